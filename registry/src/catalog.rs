//! Lazy, paginated walk of the repository catalog.

use std::collections::{HashSet, VecDeque};

use regsweep_core::error::Result;

use crate::backend::RegistryBackend;

/// Repositories requested per catalog page.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Forward-only iterator over every repository name in the catalog.
///
/// Pages are fetched on demand and the pagination cursor never leaves
/// this struct. A page fetch error is fatal to the walk: the next page
/// cannot be requested without the cursor from a successful one.
pub struct CatalogWalker<'a, B: RegistryBackend + ?Sized> {
    backend: &'a B,
    page_size: usize,
    buffer: VecDeque<String>,
    cursor: Option<String>,
    seen: HashSet<String>,
    done: bool,
}

impl<'a, B: RegistryBackend + ?Sized> CatalogWalker<'a, B> {
    pub fn new(backend: &'a B) -> Self {
        Self::with_page_size(backend, DEFAULT_PAGE_SIZE)
    }

    /// Walker with a custom page size. The registry may cap it lower.
    pub fn with_page_size(backend: &'a B, page_size: usize) -> Self {
        Self {
            backend,
            page_size: page_size.max(1),
            buffer: VecDeque::new(),
            cursor: None,
            seen: HashSet::new(),
            done: false,
        }
    }

    /// Next repository name, or `None` once the catalog is exhausted.
    pub async fn next(&mut self) -> Result<Option<String>> {
        loop {
            if let Some(name) = self.buffer.pop_front() {
                return Ok(Some(name));
            }
            if self.done {
                return Ok(None);
            }
            self.fetch_page().await?;
        }
    }

    /// Drain the remaining names into a vector.
    pub async fn collect_all(mut self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        while let Some(name) = self.next().await? {
            names.push(name);
        }
        Ok(names)
    }

    async fn fetch_page(&mut self) -> Result<()> {
        let page = self
            .backend
            .catalog_page(self.page_size, self.cursor.as_deref())
            .await?;

        // The cursor for the next request is the last name of this page.
        // Empty padding entries are not names and cannot serve as one.
        let next_cursor = page
            .repositories
            .iter()
            .rev()
            .find(|name| !name.is_empty())
            .cloned();

        match next_cursor {
            Some(last) if self.cursor.as_deref() != Some(last.as_str()) => {
                self.cursor = Some(last);
                if !page.more {
                    self.done = true;
                }
            }
            // No usable names, or a cursor that did not advance: the walk
            // cannot make progress, so stop regardless of what the
            // registry claims.
            _ => self.done = true,
        }

        for name in page.repositories {
            if name.is_empty() || !self.seen.insert(name.clone()) {
                continue;
            }
            self.buffer.push_back(name);
        }

        Ok(())
    }
}
