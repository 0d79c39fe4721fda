//! `regsweep tags` command — list one repository's tags.

use clap::Args;

use regsweep_registry::sweep::resolve_repository;

use crate::output;

use super::ConnectionArgs;

#[derive(Args)]
pub struct TagsArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Repository name, e.g. library/alpine
    pub repository: String,
}

pub async fn execute(args: TagsArgs) -> Result<(), Box<dyn std::error::Error>> {
    let client = args.connection.client()?;
    let scan = resolve_repository(&client, &args.repository).await?;

    let mut table = output::new_table(&["TAG", "DIGEST", "CREATED", "AGE"]);
    for record in &scan.records {
        table.add_row([
            record.tag.clone(),
            output::short_digest(&record.digest),
            record.created_display(),
            output::format_ago(&record.created),
        ]);
    }
    println!("{table}");

    if scan.skipped > 0 {
        eprintln!("{} tags skipped (metadata unavailable).", scan.skipped);
    }

    Ok(())
}
