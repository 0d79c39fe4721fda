//! `regsweep repos` command — list the repositories in a registry.

use clap::Args;

use regsweep_registry::catalog::CatalogWalker;

use super::ConnectionArgs;

#[derive(Args)]
pub struct ReposArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,
}

pub async fn execute(args: ReposArgs) -> Result<(), Box<dyn std::error::Error>> {
    let client = args.connection.client()?;
    let mut walker = CatalogWalker::new(&client);

    while let Some(name) = walker.next().await? {
        println!("{name}");
    }

    Ok(())
}
