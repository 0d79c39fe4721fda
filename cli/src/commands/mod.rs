//! CLI command definitions and dispatch.

mod repos;
mod sweep;
mod tags;

use clap::{Args, Parser, Subcommand};

use regsweep_registry::client::{ClientConfig, RegistryAuth, RegistryClient};

/// regsweep - batch retention for container registries.
#[derive(Parser)]
#[command(name = "regsweep", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Subcommand)]
pub enum Command {
    /// Find stale tags and report, simulate, or delete them
    Sweep(sweep::SweepArgs),
    /// List the repositories in a registry
    Repos(repos::ReposArgs),
    /// List the tags of one repository with digests and ages
    Tags(tags::TagsArgs),
}

/// Connection flags shared by every command.
#[derive(Args)]
pub struct ConnectionArgs {
    /// Registry endpoint, e.g. https://registry.example.com
    pub registry: String,

    /// Username for basic authentication
    #[arg(short, long)]
    pub username: Option<String>,

    /// Password for basic authentication
    #[arg(short, long)]
    pub password: Option<String>,

    /// Do not verify the registry's TLS certificate
    #[arg(long)]
    pub insecure: bool,
}

impl ConnectionArgs {
    /// Build a client from the flags. Credentials fall back to the
    /// REGISTRY_USERNAME and REGISTRY_PASSWORD environment variables.
    pub(crate) fn client(&self) -> Result<RegistryClient, Box<dyn std::error::Error>> {
        let auth = match (&self.username, &self.password) {
            (Some(username), Some(password)) => {
                RegistryAuth::basic(username.as_str(), password.as_str())
            }
            (None, None) => RegistryAuth::from_env(),
            _ => {
                return Err("both --username and --password are required for basic auth".into())
            }
        };

        let config = ClientConfig::new(self.registry.as_str())
            .with_auth(auth)
            .with_accept_invalid_certs(self.insecure);
        let client = RegistryClient::new(config)?;
        Ok(client)
    }
}

/// Dispatch a parsed CLI to the appropriate command handler.
pub async fn dispatch(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Command::Sweep(args) => sweep::execute(args).await,
        Command::Repos(args) => repos::execute(args).await,
        Command::Tags(args) => tags::execute(args).await,
    }
}
