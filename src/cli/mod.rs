pub mod commands;
pub mod config;
pub mod utils;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::debug;

use crate::client::{AdministrativeClient, LocalClient, RemoteClient};
use crate::database::models::ServiceSettings;
use crate::database::PgStore;
use crate::services::AdminService;
use config::CliConfig;
use utils::{ConsolePrinter, OutputFormat};

#[derive(Parser)]
#[command(name = "collabctl")]
#[command(about = "collabctl - administer users and personal access tokens")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, conflicts_with = "yaml", help = "Output in JSON format")]
    pub json: bool,

    #[arg(long, global = true, help = "Output in YAML format")]
    pub yaml: bool,

    #[arg(
        long,
        global = true,
        help = "Talk to the database directly (DATABASE_URL) instead of the current server"
    )]
    pub local: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Personal access token management")]
    Token {
        #[command(subcommand)]
        cmd: commands::token::TokenCommands,
    },

    #[command(about = "Remote server management")]
    Server {
        #[command(subcommand)]
        cmd: commands::server::ServerCommands,
    },

    #[command(about = "Session management")]
    Auth {
        #[command(subcommand)]
        cmd: commands::auth::AuthCommands,
    },

    #[command(about = "Server-wide settings")]
    Config {
        #[command(subcommand)]
        cmd: commands::settings::SettingsCommands,
    },

    #[command(about = "User management")]
    User {
        #[command(subcommand)]
        cmd: commands::user::UserCommands,
    },
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else if cli.yaml {
            OutputFormat::Yaml
        } else {
            OutputFormat::Text
        }
    }
}

/// Where commands send their calls: the database directly with `--local`,
/// otherwise the current server with its stored session
pub struct Context {
    pub local: bool,
}

impl Context {
    pub fn require_local(&self, command: &str) -> anyhow::Result<()> {
        if !self.local {
            return Err(anyhow::anyhow!("'{}' is only available with --local", command));
        }
        Ok(())
    }

    pub async fn local_service(&self) -> anyhow::Result<Arc<AdminService>> {
        let store = PgStore::connect().await?;
        store.migrate().await?;
        let defaults = ServiceSettings::from(&crate::config::config().service);
        Ok(Arc::new(AdminService::new(Arc::new(store), defaults)))
    }

    pub async fn client(&self) -> anyhow::Result<Box<dyn AdministrativeClient>> {
        if self.local {
            debug!("Using the local administrative channel");
            return Ok(Box::new(LocalClient::new(self.local_service().await?)));
        }

        let (name, server) = CliConfig::open()?.current_server()?;
        if server.auth_token.is_none() {
            return Err(anyhow::anyhow!(
                "No session stored for server '{}'. Run 'collabctl --local auth session <user>' first",
                name
            ));
        }
        debug!("Using server '{}' at {}", name, server.url);
        Ok(Box::new(RemoteClient::new(&server.url, server.auth_token)?))
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut printer = ConsolePrinter::new(OutputFormat::from_cli(&cli));
    let ctx = Context { local: cli.local };

    match cli.command {
        Commands::Token { cmd } => {
            let client = ctx.client().await?;
            commands::token::handle(cmd, client.as_ref(), &mut printer).await
        }
        Commands::Server { cmd } => commands::server::handle(cmd, &CliConfig::open()?, &mut printer).await,
        Commands::Auth { cmd } => commands::auth::handle(cmd, &ctx, &mut printer).await,
        Commands::Config { cmd } => {
            let client = ctx.client().await?;
            commands::settings::handle(cmd, client.as_ref(), &mut printer).await
        }
        Commands::User { cmd } => commands::user::handle(cmd, &ctx, &mut printer).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_flags_pick_the_format() {
        let cli = Cli::parse_from(["collabctl", "--json", "token", "revoke", "abc"]);
        assert_eq!(OutputFormat::from_cli(&cli), OutputFormat::Json);

        let cli = Cli::parse_from(["collabctl", "token", "list", "erin", "--yaml", "--page", "2"]);
        assert_eq!(OutputFormat::from_cli(&cli), OutputFormat::Yaml);

        assert!(Cli::try_parse_from(["collabctl", "--json", "--yaml", "server", "list"]).is_err());
    }

    #[test]
    fn remote_only_contexts_refuse_local_commands() {
        assert!(Context { local: false }.require_local("user create").is_err());
        assert!(Context { local: true }.require_local("user create").is_ok());
    }
}
