use clap::Subcommand;
use serde_json::json;

use crate::auth::{generate_jwt, Claims};
use crate::cli::config::CliConfig;
use crate::cli::utils::{CommandOutput, Printer};
use crate::cli::Context;
use crate::database::models::User;
use crate::services::AdminService;

#[derive(Subcommand)]
pub enum AuthCommands {
    #[command(about = "Mint a session for a user and store it on the current server (requires --local)")]
    Session {
        #[arg(help = "User email or username")]
        user: String,
    },

    #[command(about = "Forget the session stored on the current server")]
    Logout,

    #[command(about = "Show whether the current server has a session")]
    Status,
}

/// Sign a session JWT for the user named by `identifier`
pub async fn mint_session(service: &AdminService, identifier: &str) -> anyhow::Result<(User, String)> {
    let user = service.find_user(identifier).await?;
    let jwt = generate_jwt(&Claims::for_user(&user))?;
    Ok((user, jwt))
}

pub async fn handle(cmd: AuthCommands, ctx: &Context, printer: &mut dyn Printer) -> anyhow::Result<()> {
    let config = CliConfig::open()?;

    let output = match cmd {
        AuthCommands::Session { user } => {
            ctx.require_local("auth session")?;
            let (name, _) = config.current_server()?;
            let service = ctx.local_service().await?;
            let (user, jwt) = mint_session(&service, &user).await?;
            config.update_server(&name, |info| info.auth_token = Some(jwt))?;

            CommandOutput::message_with(
                format!("Session for '{}' stored on server '{}'", user.username, name),
                json!({ "server": name, "user_id": user.id, "username": user.username }),
            )
        }
        AuthCommands::Logout => {
            let (name, _) = config.current_server()?;
            config.update_server(&name, |info| info.auth_token = None)?;
            CommandOutput::message(format!("Session removed from server '{}'", name))
        }
        AuthCommands::Status => {
            let (name, info) = config.current_server()?;
            let text = if info.auth_token.is_some() {
                format!("Server '{}' has a stored session", name)
            } else {
                format!("Server '{}' has no session", name)
            };
            CommandOutput::message_with(
                text,
                json!({ "server": name, "has_session": info.auth_token.is_some() }),
            )
        }
    };

    printer.print(&output)
}
