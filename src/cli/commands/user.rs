use clap::Subcommand;

use crate::cli::utils::{CommandOutput, Printer};
use crate::cli::Context;
use crate::database::models::{Role, User};
use crate::services::{AdminService, Caller};

#[derive(Subcommand)]
pub enum UserCommands {
    #[command(about = "Create a user (requires --local)")]
    Create {
        #[arg(help = "Email address")]
        email: String,
        #[arg(help = "Username")]
        username: String,
        #[arg(long, help = "Grant the system_admin role")]
        system_admin: bool,
        #[arg(long, help = "Allow the user to manage their own access tokens")]
        token_access: bool,
    },

    #[command(about = "Look a user up by email or username")]
    Show {
        #[arg(help = "User email or username")]
        user: String,
    },
}

pub fn roles_for(system_admin: bool, token_access: bool) -> Vec<Role> {
    let mut roles = vec![Role::SystemUser];
    if system_admin {
        roles.push(Role::SystemAdmin);
    }
    if token_access {
        roles.push(Role::SystemUserAccessToken);
    }
    roles
}

pub async fn create_user(service: &AdminService, email: &str, username: &str, roles: Vec<Role>) -> anyhow::Result<User> {
    let (email, username) = (email.trim(), username.trim());
    if email.is_empty() || username.is_empty() {
        return Err(anyhow::anyhow!("email and username must not be empty"));
    }
    Ok(service.create_user(&Caller::Local, User::new(email, username, roles)).await?)
}

pub async fn handle(cmd: UserCommands, ctx: &Context, printer: &mut dyn Printer) -> anyhow::Result<()> {
    let (verb, user) = match cmd {
        UserCommands::Create {
            email,
            username,
            system_admin,
            token_access,
        } => {
            ctx.require_local("user create")?;
            let service = ctx.local_service().await?;
            let user = create_user(&service, &email, &username, roles_for(system_admin, token_access)).await?;
            ("Created", user)
        }
        UserCommands::Show { user } => ("Found", ctx.client().await?.find_user(&user).await?),
    };

    let roles: Vec<&str> = user.roles.iter().map(Role::as_str).collect();
    printer.print(&CommandOutput::message_with(
        format!(
            "{} {} <{}> ({}) roles: {}",
            verb,
            user.username,
            user.email,
            user.id,
            roles.join(", ")
        ),
        serde_json::to_value(&user)?,
    ))
}
