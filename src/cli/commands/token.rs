// cli/commands/token.rs - issue, revoke and list personal access tokens
//
// The three handlers return typed results and never print. Permission and
// the feature gate are decided by the client's backend; the handlers only
// resolve identifiers and translate failures into TokenCommandError.

use std::fmt;

use clap::Subcommand;
use thiserror::Error;
use tracing::{debug, info};

use crate::cli::utils::{CommandOutput, Printer};
use crate::client::{AdministrativeClient, ClientError};
use crate::database::models::{AccessToken, User};
use crate::services::admin_service::DEFAULT_PER_PAGE;
use crate::services::Page;

/// What a handler was doing when it failed; renders into error messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    RetrieveUser,
    CreateToken,
    RevokeToken,
    RetrieveTokens,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Action::RetrieveUser => "retrieve user information of",
            Action::CreateToken => "create token for",
            Action::RevokeToken => "revoke token",
            Action::RetrieveTokens => "retrieve tokens for",
        })
    }
}

#[derive(Debug, Error)]
pub enum TokenCommandError {
    #[error("could not retrieve user information of {identifier:?}")]
    UserNotFound { identifier: String },

    #[error("could not revoke token {token_id:?}: {detail}")]
    TokenNotFound { token_id: String, detail: String },

    #[error("could not {action} {target:?}: {detail}")]
    FeatureDisabled {
        action: Action,
        target: String,
        detail: String,
    },

    #[error("could not {action} {target:?}: {detail}")]
    PermissionDenied {
        action: Action,
        target: String,
        detail: String,
    },

    #[error("could not {action} {target:?}: {cause}")]
    StoreFailure {
        action: Action,
        target: String,
        cause: String,
    },

    #[error("there are no tokens for the {target:?}")]
    NoTokens { target: String },

    #[error("{0}")]
    InvalidArgument(String),
}

impl TokenCommandError {
    fn from_client(action: Action, target: &str, err: ClientError) -> Self {
        let target = target.to_string();
        match err {
            ClientError::PermissionDenied(detail) => TokenCommandError::PermissionDenied { action, target, detail },
            ClientError::FeatureDisabled(detail) => TokenCommandError::FeatureDisabled { action, target, detail },
            ClientError::NotFound(detail) if action == Action::RevokeToken => TokenCommandError::TokenNotFound {
                token_id: target,
                detail,
            },
            other => TokenCommandError::StoreFailure {
                action,
                target,
                cause: other.to_string(),
            },
        }
    }
}

/// Rejects blank arguments. The value is passed on as typed so messages quote it verbatim.
fn required<'a>(what: &str, value: &'a str) -> Result<&'a str, TokenCommandError> {
    if value.trim().is_empty() {
        return Err(TokenCommandError::InvalidArgument(format!("{} must not be empty", what)));
    }
    Ok(value)
}

async fn resolve_user(client: &dyn AdministrativeClient, identifier: &str) -> Result<User, TokenCommandError> {
    client.find_user(identifier).await.map_err(|err| match err {
        ClientError::NotFound(_) => TokenCommandError::UserNotFound {
            identifier: identifier.to_string(),
        },
        other => TokenCommandError::from_client(Action::RetrieveUser, identifier, other),
    })
}

/// Issue a token for the user named by `user_identifier` (email or username)
pub async fn generate_token_for_user(
    client: &dyn AdministrativeClient,
    user_identifier: &str,
    description: &str,
) -> Result<AccessToken, TokenCommandError> {
    let identifier = required("user identifier", user_identifier)?;
    let user = resolve_user(client, identifier).await?;

    let token = client
        .create_access_token(user.id, description)
        .await
        .map_err(|err| match err {
            // Owner disappeared after the lookup
            ClientError::NotFound(_) => TokenCommandError::UserNotFound {
                identifier: identifier.to_string(),
            },
            other => TokenCommandError::from_client(Action::CreateToken, &user.email, other),
        })?;

    info!("Issued access token {} for {}", token.id, user.email);
    Ok(token)
}

/// Revoke a token by its id. No user lookup is involved.
pub async fn revoke_token(client: &dyn AdministrativeClient, token_id: &str) -> Result<(), TokenCommandError> {
    let token_id = required("token id", token_id)?;

    client
        .revoke_access_token(token_id)
        .await
        .map_err(|err| TokenCommandError::from_client(Action::RevokeToken, token_id, err))?;

    info!("Revoked access token {}", token_id);
    Ok(())
}

/// One page of a user's tokens, without secrets. An empty page is an error.
pub async fn list_tokens_of_user(
    client: &dyn AdministrativeClient,
    user_identifier: &str,
    page: Page,
) -> Result<Vec<AccessToken>, TokenCommandError> {
    let identifier = required("user identifier", user_identifier)?;
    let user = resolve_user(client, identifier).await?;

    let tokens = client
        .list_access_tokens(user.id, page)
        .await
        .map_err(|err| TokenCommandError::from_client(Action::RetrieveTokens, &user.email, err))?;

    if tokens.is_empty() {
        return Err(TokenCommandError::NoTokens { target: user.email });
    }

    debug!("Listed {} tokens for {}", tokens.len(), user.email);
    Ok(tokens.into_iter().map(|token| token.sanitized()).collect())
}

#[derive(Subcommand)]
pub enum TokenCommands {
    #[command(about = "Generate a personal access token for a user")]
    Generate {
        #[arg(help = "User email or username")]
        user: String,
        #[arg(help = "Token description", default_value = "")]
        description: String,
    },

    #[command(about = "Revoke a personal access token")]
    Revoke {
        #[arg(help = "Token id")]
        token_id: String,
    },

    #[command(about = "List the personal access tokens of a user")]
    List {
        #[arg(help = "User email or username")]
        user: String,
        #[arg(long, default_value_t = 0, help = "Page to show, starting at 0")]
        page: u32,
        #[arg(long, default_value_t = DEFAULT_PER_PAGE, help = "Tokens per page (at most 200)")]
        per_page: u32,
    },
}

pub async fn handle(
    cmd: TokenCommands,
    client: &dyn AdministrativeClient,
    printer: &mut dyn Printer,
) -> anyhow::Result<()> {
    let output = match cmd {
        TokenCommands::Generate { user, description } => {
            CommandOutput::Token(generate_token_for_user(client, &user, &description).await?)
        }
        TokenCommands::Revoke { token_id } => {
            revoke_token(client, &token_id).await?;
            CommandOutput::Nothing
        }
        TokenCommands::List { user, page, per_page } => {
            CommandOutput::Tokens(list_tokens_of_user(client, &user, Page { page, per_page }).await?)
        }
    };

    printer.print(&output)
}
