use clap::{Subcommand, ValueEnum};
use serde_json::json;

use crate::cli::utils::{CommandOutput, Printer};
use crate::client::AdministrativeClient;
use crate::database::models::ServiceSettingsPatch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Toggle {
    On,
    Off,
}

#[derive(Subcommand)]
pub enum SettingsCommands {
    #[command(about = "Enable or disable personal access tokens server-wide (system admins only)")]
    SetTokenAccess {
        #[arg(value_enum)]
        state: Toggle,
    },

    #[command(about = "Show server-wide settings")]
    Show,
}

fn describe(enabled: bool) -> String {
    format!(
        "User access tokens are {}",
        if enabled { "enabled" } else { "disabled" }
    )
}

pub async fn handle(
    cmd: SettingsCommands,
    client: &dyn AdministrativeClient,
    printer: &mut dyn Printer,
) -> anyhow::Result<()> {
    let enabled = match cmd {
        SettingsCommands::SetTokenAccess { state } => {
            let patch = ServiceSettingsPatch {
                enable_user_access_tokens: Some(state == Toggle::On),
            };
            client.update_service_settings(&patch).await?.enable_user_access_tokens
        }
        SettingsCommands::Show => client.is_token_feature_enabled().await?,
    };

    printer.print(&CommandOutput::message_with(
        describe(enabled),
        json!({ "enable_user_access_tokens": enabled }),
    ))
}
