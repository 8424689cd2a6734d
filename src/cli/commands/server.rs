use clap::Subcommand;
use serde_json::json;

use crate::cli::config::{ping_server, CliConfig, ServerInfo};
use crate::cli::utils::{resolve_target_item, CommandOutput, Printer};

#[derive(Subcommand)]
pub enum ServerCommands {
    #[command(about = "Register a remote server")]
    Add {
        #[arg(help = "Server name")]
        name: String,
        #[arg(help = "Server URL, e.g. http://localhost:8065")]
        url: String,
        #[arg(long, default_value = "", help = "Free-form description")]
        description: String,
    },

    #[command(about = "List registered servers")]
    List,

    #[command(about = "Switch to a server (persistent selection)")]
    Use {
        #[arg(help = "Server name")]
        name: String,
    },

    #[command(about = "Remove a server from the registry")]
    Delete {
        #[arg(help = "Server name")]
        name: String,
    },

    #[command(about = "Health check a server (defaults to the current server)")]
    Ping {
        #[arg(help = "Server name")]
        name: Option<String>,
    },
}

pub async fn handle(cmd: ServerCommands, config: &CliConfig, printer: &mut dyn Printer) -> anyhow::Result<()> {
    let output = match cmd {
        ServerCommands::Add { name, url, description } => {
            url::Url::parse(&url).map_err(|e| anyhow::anyhow!("Invalid server URL '{}': {}", url, e))?;

            let mut servers = config.load_servers()?;
            if servers.servers.contains_key(&name) {
                return Err(anyhow::anyhow!("Server '{}' already exists", name));
            }
            servers.servers.insert(name.clone(), ServerInfo::new(url.clone(), description));
            config.save_servers(&servers)?;

            // First server registered becomes the current one
            let mut env = config.load_environment()?;
            if env.current_server.is_none() {
                env.current_server = Some(name.clone());
                config.save_environment(&env)?;
            }

            CommandOutput::message_with(
                format!("Server '{}' added ({})", name, url),
                json!({ "name": name, "url": url }),
            )
        }
        ServerCommands::List => {
            let servers = config.load_servers()?;
            let current = config.load_environment()?.current_server;

            let mut names: Vec<&String> = servers.servers.keys().collect();
            names.sort();

            let mut lines = vec![format!("{:<15} {:<35} {:<8} {}", "NAME", "URL", "STATUS", "SESSION")];
            let mut entries = Vec::new();
            for name in names {
                let info = &servers.servers[name];
                let marker = if current.as_ref() == Some(name) { "*" } else { " " };
                lines.push(format!(
                    "{}{:<14} {:<35} {:<8} {}",
                    marker,
                    name,
                    info.url,
                    info.status,
                    if info.auth_token.is_some() { "yes" } else { "no" }
                ));
                entries.push(json!({
                    "name": name,
                    "url": info.url,
                    "description": info.description,
                    "status": info.status,
                    "last_ping": info.last_ping,
                    "has_session": info.auth_token.is_some(),
                    "current": current.as_ref() == Some(name),
                }));
            }

            if entries.is_empty() {
                CommandOutput::message_with("No servers configured", json!({ "servers": [] }))
            } else {
                CommandOutput::message_with(lines.join("\n"), json!({ "servers": entries }))
            }
        }
        ServerCommands::Use { name } => {
            if !config.load_servers()?.servers.contains_key(&name) {
                return Err(anyhow::anyhow!("Server '{}' not found", name));
            }
            let mut env = config.load_environment()?;
            env.current_server = Some(name.clone());
            config.save_environment(&env)?;

            CommandOutput::message_with(
                format!("Switched to server '{}'", name),
                json!({ "current_server": name }),
            )
        }
        ServerCommands::Delete { name } => {
            let mut servers = config.load_servers()?;
            if servers.servers.remove(&name).is_none() {
                return Err(anyhow::anyhow!("Server '{}' not found", name));
            }
            config.save_servers(&servers)?;

            let mut env = config.load_environment()?;
            if env.current_server.as_deref() == Some(name.as_str()) {
                env.current_server = None;
                config.save_environment(&env)?;
            }

            CommandOutput::message(format!("Server '{}' deleted", name))
        }
        ServerCommands::Ping { name } => {
            let name = resolve_target_item(name, || Ok(config.load_environment()?.current_server), "server")?;
            let url = config
                .load_servers()?
                .servers
                .get(&name)
                .map(|info| info.url.clone())
                .ok_or_else(|| anyhow::anyhow!("Server '{}' not found", name))?;

            let status = ping_server(&ServerInfo::new(url.clone(), String::new())).await;
            config.update_server(&name, |info| info.update_ping(status))?;

            CommandOutput::message_with(
                format!("Server '{}' ({}) is {}", name, url, status),
                json!({ "name": name, "url": url, "status": status }),
            )
        }
    };

    printer.print(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::utils::BufferedPrinter;

    fn scratch() -> CliConfig {
        let dir = std::env::temp_dir().join(format!("collab-server-{}", uuid::Uuid::new_v4().simple()));
        CliConfig::at(dir).unwrap()
    }

    #[tokio::test]
    async fn add_use_and_delete_servers() {
        let config = scratch();
        let mut printer = BufferedPrinter::new();

        handle(
            ServerCommands::Add {
                name: "dev".to_string(),
                url: "http://localhost:8065".to_string(),
                description: String::new(),
            },
            &config,
            &mut printer,
        )
        .await
        .unwrap();
        assert_eq!(config.current_server().unwrap().0, "dev");

        assert!(handle(ServerCommands::Use { name: "prod".to_string() }, &config, &mut printer)
            .await
            .is_err());

        handle(ServerCommands::Delete { name: "dev".to_string() }, &config, &mut printer)
            .await
            .unwrap();
        assert!(config.load_environment().unwrap().current_server.is_none());
        assert_eq!(printer.outputs.len(), 2);

        std::fs::remove_dir_all(config.dir()).unwrap();
    }

    #[tokio::test]
    async fn rejects_unparseable_urls() {
        let config = scratch();
        let mut printer = BufferedPrinter::new();
        let result = handle(
            ServerCommands::Add {
                name: "bad".to_string(),
                url: "localhost without scheme".to_string(),
                description: String::new(),
            },
            &config,
            &mut printer,
        )
        .await;
        assert!(result.is_err());
        assert!(printer.is_empty());

        std::fs::remove_dir_all(config.dir()).unwrap();
    }
}
