use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

const SERVER_FILE: &str = "server.json";
const ENV_FILE: &str = "env.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerInfo {
    pub url: String,
    #[serde(default)]
    pub description: String,
    pub added_at: DateTime<Utc>,
    pub last_ping: Option<DateTime<Utc>>,
    pub status: ServerStatus,
    /// Session JWT minted by `auth session`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerStatus {
    Up,
    Down,
    Unknown,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    pub servers: HashMap<String, ServerInfo>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    pub current_server: Option<String>,
}

impl std::fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(match self {
            ServerStatus::Up => "up",
            ServerStatus::Down => "down",
            ServerStatus::Unknown => "unknown",
        })
    }
}

impl ServerInfo {
    pub fn new(url: String, description: String) -> Self {
        Self {
            url,
            description,
            added_at: Utc::now(),
            last_ping: None,
            status: ServerStatus::Unknown,
            auth_token: None,
        }
    }

    pub fn update_ping(&mut self, status: ServerStatus) {
        self.last_ping = Some(Utc::now());
        self.status = status;
    }
}

/// The CLI's JSON configuration directory
#[derive(Debug, Clone)]
pub struct CliConfig {
    dir: PathBuf,
}

impl CliConfig {
    /// `COLLAB_CLI_CONFIG_DIR`, else `~/.config/collab/cli`
    pub fn open() -> anyhow::Result<Self> {
        let dir = if let Ok(custom_dir) = std::env::var("COLLAB_CLI_CONFIG_DIR") {
            PathBuf::from(custom_dir)
        } else {
            let home = std::env::var("HOME").map_err(|_| anyhow::anyhow!("HOME environment variable not set"))?;
            PathBuf::from(home).join(".config").join("collab").join("cli")
        };
        Self::at(dir)
    }

    pub fn at(dir: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let dir = dir.into();
        if !dir.exists() {
            fs::create_dir_all(&dir)?;
        }
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn load_servers(&self) -> anyhow::Result<ServerConfig> {
        load_json(&self.dir.join(SERVER_FILE))
    }

    pub fn save_servers(&self, config: &ServerConfig) -> anyhow::Result<()> {
        save_json(&self.dir.join(SERVER_FILE), config)
    }

    pub fn load_environment(&self) -> anyhow::Result<EnvironmentConfig> {
        load_json(&self.dir.join(ENV_FILE))
    }

    pub fn save_environment(&self, config: &EnvironmentConfig) -> anyhow::Result<()> {
        save_json(&self.dir.join(ENV_FILE), config)
    }

    /// The selected server and its entry
    pub fn current_server(&self) -> anyhow::Result<(String, ServerInfo)> {
        let name = self
            .load_environment()?
            .current_server
            .ok_or_else(|| anyhow::anyhow!("No current server set. Use 'collabctl server use <name>' first"))?;
        let info = self
            .load_servers()?
            .servers
            .remove(&name)
            .ok_or_else(|| anyhow::anyhow!("Current server '{}' not found in configuration", name))?;
        Ok((name, info))
    }

    /// Apply `update` to the named server entry and persist it
    pub fn update_server<F>(&self, name: &str, update: F) -> anyhow::Result<ServerInfo>
    where
        F: FnOnce(&mut ServerInfo),
    {
        let mut config = self.load_servers()?;
        let info = config
            .servers
            .get_mut(name)
            .ok_or_else(|| anyhow::anyhow!("Server '{}' not found", name))?;
        update(info);
        let updated = info.clone();
        self.save_servers(&config)?;
        Ok(updated)
    }
}

fn load_json<T: DeserializeOwned + Default>(path: &Path) -> anyhow::Result<T> {
    if !path.exists() {
        return Ok(T::default());
    }
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn save_json<T: Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    let content = serde_json::to_string_pretty(value)?;
    fs::write(path, content)?;
    Ok(())
}

pub async fn ping_server(server_info: &ServerInfo) -> ServerStatus {
    let url = format!("{}/health", server_info.url.trim_end_matches('/'));

    match reqwest::Client::new()
        .get(&url)
        .timeout(Duration::from_secs(5))
        .send()
        .await
    {
        Ok(response) if response.status().is_success() => ServerStatus::Up,
        _ => ServerStatus::Down,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch() -> CliConfig {
        let dir = std::env::temp_dir().join(format!("collab-cli-{}", uuid::Uuid::new_v4().simple()));
        CliConfig::at(dir).unwrap()
    }

    #[test]
    fn missing_files_load_as_defaults() {
        let config = scratch();
        assert!(config.load_servers().unwrap().servers.is_empty());
        assert!(config.load_environment().unwrap().current_server.is_none());
        assert!(config.current_server().is_err());
    }

    #[test]
    fn current_server_round_trips_through_disk() {
        let config = scratch();
        let mut servers = ServerConfig::default();
        servers
            .servers
            .insert("dev".to_string(), ServerInfo::new("http://localhost:8065".to_string(), String::new()));
        config.save_servers(&servers).unwrap();
        config
            .save_environment(&EnvironmentConfig {
                current_server: Some("dev".to_string()),
            })
            .unwrap();

        config
            .update_server("dev", |info| info.auth_token = Some("jwt".to_string()))
            .unwrap();

        let (name, info) = config.current_server().unwrap();
        assert_eq!(name, "dev");
        assert_eq!(info.auth_token.as_deref(), Some("jwt"));
        assert!(config.update_server("missing", |_| {}).is_err());

        fs::remove_dir_all(config.dir()).unwrap();
    }
}
