use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use toolwire_mcp::server::demo_server;
use toolwire_mcp::McpServer;

use crate::sessions::SessionTable;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: ServerInfoConfig,

    #[serde(default)]
    pub paths: PathsConfig,
}

/// Identity reported to clients in the `initialize` handshake
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerInfoConfig {
    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default = "default_version")]
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_sse_path")]
    pub sse: String,

    #[serde(default = "default_messages_path")]
    pub messages: String,
}

fn default_name() -> String {
    "sse-server".to_string()
}

fn default_version() -> String {
    "1.0.0".to_string()
}

fn default_sse_path() -> String {
    "/sse".to_string()
}

fn default_messages_path() -> String {
    "/messages".to_string()
}

impl Default for ServerInfoConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            version: default_version(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            sse: default_sse_path(),
            messages: default_messages_path(),
        }
    }
}

impl ServerConfig {
    pub fn load(config_path: &Path) -> Result<Self> {
        // Load config file if it exists, otherwise use defaults
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)
                .context("Failed to read configuration file")?;
            toml::from_str(&content).context("Failed to parse configuration file")
        } else {
            tracing::info!("Configuration file not found, using defaults");
            Ok(Self::default())
        }
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: ServerConfig,
    pub mcp: McpServer,
    pub sessions: SessionTable,
}

impl AppState {
    /// State for the demo SSE server (`sse-add`, `sse-greeting://{name}`)
    pub fn new(config: ServerConfig) -> Result<Self> {
        let mcp = demo_server(&config.server.name, &config.server.version, "sse-")
            .context("Failed to register demo tools")?;
        Ok(Self::with_server(config, mcp))
    }

    pub fn with_server(config: ServerConfig, mcp: McpServer) -> Self {
        Self {
            config,
            mcp,
            sessions: SessionTable::new(),
        }
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: ServerConfig = toml::from_str(
            r#"
            [server]
            name = "custom"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.name, "custom");
        assert_eq!(config.server.version, "1.0.0");
        assert_eq!(config.paths.sse, "/sse");
        assert_eq!(config.paths.messages, "/messages");
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("toolwire.toml");
        std::fs::write(
            &path,
            "[server]\nversion = \"2.0.0\"\n\n[paths]\nsse = \"/events\"\n",
        )
        .unwrap();

        let config = ServerConfig::load(&path).unwrap();
        assert_eq!(config.server.name, "sse-server");
        assert_eq!(config.server.version, "2.0.0");
        assert_eq!(config.paths.sse, "/events");
        assert_eq!(config.paths.messages, "/messages");
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("toolwire.toml");
        std::fs::write(&path, "[server\nname = ").unwrap();

        assert!(ServerConfig::load(&path).is_err());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = ServerConfig::load(Path::new("/nonexistent/toolwire.toml")).unwrap();
        assert_eq!(config.server.name, "sse-server");
    }
}
