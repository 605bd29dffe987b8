use crate::ServerError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Server configuration, loaded from a TOML file with CLI overrides on top.
///
/// The `[users]` table maps account ids to display names; staff status is
/// derived from the id prefix, so the table only affects how names appear
/// in approved records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Milliseconds between messages when draining an offline queue.
    #[serde(default = "default_drain_pacing_ms")]
    pub drain_pacing_ms: u64,
    #[serde(default = "default_max_clients")]
    pub max_clients: usize,
    #[serde(default)]
    pub users: BTreeMap<String, String>,
}

fn default_port() -> u16 {
    7420
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./aula-data")
}

fn default_drain_pacing_ms() -> u64 {
    100
}

fn default_max_clients() -> usize {
    16
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            data_dir: default_data_dir(),
            drain_pacing_ms: default_drain_pacing_ms(),
            max_clients: default_max_clients(),
            users: BTreeMap::new(),
        }
    }
}

impl ServerConfig {
    pub fn load(path: &Path) -> Result<Self, ServerError> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| ServerError::Config(format!("invalid server config: {e}")))
    }

    pub fn save(&self, path: &Path) -> Result<(), ServerError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| ServerError::Config(format!("cannot serialize config: {e}")))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
