// Net Connection - Client Configuration
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Client configuration model.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::{
    CONFIG_DIR_NAME, CONNMAN_MANAGER_PATH, CONNMAN_SERVICE_NAME, NETCONFIG_SERVICE_NAME,
    NETCONFIG_STATISTICS_PATH,
};

/// Which message bus reaches the daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BusType {
    /// The system bus (production daemons).
    #[default]
    System,
    /// The session bus (test daemons).
    Session,
}

impl BusType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Session => "session",
        }
    }
}

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Bus to connect to.
    #[serde(default)]
    pub bus: BusType,

    /// Well-known name of the connectivity daemon.
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Object path of the daemon's manager object.
    #[serde(default = "default_manager_path")]
    pub manager_path: String,

    /// Well-known name of the statistics service.
    #[serde(default = "default_statistics_service")]
    pub statistics_service: String,

    /// Object path of the statistics object.
    #[serde(default = "default_statistics_path")]
    pub statistics_path: String,

    /// Timeout for a single daemon request, in seconds.
    #[serde(default = "default_call_timeout")]
    pub call_timeout_secs: u64,

    /// Cellular statistics store; defaults under the XDG config directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preference_file: Option<PathBuf>,
}

fn default_service_name() -> String {
    CONNMAN_SERVICE_NAME.to_string()
}

fn default_manager_path() -> String {
    CONNMAN_MANAGER_PATH.to_string()
}

fn default_statistics_service() -> String {
    NETCONFIG_SERVICE_NAME.to_string()
}

fn default_statistics_path() -> String {
    NETCONFIG_STATISTICS_PATH.to_string()
}

fn default_call_timeout() -> u64 {
    10
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            bus: BusType::System,
            service_name: default_service_name(),
            manager_path: default_manager_path(),
            statistics_service: default_statistics_service(),
            statistics_path: default_statistics_path(),
            call_timeout_secs: default_call_timeout(),
            preference_file: None,
        }
    }
}

impl ClientConfig {
    /// Directory holding the configuration and the default preference file.
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(CONFIG_DIR_NAME)
    }

    /// Load `config.toml` from the config directory, falling back to defaults.
    pub fn load() -> Self {
        let path = Self::config_dir().join("config.toml");
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from_file(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Ignoring unreadable config {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    /// Load configuration from TOML file.
    pub fn load_from_file(path: &Path) -> Result<Self, super::Error> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| super::Error::ConfigReadFailed(format!("{}: {}", path.display(), e)))?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to TOML file with restrictive permissions (0600).
    pub fn save_to_file(&self, path: &Path) -> Result<(), super::Error> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let _ = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600));
        }
        Ok(())
    }

    /// Resolved path of the cellular statistics preference file.
    pub fn preference_path(&self) -> PathBuf {
        self.preference_file
            .clone()
            .unwrap_or_else(|| Self::config_dir().join("statistics.json"))
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_toml() {
        let config: ClientConfig = toml::from_str("").unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.service_name, "net.connman");
        assert_eq!(config.call_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_partial_toml() {
        let config: ClientConfig =
            toml::from_str("bus = \"session\"\ncall_timeout_secs = 0\n").unwrap();
        assert_eq!(config.bus, BusType::Session);
        assert_eq!(config.call_timeout(), Duration::from_secs(1));
    }

    #[test]
    fn test_missing_file_is_a_read_failure() {
        let dir = tempfile::tempdir().unwrap();
        let err = ClientConfig::load_from_file(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, crate::models::Error::ConfigReadFailed(_)));
        assert_eq!(err.code(), crate::models::ErrorCode::OperationFailed);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let config = ClientConfig {
            preference_file: Some(dir.path().join("stats.json")),
            ..ClientConfig::default()
        };
        config.save_to_file(&path).unwrap();
        let loaded = ClientConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.preference_path(), dir.path().join("stats.json"));
    }
}
