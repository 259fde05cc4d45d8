//! Persistent launcher settings (`state/settings.toml`).

use crate::errors::LaunchError;
use crate::types::{AuthMode, RunMode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// Launcher settings, loaded once per invocation and passed down explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PcoderConfig {
    /// Auth mode per tool. Tools without an entry use oauth.
    pub auth: BTreeMap<String, AuthMode>,
    pub runtime: RuntimeSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeSettings {
    /// Mode used on Windows hosts when `--mode` is not given.
    pub windows_default_mode: RunMode,
    /// Copy the project back from the VM after a run.
    pub sync_back_default: bool,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            windows_default_mode: RunMode::VmPortable,
            sync_back_default: true,
        }
    }
}

impl PcoderConfig {
    /// Load settings from `path`. A missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self, LaunchError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No settings file, using defaults");
                return Ok(Self::default());
            }
            Err(err) => {
                return Err(LaunchError::Settings {
                    path: path.to_path_buf(),
                    message: err.to_string(),
                });
            }
        };
        Self::parse(&contents).map_err(|message| LaunchError::Settings {
            path: path.to_path_buf(),
            message,
        })
    }

    /// Parse settings from TOML text.
    pub fn parse(contents: &str) -> Result<Self, String> {
        toml::from_str(contents).map_err(|err| err.to_string())
    }

    /// Write settings to `path`, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let body = toml::to_string_pretty(self)?;
        std::fs::write(path, body)?;
        Ok(())
    }

    /// Configured auth mode for `tool` (oauth when unset).
    pub fn auth_mode(&self, tool: &str) -> AuthMode {
        self.auth.get(tool).copied().unwrap_or_default()
    }

    pub fn set_auth_mode(&mut self, tool: impl Into<String>, mode: AuthMode) {
        self.auth.insert(tool.into(), mode);
    }
}
