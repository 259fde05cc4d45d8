//! Per-tool credential isolation.
//!
//! In oauth mode each `(tool, side)` pair gets its own home directory with the
//! XDG base directories beneath it, so logins cached by one tool never leak
//! into another tool or across the host/guest boundary. In api mode nothing is
//! isolated and only the mode marker is set.

use crate::config::vm::PortableLayout;
use crate::errors::LaunchError;
use crate::types::AuthMode;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Marker variable exported on every execution path.
pub const AUTH_MODE_VAR: &str = "PCODER_AUTH_MODE";

/// Where the tool will run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthSide {
    /// On this machine. Directories are created immediately.
    Host {
        auth_root: PathBuf,
        /// Mirror HOME into USERPROFILE / APPDATA / LOCALAPPDATA.
        windows_profile: bool,
    },
    /// Inside the VM. Paths are POSIX strings; the run script creates them.
    Guest { home: String },
}

impl AuthSide {
    pub fn host(layout: &PortableLayout, tool: &str) -> Self {
        Self::Host {
            auth_root: layout.host_auth_root(tool),
            windows_profile: cfg!(windows),
        }
    }

    pub fn guest(home: impl Into<String>) -> Self {
        Self::Guest { home: home.into() }
    }
}

/// Variables to set and directories that must exist before the tool starts.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AuthEnvironment {
    /// Ordered; the mode marker is always last.
    pub vars: Vec<(String, String)>,
    pub dirs: Vec<String>,
}

impl AuthEnvironment {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Variables other than the mode marker.
    pub fn isolation_vars(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars
            .iter()
            .filter(|(k, _)| k != AUTH_MODE_VAR)
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    fn push(&mut self, key: &str, value: impl Into<String>) {
        self.vars.push((key.to_string(), value.into()));
    }
}

/// Joins path segments in the side's native convention.
struct Paths<'a> {
    side: &'a AuthSide,
}

impl Paths<'_> {
    fn join(&self, base: &str, parts: &[&str]) -> String {
        match self.side {
            AuthSide::Host { .. } => {
                let mut path = PathBuf::from(base);
                for part in parts {
                    path.push(part);
                }
                path.to_string_lossy().into_owned()
            }
            AuthSide::Guest { .. } => {
                let mut path = base.trim_end_matches('/').to_string();
                for part in parts {
                    path.push('/');
                    path.push_str(part);
                }
                path
            }
        }
    }
}

/// Build the auth environment for `tool`.
///
/// Host-side directories are created here and creation is idempotent.
pub fn build(tool: &str, mode: AuthMode, side: &AuthSide) -> Result<AuthEnvironment, LaunchError> {
    let mut env = AuthEnvironment::default();

    if mode == AuthMode::Oauth {
        let home = match side {
            AuthSide::Host { auth_root, .. } => auth_root.join("home").to_string_lossy().into_owned(),
            AuthSide::Guest { home } => home.clone(),
        };
        let paths = Paths { side };
        let config = paths.join(&home, &[".config"]);
        let cache = paths.join(&home, &[".cache"]);
        let data = paths.join(&home, &[".local", "share"]);
        let state = paths.join(&home, &[".local", "state"]);

        env.push("HOME", home.clone());
        env.push("XDG_CONFIG_HOME", config.clone());
        env.push("XDG_CACHE_HOME", cache.clone());
        env.push("XDG_DATA_HOME", data.clone());
        env.push("XDG_STATE_HOME", state.clone());
        env.dirs.extend([config, cache, data, state]);

        if let AuthSide::Host {
            windows_profile, ..
        } = side
        {
            env.push("PCODER_AUTH_HOME", home.clone());
            if *windows_profile {
                let roaming = paths.join(&home, &["AppData", "Roaming"]);
                let local = paths.join(&home, &["AppData", "Local"]);
                env.push("USERPROFILE", home.clone());
                env.push("APPDATA", roaming.clone());
                env.push("LOCALAPPDATA", local.clone());
                env.dirs.extend([roaming, local]);
            }
        }

        match tool {
            "claude" => {
                let dir = paths.join(&home, &[".claude"]);
                env.push("CLAUDE_CONFIG_DIR", dir.clone());
                env.dirs.push(dir);
            }
            "codex" => {
                let dir = paths.join(&home, &[".openai"]);
                env.push("OPENAI_HOME", dir.clone());
                env.dirs.push(dir);
            }
            _ => {}
        }

        if let AuthSide::Host { .. } = side {
            for dir in &env.dirs {
                std::fs::create_dir_all(dir).map_err(|source| LaunchError::AuthDir {
                    path: Path::new(dir).to_path_buf(),
                    source,
                })?;
            }
            debug!(tool, home = %home, dirs = env.dirs.len(), "Prepared host auth home");
        }
    }

    env.push(AUTH_MODE_VAR, mode.as_str());
    Ok(env)
}
