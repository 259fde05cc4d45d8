//! Executable resolution: override, then bundled copy, then PATH.

use crate::config::vm::{PortableLayout, VmSettings};
use crate::errors::LaunchError;
use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Capability to resolve a bare command name to an executable path.
pub trait ExecutableLookup {
    fn find(&self, name: &str) -> Option<PathBuf>;
}

/// PATH lookup through the `which` crate.
#[derive(Debug, Clone)]
pub struct SystemLookup {
    path: Option<OsString>,
    cwd: PathBuf,
}

impl SystemLookup {
    /// Search `path` (a PATH-style list) relative to `cwd`.
    pub fn new(path: Option<impl Into<OsString>>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            path: path.map(Into::into),
            cwd: cwd.into(),
        }
    }
}

impl ExecutableLookup for SystemLookup {
    fn find(&self, name: &str) -> Option<PathBuf> {
        which::which_in(name, self.path.as_ref(), &self.cwd).ok()
    }
}

/// Fixed name-to-path table, for tests and dry runs.
#[derive(Debug, Clone, Default)]
pub struct StaticLookup {
    entries: HashMap<String, PathBuf>,
}

impl StaticLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.entries.insert(name.into(), path.into());
        self
    }
}

impl ExecutableLookup for StaticLookup {
    fn find(&self, name: &str) -> Option<PathBuf> {
        self.entries.get(name).cloned()
    }
}

fn has_separator(value: &str) -> bool {
    value.contains('/') || value.contains('\\')
}

/// Resolves logical tools (ssh, scp, tool runners) to invocable paths.
pub struct CommandLocator<'a, L: ExecutableLookup + ?Sized> {
    lookup: &'a L,
}

impl<'a, L: ExecutableLookup + ?Sized> CommandLocator<'a, L> {
    pub fn new(lookup: &'a L) -> Self {
        Self { lookup }
    }

    /// Resolve `name`.
    ///
    /// A set override must resolve or the call fails; it never falls through
    /// to the bundled copy. Bundled candidates are tried in order, then PATH.
    pub fn locate(
        &self,
        name: &str,
        override_var: &str,
        override_value: Option<&str>,
        bundled: &[PathBuf],
    ) -> Result<PathBuf, LaunchError> {
        if let Some(value) = override_value.filter(|v| !v.is_empty()) {
            let resolved = if has_separator(value) {
                let path = PathBuf::from(value);
                path.is_file().then_some(path)
            } else {
                self.lookup.find(value)
            };
            return match resolved {
                Some(path) => {
                    debug!(tool = name, var = override_var, path = %path.display(), "Using override");
                    Ok(path)
                }
                None => Err(LaunchError::OverrideNotFound {
                    var: override_var.to_string(),
                    value: value.to_string(),
                }),
            };
        }

        if let Some(path) = bundled.iter().find(|p| p.is_file()) {
            debug!(tool = name, path = %path.display(), "Using bundled binary");
            return Ok(path.clone());
        }

        if let Some(path) = self.lookup.find(name) {
            debug!(tool = name, path = %path.display(), "Found on PATH");
            return Ok(path);
        }

        let mut searched = vec![override_var.to_string()];
        searched.extend(bundled.iter().map(|p| p.display().to_string()));
        searched.push("PATH".to_string());
        Err(LaunchError::MissingBinary {
            tool: name.to_string(),
            searched: searched.join(", "),
        })
    }

    pub fn resolve_ssh(
        &self,
        settings: &VmSettings,
        layout: &PortableLayout,
    ) -> Result<PathBuf, LaunchError> {
        self.locate(
            "ssh",
            "PCODER_SSH_CMD",
            settings.ssh_cmd.value.as_deref(),
            &[layout.bundled_binary("ssh")],
        )
    }

    /// Resolve scp, preferring a sibling of a path-qualified ssh.
    pub fn resolve_scp(
        &self,
        settings: &VmSettings,
        layout: &PortableLayout,
        ssh: &Path,
    ) -> Result<PathBuf, LaunchError> {
        let mut bundled = Vec::with_capacity(2);
        if has_separator(&ssh.to_string_lossy()) {
            if let Some(dir) = ssh.parent() {
                bundled.push(dir.join(format!("scp{}", std::env::consts::EXE_SUFFIX)));
            }
        }
        bundled.push(layout.bundled_binary("scp"));
        self.locate(
            "scp",
            "PCODER_SCP_CMD",
            settings.scp_cmd.value.as_deref(),
            &bundled,
        )
    }
}
