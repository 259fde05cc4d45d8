//! Install layout and VM connection settings.

use super::env::{EnvParser, EnvSnapshot};
use super::source::Sourced;
use crate::errors::LaunchError;
use crate::util::normalize_path;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DEFAULT_VM_HOST: &str = "127.0.0.1";
pub const DEFAULT_VM_USER: &str = "portable";
pub const DEFAULT_SSH_TIMEOUT_SECS: u64 = 300;
pub const MIN_SSH_TIMEOUT_SECS: u64 = 10;
pub const MAX_SSH_TIMEOUT_SECS: u64 = 3600;
pub const DEFAULT_PROJECTS_ROOT: &str = "/home/portable/projects";
pub const DEFAULT_AUTH_WORKDIR: &str = "/home/portable";
pub const DEFAULT_AUTH_HOME_ROOT: &str = "/home/portable/.pcoder-auth";

/// Well-known paths inside a Portable Coder install root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortableLayout {
    root: PathBuf,
}

impl PortableLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve the root from `PCODER_ROOT`, relative to `cwd` when not absolute.
    pub fn from_env(env: &EnvSnapshot, cwd: &Path) -> Self {
        let mut parser = EnvParser::new(env);
        let root = parser.get_path("ROOT", ".", false).into_inner();
        let root = if root.is_absolute() {
            root
        } else {
            cwd.join(root)
        };
        Self {
            root: normalize_path(&root),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn state_dir(&self) -> PathBuf {
        self.root.join("state")
    }

    pub fn settings_file(&self) -> PathBuf {
        self.state_dir().join("settings.toml")
    }

    /// File the boot script writes the forwarded SSH port into.
    pub fn ssh_port_file(&self) -> PathBuf {
        self.state_dir().join("vm").join("ssh-port.txt")
    }

    pub fn boot_script(&self) -> PathBuf {
        let scripts = self.root.join("scripts").join("runtime");
        if cfg!(windows) {
            scripts.join("windows").join("start-vm.cmd")
        } else {
            scripts.join("start-vm.sh")
        }
    }

    pub fn default_ssh_key(&self) -> PathBuf {
        self.root
            .join("runtime")
            .join("linux")
            .join("ssh")
            .join("id_ed25519")
    }

    /// Bundled OpenSSH client binary (`ssh` or `scp`).
    pub fn bundled_binary(&self, name: &str) -> PathBuf {
        self.root
            .join("runtime")
            .join("ssh")
            .join(format!("{name}{}", std::env::consts::EXE_SUFFIX))
    }

    /// Host-side isolated auth root for `tool`.
    pub fn host_auth_root(&self, tool: &str) -> PathBuf {
        self.state_dir().join("auth").join(tool).join("host")
    }
}

/// VM connection and remote workspace settings.
#[derive(Debug, Clone, PartialEq)]
pub struct VmSettings {
    pub host: Sourced<String>,
    pub user: Sourced<String>,
    pub ssh_key: Sourced<PathBuf>,
    pub ssh_cmd: Sourced<Option<String>>,
    pub scp_cmd: Sourced<Option<String>>,
    pub ssh_timeout_secs: Sourced<u64>,
    pub projects_root: Sourced<String>,
    pub auth_workdir: Sourced<String>,
    auth_home: Option<String>,
}

impl VmSettings {
    /// Read every VM setting, reporting all invalid values at once.
    pub fn from_env(env: &EnvSnapshot, layout: &PortableLayout) -> Result<Self, LaunchError> {
        let mut parser = EnvParser::new(env);
        let default_key = layout.default_ssh_key();

        let settings = Self {
            host: parser.get_string("VM_HOST", DEFAULT_VM_HOST),
            user: parser.get_string("VM_USER", DEFAULT_VM_USER),
            ssh_key: parser.get_path("VM_SSH_KEY", &default_key.to_string_lossy(), false),
            ssh_cmd: parser.get_optional_string("SSH_CMD"),
            scp_cmd: parser.get_optional_string("SCP_CMD"),
            ssh_timeout_secs: parser.get_u64_range(
                "VM_SSH_TIMEOUT_SECONDS",
                DEFAULT_SSH_TIMEOUT_SECS,
                MIN_SSH_TIMEOUT_SECS,
                MAX_SSH_TIMEOUT_SECS,
            ),
            projects_root: parser.get_string("VM_PROJECTS_ROOT", DEFAULT_PROJECTS_ROOT),
            auth_workdir: parser.get_string("VM_AUTH_WORKDIR", DEFAULT_AUTH_WORKDIR),
            auth_home: parser.get_optional_string("VM_AUTH_HOME").into_inner(),
        };

        if parser.has_errors() {
            return Err(LaunchError::InvalidEnv(parser.take_errors()));
        }

        debug!(
            host = %settings.host.value,
            host_origin = %settings.host.origin(),
            user = %settings.user.value,
            timeout_secs = settings.ssh_timeout_secs.value,
            timeout_origin = %settings.ssh_timeout_secs.origin(),
            "Loaded VM settings"
        );
        Ok(settings)
    }

    /// Guest-side isolated home for `tool`.
    pub fn guest_auth_home(&self, tool: &str) -> String {
        match &self.auth_home {
            Some(home) => home.clone(),
            None => format!("{DEFAULT_AUTH_HOME_ROOT}/{tool}"),
        }
    }
}
