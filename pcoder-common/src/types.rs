//! Common types used across pcoder components.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Credential strategy for a tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    /// Interactive login with credentials cached in an isolated home.
    #[default]
    Oauth,
    /// Caller-supplied provider keys forwarded through the environment.
    Api,
}

impl AuthMode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Oauth => "oauth",
            Self::Api => "api",
        }
    }
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "oauth" => Ok(Self::Oauth),
            "api" => Ok(Self::Api),
            other => Err(format!("invalid auth mode '{other}' (expected oauth|api)")),
        }
    }
}

/// Where a tool runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunMode {
    /// Inside the portable Linux VM, reached over SSH.
    #[serde(rename = "linux-portable")]
    VmPortable,
    /// Directly on the host.
    #[serde(rename = "host-native")]
    HostNative,
}

impl RunMode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::VmPortable => "linux-portable",
            Self::HostNative => "host-native",
        }
    }

    /// Pick the effective mode: an explicit request wins, Windows hosts fall
    /// back to the configured default, everything else runs natively.
    pub fn resolve(explicit: Option<RunMode>, windows_default: RunMode) -> RunMode {
        match explicit {
            Some(mode) => mode,
            None if cfg!(windows) => windows_default,
            None => RunMode::HostNative,
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "linux-portable" => Ok(Self::VmPortable),
            "host-native" => Ok(Self::HostNative),
            other => Err(format!(
                "invalid run mode '{other}' (expected linux-portable|host-native)"
            )),
        }
    }
}

/// One CLI-level request to run a tool. Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    pub tool: String,
    pub args: Vec<String>,
    pub auth_mode: AuthMode,
    /// Absolute local project directory.
    pub project_path: PathBuf,
    /// Auth-only flows: do not replace the remote directory or copy files.
    pub skip_project_sync: bool,
    pub no_sync_back: bool,
}

impl ToolInvocation {
    pub fn new(tool: impl Into<String>, project_path: impl Into<PathBuf>) -> Self {
        Self {
            tool: tool.into(),
            args: Vec::new(),
            auth_mode: AuthMode::default(),
            project_path: project_path.into(),
            skip_project_sync: false,
            no_sync_back: false,
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_auth_mode(mut self, auth_mode: AuthMode) -> Self {
        self.auth_mode = auth_mode;
        self
    }

    pub fn with_skip_project_sync(mut self, skip: bool) -> Self {
        self.skip_project_sync = skip;
        self
    }

    pub fn with_no_sync_back(mut self, no_sync_back: bool) -> Self {
        self.no_sync_back = no_sync_back;
        self
    }

    /// Whether files are copied back after execution.
    pub fn syncs_back(&self) -> bool {
        !self.skip_project_sync && !self.no_sync_back
    }
}

/// Fully resolved SSH endpoint for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VmConnection {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub identity_file: PathBuf,
    pub ssh_program: PathBuf,
    pub scp_program: PathBuf,
}

impl VmConnection {
    /// `user@host` destination string.
    pub fn destination(&self) -> String {
        format!("{}@{}", self.user, self.host)
    }

    /// `user@host:path` for scp.
    pub fn remote_spec(&self, remote_path: &str) -> String {
        format!("{}@{}:{}", self.user, self.host, remote_path)
    }

    pub fn identity_file(&self) -> &Path {
        &self.identity_file
    }
}

impl fmt::Display for VmConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}:{}", self.user, self.host, self.port)
    }
}

/// Direction of a project copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncDirection {
    /// Host to VM.
    Push,
    /// VM to host.
    Pull,
}

impl fmt::Display for SyncDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Push => f.write_str("push"),
            Self::Pull => f.write_str("pull"),
        }
    }
}

/// Terminal outcome of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunOutcome {
    Succeeded,
    Failed,
    TimedOut,
    SyncError,
    ConfigError,
}

impl RunOutcome {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::TimedOut => "timed-out",
            Self::SyncError => "sync-error",
            Self::ConfigError => "config-error",
        }
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exit code used for launcher-side failures and signal-terminated tools.
pub const EXIT_LAUNCHER_FAILURE: i32 = 1;

/// Exit code plus outcome tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResult {
    pub exit_code: i32,
    pub outcome: RunOutcome,
}

impl RunResult {
    /// Result of the tool itself. `None` means the process died without a
    /// status (killed by a signal).
    pub fn from_tool_status(status: Option<i32>) -> Self {
        match status {
            Some(0) => Self {
                exit_code: 0,
                outcome: RunOutcome::Succeeded,
            },
            Some(code) => Self {
                exit_code: code,
                outcome: RunOutcome::Failed,
            },
            None => Self {
                exit_code: EXIT_LAUNCHER_FAILURE,
                outcome: RunOutcome::Failed,
            },
        }
    }

    pub fn launcher_failure(outcome: RunOutcome) -> Self {
        Self {
            exit_code: EXIT_LAUNCHER_FAILURE,
            outcome,
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome == RunOutcome::Succeeded
    }
}

/// Orchestrator states, in the order a full run visits them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStage {
    Idle,
    VmBooting,
    AwaitingSshReady,
    PreparingRemoteDir,
    SyncingIn,
    Executing,
    SyncingOut,
    Done,
    Failed,
}

impl RunStage {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::VmBooting => "vm_booting",
            Self::AwaitingSshReady => "awaiting_ssh_ready",
            Self::PreparingRemoteDir => "preparing_remote_dir",
            Self::SyncingIn => "syncing_in",
            Self::Executing => "executing",
            Self::SyncingOut => "syncing_out",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
