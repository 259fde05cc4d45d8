//! Launcher failures.
//!
//! Every variant carries enough context for a single-line diagnostic and maps
//! onto a catalog code, a run outcome and a process exit code.

use super::catalog::ErrorCode;
use crate::config::env::EnvError;
use crate::types::{EXIT_LAUNCHER_FAILURE, RunOutcome, SyncDirection};
use std::path::PathBuf;

/// Errors raised by the launcher itself (never by the tool it runs).
#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    #[error("{tool} not found (looked in {searched})")]
    MissingBinary { tool: String, searched: String },

    #[error("{var} is set to '{value}' but it does not resolve to an executable")]
    OverrideNotFound { var: String, value: String },

    #[error("SSH key not found: {0}")]
    MissingSshKey(PathBuf),

    #[error("VM port file not found: {0}")]
    MissingPortFile(PathBuf),

    #[error("invalid SSH port in {path}: '{raw}'")]
    InvalidPort { path: PathBuf, raw: String },

    #[error("VM boot script not found: {0}")]
    MissingBootScript(PathBuf),

    #[error("invalid environment: {}", format_env_errors(.0))]
    InvalidEnv(Vec<EnvError>),

    #[error("project directory {path} is not usable: {reason}")]
    ProjectPath { path: PathBuf, reason: String },

    #[error("no command found for {tool}; set {env_var} or install one of: {candidates}")]
    NoRunner {
        tool: String,
        env_var: String,
        candidates: String,
    },

    #[error("failed to start {program} while {stage}: {source}")]
    Spawn {
        stage: &'static str,
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to start {program} to sync {direction}: {source}")]
    SyncSpawn {
        direction: SyncDirection,
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("VM boot script {script} failed (exit {})", display_code(.exit_code))]
    VmBoot {
        script: PathBuf,
        exit_code: Option<i32>,
    },

    #[error("VM SSH not ready at {target} after {timeout_secs}s ({attempts} attempts)")]
    ReadinessTimeout {
        target: String,
        timeout_secs: u64,
        attempts: u32,
    },

    #[error("failed to prepare remote workspace (exit {})", display_code(.exit_code))]
    RemotePrepare { exit_code: Option<i32> },

    #[error("sync {direction} failed (exit {}): {command}", display_code(.exit_code))]
    Sync {
        direction: SyncDirection,
        exit_code: Option<i32>,
        command: String,
    },

    #[error("failed to load settings {path}: {message}")]
    Settings { path: PathBuf, message: String },

    #[error("failed to create auth directory {path}: {source}")]
    AuthDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn display_code(code: &Option<i32>) -> String {
    code.map_or_else(|| "signal".to_string(), |c| c.to_string())
}

fn format_env_errors(errors: &[EnvError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl LaunchError {
    /// Catalog code for this failure.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::MissingBinary { .. } => ErrorCode::ConfigBinaryMissing,
            Self::OverrideNotFound { .. } => ErrorCode::ConfigOverrideNotFound,
            Self::MissingSshKey(_) => ErrorCode::ConfigSshKeyMissing,
            Self::MissingPortFile(_) => ErrorCode::ConfigPortFileMissing,
            Self::InvalidPort { .. } => ErrorCode::ConfigPortInvalid,
            Self::MissingBootScript(_) => ErrorCode::ConfigBootScriptMissing,
            Self::InvalidEnv(_) => ErrorCode::ConfigEnvError,
            Self::ProjectPath { .. } => ErrorCode::ConfigProjectPath,
            Self::NoRunner { .. } => ErrorCode::ConfigNoRunner,
            Self::Settings { .. } => ErrorCode::ConfigSettingsError,
            Self::AuthDir { .. } => ErrorCode::ConfigAuthDirError,
            Self::Spawn { .. } => ErrorCode::ExecSpawnFailed,
            Self::VmBoot { .. } => ErrorCode::VmBootFailed,
            Self::ReadinessTimeout { .. } => ErrorCode::SshReadinessTimeout,
            Self::RemotePrepare { .. } => ErrorCode::SshRemotePrepareFailed,
            Self::Sync { direction, .. } | Self::SyncSpawn { direction, .. } => match direction {
                SyncDirection::Push => ErrorCode::TransferPushFailed,
                SyncDirection::Pull => ErrorCode::TransferPullFailed,
            },
        }
    }

    /// Outcome tag recorded when a run ends with this error.
    pub fn outcome(&self) -> RunOutcome {
        match self {
            Self::ReadinessTimeout { .. } => RunOutcome::TimedOut,
            Self::Sync { .. } | Self::SyncSpawn { .. } => RunOutcome::SyncError,
            Self::VmBoot { .. } | Self::RemotePrepare { .. } | Self::Spawn { .. } => {
                RunOutcome::Failed
            }
            _ => RunOutcome::ConfigError,
        }
    }

    /// Launcher failures always exit with 1.
    pub fn exit_code(&self) -> i32 {
        EXIT_LAUNCHER_FAILURE
    }
}
