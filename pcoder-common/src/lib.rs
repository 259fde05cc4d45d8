//! Portable Coder - core library
//!
//! Launches coding assistants (codex, claude, ...) either directly on the host
//! or inside a portable Linux VM reached over SSH, with per-tool credential
//! isolation and project sync in both directions.

pub mod adapters;
pub mod auth_env;
pub mod config;
pub mod errors;
pub mod host;
pub mod locator;
pub mod logging;
pub mod orchestrator;
pub mod readiness;
pub mod remote_path;
pub mod script;
pub mod ssh;
pub mod sync;
pub mod types;
pub mod util;
pub mod vm;

pub use adapters::{ToolAdapter, ToolCatalog, apply_tool_compat};
pub use auth_env::{AUTH_MODE_VAR, AuthEnvironment, AuthSide};
pub use config::{EnvSnapshot, PcoderConfig, PortableLayout, VmSettings};
pub use errors::{ErrorCategory, ErrorCode, ErrorEntry, LaunchError};
pub use host::HostLauncher;
pub use locator::{CommandLocator, ExecutableLookup, StaticLookup, SystemLookup};
pub use logging::{LogConfig, LogFormat, LoggingGuards, init_logging};
pub use orchestrator::{Orchestrator, RunReport};
pub use remote_path::RemoteProjectPath;
pub use ssh::{OpenSshTransport, RemoteTransport, StreamMode};
pub use types::{
    AuthMode, RunMode, RunOutcome, RunResult, RunStage, SyncDirection, ToolInvocation,
    VmConnection,
};
pub use vm::{ScriptBooter, VmBooter};
