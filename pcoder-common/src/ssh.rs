//! OpenSSH client invocation.
//!
//! ssh and scp are treated as opaque executables. Each call is a fresh
//! process with no session reuse. Host keys are neither checked nor persisted
//! (see DESIGN.md, "Host key policy").

use crate::errors::LaunchError;
use crate::types::{SyncDirection, VmConnection};
use std::path::Path;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

/// Per-attempt connect timeout, separate from the readiness deadline.
pub const CONNECT_TIMEOUT_SECS: u32 = 5;

/// Where ssh should write known host keys (nowhere).
pub const fn known_hosts_sink() -> &'static str {
    if cfg!(windows) { "NUL" } else { "/dev/null" }
}

/// How the remote shell's output is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamMode {
    /// Share the parent's stdout/stderr (interactive runs).
    Inherit,
    /// Swallow output (probes).
    Capture,
}

fn trust_options() -> Vec<String> {
    [
        "BatchMode=yes".to_string(),
        "StrictHostKeyChecking=no".to_string(),
        format!("UserKnownHostsFile={}", known_hosts_sink()),
        format!("ConnectTimeout={CONNECT_TIMEOUT_SECS}"),
    ]
    .into_iter()
    .flat_map(|opt| ["-o".to_string(), opt])
    .collect()
}

/// Arguments for `ssh ... bash -s`.
pub fn ssh_args(conn: &VmConnection) -> Vec<String> {
    let mut args = vec![
        "-p".to_string(),
        conn.port.to_string(),
        "-i".to_string(),
        conn.identity_file.to_string_lossy().into_owned(),
    ];
    args.extend(trust_options());
    args.push(conn.destination());
    args.push("bash".to_string());
    args.push("-s".to_string());
    args
}

fn scp_base_args(conn: &VmConnection) -> Vec<String> {
    let mut args = vec![
        "-P".to_string(),
        conn.port.to_string(),
        "-i".to_string(),
        conn.identity_file.to_string_lossy().into_owned(),
    ];
    args.extend(trust_options());
    args.push("-r".to_string());
    args
}

/// Arguments for copying the current directory to `remote_dir`.
pub fn scp_push_args(conn: &VmConnection, remote_dir: &str) -> Vec<String> {
    let mut args = scp_base_args(conn);
    args.push(".".to_string());
    args.push(conn.remote_spec(remote_dir));
    args
}

/// Arguments for copying the contents of `remote_dir` into the current directory.
pub fn scp_pull_args(conn: &VmConnection, remote_dir: &str) -> Vec<String> {
    let mut args = scp_base_args(conn);
    args.push(conn.remote_spec(&format!("{remote_dir}/.")));
    args.push(".".to_string());
    args
}

/// Remote command execution and file copy.
///
/// Returned statuses are `None` when the process was killed by a signal.
#[allow(async_fn_in_trait)]
pub trait RemoteTransport {
    /// Run `script` through the remote shell's stdin.
    async fn execute(
        &self,
        conn: &VmConnection,
        script: &str,
        mode: StreamMode,
    ) -> Result<Option<i32>, LaunchError>;

    /// Recursively copy `local_dir` into `remote_dir`.
    async fn copy_to(
        &self,
        conn: &VmConnection,
        local_dir: &Path,
        remote_dir: &str,
    ) -> Result<Option<i32>, LaunchError>;

    /// Recursively copy the contents of `remote_dir` onto `local_dir`.
    async fn copy_from(
        &self,
        conn: &VmConnection,
        remote_dir: &str,
        local_dir: &Path,
    ) -> Result<Option<i32>, LaunchError>;
}

impl<T: RemoteTransport + ?Sized> RemoteTransport for &T {
    async fn execute(
        &self,
        conn: &VmConnection,
        script: &str,
        mode: StreamMode,
    ) -> Result<Option<i32>, LaunchError> {
        (**self).execute(conn, script, mode).await
    }

    async fn copy_to(
        &self,
        conn: &VmConnection,
        local_dir: &Path,
        remote_dir: &str,
    ) -> Result<Option<i32>, LaunchError> {
        (**self).copy_to(conn, local_dir, remote_dir).await
    }

    async fn copy_from(
        &self,
        conn: &VmConnection,
        remote_dir: &str,
        local_dir: &Path,
    ) -> Result<Option<i32>, LaunchError> {
        (**self).copy_from(conn, remote_dir, local_dir).await
    }
}

/// Transport backed by the resolved OpenSSH client binaries.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenSshTransport;

impl OpenSshTransport {
    async fn run_scp(
        &self,
        conn: &VmConnection,
        direction: SyncDirection,
        args: Vec<String>,
        cwd: &Path,
    ) -> Result<Option<i32>, LaunchError> {
        debug!(program = %conn.scp_program.display(), cwd = %cwd.display(), %direction, ?args, "Running scp");
        let status = Command::new(&conn.scp_program)
            .args(&args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .status()
            .await
            .map_err(|source| LaunchError::SyncSpawn {
                direction,
                program: conn.scp_program.display().to_string(),
                source,
            })?;
        Ok(status.code())
    }
}

impl RemoteTransport for OpenSshTransport {
    async fn execute(
        &self,
        conn: &VmConnection,
        script: &str,
        mode: StreamMode,
    ) -> Result<Option<i32>, LaunchError> {
        let (stdout, stderr) = match mode {
            StreamMode::Inherit => (Stdio::inherit(), Stdio::inherit()),
            StreamMode::Capture => (Stdio::piped(), Stdio::piped()),
        };

        let mut child = Command::new(&conn.ssh_program)
            .args(ssh_args(conn))
            .stdin(Stdio::piped())
            .stdout(stdout)
            .stderr(stderr)
            .spawn()
            .map_err(|source| LaunchError::Spawn {
                stage: "running remote script",
                program: conn.ssh_program.display().to_string(),
                source,
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            // ssh exits without reading stdin when the connection fails.
            if let Err(err) = stdin.write_all(script.as_bytes()).await {
                debug!(error = %err, "Remote shell closed stdin early");
            }
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|source| LaunchError::Spawn {
                stage: "waiting for remote script",
                program: conn.ssh_program.display().to_string(),
                source,
            })?;

        if mode == StreamMode::Capture && !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            debug!(code = ?output.status.code(), stderr = %stderr.trim(), "Captured ssh failure");
        }
        if output.status.code().is_none() {
            warn!(endpoint = %conn, "ssh terminated by signal");
        }
        Ok(output.status.code())
    }

    async fn copy_to(
        &self,
        conn: &VmConnection,
        local_dir: &Path,
        remote_dir: &str,
    ) -> Result<Option<i32>, LaunchError> {
        self.run_scp(conn, SyncDirection::Push, scp_push_args(conn, remote_dir), local_dir)
            .await
    }

    async fn copy_from(
        &self,
        conn: &VmConnection,
        remote_dir: &str,
        local_dir: &Path,
    ) -> Result<Option<i32>, LaunchError> {
        self.run_scp(conn, SyncDirection::Pull, scp_pull_args(conn, remote_dir), local_dir)
            .await
    }
}
