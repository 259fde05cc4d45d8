//! Project synchronization between the host and the VM.

use crate::errors::LaunchError;
use crate::script::build_prepare_script;
use crate::ssh::{RemoteTransport, StreamMode, scp_pull_args, scp_push_args};
use crate::types::{SyncDirection, VmConnection};
use crate::util::display_command;
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

/// Prepares, pushes and pulls one project over a resolved connection.
pub struct FileSynchronizer<'a, T: RemoteTransport> {
    transport: &'a T,
    conn: &'a VmConnection,
}

impl<'a, T: RemoteTransport> FileSynchronizer<'a, T> {
    pub fn new(transport: &'a T, conn: &'a VmConnection) -> Self {
        Self { transport, conn }
    }

    /// Make `remote_dir` ready for the run.
    ///
    /// Unless `skip_sync` is set the directory is removed and recreated
    /// empty, so files deleted locally do not linger in the VM.
    pub async fn prepare(
        &self,
        remote_root: &str,
        remote_dir: &str,
        skip_sync: bool,
    ) -> Result<(), LaunchError> {
        let script = build_prepare_script(remote_root, remote_dir, skip_sync);
        let status = self
            .transport
            .execute(self.conn, &script, StreamMode::Inherit)
            .await?;
        if status != Some(0) {
            warn!(remote_dir, exit_code = ?status, "Remote prepare failed");
            return Err(LaunchError::RemotePrepare { exit_code: status });
        }
        info!(remote_dir, wiped = !skip_sync, "Remote directory ready");
        Ok(())
    }

    /// Copy `local_dir` into `remote_dir`.
    pub async fn push(&self, local_dir: &Path, remote_dir: &str) -> Result<(), LaunchError> {
        let start = Instant::now();
        let status = self
            .transport
            .copy_to(self.conn, local_dir, remote_dir)
            .await?;
        self.check(SyncDirection::Push, status, remote_dir)?;
        info!(
            remote_dir,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Project synced to VM"
        );
        Ok(())
    }

    /// Copy the contents of `remote_dir` back onto `local_dir`.
    pub async fn pull(&self, remote_dir: &str, local_dir: &Path) -> Result<(), LaunchError> {
        let start = Instant::now();
        let status = self
            .transport
            .copy_from(self.conn, remote_dir, local_dir)
            .await?;
        self.check(SyncDirection::Pull, status, remote_dir)?;
        info!(
            remote_dir,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Project synced back from VM"
        );
        Ok(())
    }

    fn check(
        &self,
        direction: SyncDirection,
        status: Option<i32>,
        remote_dir: &str,
    ) -> Result<(), LaunchError> {
        if status == Some(0) {
            return Ok(());
        }
        let args = match direction {
            SyncDirection::Push => scp_push_args(self.conn, remote_dir),
            SyncDirection::Pull => scp_pull_args(self.conn, remote_dir),
        };
        let command = display_command(&self.conn.scp_program.to_string_lossy(), &args);
        warn!(%direction, exit_code = ?status, "Sync failed");
        Err(LaunchError::Sync {
            direction,
            exit_code: status,
            command,
        })
    }
}
