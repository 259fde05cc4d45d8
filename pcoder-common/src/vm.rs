//! VM boot collaborator and port discovery.

use crate::config::vm::PortableLayout;
use crate::errors::LaunchError;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::info;

/// Brings the VM up. On success the VM will eventually accept SSH on the
/// port written to the layout's port file.
#[allow(async_fn_in_trait)]
pub trait VmBooter {
    async fn boot(&self) -> Result<(), LaunchError>;
}

impl<B: VmBooter + ?Sized> VmBooter for &B {
    async fn boot(&self) -> Result<(), LaunchError> {
        (**self).boot().await
    }
}

/// Runs the bundle's boot script.
#[derive(Debug, Clone)]
pub struct ScriptBooter {
    script: PathBuf,
    cwd: PathBuf,
}

impl ScriptBooter {
    pub fn new(layout: &PortableLayout) -> Self {
        Self {
            script: layout.boot_script(),
            cwd: layout.root().to_path_buf(),
        }
    }

    fn command(&self) -> Command {
        let mut cmd = if cfg!(windows) {
            let mut cmd = Command::new("cmd.exe");
            cmd.arg("/c").arg(&self.script);
            cmd
        } else {
            let mut cmd = Command::new("sh");
            cmd.arg(&self.script);
            cmd
        };
        cmd.current_dir(&self.cwd)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        cmd
    }
}

impl VmBooter for ScriptBooter {
    async fn boot(&self) -> Result<(), LaunchError> {
        if !self.script.is_file() {
            return Err(LaunchError::MissingBootScript(self.script.clone()));
        }
        info!(script = %self.script.display(), "Starting VM");
        let status = self
            .command()
            .status()
            .await
            .map_err(|source| LaunchError::Spawn {
                stage: "booting the VM",
                program: self.script.display().to_string(),
                source,
            })?;
        if !status.success() {
            return Err(LaunchError::VmBoot {
                script: self.script.clone(),
                exit_code: status.code(),
            });
        }
        Ok(())
    }
}

/// Read the forwarded SSH port. The file must hold one integer in 1..=65535.
pub fn read_ssh_port(path: &Path) -> Result<u16, LaunchError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|_| LaunchError::MissingPortFile(path.to_path_buf()))?;
    let trimmed = raw.trim();
    let invalid = || LaunchError::InvalidPort {
        path: path.to_path_buf(),
        raw: trimmed.to_string(),
    };
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    match trimmed.parse::<u16>() {
        Ok(port) if port >= 1 => Ok(port),
        _ => Err(invalid()),
    }
}
