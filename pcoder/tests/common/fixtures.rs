use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

/// Empty install root plus a project directory, with a command builder that
/// points `pcoder` at them.
pub struct TestBundle {
    pub root: TempDir,
    pub project: TempDir,
}

impl TestBundle {
    pub fn new() -> Self {
        crate::test_log!("FIXTURE: Creating install root and project");
        Self {
            root: TempDir::new().expect("Failed to create install root"),
            project: TempDir::new().expect("Failed to create project dir"),
        }
    }

    pub fn root(&self) -> &Path {
        self.root.path()
    }

    pub fn project(&self) -> &Path {
        self.project.path()
    }

    /// `pcoder` with `PCODER_ROOT` set and the project as working directory.
    pub fn command(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_pcoder"));
        cmd.current_dir(self.project())
            .env("PCODER_ROOT", self.root())
            .env_remove("RUST_LOG")
            .env_remove("PCODER_LOG_FILE")
            .env_remove("PCODER_VM_SSH_KEY")
            .env_remove("PCODER_CODEX_CMD")
            .env_remove("PCODER_CLAUDE_CMD");
        cmd
    }
}
