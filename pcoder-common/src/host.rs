//! Host-native runs: the tool runs directly on this machine.

use crate::adapters::{ToolCatalog, apply_tool_compat};
use crate::auth_env::{self, AuthSide};
use crate::config::env::EnvSnapshot;
use crate::config::vm::PortableLayout;
use crate::errors::LaunchError;
use crate::locator::ExecutableLookup;
use crate::orchestrator::{RunReport, StageTracker, check_project_dir};
use crate::types::{RunResult, RunStage, ToolInvocation};
use std::process::Stdio;
use tokio::process::Command;
use tracing::info;

/// Launches tools on the host with an isolated auth environment.
pub struct HostLauncher<'a, L: ExecutableLookup + ?Sized> {
    layout: &'a PortableLayout,
    env: &'a EnvSnapshot,
    lookup: &'a L,
    catalog: ToolCatalog,
}

impl<'a, L: ExecutableLookup + ?Sized> HostLauncher<'a, L> {
    pub fn new(layout: &'a PortableLayout, env: &'a EnvSnapshot, lookup: &'a L) -> Self {
        Self {
            layout,
            env,
            lookup,
            catalog: ToolCatalog::builtin(),
        }
    }

    pub async fn run(&self, invocation: &ToolInvocation) -> RunReport {
        let mut tracker = StageTracker::new();
        let result = self.drive(invocation, &mut tracker).await;
        tracker.finish(result)
    }

    /// Environment the tool is started with: the captured environment, tool
    /// fixups, then the auth overlay.
    pub fn child_env(&self, invocation: &ToolInvocation) -> Result<EnvSnapshot, LaunchError> {
        let tool = invocation.tool.as_str();
        let auth = auth_env::build(
            tool,
            invocation.auth_mode,
            &AuthSide::host(self.layout, tool),
        )?;
        let mut env = self.env.clone();
        apply_tool_compat(tool, &mut env);
        for (key, value) in &auth.vars {
            env.set(key.as_str(), value.as_str());
        }
        Ok(env)
    }

    async fn drive(
        &self,
        invocation: &ToolInvocation,
        tracker: &mut StageTracker,
    ) -> Result<RunResult, LaunchError> {
        check_project_dir(&invocation.project_path)?;
        let env = self.child_env(invocation)?;
        let runner = self
            .catalog
            .adapter(&invocation.tool)
            .host_runner(&env, self.lookup)?;

        tracker.enter(RunStage::Executing);
        info!(
            tool = %invocation.tool,
            runner = %runner.display(),
            auth_mode = %invocation.auth_mode,
            project = %invocation.project_path.display(),
            "Launching tool on host"
        );
        let status = Command::new(&runner)
            .args(&invocation.args)
            .current_dir(&invocation.project_path)
            .env_clear()
            .envs(env.iter())
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|source| LaunchError::Spawn {
                stage: "launching the tool",
                program: runner.display().to_string(),
                source,
            })?;

        Ok(RunResult::from_tool_status(status.code()))
    }
}
