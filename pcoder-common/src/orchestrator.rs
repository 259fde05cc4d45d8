//! End-to-end VM run: boot, wait for SSH, prepare, sync in, execute, sync out.
//!
//! Stages run strictly in sequence. Only the readiness stage retries; any other
//! failure ends the run in [`RunStage::Failed`].

use crate::adapters::{ToolCatalog, apply_tool_compat};
use crate::auth_env::{self, AuthSide};
use crate::config::env::EnvSnapshot;
use crate::config::vm::{PortableLayout, VmSettings};
use crate::errors::LaunchError;
use crate::locator::{CommandLocator, ExecutableLookup};
use crate::readiness::{ReadinessError, ReadinessPolicy, wait_until_ready};
use crate::remote_path::RemoteProjectPath;
use crate::script::{PROBE_SCRIPT, RunPlan, build_run_script};
use crate::ssh::{RemoteTransport, StreamMode};
use crate::sync::FileSynchronizer;
use crate::types::{RunResult, RunStage, ToolInvocation, VmConnection};
use crate::util::mask_sensitive_command;
use crate::vm::{VmBooter, read_ssh_port};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// What happened during one run.
#[derive(Debug)]
pub struct RunReport {
    pub result: RunResult,
    /// Stages in the order they were entered, ending in `Done` or `Failed`.
    pub stages: Vec<RunStage>,
    pub error: Option<LaunchError>,
}

impl RunReport {
    /// Report for a run that failed before any stage was entered.
    pub fn failed(err: LaunchError) -> Self {
        StageTracker::new().finish(Err(err))
    }

    pub fn exit_code(&self) -> i32 {
        self.result.exit_code
    }

    pub fn entered(&self, stage: RunStage) -> bool {
        self.stages.contains(&stage)
    }

    pub fn final_stage(&self) -> RunStage {
        self.stages.last().copied().unwrap_or(RunStage::Idle)
    }
}

/// Records stage transitions and produces the report.
#[derive(Debug)]
pub(crate) struct StageTracker {
    stages: Vec<RunStage>,
}

impl StageTracker {
    pub(crate) fn new() -> Self {
        Self {
            stages: vec![RunStage::Idle],
        }
    }

    pub(crate) fn enter(&mut self, stage: RunStage) {
        info!(stage = %stage, "Entering stage");
        self.stages.push(stage);
    }

    fn current(&self) -> RunStage {
        self.stages.last().copied().unwrap_or(RunStage::Idle)
    }

    pub(crate) fn finish(mut self, result: Result<RunResult, LaunchError>) -> RunReport {
        match result {
            Ok(result) => {
                self.stages.push(RunStage::Done);
                info!(exit_code = result.exit_code, outcome = %result.outcome, "Run finished");
                RunReport {
                    result,
                    stages: self.stages,
                    error: None,
                }
            }
            Err(err) => {
                error!(
                    stage = %self.current(),
                    code = %err.code().code_string(),
                    error = %err,
                    "Run failed"
                );
                self.stages.push(RunStage::Failed);
                RunReport {
                    result: RunResult::launcher_failure(err.outcome()),
                    stages: self.stages,
                    error: Some(err),
                }
            }
        }
    }
}

/// Runs tools inside the portable VM.
pub struct Orchestrator<'a, T, B, L: ExecutableLookup + ?Sized> {
    layout: &'a PortableLayout,
    settings: &'a VmSettings,
    env: &'a EnvSnapshot,
    lookup: &'a L,
    transport: T,
    booter: B,
    catalog: ToolCatalog,
}

impl<'a, T, B, L> Orchestrator<'a, T, B, L>
where
    T: RemoteTransport,
    B: VmBooter,
    L: ExecutableLookup + ?Sized,
{
    pub fn new(
        layout: &'a PortableLayout,
        settings: &'a VmSettings,
        env: &'a EnvSnapshot,
        lookup: &'a L,
        transport: T,
        booter: B,
    ) -> Self {
        Self {
            layout,
            settings,
            env,
            lookup,
            transport,
            booter,
            catalog: ToolCatalog::builtin(),
        }
    }

    /// Run `invocation` to completion. Never panics on stage failure; the
    /// error is carried in the report.
    pub async fn run(&self, invocation: &ToolInvocation) -> RunReport {
        let mut tracker = StageTracker::new();
        let result = self.drive(invocation, &mut tracker).await;
        tracker.finish(result)
    }

    /// Everything that must hold before the VM is touched.
    fn resolve_connection_parts(
        &self,
        invocation: &ToolInvocation,
    ) -> Result<(PathBuf, PathBuf), LaunchError> {
        let key = &self.settings.ssh_key.value;
        if !key.is_file() {
            return Err(LaunchError::MissingSshKey(key.clone()));
        }
        if !invocation.skip_project_sync {
            check_project_dir(&invocation.project_path)?;
        }
        let locator = CommandLocator::new(self.lookup);
        let ssh = locator.resolve_ssh(self.settings, self.layout)?;
        let scp = locator.resolve_scp(self.settings, self.layout, &ssh)?;
        Ok((ssh, scp))
    }

    async fn drive(
        &self,
        invocation: &ToolInvocation,
        tracker: &mut StageTracker,
    ) -> Result<RunResult, LaunchError> {
        let (ssh_program, scp_program) = self.resolve_connection_parts(invocation)?;

        tracker.enter(RunStage::VmBooting);
        self.booter.boot().await?;

        let port = read_ssh_port(&self.layout.ssh_port_file())?;
        let conn = VmConnection {
            host: self.settings.host.value.clone(),
            port,
            user: self.settings.user.value.clone(),
            identity_file: self.settings.ssh_key.value.clone(),
            ssh_program,
            scp_program,
        };

        tracker.enter(RunStage::AwaitingSshReady);
        self.await_ssh(&conn).await?;

        let remote_root = self.settings.projects_root.value.as_str();
        let remote_dir = if invocation.skip_project_sync {
            self.settings.auth_workdir.value.clone()
        } else {
            RemoteProjectPath::resolve(remote_root, &invocation.project_path).into_string()
        };
        let sync = FileSynchronizer::new(&self.transport, &conn);

        tracker.enter(RunStage::PreparingRemoteDir);
        sync.prepare(remote_root, &remote_dir, invocation.skip_project_sync)
            .await?;

        if !invocation.skip_project_sync {
            tracker.enter(RunStage::SyncingIn);
            sync.push(&invocation.project_path, &remote_dir).await?;
        }

        tracker.enter(RunStage::Executing);
        let status = self.execute(invocation, &conn, &remote_dir).await?;
        let result = RunResult::from_tool_status(status);
        if !result.is_success() {
            warn!(tool = %invocation.tool, exit_code = result.exit_code, "Tool exited non-zero");
        }

        if invocation.syncs_back() {
            // Runs whatever the tool returned; a failure here replaces its result.
            tracker.enter(RunStage::SyncingOut);
            sync.pull(&remote_dir, &invocation.project_path).await?;
        }

        Ok(result)
    }

    async fn await_ssh(&self, conn: &VmConnection) -> Result<(), LaunchError> {
        let timeout_secs = self.settings.ssh_timeout_secs.value;
        let policy = ReadinessPolicy::new(Duration::from_secs(timeout_secs));
        let target = conn.to_string();
        let transport = &self.transport;

        let probe = move |_attempt: u32| async move {
            let status = transport
                .execute(conn, PROBE_SCRIPT, StreamMode::Capture)
                .await?;
            Ok::<_, LaunchError>(status == Some(0))
        };

        match wait_until_ready(&target, policy, probe).await {
            Ok(_) => Ok(()),
            Err(ReadinessError::TimedOut { attempts, .. }) => Err(LaunchError::ReadinessTimeout {
                target,
                timeout_secs,
                attempts,
            }),
            Err(ReadinessError::Probe(err)) => Err(err),
        }
    }

    async fn execute(
        &self,
        invocation: &ToolInvocation,
        conn: &VmConnection,
        remote_dir: &str,
    ) -> Result<Option<i32>, LaunchError> {
        let tool = invocation.tool.as_str();
        let side = AuthSide::guest(self.settings.guest_auth_home(tool));
        let auth = auth_env::build(tool, invocation.auth_mode, &side)?;

        let mut env = self.env.clone();
        apply_tool_compat(tool, &mut env);
        let runner = self.catalog.adapter(tool).guest_runner(&env);

        let script = build_run_script(&RunPlan {
            remote_dir,
            auth: &auth,
            runner: &runner,
            args: &invocation.args,
            env: &env,
        });
        debug!(script = %mask_sensitive_command(&script), "Remote run script");
        info!(tool, runner = %runner, auth_mode = %invocation.auth_mode, remote_dir, "Launching tool in VM");

        self.transport
            .execute(conn, &script, StreamMode::Inherit)
            .await
    }
}

/// The project path must name an existing directory.
pub(crate) fn check_project_dir(path: &std::path::Path) -> Result<(), LaunchError> {
    let reason = match std::fs::metadata(path) {
        Ok(meta) if meta.is_dir() => return Ok(()),
        Ok(_) => "not a directory",
        Err(_) => "does not exist",
    };
    Err(LaunchError::ProjectPath {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    })
}
