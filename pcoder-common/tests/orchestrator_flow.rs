//! Orchestrator runs against a recording transport and a fake VM booter.

use pcoder_common::script::PROBE_SCRIPT;
use pcoder_common::{
    AuthMode, EnvSnapshot, LaunchError, Orchestrator, PortableLayout, RemoteProjectPath,
    RemoteTransport, RunOutcome, RunStage, StaticLookup, StreamMode, ToolInvocation, VmBooter,
    VmConnection, VmSettings,
};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tempfile::TempDir;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    Probe,
    Exec(String),
    Push { local: PathBuf, remote: String },
    Pull { remote: String, local: PathBuf },
}

/// Records every remote operation and answers with canned statuses.
struct RecordingTransport {
    /// Probe attempt that first succeeds; `None` never does.
    ready_on: Option<u32>,
    /// Status for non-probe scripts whose text contains the key.
    exec_status: Vec<(&'static str, Option<i32>)>,
    push_status: Option<i32>,
    pull_status: Option<i32>,
    probes: AtomicU32,
    calls: Mutex<Vec<Call>>,
}

impl Default for RecordingTransport {
    fn default() -> Self {
        Self {
            ready_on: Some(1),
            exec_status: Vec::new(),
            push_status: Some(0),
            pull_status: Some(0),
            probes: AtomicU32::new(0),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl RecordingTransport {
    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn scripts(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Exec(s) => Some(s),
                _ => None,
            })
            .collect()
    }

    fn copies(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Push { .. } | Call::Pull { .. }))
            .count()
    }
}

impl RemoteTransport for RecordingTransport {
    async fn execute(
        &self,
        _conn: &VmConnection,
        script: &str,
        mode: StreamMode,
    ) -> Result<Option<i32>, LaunchError> {
        if script == PROBE_SCRIPT {
            assert_eq!(mode, StreamMode::Capture);
            self.calls.lock().unwrap().push(Call::Probe);
            let attempt = self.probes.fetch_add(1, Ordering::SeqCst) + 1;
            let ready = self.ready_on.is_some_and(|n| attempt >= n);
            return Ok(Some(if ready { 0 } else { 255 }));
        }
        self.calls
            .lock()
            .unwrap()
            .push(Call::Exec(script.to_string()));
        let status = self
            .exec_status
            .iter()
            .find(|(key, _)| script.contains(key))
            .map_or(Some(0), |(_, status)| *status);
        Ok(status)
    }

    async fn copy_to(
        &self,
        _conn: &VmConnection,
        local_dir: &Path,
        remote_dir: &str,
    ) -> Result<Option<i32>, LaunchError> {
        self.calls.lock().unwrap().push(Call::Push {
            local: local_dir.to_path_buf(),
            remote: remote_dir.to_string(),
        });
        Ok(self.push_status)
    }

    async fn copy_from(
        &self,
        _conn: &VmConnection,
        remote_dir: &str,
        local_dir: &Path,
    ) -> Result<Option<i32>, LaunchError> {
        self.calls.lock().unwrap().push(Call::Pull {
            remote: remote_dir.to_string(),
            local: local_dir.to_path_buf(),
        });
        Ok(self.pull_status)
    }
}

#[derive(Default)]
struct FakeBooter {
    boots: AtomicU32,
}

impl VmBooter for FakeBooter {
    async fn boot(&self) -> Result<(), LaunchError> {
        self.boots.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Install root with a key and a port file, plus a project directory.
struct Bundle {
    _root: TempDir,
    project: TempDir,
    layout: PortableLayout,
    env: EnvSnapshot,
}

impl Bundle {
    fn new(extra: &[(&str, &str)]) -> Self {
        let root = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        let layout = PortableLayout::new(root.path());

        let key = layout.default_ssh_key();
        std::fs::create_dir_all(key.parent().unwrap()).unwrap();
        std::fs::write(&key, "fake key").unwrap();
        let port = layout.ssh_port_file();
        std::fs::create_dir_all(port.parent().unwrap()).unwrap();
        std::fs::write(&port, "2222\n").unwrap();

        let mut env = EnvSnapshot::from_pairs([("PCODER_VM_SSH_TIMEOUT_SECONDS", "10")]);
        for (k, v) in extra {
            env.set(*k, *v);
        }
        Self {
            _root: root,
            project,
            layout,
            env,
        }
    }

    fn settings(&self) -> VmSettings {
        VmSettings::from_env(&self.env, &self.layout).unwrap()
    }

    fn invocation(&self, tool: &str) -> ToolInvocation {
        ToolInvocation::new(tool, self.project.path())
    }
}

fn lookup() -> StaticLookup {
    StaticLookup::new()
        .with("ssh", "/usr/bin/ssh")
        .with("scp", "/usr/bin/scp")
}

#[tokio::test(start_paused = true)]
async fn unreachable_vm_times_out_before_any_remote_work() {
    let bundle = Bundle::new(&[]);
    let settings = bundle.settings();
    let lookup = lookup();
    let transport = RecordingTransport {
        ready_on: None,
        ..Default::default()
    };
    let booter = FakeBooter::default();
    let orchestrator = Orchestrator::new(
        &bundle.layout,
        &settings,
        &bundle.env,
        &lookup,
        &transport,
        &booter,
    );

    let started = tokio::time::Instant::now();
    let report = orchestrator.run(&bundle.invocation("codex")).await;
    let elapsed = started.elapsed();

    assert_eq!(report.result.outcome, RunOutcome::TimedOut);
    assert_eq!(report.exit_code(), 1);
    assert!(matches!(
        report.error,
        Some(LaunchError::ReadinessTimeout {
            timeout_secs: 10,
            attempts: 5,
            ..
        })
    ));
    assert!(elapsed >= Duration::from_secs(8) && elapsed <= Duration::from_secs(12));
    assert_eq!(booter.boots.load(Ordering::SeqCst), 1);
    assert!(transport.calls().iter().all(|c| *c == Call::Probe));
    for stage in [
        RunStage::PreparingRemoteDir,
        RunStage::SyncingIn,
        RunStage::Executing,
        RunStage::SyncingOut,
    ] {
        assert!(!report.entered(stage), "entered {stage}");
    }
    assert_eq!(report.final_stage(), RunStage::Failed);
}

#[tokio::test(start_paused = true)]
async fn full_run_visits_every_stage_in_order() {
    let bundle = Bundle::new(&[("OPENAI_API_KEY", "sk-test"), ("AWS_SECRET_ACCESS_KEY", "x")]);
    let settings = bundle.settings();
    let lookup = lookup();
    let transport = RecordingTransport {
        ready_on: Some(3),
        ..Default::default()
    };
    let booter = FakeBooter::default();
    let orchestrator = Orchestrator::new(
        &bundle.layout,
        &settings,
        &bundle.env,
        &lookup,
        &transport,
        &booter,
    );

    let invocation = bundle
        .invocation("codex")
        .with_args(["exec", "fix it"])
        .with_auth_mode(AuthMode::Api);
    let report = orchestrator.run(&invocation).await;

    assert!(report.error.is_none(), "{:?}", report.error);
    assert_eq!(report.exit_code(), 0);
    assert_eq!(
        report.stages,
        [
            RunStage::Idle,
            RunStage::VmBooting,
            RunStage::AwaitingSshReady,
            RunStage::PreparingRemoteDir,
            RunStage::SyncingIn,
            RunStage::Executing,
            RunStage::SyncingOut,
            RunStage::Done,
        ]
    );

    let remote = RemoteProjectPath::resolve("/home/portable/projects", bundle.project.path());
    let calls = transport.calls();
    assert_eq!(&calls[..3], [Call::Probe, Call::Probe, Call::Probe]);
    assert_eq!(
        calls[4],
        Call::Push {
            local: bundle.project.path().to_path_buf(),
            remote: remote.as_str().to_string(),
        }
    );
    assert_eq!(
        *calls.last().unwrap(),
        Call::Pull {
            remote: remote.as_str().to_string(),
            local: bundle.project.path().to_path_buf(),
        }
    );

    let scripts = transport.scripts();
    assert!(scripts[0].contains(&format!("rm -rf '{remote}'")));
    let run = &scripts[1];
    assert!(run.contains(&format!("cd '{remote}'")));
    assert!(run.contains("export OPENAI_API_KEY='sk-test'"));
    assert!(!run.contains("AWS_SECRET_ACCESS_KEY"));
    assert!(run.ends_with("'codex' 'exec' 'fix it'"));
}

#[tokio::test]
async fn skip_project_sync_never_wipes_or_copies() {
    let bundle = Bundle::new(&[]);
    let settings = bundle.settings();
    let lookup = lookup();
    let transport = RecordingTransport::default();
    let booter = FakeBooter::default();
    let orchestrator = Orchestrator::new(
        &bundle.layout,
        &settings,
        &bundle.env,
        &lookup,
        &transport,
        &booter,
    );

    let invocation = bundle
        .invocation("claude")
        .with_args(["login"])
        .with_skip_project_sync(true)
        .with_no_sync_back(true);
    let report = orchestrator.run(&invocation).await;

    assert_eq!(report.exit_code(), 0);
    assert!(!report.entered(RunStage::SyncingIn));
    assert!(!report.entered(RunStage::SyncingOut));
    assert_eq!(transport.copies(), 0);

    let scripts = transport.scripts();
    assert_eq!(scripts[0], "set -e\nmkdir -p '/home/portable'");
    assert!(scripts.iter().all(|s| !s.contains("rm -rf")));
    assert!(scripts[1].contains("cd '/home/portable'"));
    assert!(scripts[1].contains("export HOME='/home/portable/.pcoder-auth/claude'"));
    assert!(scripts[1].contains("export PCODER_AUTH_MODE='oauth'"));
}

#[tokio::test]
async fn tool_exit_code_propagates_and_sync_back_still_runs() {
    let bundle = Bundle::new(&[]);
    let settings = bundle.settings();
    let lookup = lookup();
    let transport = RecordingTransport {
        exec_status: vec![("'codex'", Some(42))],
        ..Default::default()
    };
    let booter = FakeBooter::default();
    let orchestrator = Orchestrator::new(
        &bundle.layout,
        &settings,
        &bundle.env,
        &lookup,
        &transport,
        &booter,
    );

    let report = orchestrator.run(&bundle.invocation("codex")).await;

    assert_eq!(report.exit_code(), 42);
    assert_eq!(report.result.outcome, RunOutcome::Failed);
    assert!(report.error.is_none());
    assert!(report.entered(RunStage::SyncingOut));
    assert_eq!(report.final_stage(), RunStage::Done);
}

#[tokio::test]
async fn failed_pull_masks_tool_result() {
    let bundle = Bundle::new(&[]);
    let settings = bundle.settings();
    let lookup = lookup();
    let transport = RecordingTransport {
        pull_status: Some(1),
        ..Default::default()
    };
    let booter = FakeBooter::default();
    let orchestrator = Orchestrator::new(
        &bundle.layout,
        &settings,
        &bundle.env,
        &lookup,
        &transport,
        &booter,
    );

    let report = orchestrator.run(&bundle.invocation("codex")).await;

    assert_eq!(report.result.outcome, RunOutcome::SyncError);
    assert_eq!(report.exit_code(), 1);
    assert!(report.entered(RunStage::Executing));
    assert_eq!(report.final_stage(), RunStage::Failed);
}

#[tokio::test]
async fn failed_push_aborts_before_execution() {
    let bundle = Bundle::new(&[]);
    let settings = bundle.settings();
    let lookup = lookup();
    let transport = RecordingTransport {
        push_status: Some(1),
        ..Default::default()
    };
    let booter = FakeBooter::default();
    let orchestrator = Orchestrator::new(
        &bundle.layout,
        &settings,
        &bundle.env,
        &lookup,
        &transport,
        &booter,
    );

    let report = orchestrator.run(&bundle.invocation("codex")).await;

    assert_eq!(report.result.outcome, RunOutcome::SyncError);
    assert!(!report.entered(RunStage::Executing));
    // Only the prepare script ran.
    assert_eq!(transport.scripts().len(), 1);
}

#[tokio::test]
async fn no_sync_back_skips_pull() {
    let bundle = Bundle::new(&[]);
    let settings = bundle.settings();
    let lookup = lookup();
    let transport = RecordingTransport::default();
    let booter = FakeBooter::default();
    let orchestrator = Orchestrator::new(
        &bundle.layout,
        &settings,
        &bundle.env,
        &lookup,
        &transport,
        &booter,
    );

    let report = orchestrator
        .run(&bundle.invocation("codex").with_no_sync_back(true))
        .await;

    assert_eq!(report.exit_code(), 0);
    assert!(report.entered(RunStage::SyncingIn));
    assert!(!report.entered(RunStage::SyncingOut));
    assert!(
        !transport
            .calls()
            .iter()
            .any(|c| matches!(c, Call::Pull { .. }))
    );
}

#[tokio::test]
async fn missing_key_fails_before_boot() {
    let bundle = Bundle::new(&[]);
    std::fs::remove_file(bundle.layout.default_ssh_key()).unwrap();
    let settings = bundle.settings();
    let lookup = lookup();
    let transport = RecordingTransport::default();
    let booter = FakeBooter::default();
    let orchestrator = Orchestrator::new(
        &bundle.layout,
        &settings,
        &bundle.env,
        &lookup,
        &transport,
        &booter,
    );

    let report = orchestrator.run(&bundle.invocation("codex")).await;

    assert_eq!(report.result.outcome, RunOutcome::ConfigError);
    assert!(matches!(report.error, Some(LaunchError::MissingSshKey(_))));
    assert_eq!(booter.boots.load(Ordering::SeqCst), 0);
    assert!(transport.calls().is_empty());
    assert_eq!(report.stages, [RunStage::Idle, RunStage::Failed]);
}

#[tokio::test]
async fn missing_ssh_binary_is_config_error() {
    let bundle = Bundle::new(&[]);
    let settings = bundle.settings();
    let lookup = StaticLookup::new();
    let transport = RecordingTransport::default();
    let booter = FakeBooter::default();
    let orchestrator = Orchestrator::new(
        &bundle.layout,
        &settings,
        &bundle.env,
        &lookup,
        &transport,
        &booter,
    );

    let report = orchestrator.run(&bundle.invocation("codex")).await;

    assert_eq!(report.result.outcome, RunOutcome::ConfigError);
    assert!(matches!(report.error, Some(LaunchError::MissingBinary { .. })));
    assert_eq!(booter.boots.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn bad_port_file_is_config_error_after_boot() {
    let bundle = Bundle::new(&[]);
    std::fs::write(bundle.layout.ssh_port_file(), "70000").unwrap();
    let settings = bundle.settings();
    let lookup = lookup();
    let transport = RecordingTransport::default();
    let booter = FakeBooter::default();
    let orchestrator = Orchestrator::new(
        &bundle.layout,
        &settings,
        &bundle.env,
        &lookup,
        &transport,
        &booter,
    );

    let report = orchestrator.run(&bundle.invocation("codex")).await;

    assert_eq!(report.result.outcome, RunOutcome::ConfigError);
    assert!(matches!(report.error, Some(LaunchError::InvalidPort { .. })));
    assert!(!report.entered(RunStage::AwaitingSshReady));
    assert!(transport.calls().is_empty());
}

#[test]
fn remote_path_for_known_project() {
    let remote = RemoteProjectPath::resolve("/home/portable/projects/", Path::new("/home/u/app"));
    assert_eq!(remote.as_str(), "/home/portable/projects/app-503eab1a");
}
