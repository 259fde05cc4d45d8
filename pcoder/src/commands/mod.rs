//! Command implementations.

mod auth;
mod run;
mod setup;

use crate::cli::{AuthAction, Commands};
use anyhow::{Context as _, Result};
use pcoder_common::{
    EnvSnapshot, HostLauncher, LaunchError, OpenSshTransport, Orchestrator, PcoderConfig,
    PortableLayout, RunMode, RunReport, ScriptBooter, SystemLookup, ToolInvocation, VmSettings,
};
use pcoder_common::util::normalize_path;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Process-wide inputs captured once at startup.
pub struct Context {
    pub env: EnvSnapshot,
    pub cwd: PathBuf,
    pub layout: PortableLayout,
}

impl Context {
    pub fn capture() -> Result<Self> {
        let env = EnvSnapshot::capture();
        let cwd = normalize_path(
            &std::env::current_dir().context("cannot determine current directory")?,
        );
        let layout = PortableLayout::from_env(&env, &cwd);
        debug!(root = %layout.root().display(), "Resolved install root");
        Ok(Self { env, cwd, layout })
    }

    pub fn settings_initialized(&self) -> bool {
        self.layout.settings_file().is_file()
    }

    pub fn load_settings(&self) -> Result<PcoderConfig, LaunchError> {
        PcoderConfig::load(&self.layout.settings_file())
    }

    fn lookup(&self) -> SystemLookup {
        SystemLookup::new(self.env.get("PATH"), &self.cwd)
    }

    /// Absolute, normalized form of a user-supplied path.
    pub fn absolute(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            normalize_path(path)
        } else {
            normalize_path(&self.cwd.join(path))
        }
    }

    /// Run `invocation` in `mode`.
    pub async fn launch(&self, invocation: &ToolInvocation, mode: RunMode) -> RunReport {
        let lookup = self.lookup();
        debug!(tool = %invocation.tool, %mode, "Dispatching run");
        match mode {
            RunMode::HostNative => {
                HostLauncher::new(&self.layout, &self.env, &lookup)
                    .run(invocation)
                    .await
            }
            RunMode::VmPortable => {
                let settings = match VmSettings::from_env(&self.env, &self.layout) {
                    Ok(settings) => settings,
                    Err(err) => return RunReport::failed(err),
                };
                Orchestrator::new(
                    &self.layout,
                    &settings,
                    &self.env,
                    &lookup,
                    OpenSshTransport,
                    ScriptBooter::new(&self.layout),
                )
                .run(invocation)
                .await
            }
        }
    }
}

/// Print a failed run's diagnostics and return the process exit code.
pub fn finish(report: &RunReport) -> i32 {
    if let Some(err) = &report.error {
        eprintln!("pcoder: {err}");
        eprint!("{}", err.code().entry().format_full());
    }
    report.exit_code()
}

/// Execute a parsed command, returning the process exit code.
pub async fn dispatch(command: Commands) -> Result<i32> {
    let ctx = Context::capture()?;
    match command {
        Commands::Run {
            tool,
            mode,
            project,
            no_sync_back,
            args,
        } => {
            let report = run::run(
                &ctx,
                run::RunArgs {
                    tool,
                    mode,
                    project,
                    no_sync_back,
                    args,
                },
            )
            .await;
            Ok(finish(&report))
        }
        Commands::Auth { action } => match action {
            AuthAction::Login { tool, mode } => auth::session(&ctx, &tool, "login", mode).await,
            AuthAction::Logout { tool, mode } => auth::session(&ctx, &tool, "logout", mode).await,
            AuthAction::Status { json } => {
                auth::status(&ctx, json)?;
                Ok(0)
            }
        },
        Commands::Setup(args) => {
            setup::setup(&ctx, args)?;
            Ok(0)
        }
        Commands::ListTools => {
            setup::list_tools();
            Ok(0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(cwd: &str) -> Context {
        Context {
            env: EnvSnapshot::default(),
            cwd: PathBuf::from(cwd),
            layout: PortableLayout::new("/opt/pcoder"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_absolute_normalizes_project_spellings() {
        let ctx = context("/home/u");
        for spelling in ["app", "app/", "./app", "app/.", "app/sub/..", "/home/u/app/"] {
            assert_eq!(ctx.absolute(Path::new(spelling)), PathBuf::from("/home/u/app"), "{spelling}");
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_absolute_parent_keeps_real_name() {
        let ctx = context("/home/u/app/project");
        assert_eq!(ctx.absolute(Path::new("..")), PathBuf::from("/home/u/app"));
    }
}
