//! `pcoder run`.

use super::Context;
use pcoder_common::{RunMode, RunReport, ToolInvocation};
use std::path::PathBuf;
use tracing::info;

pub struct RunArgs {
    pub tool: String,
    pub mode: Option<RunMode>,
    pub project: Option<PathBuf>,
    pub no_sync_back: bool,
    pub args: Vec<String>,
}

pub async fn run(ctx: &Context, args: RunArgs) -> RunReport {
    let config = match ctx.load_settings() {
        Ok(config) => config,
        Err(err) => return RunReport::failed(err),
    };

    let project = args
        .project
        .as_deref()
        .map_or_else(|| ctx.cwd.clone(), |p| ctx.absolute(p));
    let mode = RunMode::resolve(args.mode, config.runtime.windows_default_mode);
    let invocation = ToolInvocation::new(&args.tool, project)
        .with_args(args.args)
        .with_auth_mode(config.auth_mode(&args.tool))
        .with_no_sync_back(args.no_sync_back || !config.runtime.sync_back_default);

    info!(
        tool = %invocation.tool,
        %mode,
        auth_mode = %invocation.auth_mode,
        project = %invocation.project_path.display(),
        sync_back = invocation.syncs_back(),
        "Starting run"
    );
    ctx.launch(&invocation, mode).await
}
