//! `pcoder auth login|logout|status`.

use super::{Context, finish};
use anyhow::{Result, bail};
use pcoder_common::{AuthMode, RunMode, ToolCatalog, ToolInvocation, VmSettings};
use serde::Serialize;
use tracing::warn;

/// Run `tool <action>` against the tool's isolated oauth home.
pub async fn session(ctx: &Context, tool: &str, action: &str, mode: Option<RunMode>) -> Result<i32> {
    let catalog = ToolCatalog::builtin();
    if !catalog.names().any(|name| name == tool) {
        let known: Vec<&str> = catalog.names().collect();
        bail!("unknown tool '{tool}'; supported: {}", known.join(", "));
    }

    let config = ctx.load_settings()?;
    if action == "login" && config.auth_mode(tool) == AuthMode::Api {
        warn!(tool, "Auth mode is 'api'; oauth login is optional");
    }

    let mode = RunMode::resolve(mode, config.runtime.windows_default_mode);
    let invocation = ToolInvocation::new(tool, ctx.layout.root())
        .with_args([action])
        .with_auth_mode(AuthMode::Oauth)
        .with_skip_project_sync(true)
        .with_no_sync_back(true);

    let report = ctx.launch(&invocation, mode).await;
    Ok(finish(&report))
}

#[derive(Debug, Serialize)]
struct ToolAuthStatus {
    tool: String,
    mode: AuthMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    host_home: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    vm_home: Option<String>,
}

#[derive(Debug, Serialize)]
struct AuthStatus {
    settings_initialized: bool,
    tools: Vec<ToolAuthStatus>,
}

fn collect_status(ctx: &Context) -> Result<AuthStatus> {
    let config = ctx.load_settings()?;
    let vm = VmSettings::from_env(&ctx.env, &ctx.layout)?;
    let tools = ToolCatalog::builtin()
        .names()
        .map(|tool| {
            let mode = config.auth_mode(tool);
            let oauth = mode == AuthMode::Oauth;
            ToolAuthStatus {
                tool: tool.to_string(),
                mode,
                host_home: oauth.then(|| {
                    ctx.layout
                        .host_auth_root(tool)
                        .join("home")
                        .display()
                        .to_string()
                }),
                vm_home: oauth.then(|| vm.guest_auth_home(tool)),
            }
        })
        .collect();
    Ok(AuthStatus {
        settings_initialized: ctx.settings_initialized(),
        tools,
    })
}

pub fn status(ctx: &Context, json: bool) -> Result<()> {
    let status = collect_status(ctx)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("Auth status");
    println!(
        "  settings initialized: {}",
        if status.settings_initialized { "yes" } else { "no" }
    );
    for entry in &status.tools {
        println!("  {}: {}", entry.tool, entry.mode);
        match (&entry.host_home, &entry.vm_home) {
            (Some(host), Some(vm)) => {
                println!("    host oauth home: {host}");
                println!("    vm oauth home:   {vm}");
            }
            _ => println!("    api mode: provider keys are read from the environment at launch"),
        }
    }
    Ok(())
}
