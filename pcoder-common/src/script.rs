//! Remote shell scripts fed to `bash -s` inside the VM.
//!
//! Every embedded value goes through [`shell_quote`]; scripts start with
//! `set -e` so the first failing line aborts the run.

use crate::auth_env::AuthEnvironment;
use crate::config::env::EnvSnapshot;
use crate::util::shell_quote;

/// Script used by the readiness probe.
pub const PROBE_SCRIPT: &str = "echo vm-ready";

/// Variables that may cross from the host into the guest. Nothing else does.
pub const FORWARDED_VARS: [&str; 11] = [
    "OPENAI_API_KEY",
    "OPENAI_BASE_URL",
    "OPENAI_ORG_ID",
    "OPENAI_PROJECT",
    "ANTHROPIC_AUTH_TOKEN",
    "ANTHROPIC_API_KEY",
    "ANTHROPIC_BASE_URL",
    "HTTP_PROXY",
    "HTTPS_PROXY",
    "NO_PROXY",
    "ALL_PROXY",
];

/// Inputs for the tool run script.
#[derive(Debug, Clone, Copy)]
pub struct RunPlan<'a> {
    pub remote_dir: &'a str,
    /// Guest-side auth environment.
    pub auth: &'a AuthEnvironment,
    pub runner: &'a str,
    pub args: &'a [String],
    /// Merged invocation environment, source of forwarded variables.
    pub env: &'a EnvSnapshot,
}

fn export(key: &str, value: &str) -> String {
    format!("export {key}={}", shell_quote(value))
}

/// Build the script that runs the tool.
pub fn build_run_script(plan: &RunPlan<'_>) -> String {
    let mut lines = vec![
        "set -e".to_string(),
        format!("cd {}", shell_quote(plan.remote_dir)),
    ];

    if !plan.auth.dirs.is_empty() {
        let dirs: Vec<String> = plan.auth.dirs.iter().map(|d| shell_quote(d)).collect();
        lines.push(format!("mkdir -p {}", dirs.join(" ")));
    }
    // Isolation exports first, then the mode marker.
    lines.extend(plan.auth.vars.iter().map(|(k, v)| export(k, v)));

    for key in FORWARDED_VARS {
        if let Some(value) = plan.env.get_non_empty(key) {
            lines.push(export(key, value));
        }
    }

    let command: Vec<String> = std::iter::once(plan.runner)
        .chain(plan.args.iter().map(String::as_str))
        .map(shell_quote)
        .collect();
    lines.push(command.join(" "));

    lines.join("\n")
}

/// Build the script that prepares the remote directory.
///
/// With sync enabled the directory is wiped and recreated. Auth-only flows
/// (`skip_sync`) only ensure it exists, because it may hold cached logins.
pub fn build_prepare_script(remote_root: &str, remote_dir: &str, skip_sync: bool) -> String {
    let mut lines = vec!["set -e".to_string()];
    if skip_sync {
        lines.push(format!("mkdir -p {}", shell_quote(remote_dir)));
    } else {
        lines.push(format!("mkdir -p {}", shell_quote(remote_root)));
        lines.push(format!("rm -rf {}", shell_quote(remote_dir)));
        lines.push(format!("mkdir -p {}", shell_quote(remote_dir)));
    }
    lines.join("\n")
}
