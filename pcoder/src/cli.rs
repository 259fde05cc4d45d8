//! Command-line surface.

use clap::{Args, Parser, Subcommand};
use pcoder_common::{AuthMode, RunMode};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "pcoder")]
#[command(
    author,
    version,
    about = "Portable Coder - run coding assistants on the host or inside an isolated VM"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a tool against a project
    Run {
        /// Tool to launch (codex, claude, ...)
        tool: String,

        /// Where to run: linux-portable or host-native
        #[arg(long)]
        mode: Option<RunMode>,

        /// Project directory (defaults to the current directory)
        #[arg(short, long)]
        project: Option<PathBuf>,

        /// Leave changes made in the VM behind
        #[arg(long)]
        no_sync_back: bool,

        /// Arguments passed to the tool. Everything from the first one on is
        /// forwarded as-is; use `--` when the first starts with a launcher flag.
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Manage isolated tool logins
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },

    /// Show or change persistent settings
    Setup(SetupArgs),

    /// List known tools and their command overrides
    ListTools,
}

#[derive(Args, Debug, Default)]
pub struct SetupArgs {
    /// Start from defaults and write the settings file
    #[arg(long)]
    pub init: bool,

    /// Auth mode for a tool, as TOOL=oauth|api (repeatable)
    #[arg(long = "auth", value_name = "TOOL=MODE", value_parser = parse_tool_auth)]
    pub auth: Vec<(String, AuthMode)>,

    /// Run mode used on Windows when --mode is not given
    #[arg(long)]
    pub windows_mode: Option<RunMode>,

    /// Copy VM changes back by default (true|false)
    #[arg(long)]
    pub sync_back: Option<bool>,
}

fn parse_tool_auth(raw: &str) -> Result<(String, AuthMode), String> {
    let (tool, mode) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected TOOL=MODE, got '{raw}'"))?;
    let tool = tool.trim();
    if tool.is_empty() {
        return Err(format!("missing tool name in '{raw}'"));
    }
    Ok((tool.to_string(), mode.parse()?))
}

#[derive(Subcommand, Debug)]
pub enum AuthAction {
    /// Log a tool in using its isolated home
    Login {
        tool: String,
        #[arg(long)]
        mode: Option<RunMode>,
    },

    /// Log a tool out of its isolated home
    Logout {
        tool: String,
        #[arg(long)]
        mode: Option<RunMode>,
    },

    /// Show auth mode and isolated homes per tool
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
