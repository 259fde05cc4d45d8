//! Known tools and how to find their executables.

use crate::config::env::EnvSnapshot;
use crate::errors::LaunchError;
use crate::locator::ExecutableLookup;
use std::path::PathBuf;

/// Launch metadata for one tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolAdapter {
    pub name: String,
    /// Host-side override variable, e.g. `PCODER_CLAUDE_CMD`.
    pub command_env: String,
    /// Executable names tried in order.
    pub candidates: Vec<String>,
}

fn env_token(tool: &str) -> String {
    tool.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

impl ToolAdapter {
    pub fn new(name: &str, candidates: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            command_env: format!("PCODER_{}_CMD", env_token(name)),
            candidates: candidates.iter().map(|c| (*c).to_string()).collect(),
        }
    }

    /// Adapter for a tool with no catalog entry.
    pub fn generic(name: &str) -> Self {
        Self::new(name, &[name])
    }

    /// Guest-side override variable, e.g. `PCODER_VM_CODEX_CMD`.
    pub fn vm_command_env(&self) -> String {
        format!("PCODER_VM_{}_CMD", env_token(&self.name))
    }

    /// Command to run inside the VM: override, first candidate, or the name.
    pub fn guest_runner(&self, env: &EnvSnapshot) -> String {
        if let Some(cmd) = env.get_non_empty(&self.vm_command_env()) {
            return cmd.to_string();
        }
        self.candidates
            .first()
            .cloned()
            .unwrap_or_else(|| self.name.clone())
    }

    /// Command to run on the host: the override as given, else the first
    /// candidate found by `lookup`.
    pub fn host_runner<L: ExecutableLookup + ?Sized>(
        &self,
        env: &EnvSnapshot,
        lookup: &L,
    ) -> Result<PathBuf, LaunchError> {
        if let Some(cmd) = env.get_non_empty(&self.command_env) {
            return Ok(PathBuf::from(cmd));
        }
        self.candidates
            .iter()
            .find_map(|candidate| lookup.find(candidate))
            .ok_or_else(|| LaunchError::NoRunner {
                tool: self.name.clone(),
                env_var: self.command_env.clone(),
                candidates: self.candidates.join(", "),
            })
    }
}

/// Environment fixups some tools need before launch.
///
/// claude reads `ANTHROPIC_AUTH_TOKEN`; mirror `ANTHROPIC_API_KEY` into it
/// when only the latter is set.
pub fn apply_tool_compat(tool: &str, env: &mut EnvSnapshot) {
    if tool == "claude" && env.get_non_empty("ANTHROPIC_AUTH_TOKEN").is_none() {
        if let Some(key) = env.get_non_empty("ANTHROPIC_API_KEY").map(str::to_string) {
            env.set("ANTHROPIC_AUTH_TOKEN", key);
        }
    }
}

/// Built-in tool catalog.
#[derive(Debug, Clone)]
pub struct ToolCatalog {
    adapters: Vec<ToolAdapter>,
}

impl ToolCatalog {
    pub fn builtin() -> Self {
        Self {
            adapters: vec![
                ToolAdapter::new("codex", &["codex"]),
                ToolAdapter::new("claude", &["claude"]),
            ],
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.adapters.iter().map(|a| a.name.as_str())
    }

    /// Adapter for `tool`, falling back to a generic one.
    pub fn adapter(&self, tool: &str) -> ToolAdapter {
        self.adapters
            .iter()
            .find(|a| a.name == tool)
            .cloned()
            .unwrap_or_else(|| ToolAdapter::generic(tool))
    }
}
