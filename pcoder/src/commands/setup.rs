//! `pcoder setup` and `pcoder list-tools`.

use super::Context;
use crate::cli::SetupArgs;
use anyhow::{Context as _, Result};
use pcoder_common::{PcoderConfig, ToolCatalog};
use tracing::info;

/// Apply `args` to the stored settings. Writes only when something was asked
/// for; with no flags it just prints the current values.
pub fn setup(ctx: &Context, args: SetupArgs) -> Result<()> {
    let path = ctx.layout.settings_file();
    let initialized = ctx.settings_initialized();
    let mut config = if args.init {
        PcoderConfig::default()
    } else {
        ctx.load_settings()?
    };

    let mut persist = args.init;
    for (tool, mode) in args.auth {
        config.set_auth_mode(tool, mode);
        persist = true;
    }
    if let Some(mode) = args.windows_mode {
        config.runtime.windows_default_mode = mode;
        persist = true;
    }
    if let Some(sync_back) = args.sync_back {
        config.runtime.sync_back_default = sync_back;
        persist = true;
    }

    if persist {
        config
            .save(&path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!(path = %path.display(), "Settings saved");
        println!("Settings saved to {}\n", path.display());
    } else if !initialized {
        println!("Settings are not initialized; run 'pcoder setup --init' to create them.\n");
    }

    let catalog = ToolCatalog::builtin();
    println!("Settings");
    println!(
        "  initialized: {}",
        if initialized || persist { "yes" } else { "no" }
    );
    for tool in catalog.names() {
        println!("  {tool} auth: {}", config.auth_mode(tool));
    }
    for (tool, mode) in &config.auth {
        if !catalog.names().any(|known| known == tool) {
            println!("  {tool} auth: {mode}");
        }
    }
    println!(
        "  windows default mode: {}",
        config.runtime.windows_default_mode
    );
    println!("  sync back default: {}", config.runtime.sync_back_default);
    println!("  settings file: {}", path.display());
    Ok(())
}

pub fn list_tools() {
    let catalog = ToolCatalog::builtin();
    println!("Available tools:\n");
    for tool in catalog.names() {
        let adapter = catalog.adapter(tool);
        println!("- {}", adapter.name);
        println!("  command env: {}", adapter.command_env);
        println!("  vm command env: {}", adapter.vm_command_env());
        println!("  candidates: {}", adapter.candidates.join(", "));
    }
}
