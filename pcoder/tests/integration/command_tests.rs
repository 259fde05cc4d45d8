use crate::common::{TestBundle, assert_contains, assert_exit_code, init_test_logging};
use std::process::Command;

#[test]
fn test_pcoder_help_includes_description() {
    init_test_logging();
    crate::test_log!("TEST START: test_pcoder_help_includes_description");

    let output = Command::new(env!("CARGO_BIN_EXE_pcoder"))
        .arg("--help")
        .output()
        .expect("Failed to run pcoder --help");

    assert!(output.status.success(), "pcoder --help failed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_contains(&stdout, "Portable Coder");
    assert_contains(&stdout, "run");
    assert_contains(&stdout, "auth");
    crate::test_log!("TEST PASS: test_pcoder_help_includes_description");
}

#[test]
fn test_unknown_subcommand_fails() {
    init_test_logging();
    let output = Command::new(env!("CARGO_BIN_EXE_pcoder"))
        .arg("teleport")
        .output()
        .expect("Failed to run pcoder");

    assert!(!output.status.success());
    assert_contains(&String::from_utf8_lossy(&output.stderr), "teleport");
}

#[test]
fn test_list_tools_shows_overrides() {
    init_test_logging();
    let bundle = TestBundle::new();
    let output = bundle
        .command()
        .arg("list-tools")
        .output()
        .expect("Failed to run pcoder list-tools");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_contains(&stdout, "- codex");
    assert_contains(&stdout, "PCODER_CLAUDE_CMD");
    assert_contains(&stdout, "PCODER_VM_CODEX_CMD");
}

#[test]
fn test_setup_persists_settings() {
    init_test_logging();
    crate::test_log!("TEST START: test_setup_persists_settings");
    let bundle = TestBundle::new();

    let output = bundle
        .command()
        .args(["setup", "--auth", "codex=api", "--sync-back", "false"])
        .output()
        .expect("Failed to run pcoder setup");
    assert_exit_code(&output, 0);

    let settings = bundle.root().join("state").join("settings.toml");
    let body = std::fs::read_to_string(&settings).expect("settings file was not written");
    assert_contains(&body, "codex = \"api\"");
    assert_contains(&body, "sync_back_default = false");

    let output = bundle.command().arg("setup").output().unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_contains(&stdout, "codex auth: api");
    assert_contains(&stdout, "claude auth: oauth");
    assert_contains(&stdout, "initialized: yes");
}
