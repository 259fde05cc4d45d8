use crate::common::{
    TestBundle, assert_contains, assert_exit_code, assert_launcher_failure, init_test_logging,
};

#[test]
fn test_vm_run_without_key_is_config_error() {
    init_test_logging();
    crate::test_log!("TEST START: test_vm_run_without_key_is_config_error");
    let bundle = TestBundle::new();

    let output = bundle
        .command()
        .args(["run", "codex", "--mode", "linux-portable"])
        .output()
        .expect("Failed to run pcoder run");

    assert_launcher_failure(&output, "PCODER-E002");
    assert_contains(&String::from_utf8_lossy(&output.stderr), "SSH key not found");
}

#[test]
fn test_out_of_range_timeout_is_env_error() {
    init_test_logging();
    let bundle = TestBundle::new();

    let output = bundle
        .command()
        .args(["run", "codex", "--mode", "linux-portable"])
        .env("PCODER_VM_SSH_TIMEOUT_SECONDS", "5")
        .output()
        .unwrap();

    assert_launcher_failure(&output, "PCODER-E001");
    assert_contains(&String::from_utf8_lossy(&output.stderr), "PCODER_VM_SSH_TIMEOUT_SECONDS");
}

#[test]
fn test_missing_project_is_config_error() {
    init_test_logging();
    let bundle = TestBundle::new();
    let missing = bundle.project().join("nope");

    let output = bundle
        .command()
        .args(["run", "codex", "--mode", "host-native", "--project"])
        .arg(&missing)
        .output()
        .unwrap();

    assert_launcher_failure(&output, "PCODER-E008");
    assert_contains(&String::from_utf8_lossy(&output.stderr), "does not exist");
}

#[cfg(unix)]
#[test]
fn test_host_native_run_propagates_exit_code() {
    use std::os::unix::fs::PermissionsExt;

    init_test_logging();
    crate::test_log!("TEST START: test_host_native_run_propagates_exit_code");
    let bundle = TestBundle::new();
    let runner = bundle.root().join("fake-codex");
    std::fs::write(&runner, "#!/bin/sh\necho \"$@\" > args.txt\nexit 7\n").unwrap();
    std::fs::set_permissions(&runner, std::fs::Permissions::from_mode(0o755)).unwrap();

    let output = bundle
        .command()
        .args(["run", "codex", "--mode", "host-native", "--", "exec", "it's fine"])
        .env("PCODER_CODEX_CMD", &runner)
        .output()
        .unwrap();

    assert_exit_code(&output, 7);
    let args = std::fs::read_to_string(bundle.project().join("args.txt")).unwrap();
    assert_eq!(args.trim(), "exec it's fine");
}

#[cfg(unix)]
#[test]
fn test_host_native_run_forwards_bare_args() {
    use std::os::unix::fs::PermissionsExt;

    init_test_logging();
    let bundle = TestBundle::new();
    let runner = bundle.root().join("fake-claude");
    std::fs::write(&runner, "#!/bin/sh\necho \"$@\" > args.txt\n").unwrap();
    std::fs::set_permissions(&runner, std::fs::Permissions::from_mode(0o755)).unwrap();

    let output = bundle
        .command()
        .args(["run", "claude", "--mode", "host-native", "--print", "--mode", "plan"])
        .env("PCODER_CLAUDE_CMD", &runner)
        .output()
        .unwrap();

    assert_exit_code(&output, 0);
    let args = std::fs::read_to_string(bundle.project().join("args.txt")).unwrap();
    assert_eq!(args.trim(), "--print --mode plan");
}
