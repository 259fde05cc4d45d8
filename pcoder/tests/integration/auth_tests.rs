use crate::common::{TestBundle, assert_contains, assert_exit_code, init_test_logging};

#[test]
fn test_auth_status_json_defaults() {
    init_test_logging();
    crate::test_log!("TEST START: test_auth_status_json_defaults");
    let bundle = TestBundle::new();

    let output = bundle
        .command()
        .args(["auth", "status", "--json"])
        .output()
        .expect("Failed to run pcoder auth status");
    assert_exit_code(&output, 0);

    let status: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("status output is not JSON");
    assert_eq!(status["settings_initialized"], false);
    let tools = status["tools"].as_array().unwrap();
    assert_eq!(tools.len(), 2);
    assert_eq!(tools[0]["tool"], "codex");
    assert_eq!(tools[0]["mode"], "oauth");
    assert_eq!(tools[1]["vm_home"], "/home/portable/.pcoder-auth/claude");
    assert!(
        tools[0]["host_home"]
            .as_str()
            .unwrap()
            .ends_with("home")
    );
}

#[test]
fn test_auth_status_api_mode_hides_homes() {
    init_test_logging();
    let bundle = TestBundle::new();
    let settings = bundle.root().join("state").join("settings.toml");
    std::fs::create_dir_all(settings.parent().unwrap()).unwrap();
    std::fs::write(&settings, "[auth]\nclaude = \"api\"\n").unwrap();

    let output = bundle
        .command()
        .args(["auth", "status", "--json"])
        .output()
        .unwrap();
    let status: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(status["settings_initialized"], true);
    assert_eq!(status["tools"][1]["mode"], "api");
    assert!(status["tools"][1].get("host_home").is_none());

    let output = bundle.command().args(["auth", "status"]).output().unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_contains(&stdout, "claude: api");
    assert_contains(&stdout, "codex: oauth");
}

#[test]
fn test_auth_login_rejects_unknown_tool() {
    init_test_logging();
    let bundle = TestBundle::new();
    let output = bundle
        .command()
        .args(["auth", "login", "aider", "--mode", "host-native"])
        .output()
        .unwrap();
    assert_exit_code(&output, 1);
    assert_contains(&String::from_utf8_lossy(&output.stderr), "unknown tool 'aider'");
}

#[cfg(unix)]
#[test]
fn test_auth_login_host_native_uses_isolated_home() {
    use std::os::unix::fs::PermissionsExt;

    init_test_logging();
    let bundle = TestBundle::new();
    let runner = bundle.root().join("fake-claude");
    std::fs::write(&runner, "#!/bin/sh\necho \"$1 $HOME $PCODER_AUTH_MODE\" > \"$HOME/seen\"\n").unwrap();
    std::fs::set_permissions(&runner, std::fs::Permissions::from_mode(0o755)).unwrap();

    let output = bundle
        .command()
        .args(["auth", "login", "claude", "--mode", "host-native"])
        .env("PCODER_CLAUDE_CMD", &runner)
        .output()
        .unwrap();
    assert_exit_code(&output, 0);

    let home = bundle
        .root()
        .join("state/auth/claude/host/home");
    let seen = std::fs::read_to_string(home.join("seen")).unwrap();
    assert_eq!(seen.trim(), format!("login {} oauth", home.display()));
}
