use std::process::Output;

pub fn assert_contains(haystack: &str, needle: &str) {
    assert!(
        haystack.contains(needle),
        "Expected to find '{needle}' in output, got: {haystack}"
    );
}

/// Exit code check that shows both streams when it fails.
pub fn assert_exit_code(output: &Output, expected: i32) {
    assert_eq!(
        output.status.code(),
        Some(expected),
        "stdout:\n{}\nstderr:\n{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
}

/// A launcher failure exits 1 and names its catalog code on stderr.
pub fn assert_launcher_failure(output: &Output, code: &str) {
    assert_exit_code(output, 1);
    assert_contains(&String::from_utf8_lossy(&output.stderr), code);
}
