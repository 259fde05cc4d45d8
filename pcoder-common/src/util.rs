//! Shared utilities for Portable Coder.

use std::path::{Component, Path, PathBuf};

/// Quote a value as a single POSIX shell word.
///
/// The value is wrapped in single quotes and every embedded `'` becomes
/// `'\''`. The result is always quoted, even for "safe" values, so the
/// generated scripts are byte-for-byte predictable.
pub fn shell_quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    quoted.push_str(&value.replace('\'', "'\\''"));
    quoted.push('\'');
    quoted
}

/// Lexically normalize `path`: drop `.` components and trailing separators,
/// and fold `..` into its parent. Symlinks are not resolved.
///
/// `..` directly under the root stays at the root; leading `..` of a relative
/// path are kept.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

/// Render a program and its arguments for logs and error messages.
pub fn display_command<S: AsRef<str>>(program: &str, args: &[S]) -> String {
    let mut out = program.to_string();
    for arg in args {
        out.push(' ');
        out.push_str(arg.as_ref());
    }
    out
}

fn find_value_end(s: &str) -> usize {
    let mut end = 0;
    let mut in_quote = None;
    let mut escaped = false;

    for c in s.chars() {
        let char_len = c.len_utf8();

        if escaped {
            escaped = false;
            end += char_len;
            continue;
        }

        if let Some(q) = in_quote {
            if c == q {
                in_quote = None;
            }
            end += char_len;
            continue;
        }

        if c == '\\' {
            escaped = true;
            end += char_len;
            continue;
        }

        if c == '"' || c == '\'' {
            in_quote = Some(c);
            end += char_len;
            continue;
        }

        if c.is_whitespace() {
            break;
        }

        end += char_len;
    }
    end
}

/// Mask credentials in a script or command line before logging.
///
/// Covers the provider variables forwarded into the VM and proxy URLs, which
/// may embed `user:password@`.
pub fn mask_sensitive_command(cmd: &str) -> String {
    const PATTERNS: &[&str] = &[
        "OPENAI_API_KEY=",
        "ANTHROPIC_API_KEY=",
        "ANTHROPIC_AUTH_TOKEN=",
        "HTTP_PROXY=",
        "HTTPS_PROXY=",
        "ALL_PROXY=",
        "API_KEY=",
        "TOKEN=",
        "SECRET=",
        "PASSWORD=",
        "--api-key=",
        "--token=",
    ];

    let mut result = cmd.to_string();
    for pattern in PATTERNS {
        let replacement = format!("{pattern}***");
        let mut search_start = 0;
        while search_start < result.len() {
            let Some(start) = result[search_start..].find(pattern) else {
                break;
            };
            let abs_start = search_start + start;
            let value_start = abs_start + pattern.len();
            let value_end = value_start + find_value_end(&result[value_start..]);

            result = format!(
                "{}{}{}",
                &result[..abs_start],
                replacement,
                &result[value_end..]
            );
            search_start = abs_start + replacement.len();
        }
    }

    result
}
