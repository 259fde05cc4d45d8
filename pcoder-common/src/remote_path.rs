//! Deterministic remote workspace paths.
//!
//! A project at `/home/u/app` maps to `<root>/app-<hash8>`, where `hash8` is
//! the first 8 hex characters of SHA-1 over the lowercased local path. The
//! same path always lands in the same remote directory, and two projects
//! that share a directory name do not collide. The local path is normalized
//! first, so `app/`, `app/.` and `app/sub/..` name the same workspace.

use crate::util::normalize_path;
use sha1::{Digest, Sha1};
use std::fmt;
use std::path::Path;

const FALLBACK_NAME: &str = "project";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemoteProjectPath(String);

impl RemoteProjectPath {
    /// Derive the remote path for `local` under `remote_root`. Pure.
    pub fn resolve(remote_root: &str, local: &Path) -> Self {
        let root = remote_root.strip_suffix('/').unwrap_or(remote_root);
        let local = normalize_path(local);
        let name = local
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| FALLBACK_NAME.to_string());

        Self(format!(
            "{root}/{}-{}",
            sanitize_name(&name),
            path_hash8(&local)
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for RemoteProjectPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// First 8 hex chars of SHA-1 over the lowercased path.
fn path_hash8(local: &Path) -> String {
    let lowered = local.to_string_lossy().to_lowercase();
    let digest = Sha1::digest(lowered.as_bytes());
    let hex = format!("{digest:x}");
    hex[..8].to_string()
}
