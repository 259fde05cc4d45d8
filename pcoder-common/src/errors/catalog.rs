//! Error Catalog for Portable Coder
//!
//! Every launcher-side failure maps to a stable code in the `PCODER-Exxx`
//! format, a message and a short list of remediation steps.
//!
//! # Error Code Ranges
//!
//! | Range      | Category    | Description                              |
//! |------------|-------------|------------------------------------------|
//! | E001-E099  | Config      | Configuration, paths and tool discovery  |
//! | E100-E199  | Network     | VM boot and SSH connectivity             |
//! | E300-E399  | Execution   | Process spawning and tool execution      |
//! | E400-E499  | Transfer    | Project sync in and out of the VM        |

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error code enumeration covering all launcher failure scenarios.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum ErrorCode {
    // =========================================================================
    // Config Errors (E001-E099)
    // =========================================================================
    /// Environment variable has invalid value
    ConfigEnvError,
    /// SSH private key not found
    ConfigSshKeyMissing,
    /// VM port file not found
    ConfigPortFileMissing,
    /// VM port file does not contain a valid port
    ConfigPortInvalid,
    /// VM boot script not found
    ConfigBootScriptMissing,
    /// ssh or scp binary could not be located
    ConfigBinaryMissing,
    /// Command override points at nothing
    ConfigOverrideNotFound,
    /// Project directory is unusable
    ConfigProjectPath,
    /// No runner found for a host-native tool
    ConfigNoRunner,
    /// Settings file could not be read or parsed
    ConfigSettingsError,
    /// Isolated auth directory could not be created
    ConfigAuthDirError,

    // =========================================================================
    // Network Errors (E100-E199)
    // =========================================================================
    /// VM boot script exited non-zero
    VmBootFailed,
    /// SSH did not become ready before the deadline
    SshReadinessTimeout,
    /// Remote workspace preparation failed
    SshRemotePrepareFailed,

    // =========================================================================
    // Execution Errors (E300-E399)
    // =========================================================================
    /// A local process could not be spawned
    ExecSpawnFailed,

    // =========================================================================
    // Transfer Errors (E400-E499)
    // =========================================================================
    /// Copying the project into the VM failed
    TransferPushFailed,
    /// Copying the project back from the VM failed
    TransferPullFailed,
}

impl ErrorCode {
    /// Returns the numeric error code (without prefix).
    #[must_use]
    pub const fn code_number(&self) -> u16 {
        match self {
            // Config (001-099)
            Self::ConfigEnvError => 1,
            Self::ConfigSshKeyMissing => 2,
            Self::ConfigPortFileMissing => 3,
            Self::ConfigPortInvalid => 4,
            Self::ConfigBootScriptMissing => 5,
            Self::ConfigBinaryMissing => 6,
            Self::ConfigOverrideNotFound => 7,
            Self::ConfigProjectPath => 8,
            Self::ConfigNoRunner => 9,
            Self::ConfigSettingsError => 10,
            Self::ConfigAuthDirError => 11,

            // Network (100-199)
            Self::VmBootFailed => 100,
            Self::SshReadinessTimeout => 101,
            Self::SshRemotePrepareFailed => 102,

            // Execution (300-399)
            Self::ExecSpawnFailed => 300,

            // Transfer (400-499)
            Self::TransferPushFailed => 400,
            Self::TransferPullFailed => 401,
        }
    }

    /// Returns the formatted error code string (e.g., "PCODER-E001").
    #[must_use]
    pub fn code_string(&self) -> String {
        format!("PCODER-E{:03}", self.code_number())
    }

    /// Returns the error category.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self.code_number() {
            1..=99 => ErrorCategory::Config,
            100..=199 => ErrorCategory::Network,
            300..=399 => ErrorCategory::Execution,
            // 400-499
            _ => ErrorCategory::Transfer,
        }
    }

    /// Returns the full error entry with all metadata.
    #[must_use]
    pub fn entry(&self) -> ErrorEntry {
        ErrorEntry {
            code: self.code_string(),
            category: self.category(),
            message: self.message().to_string(),
            remediation: self
                .remediation()
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
        }
    }

    /// Returns the error message template.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::ConfigEnvError => "Environment variable has an invalid value",
            Self::ConfigSshKeyMissing => "SSH private key for the VM was not found",
            Self::ConfigPortFileMissing => "VM SSH port file was not found",
            Self::ConfigPortInvalid => "VM SSH port file does not contain a valid port",
            Self::ConfigBootScriptMissing => "VM boot script was not found",
            Self::ConfigBinaryMissing => "Required ssh/scp binary could not be located",
            Self::ConfigOverrideNotFound => "Command override does not resolve to a program",
            Self::ConfigProjectPath => "Project directory is not usable",
            Self::ConfigNoRunner => "No command found to launch the tool on this host",
            Self::ConfigSettingsError => "Settings file could not be loaded",
            Self::ConfigAuthDirError => "Isolated auth directory could not be created",

            Self::VmBootFailed => "VM boot script failed",
            Self::SshReadinessTimeout => "VM SSH did not become ready in time",
            Self::SshRemotePrepareFailed => "Remote workspace preparation failed",

            Self::ExecSpawnFailed => "Failed to start a local process",

            Self::TransferPushFailed => "Copying the project into the VM failed",
            Self::TransferPullFailed => "Copying the project back from the VM failed",

        }
    }

    /// Returns remediation steps for the error.
    #[must_use]
    pub const fn remediation(&self) -> &'static [&'static str] {
        match self {
            Self::ConfigEnvError => &[
                "Check PCODER_* variables for typos",
                "Numeric values must be plain integers within the documented range",
            ],
            Self::ConfigSshKeyMissing => &[
                "Verify the bundle contains runtime/linux/ssh/id_ed25519",
                "Or point PCODER_VM_SSH_KEY at an existing private key",
            ],
            Self::ConfigPortFileMissing => &[
                "Make sure the boot script writes state/vm/ssh-port.txt",
                "Re-run the command to boot the VM again",
            ],
            Self::ConfigPortInvalid => &[
                "The port file must contain a single integer between 1 and 65535",
                "Delete state/vm/ssh-port.txt and boot the VM again",
            ],
            Self::ConfigBootScriptMissing => &[
                "Verify the bundle contains scripts/runtime/windows/start-vm.cmd (or scripts/runtime/start-vm.sh)",
                "Check that PCODER_ROOT points at the bundle root",
            ],
            Self::ConfigBinaryMissing => &[
                "Install OpenSSH client tools or ship them under runtime/ssh/",
                "Or set PCODER_SSH_CMD / PCODER_SCP_CMD",
            ],
            Self::ConfigOverrideNotFound => &[
                "Use an absolute path to an existing executable",
                "Or a bare command name that resolves on PATH",
            ],
            Self::ConfigProjectPath => &[
                "Run from an existing directory or pass --project",
            ],
            Self::ConfigNoRunner => &[
                "Install the tool so it is available on PATH",
                "Or set PCODER_<TOOL>_CMD to the executable",
            ],
            Self::ConfigSettingsError => &[
                "Check state/settings.toml for TOML syntax errors",
                "Delete the file to fall back to defaults",
            ],
            Self::ConfigAuthDirError => &[
                "Check permissions on the state/auth directory",
            ],
            Self::VmBootFailed => &[
                "Run the boot script manually to see its output",
                "Check that virtualization is available on this host",
            ],
            Self::SshReadinessTimeout => &[
                "Increase PCODER_VM_SSH_TIMEOUT_SECONDS for slow hosts",
                "Check that the VM forwards the port in state/vm/ssh-port.txt",
            ],
            Self::SshRemotePrepareFailed => &[
                "Check free disk space inside the VM",
                "Check that PCODER_VM_PROJECTS_ROOT is writable by the VM user",
            ],
            Self::ExecSpawnFailed => &[
                "Verify the program exists and is executable",
            ],
            Self::TransferPushFailed => &[
                "Check free disk space inside the VM",
                "Check that all project files are readable",
            ],
            Self::TransferPullFailed => &[
                "Check free disk space on the host",
                "Your remote changes are still in the VM project directory",
            ],
        }
    }

    /// Returns all error codes for iteration.
    #[must_use]
    pub const fn all() -> &'static [ErrorCode] {
        &[
            Self::ConfigEnvError,
            Self::ConfigSshKeyMissing,
            Self::ConfigPortFileMissing,
            Self::ConfigPortInvalid,
            Self::ConfigBootScriptMissing,
            Self::ConfigBinaryMissing,
            Self::ConfigOverrideNotFound,
            Self::ConfigProjectPath,
            Self::ConfigNoRunner,
            Self::ConfigSettingsError,
            Self::ConfigAuthDirError,
            Self::VmBootFailed,
            Self::SshReadinessTimeout,
            Self::SshRemotePrepareFailed,
            Self::ExecSpawnFailed,
            Self::TransferPushFailed,
            Self::TransferPullFailed,
        ]
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code_string(), self.message())
    }
}

/// Error category for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    /// Configuration and setup errors (E001-E099)
    Config,
    /// VM boot and SSH connectivity errors (E100-E199)
    Network,
    /// Process execution errors (E300-E399)
    Execution,
    /// File transfer errors (E400-E499)
    Transfer,
}

impl ErrorCategory {
    /// Returns a human-readable name for the category.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Config => "Configuration",
            Self::Network => "Network",
            Self::Execution => "Execution",
            Self::Transfer => "Transfer",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Complete error entry with all metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEntry {
    /// Error code string (e.g., "PCODER-E001")
    pub code: String,
    pub category: ErrorCategory,
    pub message: String,
    /// Steps to remediate the error
    pub remediation: Vec<String>,
}

impl ErrorEntry {
    /// Formats the error for display with full remediation steps.
    #[must_use]
    pub fn format_full(&self) -> String {
        let mut output = format!("[{}] {}\n", self.code, self.message);

        if !self.remediation.is_empty() {
            output.push_str("\nRemediation steps:\n");
            for (i, step) in self.remediation.iter().enumerate() {
                output.push_str(&format!("  {}. {}\n", i + 1, step));
            }
        }

        output
    }

    /// Formats the error as a single line.
    #[must_use]
    pub fn format_brief(&self) -> String {
        format!("[{}] {}", self.code, self.message)
    }
}

impl fmt::Display for ErrorEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_brief())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_numbers_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for code in ErrorCode::all() {
            let num = code.code_number();
            assert!(
                seen.insert(num),
                "Duplicate error code number: {} for {:?}",
                num,
                code
            );
        }
    }

    #[test]
    fn test_error_code_format() {
        assert_eq!(ErrorCode::ConfigEnvError.code_string(), "PCODER-E001");
        assert_eq!(ErrorCode::VmBootFailed.code_string(), "PCODER-E100");
        assert_eq!(ErrorCode::ExecSpawnFailed.code_string(), "PCODER-E300");
        assert_eq!(ErrorCode::TransferPushFailed.code_string(), "PCODER-E400");
    }

    #[test]
    fn test_category_ranges() {
        for code in ErrorCode::all() {
            let expected = match code.code_number() {
                1..=99 => ErrorCategory::Config,
                100..=199 => ErrorCategory::Network,
                300..=399 => ErrorCategory::Execution,
                400..=499 => ErrorCategory::Transfer,
                other => panic!("code {other} is outside every category range"),
            };
            assert_eq!(code.category(), expected, "{code:?}");
        }
    }

    #[test]
    fn test_all_errors_have_message_and_remediation() {
        for code in ErrorCode::all() {
            assert!(!code.message().is_empty(), "{code:?} has no message");
            assert!(
                !code.remediation().is_empty(),
                "{code:?} has no remediation steps"
            );
        }
    }

    #[test]
    fn test_format_full() {
        let full = ErrorCode::SshReadinessTimeout.entry().format_full();
        assert!(full.starts_with("[PCODER-E101] VM SSH did not become ready in time"));
        assert!(full.contains("Remediation steps:"));
        assert!(full.contains("  1. Increase PCODER_VM_SSH_TIMEOUT_SECONDS"));
    }

    #[test]
    fn test_format_brief() {
        let entry = ErrorCode::TransferPullFailed.entry();
        assert_eq!(
            entry.format_brief(),
            "[PCODER-E401] Copying the project back from the VM failed"
        );
        assert_eq!(entry.to_string(), entry.format_brief());
    }
}
