//! Error catalog and launcher errors for Portable Coder.
//!
//! # Error Code Ranges
//!
//! | Range      | Category    | Description                              |
//! |------------|-------------|------------------------------------------|
//! | E001-E099  | Config      | Configuration, paths and tool discovery  |
//! | E100-E199  | Network     | VM boot and SSH connectivity             |
//! | E300-E399  | Execution   | Process spawning and tool execution      |
//! | E400-E499  | Transfer    | Project sync in and out of the VM        |

pub mod catalog;
pub mod launch;

pub use catalog::{ErrorCategory, ErrorCode, ErrorEntry};
pub use launch::LaunchError;
