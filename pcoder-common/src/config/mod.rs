//! Configuration for Portable Coder.
//!
//! - Environment variable parsing over an immutable snapshot
//! - Source tracking for debugging
//! - Install layout and VM connection settings
//! - Persistent settings file

pub mod env;
pub mod settings;
pub mod source;
pub mod vm;

pub use env::{EnvError, EnvParser, EnvSnapshot};
pub use settings::{PcoderConfig, RuntimeSettings};
pub use source::{ConfigSource, Sourced};
pub use vm::{PortableLayout, VmSettings};
