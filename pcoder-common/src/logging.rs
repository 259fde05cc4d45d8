//! Tracing subscriber setup.
//!
//! Diagnostics always go to stderr (or a file) so the launched tool owns
//! stdout. `PCODER_LOG_LEVEL`, `PCODER_LOG_FORMAT` and `PCODER_LOG_FILE`
//! control the output; `RUST_LOG` wins over the level when set.

use crate::config::env::{EnvParser, EnvSnapshot};
use anyhow::Context;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::Layer;
use tracing_subscriber::Registry;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Console output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        match value {
            "compact" => Self::Compact,
            "json" => Self::Json,
            _ => Self::Pretty,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub level: String,
    pub format: LogFormat,
    pub file: Option<PathBuf>,
    pub stderr: bool,
    /// Raw `RUST_LOG` directive, if any.
    pub directive: Option<String>,
}

impl LogConfig {
    /// Read logging settings from the process environment.
    pub fn from_env(default_level: &str) -> Self {
        Self::from_snapshot(&EnvSnapshot::capture(), default_level)
    }

    /// Read logging settings from `env`. Invalid values fall back to defaults
    /// because logging has to come up before errors can be reported.
    pub fn from_snapshot(env: &EnvSnapshot, default_level: &str) -> Self {
        let mut parser = EnvParser::new(env);
        let level = parser.get_log_level("LOG_LEVEL", default_level).into_inner();
        let format = parser
            .get_choice("LOG_FORMAT", "pretty", &["pretty", "compact", "json"])
            .into_inner();
        let file = parser
            .get_optional_string("LOG_FILE")
            .into_inner()
            .map(PathBuf::from);

        Self {
            level,
            format: LogFormat::parse(&format),
            file,
            stderr: false,
            directive: env.get_non_empty("RUST_LOG").map(str::to_string),
        }
    }

    pub fn with_stderr(mut self) -> Self {
        self.stderr = true;
        self
    }

    /// Force a level, ignoring `RUST_LOG`.
    pub fn with_level(mut self, level: &str) -> Self {
        self.level = level.to_string();
        self.directive = None;
        self
    }

    fn filter(&self) -> anyhow::Result<EnvFilter> {
        let directive = self.directive.as_deref().unwrap_or(&self.level);
        EnvFilter::try_new(directive)
            .with_context(|| format!("invalid log filter directive '{directive}'"))
    }
}

/// Keeps background writers alive; drop only at process exit.
#[must_use = "dropping the guards stops file logging"]
pub struct LoggingGuards {
    _file: Option<WorkerGuard>,
}

/// Install the global subscriber.
pub fn init_logging(config: &LogConfig) -> anyhow::Result<LoggingGuards> {
    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();

    let writer = if config.stderr {
        BoxMakeWriter::new(std::io::stderr)
    } else {
        BoxMakeWriter::new(std::io::stdout)
    };
    let console = tracing_subscriber::fmt::layer().with_writer(writer);
    let console = match config.format {
        LogFormat::Pretty => console.pretty().with_filter(config.filter()?).boxed(),
        LogFormat::Compact => console.compact().with_filter(config.filter()?).boxed(),
        LogFormat::Json => console.json().with_filter(config.filter()?).boxed(),
    };
    layers.push(console);

    let mut file_guard = None;
    if let Some(path) = &config.file {
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        let name = path
            .file_name()
            .context("PCODER_LOG_FILE must name a file")?;
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create log directory {}", dir.display()))?;

        let appender = tracing_appender::rolling::never(&dir, name);
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);
        layers.push(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(non_blocking)
                .json()
                .with_filter(config.filter()?)
                .boxed(),
        );
        file_guard = Some(guard);
    }

    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .context("failed to install tracing subscriber")?;

    Ok(LoggingGuards { _file: file_guard })
}
