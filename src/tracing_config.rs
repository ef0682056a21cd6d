//! Logging setup for the mask merger
//!
//! The library only emits `tracing` events and spans. The CLI installs a
//! subscriber through [`init_cli_tracing`], which needs the `cli` feature.

#[cfg(feature = "cli")]
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// How log lines are rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TracingFormat {
    /// Colored output for an interactive terminal
    Console,
    /// Plain output for pipes, log files and `--no-color`
    Compact,
}

impl TracingFormat {
    /// Pick a format for a stream: plain when colors are disabled or the
    /// stream is not a terminal
    #[must_use]
    pub fn select(no_color: bool, is_terminal: bool) -> Self {
        if no_color || !is_terminal {
            Self::Compact
        } else {
            Self::Console
        }
    }

    /// Whether ANSI escapes should be written
    #[must_use]
    pub fn ansi(self) -> bool {
        self == Self::Console
    }
}

/// Subscriber settings for a CLI session
#[derive(Debug)]
pub struct TracingConfig {
    /// Number of `-v` flags
    pub verbosity: u8,
    pub format: TracingFormat,
    /// `RUST_LOG`-style directives; take precedence over `verbosity`
    pub env_filter: Option<String>,
    /// Logged at debug level once the subscriber is installed
    pub session_id: Option<String>,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            verbosity: 0,
            format: TracingFormat::Console,
            env_filter: None,
            session_id: None,
        }
    }
}

impl TracingConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }

    #[must_use]
    pub fn with_format(mut self, format: TracingFormat) -> Self {
        self.format = format;
        self
    }

    #[must_use]
    pub fn with_env_filter<S: Into<String>>(mut self, filter: S) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    #[must_use]
    pub fn with_session_id<S: Into<String>>(mut self, session_id: S) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Filter directive for the configured verbosity
    #[must_use]
    pub fn verbosity_to_filter(&self) -> &'static str {
        match self.verbosity {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }

    /// Filter directive actually applied: `env_filter` if set, else verbosity
    #[must_use]
    pub fn filter_directive(&self) -> &str {
        self.env_filter
            .as_deref()
            .unwrap_or_else(|| self.verbosity_to_filter())
    }

    /// Install the global subscriber
    #[cfg(feature = "cli")]
    pub fn init(self) -> anyhow::Result<()> {
        let filter = EnvFilter::try_new(self.filter_directive())?;

        // Per-image lines carry their file path, so module targets add nothing.
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_ansi(self.format.ansi())
            .with_target(false)
            .compact();
        Registry::default().with(filter).with(fmt_layer).try_init()?;

        if let Some(session_id) = &self.session_id {
            tracing::debug!(session_id = %session_id, "Mask merger session started");
        }

        Ok(())
    }
}

/// Install the CLI subscriber with a fresh session id
///
/// `RUST_LOG` overrides the `-v` count when set.
#[cfg(feature = "cli")]
pub fn init_cli_tracing(verbosity: u8, format: TracingFormat) -> anyhow::Result<()> {
    let mut config = TracingConfig::new()
        .with_verbosity(verbosity)
        .with_format(format)
        .with_session_id(uuid::Uuid::new_v4().to_string());

    if let Ok(filter) = std::env::var("RUST_LOG") {
        config = config.with_env_filter(filter);
    }

    config.init()
}

/// Span creation helpers for common operations
pub mod spans {
    use tracing::{Level, Span};

    /// Span for a whole batch run
    pub fn batch_processing(file_count: usize) -> Span {
        tracing::span!(Level::INFO, "batch_processing", file_count = %file_count)
    }

    /// Span for a single image
    pub fn file_processing(file_path: &std::path::Path) -> Span {
        tracing::span!(
            Level::DEBUG,
            "file_processing",
            file_path = %file_path.display()
        )
    }
}
