//! # Logging & Tracing Infrastructure
//!
//! Installs the global `tracing` subscriber for the engine:
//!
//! ```text
//! registry
//!   ├── EnvFilter        explicit filter > RUST_LOG > per-crate defaults
//!   ├── fmt layer        pretty | json | compact, to stdout
//!   └── SinkLayer        optional mirror into a host LoggerSink
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
//! use bridge_traits::logger::LogLevel;
//!
//! init_logging(
//!     LoggingConfig::default()
//!         .with_format(LogFormat::Compact)
//!         .with_level(LogLevel::Debug)
//!         .with_sink(host_sink),
//! )?;
//! tracing::info!("Engine started");
//! ```
//!
//! Access tokens never go into fields. Values that reach the sink still
//! pass through [`redact_if_sensitive`] unless redaction is turned off.

use crate::error::{Error, Result};

use bridge_traits::logger::{LogEntry, LogLevel, LoggerSink};
use core_async::runtime;

use std::fmt;
use std::sync::Arc;

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::{
    filter::EnvFilter,
    fmt::format::FmtSpan,
    layer::{Context, SubscriberExt},
    registry::LookupSpan,
    util::SubscriberInitExt,
    Layer,
};

/// Workspace crates, logged at the configured level.
const ENGINE_TARGETS: &[&str] = &[
    "release_sync_workspace",
    "core_runtime",
    "core_sync",
    "core_service",
    "provider_spotify",
    "bridge_desktop",
];

/// Transport crates, kept quiet unless asked for.
const TRANSPORT_TARGETS: &[&str] = &["h2", "hyper", "hyper_util", "reqwest", "rustls"];

const REDACTED: &str = "[REDACTED]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Multi-line, colored; for terminals.
    Pretty,
    /// One JSON object per event; for log shippers.
    Json,
    /// One line per event.
    Compact,
}

impl Default for LogFormat {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            LogFormat::Pretty
        } else {
            LogFormat::Json
        }
    }
}

#[derive(Clone)]
pub struct LoggingConfig {
    pub format: LogFormat,
    /// Level for workspace crates when no filter overrides it.
    pub level: LogLevel,
    /// Full `EnvFilter` directive string; wins over `RUST_LOG`.
    pub filter: Option<String>,
    /// Mask credential-like fields and emails before they reach the sink.
    pub redact: bool,
    pub sink: Option<Arc<dyn LoggerSink>>,
    /// Log span open/close (pretty) or attach span context (json).
    pub span_events: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            level: LogLevel::Info,
            filter: None,
            redact: true,
            sink: None,
            span_events: false,
        }
    }
}

impl fmt::Debug for LoggingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggingConfig")
            .field("format", &self.format)
            .field("level", &self.level)
            .field("filter", &self.filter)
            .field("redact", &self.redact)
            .field("sink", &self.sink.is_some())
            .field("span_events", &self.span_events)
            .finish()
    }
}

impl LoggingConfig {
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn with_redaction(mut self, redact: bool) -> Self {
        self.redact = redact;
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn LoggerSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn with_span_events(mut self, enabled: bool) -> Self {
        self.span_events = enabled;
        self
    }
}

/// Installs the global subscriber.
///
/// # Errors
///
/// `Error::Config` for an unparsable filter. `Error::Logging` when a global
/// subscriber is already installed, including by an earlier call.
pub fn init_logging(config: LoggingConfig) -> Result<()> {
    let filter = build_filter(&config)?;

    let output = match config.format {
        LogFormat::Pretty => tracing_subscriber::fmt::layer()
            .pretty()
            .with_span_events(if config.span_events {
                FmtSpan::NEW | FmtSpan::CLOSE
            } else {
                FmtSpan::NONE
            })
            .boxed(),
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_current_span(config.span_events)
            .with_span_list(false)
            .boxed(),
        LogFormat::Compact => tracing_subscriber::fmt::layer().compact().boxed(),
    };

    let sink = config.sink.map(|sink| SinkLayer {
        sink,
        redact: config.redact,
    });

    tracing_subscriber::registry()
        .with(output)
        .with(sink)
        .with(filter)
        .try_init()
        .map_err(|e| Error::Logging(e.to_string()))
}

fn default_directives(level: LogLevel) -> String {
    ENGINE_TARGETS
        .iter()
        .map(|target| format!("{}={}", target, level.as_str()))
        .chain(TRANSPORT_TARGETS.iter().map(|target| format!("{}=warn", target)))
        .collect::<Vec<_>>()
        .join(",")
}

fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    let directives = match &config.filter {
        Some(filter) => filter.clone(),
        None => match EnvFilter::try_from_default_env() {
            Ok(from_env) => return Ok(from_env),
            Err(_) => default_directives(config.level),
        },
    };

    EnvFilter::try_new(&directives)
        .map_err(|e| Error::Config(format!("Invalid log filter '{}': {}", directives, e)))
}

/// Mirrors events into a [`LoggerSink`].
struct SinkLayer {
    sink: Arc<dyn LoggerSink>,
    redact: bool,
}

impl SinkLayer {
    fn entry<S>(&self, event: &Event<'_>, ctx: &Context<'_, S>) -> Option<LogEntry>
    where
        S: Subscriber + for<'a> LookupSpan<'a>,
    {
        let metadata = event.metadata();
        let level = log_level(metadata.level());
        if level < self.sink.min_level() {
            return None;
        }

        let mut fields = FieldCollector::default();
        event.record(&mut fields);

        let message = fields
            .message
            .take()
            .unwrap_or_else(|| metadata.name().to_string());
        let mut entry = LogEntry::new(level, metadata.target(), message);

        for (name, value) in fields.values {
            let value = if self.redact {
                redact_if_sensitive(name, &value)
            } else {
                value
            };
            entry = entry.with_field(name, value);
        }

        if let Some(span) = ctx.event_span(event) {
            entry = entry.in_span(span.name());
        }
        Some(entry)
    }
}

impl<S> Layer<S> for SinkLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let Some(entry) = self.entry(event, &ctx) else {
            return;
        };
        let sink = Arc::clone(&self.sink);

        match runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = sink.log(entry).await {
                        eprintln!("Log sink rejected entry: {}", e);
                    }
                });
            }
            Err(_) => match runtime::block_on(sink.log(entry)) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => eprintln!("Log sink rejected entry: {}", e),
                Err(e) => eprintln!("Log sink unavailable: {}", e),
            },
        }
    }
}

#[derive(Default)]
struct FieldCollector {
    message: Option<String>,
    values: Vec<(&'static str, String)>,
}

impl Visit for FieldCollector {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        } else {
            self.values.push((field.name(), value.to_string()));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = Some(format!("{:?}", value));
        } else {
            self.values.push((field.name(), format!("{:?}", value)));
        }
    }
}

fn log_level(level: &Level) -> LogLevel {
    match *level {
        Level::TRACE => LogLevel::Trace,
        Level::DEBUG => LogLevel::Debug,
        Level::INFO => LogLevel::Info,
        Level::WARN => LogLevel::Warn,
        Level::ERROR => LogLevel::Error,
    }
}

/// Masks `value` when `field_name` looks like a credential, and keeps only
/// the first character of anything shaped like an email address.
///
/// ```
/// use core_runtime::logging::redact_if_sensitive;
///
/// assert_eq!(redact_if_sensitive("access_token", "BQDx9k"), "[REDACTED]");
/// assert_eq!(redact_if_sensitive("owner", "dj@example.com"), "d***@[REDACTED]");
/// assert_eq!(redact_if_sensitive("artist_id", "4Z8W4fKe"), "4Z8W4fKe");
/// ```
pub fn redact_if_sensitive(field_name: &str, value: &str) -> String {
    const CREDENTIAL_MARKERS: &[&str] = &[
        "token",
        "password",
        "secret",
        "api_key",
        "authorization",
        "bearer",
    ];

    let name = field_name.to_ascii_lowercase();
    if CREDENTIAL_MARKERS.iter().any(|marker| name.contains(marker)) {
        return REDACTED.to_string();
    }

    match value.split_once('@') {
        Some((local, domain)) if domain.contains('.') => {
            let first = local.chars().next().map(String::from).unwrap_or_default();
            format!("{}***@{}", first, REDACTED)
        }
        _ => value.to_string(),
    }
}
