//! Query log sink.
//!
//! Statement lines (one debug line per statement, one error line per
//! exhausted statement) go through a [`LogSink`]. The default sink forwards
//! them to `tracing` under the `crudkit::query` target. Lifecycle events such
//! as reconnects and retries are traced directly by the engine.

use std::fmt;

/// Severity of a sink entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => f.write_str("debug"),
            LogLevel::Error => f.write_str("error"),
        }
    }
}

/// Receiver for query log lines.
pub trait LogSink: Send + Sync {
    fn log(&self, level: LogLevel, message: &str);
}

/// Forwards entries to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn log(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Debug => tracing::debug!(target: "crudkit::query", "{}", message),
            LogLevel::Error => tracing::error!(target: "crudkit::query", "{}", message),
        }
    }
}

impl<S: LogSink + ?Sized> LogSink for std::sync::Arc<S> {
    fn log(&self, level: LogLevel, message: &str) {
        (**self).log(level, message);
    }
}
