//! Diagnostics sink injected into the engine
//!
//! The engine never panics or returns errors from bind / unbind / remove.
//! Recoverable failures are reported here instead and forwarded to `tracing`
//! under the `bindery` target, filtered by a plain [`LogLevel`].

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Verbosity of the diagnostics sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Report nothing
    None,
    /// Report informational messages and errors
    #[default]
    Info,
    /// Report errors only
    Error,
}

impl LogLevel {
    fn allows(self, message: LogLevel) -> bool {
        match self {
            Self::None => false,
            Self::Info => message != Self::None,
            Self::Error => message == Self::Error,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::None => "none",
            Self::Info => "info",
            Self::Error => "error",
        })
    }
}

type Sink = Arc<dyn Fn(LogLevel, &str) + Send + Sync>;

/// Filtered diagnostics with an optional extra sink
#[derive(Clone, Default)]
pub struct Diagnostics {
    level: LogLevel,
    sink: Option<Sink>,
}

impl Diagnostics {
    #[must_use]
    pub fn new(level: LogLevel) -> Self {
        Self { level, sink: None }
    }

    /// Also deliver every reported message to `sink`
    #[must_use]
    pub fn with_sink(mut self, sink: impl Fn(LogLevel, &str) + Send + Sync + 'static) -> Self {
        self.sink = Some(Arc::new(sink));
        self
    }

    #[must_use]
    pub fn level(&self) -> LogLevel {
        self.level
    }

    pub fn info(&self, message: impl fmt::Display) {
        if !self.level.allows(LogLevel::Info) {
            return;
        }
        let message = message.to_string();
        tracing::info!(target: "bindery", "{message}");
        if let Some(sink) = &self.sink {
            sink(LogLevel::Info, &message);
        }
    }

    pub fn error(&self, message: impl fmt::Display) {
        if !self.level.allows(LogLevel::Error) {
            return;
        }
        let message = message.to_string();
        tracing::error!(target: "bindery", "{message}");
        if let Some(sink) = &self.sink {
            sink(LogLevel::Error, &message);
        }
    }
}

impl fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diagnostics")
            .field("level", &self.level)
            .field("has_sink", &self.sink.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn recording(level: LogLevel) -> (Diagnostics, Arc<Mutex<Vec<(LogLevel, String)>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let diagnostics =
            Diagnostics::new(level).with_sink(move |lvl, msg| sink.lock().unwrap().push((lvl, msg.to_string())));
        (diagnostics, seen)
    }

    #[test]
    fn test_info_level_reports_everything() {
        let (diagnostics, seen) = recording(LogLevel::Info);
        diagnostics.info("a");
        diagnostics.error("b");
        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_error_level_drops_info() {
        let (diagnostics, seen) = recording(LogLevel::Error);
        diagnostics.info("a");
        diagnostics.error("b");
        assert_eq!(*seen.lock().unwrap(), vec![(LogLevel::Error, "b".to_string())]);
    }

    #[test]
    fn test_none_level_is_silent() {
        let (diagnostics, seen) = recording(LogLevel::None);
        diagnostics.info("a");
        diagnostics.error("b");
        assert!(seen.lock().unwrap().is_empty());
    }
}
