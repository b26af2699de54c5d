//! Log sinks for statement events and diagnostics.
//!
//! The proxy and the rewriter never log through a global handle. They are
//! given an `Arc<dyn LogSink>` at construction:
//!
//! - [`TracingSink`] forwards to `tracing` (statements at `INFO`, diagnostics
//!   at their own level) and is what the agent installs.
//! - [`MemorySink`] keeps everything in memory, for tests and for embedders
//!   that want to inspect what was logged.

use parking_lot::Mutex;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::Level;

const OPEN_BANNER_LEFT: usize = 27;
const OPEN_BANNER_RIGHT: usize = 28;
const CLOSE_BANNER: usize = 62;

/// One execution of a prepared statement, with its reconstructed literal text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatementEvent {
    /// Operation that triggered the event, e.g. `execute_query()`.
    pub operation: String,
    /// Command template with every bound placeholder substituted.
    pub literal_sql: String,
}

impl StatementEvent {
    pub fn new(operation: impl Into<String>, literal_sql: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            literal_sql: literal_sql.into(),
        }
    }

    /// Render the event framed by banner lines:
    ///
    /// ```text
    ///
    /// +++++++++++++++++++++++++++execute_query()++++++++++++++++++++++++++++
    /// SELECT * FROM t WHERE id=42
    /// ++++++++++++++++++++++++++++++++++++++++++++++++++++++++++++++
    /// ```
    pub fn banner(&self) -> String {
        format!(
            "\n{}{}{}\n{}\n{}",
            "+".repeat(OPEN_BANNER_LEFT),
            self.operation,
            "+".repeat(OPEN_BANNER_RIGHT),
            self.literal_sql,
            "+".repeat(CLOSE_BANNER)
        )
    }
}

impl fmt::Display for StatementEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.banner())
    }
}

/// A bookkeeping message that never affects the delegated call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub level: Level,
    pub message: String,
}

impl Diagnostic {
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }

    pub fn debug(message: impl Into<String>) -> Self {
        Self::new(Level::DEBUG, message)
    }

    pub fn warn(message: impl Into<String>) -> Self {
        Self::new(Level::WARN, message)
    }
}

/// Destination for statement events and diagnostics.
///
/// Implementations must not panic; callers treat logging as best effort.
pub trait LogSink: Send + Sync {
    fn statement(&self, event: &StatementEvent);

    fn diagnostic(&self, diagnostic: &Diagnostic);
}

impl<T: LogSink + ?Sized> LogSink for Arc<T> {
    fn statement(&self, event: &StatementEvent) {
        (**self).statement(event)
    }

    fn diagnostic(&self, diagnostic: &Diagnostic) {
        (**self).diagnostic(diagnostic)
    }
}

/// Forwards to the `tracing` macros.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl TracingSink {
    pub fn shared() -> Arc<dyn LogSink> {
        Arc::new(TracingSink)
    }
}

impl LogSink for TracingSink {
    fn statement(&self, event: &StatementEvent) {
        tracing::info!(
            target: "sqlspy::statement",
            operation = %event.operation,
            "{}",
            event.banner()
        );
    }

    fn diagnostic(&self, diagnostic: &Diagnostic) {
        let message = diagnostic.message.as_str();
        match diagnostic.level {
            Level::ERROR => tracing::error!(target: "sqlspy::diagnostic", "{}", message),
            Level::WARN => tracing::warn!(target: "sqlspy::diagnostic", "{}", message),
            Level::INFO => tracing::info!(target: "sqlspy::diagnostic", "{}", message),
            Level::DEBUG => tracing::debug!(target: "sqlspy::diagnostic", "{}", message),
            _ => tracing::trace!(target: "sqlspy::diagnostic", "{}", message),
        }
    }
}

/// Records every event in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    statements: Mutex<Vec<StatementEvent>>,
    diagnostics: Mutex<Vec<Diagnostic>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<MemorySink> {
        Arc::new(Self::new())
    }

    pub fn statements(&self) -> Vec<StatementEvent> {
        self.statements.lock().clone()
    }

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.lock().clone()
    }

    /// Literal SQL of every recorded statement, in order.
    pub fn literal_sql(&self) -> Vec<String> {
        self.statements
            .lock()
            .iter()
            .map(|e| e.literal_sql.clone())
            .collect()
    }

    pub fn clear(&self) {
        self.statements.lock().clear();
        self.diagnostics.lock().clear();
    }
}

impl LogSink for MemorySink {
    fn statement(&self, event: &StatementEvent) {
        self.statements.lock().push(event.clone());
    }

    fn diagnostic(&self, diagnostic: &Diagnostic) {
        self.diagnostics.lock().push(diagnostic.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_banner_layout() {
        let event = StatementEvent::new("execute_query()", "SELECT 1");
        let banner = event.banner();
        let lines: Vec<&str> = banner.split('\n').collect();

        assert_eq!(lines.len(), 4, "leading newline + three lines");
        assert_eq!(lines[0], "");
        assert_eq!(
            lines[1],
            format!("{}execute_query(){}", "+".repeat(27), "+".repeat(28))
        );
        assert_eq!(lines[2], "SELECT 1");
        assert_eq!(lines[3], "+".repeat(62));
    }

    #[test]
    fn test_memory_sink_records_in_order() {
        let sink = MemorySink::shared();
        let dyn_sink: Arc<dyn LogSink> = sink.clone();

        dyn_sink.statement(&StatementEvent::new("execute()", "a"));
        dyn_sink.diagnostic(&Diagnostic::debug("formatting failed"));
        dyn_sink.statement(&StatementEvent::new("execute()", "b"));

        assert_eq!(sink.literal_sql(), vec!["a", "b"]);
        assert_eq!(sink.diagnostics().len(), 1);
        assert_eq!(sink.diagnostics()[0].level, Level::DEBUG);

        sink.clear();
        assert!(sink.statements().is_empty());
        assert!(sink.diagnostics().is_empty());
    }

    #[test]
    fn test_tracing_sink_without_subscriber_is_silent() {
        let sink = TracingSink::shared();
        sink.statement(&StatementEvent::new("execute()", "SELECT 1"));
        sink.diagnostic(&Diagnostic::warn("nothing listening"));
    }
}
