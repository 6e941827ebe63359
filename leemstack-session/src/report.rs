//! Report sinks: where a session sends user-facing messages.
//!
//! The session borrows one sink for its whole lifetime instead of writing
//! to a process-wide stream.

use std::sync::{Mutex, PoisonError};

use log::Level;

/// Receives messages a collaborator should show to the user.
pub trait ReportSink {
    /// Records one message.
    fn report(&self, level: Level, message: &str);

    /// Informational message.
    fn info(&self, message: &str) {
        self.report(Level::Info, message);
    }

    /// Non-fatal adjustment or rejected request.
    fn warn(&self, message: &str) {
        self.report(Level::Warn, message);
    }

    /// Failed operation.
    fn error(&self, message: &str) {
        self.report(Level::Error, message);
    }
}

/// Forwards reports to the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl ReportSink for LogSink {
    fn report(&self, level: Level, message: &str) {
        log::log!(target: "leemstack::session", level, "{message}");
    }
}

/// One recorded report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub level: Level,
    pub message: String,
}

/// Keeps every report in memory, in arrival order.
#[derive(Debug, Default)]
pub struct MemorySink {
    reports: Mutex<Vec<Report>>,
}

impl MemorySink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything recorded so far.
    #[must_use]
    pub fn reports(&self) -> Vec<Report> {
        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Most recent report at `level` or more severe.
    #[must_use]
    pub fn last_at(&self, level: Level) -> Option<Report> {
        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .rev()
            .find(|r| r.level <= level)
            .cloned()
    }

    /// Removes and returns all recorded reports.
    pub fn drain(&self) -> Vec<Report> {
        std::mem::take(&mut *self.reports.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl ReportSink for MemorySink {
    fn report(&self, level: Level, message: &str) {
        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Report {
                level,
                message: message.to_string(),
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink_records_in_order() {
        let sink = MemorySink::new();
        sink.info("loaded");
        sink.warn("window adjusted");
        sink.error("bad pixel");
        let reports = sink.reports();
        assert_eq!(reports.len(), 3);
        assert_eq!(reports[0].level, Level::Info);
        assert_eq!(reports[2].message, "bad pixel");
    }

    #[test]
    fn test_last_at_filters_by_severity() {
        let sink = MemorySink::new();
        sink.error("first failure");
        sink.info("later info");
        assert_eq!(sink.last_at(Level::Warn).unwrap().message, "first failure");
        assert_eq!(sink.last_at(Level::Info).unwrap().message, "later info");
        assert_eq!(sink.drain().len(), 2);
        assert!(sink.reports().is_empty());
    }
}
