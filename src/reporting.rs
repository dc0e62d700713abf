//! Error sink for non-fatal sync failures.
//!
//! Reports are fire-and-forget: sinks must not fail or panic.

use std::collections::BTreeMap;
use std::sync::Mutex;

/// A single failure report
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorReport {
    pub message: String,
    pub tags: BTreeMap<String, String>,
    pub extra: BTreeMap<String, String>,
    pub include_stack: bool,
}

impl ErrorReport {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    pub fn with_stack(mut self) -> Self {
        self.include_stack = true;
        self
    }
}

pub trait ErrorSink: Send + Sync {
    fn report(&self, report: ErrorReport);
}

/// Emits every report as a `tracing` warning.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl ErrorSink for TracingSink {
    fn report(&self, report: ErrorReport) {
        let error = report.extra.get("error").map(String::as_str).unwrap_or("");
        if report.include_stack {
            let backtrace = std::backtrace::Backtrace::capture();
            tracing::warn!(
                tags = ?report.tags,
                extra = ?report.extra,
                %backtrace,
                "{}: {}",
                report.message,
                error
            );
        } else {
            tracing::warn!(tags = ?report.tags, extra = ?report.extra, "{}: {}", report.message, error);
        }
    }
}

/// Keeps reports in memory so callers can inspect them after a sync.
#[derive(Debug, Default)]
pub struct RecordingSink {
    reports: Mutex<Vec<ErrorReport>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<ErrorReport> {
        match self.reports.lock() {
            Ok(reports) => reports.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Reports tagged with the given playlist id
    pub fn reports_for(&self, playlist_id: &str) -> Vec<ErrorReport> {
        self.reports()
            .into_iter()
            .filter(|r| r.tags.get("playlistId").map(String::as_str) == Some(playlist_id))
            .collect()
    }

    pub fn clear(&self) {
        match self.reports.lock() {
            Ok(mut reports) => reports.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
    }
}

impl ErrorSink for RecordingSink {
    fn report(&self, report: ErrorReport) {
        match self.reports.lock() {
            Ok(mut reports) => reports.push(report),
            Err(poisoned) => poisoned.into_inner().push(report),
        }
    }
}
