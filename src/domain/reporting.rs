//! User-facing outcome messages.

#[cfg(test)]
use std::sync::Mutex;

use crate::domain::filters::TextFilter;
use crate::domain::{AggregateResult, ReplaceReport};

/// Where status messages are shown (an editor's status bar, stderr, ...).
pub trait StatusSink {
    fn status_message(&self, message: &str);
}

/// Writes status messages to stderr.
pub struct StderrStatus {
    quiet: bool,
}

impl StderrStatus {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }
}

impl StatusSink for StderrStatus {
    fn status_message(&self, message: &str) {
        if !self.quiet {
            eprintln!("{}", message);
        }
    }
}

/// Keeps every message for later inspection.
#[cfg(test)]
#[derive(Default)]
pub struct RecordedStatus {
    messages: Mutex<Vec<String>>,
}

#[cfg(test)]
impl RecordedStatus {
    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
impl StatusSink for RecordedStatus {
    fn status_message(&self, message: &str) {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push(message.to_string());
        }
    }
}

/// Which outcomes produce a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportingPolicy {
    pub report_success: bool,
    pub report_failure: bool,
    pub report_nochange: bool,
}

impl Default for ReportingPolicy {
    fn default() -> Self {
        Self {
            report_success: true,
            report_failure: true,
            report_nochange: true,
        }
    }
}

impl ReportingPolicy {
    /// Message for `report`, or `None` when that category is switched off.
    pub fn message(&self, report: &ReplaceReport, filter: &dyn TextFilter) -> Option<String> {
        match report.result {
            AggregateResult::Failure if self.report_failure => {
                Some(filter.failure_message(report.error.as_ref()))
            }
            AggregateResult::NoChange if self.report_nochange => Some(filter.nochange_message()),
            AggregateResult::Success if self.report_success => Some(filter.success_message()),
            _ => None,
        }
    }

    /// Show the message for `report`, if any. Returns whether one was shown.
    pub fn report(
        &self,
        report: &ReplaceReport,
        filter: &dyn TextFilter,
        status: &dyn StatusSink,
    ) -> bool {
        match self.message(report, filter) {
            Some(message) => {
                status.status_message(&message);
                true
            }
            None => false,
        }
    }
}
