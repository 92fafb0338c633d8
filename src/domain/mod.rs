//! Domain layer containing core business logic.
//!
//! This module contains:
//! - Span, outcome and result types for filter invocations
//! - The text filter trait, built-in filters and their registry
//! - The host buffer contract and region replacer
//! - Outcome reporting
//! - Logger with rotation

mod buffer;
mod error;
pub mod filters;
pub mod logger;
mod replacer;
mod reporting;
mod types;

pub use buffer::{DocumentBuffer, TextBuffer};
pub use error::FilterError;
pub use replacer::{RegionReplacer, ReplaceReport};
#[cfg(test)]
pub use reporting::RecordedStatus;
pub use reporting::{ReportingPolicy, StatusSink, StderrStatus};
pub use types::{AggregateResult, FilterOutput, Replacement, Span, SpanOutcome};
