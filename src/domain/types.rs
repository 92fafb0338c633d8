//! Core domain types for filter invocations.

use std::fmt;
use std::str::FromStr;

/// Half-open character range `[start, end)` over a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    /// Create a span, swapping the bounds if they are reversed.
    pub fn new(start: usize, end: usize) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Sort spans and merge the ones that overlap.
    ///
    /// Spans that only touch (`a.end == b.start`) stay separate; exact
    /// duplicates collapse into one.
    pub fn merge_overlapping(mut spans: Vec<Span>) -> Vec<Span> {
        spans.sort();
        let mut merged: Vec<Span> = Vec::with_capacity(spans.len());
        for span in spans {
            match merged.last_mut() {
                Some(last) if span.start < last.end => last.end = last.end.max(span.end),
                Some(last) if *last == span => {}
                _ => merged.push(span),
            }
        }
        merged
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start, self.end)
    }
}

impl FromStr for Span {
    type Err = String;

    /// Parse `START:END` or `START..END`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (start, end) = s
            .split_once(':')
            .or_else(|| s.split_once(".."))
            .ok_or_else(|| format!("expected START:END, got '{}'", s))?;
        let start = start
            .trim()
            .parse::<usize>()
            .map_err(|e| format!("invalid span start '{}': {}", start, e))?;
        let end = end
            .trim()
            .parse::<usize>()
            .map_err(|e| format!("invalid span end '{}': {}", end, e))?;
        Ok(Span::new(start, end))
    }
}

/// A computed replacement, pending commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    pub span: Span,
    pub text: String,
}

/// Result of running a filter over one piece of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterOutput {
    /// The filter chose not to operate on this text.
    Decline,
    /// The filter ran and produced identical text.
    Unchanged,
    /// The filter produced new text.
    Changed(String),
}

impl FilterOutput {
    /// Classify a filter result against the text it was computed from.
    pub fn compare(original: &str, filtered: String) -> Self {
        if filtered == original {
            FilterOutput::Unchanged
        } else {
            FilterOutput::Changed(filtered)
        }
    }

    /// Map an optional result, `None` meaning decline.
    pub fn from_option(original: &str, filtered: Option<String>) -> Self {
        match filtered {
            Some(text) => Self::compare(original, text),
            None => FilterOutput::Decline,
        }
    }
}

/// Per-span outcome of an invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanOutcome {
    Unchanged,
    Replaced,
    Failed,
}

/// Invocation-wide classification of the per-span outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateResult {
    Success,
    NoChange,
    Failure,
}

impl AggregateResult {
    /// Failure wins over everything, then any replacement means success.
    pub fn from_outcomes<'a, I>(outcomes: I) -> Self
    where
        I: IntoIterator<Item = &'a SpanOutcome>,
    {
        let mut replaced = false;
        for outcome in outcomes {
            match outcome {
                SpanOutcome::Failed => return AggregateResult::Failure,
                SpanOutcome::Replaced => replaced = true,
                SpanOutcome::Unchanged => {}
            }
        }
        if replaced {
            AggregateResult::Success
        } else {
            AggregateResult::NoChange
        }
    }

    /// Get exit code for this result.
    ///
    /// - Success / NoChange: 0
    /// - Failure: 1
    pub fn exit_code(&self) -> i32 {
        match self {
            AggregateResult::Success | AggregateResult::NoChange => 0,
            AggregateResult::Failure => 1,
        }
    }
}
