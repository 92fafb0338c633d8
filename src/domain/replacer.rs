//! Applies a filter to every selected region of a buffer.

use tracing::{debug, warn};

use crate::domain::filters::TextFilter;
use crate::domain::{
    AggregateResult, FilterError, FilterOutput, Replacement, Span, SpanOutcome, TextBuffer,
};

/// Outcome of one replace operation.
#[derive(Debug)]
pub struct ReplaceReport {
    pub result: AggregateResult,
    /// Outcomes of the spans that were processed, in document order
    pub outcomes: Vec<SpanOutcome>,
    /// The failure that stopped processing, if any
    pub error: Option<FilterError>,
    /// Number of replacements written to the buffer
    pub committed: usize,
}

/// Runs a filter over the selected spans and commits the results.
#[derive(Debug, Clone, Copy)]
pub struct RegionReplacer {
    use_selections: bool,
}

impl RegionReplacer {
    /// Create a new RegionReplacer. With `use_selections` off the whole
    /// document is always a single span.
    pub fn new(use_selections: bool) -> Self {
        Self { use_selections }
    }

    /// Spans to process: the non-empty selections, or the whole document.
    ///
    /// Overlapping selections are merged so that no character is filtered
    /// twice.
    pub fn regions<B: TextBuffer + ?Sized>(&self, buffer: &B) -> Vec<Span> {
        let mut regions: Vec<Span> = Vec::new();
        if self.use_selections {
            regions = Span::merge_overlapping(
                buffer
                    .selections()
                    .into_iter()
                    .filter(|s| !s.is_empty())
                    .collect(),
            );
        }
        if regions.is_empty() {
            regions.push(Span::new(0, buffer.size()));
        }
        regions
    }

    /// Filter every region and commit the replacements in one edit.
    ///
    /// All spans are computed against the unmodified buffer. If any span
    /// fails, processing stops and nothing is committed.
    pub fn apply<B: TextBuffer + ?Sized>(
        &self,
        buffer: &mut B,
        filter: &dyn TextFilter,
    ) -> ReplaceReport {
        let regions = self.regions(buffer);
        let mut outcomes = Vec::with_capacity(regions.len());
        let mut replacements: Vec<Replacement> = Vec::new();

        for span in regions {
            let existing = buffer.substr(span);
            match filter.filter(&existing) {
                Ok(FilterOutput::Decline) => {
                    debug!("Filter declined span {}", span);
                    outcomes.push(SpanOutcome::Unchanged);
                }
                Ok(FilterOutput::Unchanged) => {
                    debug!("Span {} unchanged", span);
                    outcomes.push(SpanOutcome::Unchanged);
                }
                Ok(FilterOutput::Changed(text)) => {
                    // A filter may report a change that is byte-identical.
                    if text == existing {
                        outcomes.push(SpanOutcome::Unchanged);
                    } else {
                        outcomes.push(SpanOutcome::Replaced);
                        replacements.push(Replacement { span, text });
                    }
                }
                Err(e) => {
                    warn!("Filter failed on span {}: {}", span, e);
                    outcomes.push(SpanOutcome::Failed);
                    return ReplaceReport {
                        result: AggregateResult::Failure,
                        outcomes,
                        error: Some(e),
                        committed: 0,
                    };
                }
            }
        }

        let committed = Self::commit(buffer, replacements);
        ReplaceReport {
            result: AggregateResult::from_outcomes(&outcomes),
            outcomes,
            error: None,
            committed,
        }
    }

    /// Write replacements highest offset first, so edits never shift the
    /// offsets of spans still waiting to be written.
    fn commit<B: TextBuffer + ?Sized>(buffer: &mut B, mut replacements: Vec<Replacement>) -> usize {
        if replacements.is_empty() {
            return 0;
        }
        replacements.sort_by_key(|r| std::cmp::Reverse(r.span.start));

        buffer.begin_edit();
        for replacement in &replacements {
            buffer.replace(replacement.span, &replacement.text);
        }
        buffer.end_edit();

        debug!("Committed {} replacement(s)", replacements.len());
        replacements.len()
    }
}
