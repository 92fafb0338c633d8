//! Host buffer contract and the in-memory document used by the CLI host.
//!
//! Offsets are character indices, matching how editors address selections.

use ropey::Rope;
use tracing::debug;

use crate::domain::Span;

/// Document-like text storage that a filter invocation reads and edits.
///
/// Replacements are issued between [`begin_edit`](TextBuffer::begin_edit) and
/// [`end_edit`](TextBuffer::end_edit); hosts treat that bracket as one undoable
/// transaction.
pub trait TextBuffer {
    /// Current selections, in document order.
    fn selections(&self) -> Vec<Span>;

    /// Document length in characters.
    fn size(&self) -> usize;

    /// Text covered by `span`.
    fn substr(&self, span: Span) -> String;

    /// Open an edit transaction.
    fn begin_edit(&mut self);

    /// Replace the text covered by `span`. Only valid inside an edit transaction.
    fn replace(&mut self, span: Span, text: &str);

    /// Close the edit transaction opened by `begin_edit`.
    fn end_edit(&mut self);
}

/// Rope-backed document with a selection set.
#[derive(Debug, Clone, Default)]
pub struct DocumentBuffer {
    rope: Rope,
    selections: Vec<Span>,
    in_edit: bool,
    transactions: usize,
}

impl DocumentBuffer {
    /// Create a document without selections.
    pub fn new(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
            selections: Vec::new(),
            in_edit: false,
            transactions: 0,
        }
    }

    /// Create a document with the given selections.
    ///
    /// Selections are clamped to the document, sorted by start offset, and
    /// merged where they overlap.
    pub fn with_selections(text: &str, selections: Vec<Span>) -> Self {
        let mut buffer = Self::new(text);
        buffer.set_selections(selections);
        buffer
    }

    fn set_selections(&mut self, selections: Vec<Span>) {
        let size = self.size();
        let clamped = selections
            .into_iter()
            .map(|s| Span::new(s.start.min(size), s.end.min(size)))
            .collect();
        self.selections = Span::merge_overlapping(clamped);
    }

    /// Number of completed edit transactions.
    #[cfg(test)]
    pub fn transactions(&self) -> usize {
        self.transactions
    }

    pub fn text(&self) -> String {
        self.rope.to_string()
    }
}

impl TextBuffer for DocumentBuffer {
    fn selections(&self) -> Vec<Span> {
        self.selections.clone()
    }

    fn size(&self) -> usize {
        self.rope.len_chars()
    }

    fn substr(&self, span: Span) -> String {
        let size = self.size();
        let start = span.start.min(size);
        let end = span.end.min(size);
        self.rope.slice(start..end).to_string()
    }

    fn begin_edit(&mut self) {
        debug_assert!(!self.in_edit, "nested edit transaction");
        self.in_edit = true;
    }

    fn replace(&mut self, span: Span, text: &str) {
        debug_assert!(self.in_edit, "replace outside edit transaction");
        let size = self.size();
        let start = span.start.min(size);
        let end = span.end.min(size);
        self.rope.remove(start..end);
        self.rope.insert(start, text);
    }

    fn end_edit(&mut self) {
        self.in_edit = false;
        self.transactions += 1;
        debug!("Edit transaction {} committed", self.transactions);
    }
}
