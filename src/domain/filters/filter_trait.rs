//! Filter trait definition.

use crate::domain::{FilterError, FilterOutput};

/// Trait for text filters.
///
/// A filter is configured once at construction and then called for every
/// span of an invocation, so `filter` must not depend on earlier calls.
pub trait TextFilter: Send + Sync {
    /// Transform `input`, decline it, or fail.
    fn filter(&self, input: &str) -> Result<FilterOutput, FilterError>;

    /// Status message when at least one span was replaced.
    fn success_message(&self) -> String {
        "FilterPipes: success".to_string()
    }

    /// Status message when the invocation failed.
    fn failure_message(&self, error: Option<&FilterError>) -> String {
        match error {
            Some(e) => format!("FilterPipes: command failed: {}", e),
            None => "FilterPipes: command failed".to_string(),
        }
    }

    /// Status message when nothing changed.
    fn nochange_message(&self) -> String {
        "FilterPipes: No change".to_string()
    }
}
