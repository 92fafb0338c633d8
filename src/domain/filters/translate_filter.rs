//! Character translation filter, like the `tr` shell command.

use std::collections::HashMap;

use super::{FilterArgs, TextFilter};
use crate::domain::{FilterError, FilterOutput};

/// Maps every character of `before` to the character at the same index in `after`.
#[derive(Debug, Clone)]
pub struct TranslateFilter {
    table: Option<HashMap<char, char>>,
}

impl TranslateFilter {
    pub const ID: &'static str = "translate";
    const OPTIONS: &'static [&'static str] = &["before", "after"];

    /// Create a new TranslateFilter.
    ///
    /// Extra characters in the longer of the two strings are ignored.
    /// The filter declines when either string is empty.
    pub fn new(before: &str, after: &str) -> Self {
        if before.is_empty() || after.is_empty() {
            return Self { table: None };
        }
        let table = before.chars().zip(after.chars()).collect();
        Self { table: Some(table) }
    }

    pub fn from_args(args: &FilterArgs) -> Result<Self, FilterError> {
        args.reject_unknown(Self::ID, Self::OPTIONS)?;
        let before = args.get_str("before")?.unwrap_or_default();
        let after = args.get_str("after")?.unwrap_or_default();
        Ok(Self::new(&before, &after))
    }
}

impl TextFilter for TranslateFilter {
    fn filter(&self, input: &str) -> Result<FilterOutput, FilterError> {
        let Some(table) = &self.table else {
            return Ok(FilterOutput::Decline);
        };
        let translated: String = input
            .chars()
            .map(|c| table.get(&c).copied().unwrap_or(c))
            .collect();
        Ok(FilterOutput::compare(input, translated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swap_quotes() {
        let filter = TranslateFilter::new("'\"", "\"'");
        assert_eq!(
            filter.filter(r#"say 'hi' and "bye""#).unwrap(),
            FilterOutput::Changed(r#"say "hi" and 'bye'"#.to_string())
        );
    }

    #[test]
    fn test_straight_quotes() {
        let filter = TranslateFilter::new("\u{201c}\u{201d}\u{2018}\u{2019}", "\"\"''");
        assert_eq!(
            filter.filter("\u{201c}it\u{2019}s\u{201d}").unwrap(),
            FilterOutput::Changed("\"it's\"".to_string())
        );
    }

    #[test]
    fn test_untouched_characters_pass_through() {
        let filter = TranslateFilter::new("abc", "xyz");
        assert_eq!(
            filter.filter("a-b-c-d").unwrap(),
            FilterOutput::Changed("x-y-z-d".to_string())
        );
        assert_eq!(filter.filter("def").unwrap(), FilterOutput::Unchanged);
    }

    #[test]
    fn test_empty_tables_decline() {
        assert_eq!(
            TranslateFilter::new("", "x").filter("abc").unwrap(),
            FilterOutput::Decline
        );
        assert_eq!(
            TranslateFilter::new("a", "").filter("abc").unwrap(),
            FilterOutput::Decline
        );
        let unset = TranslateFilter::from_args(&FilterArgs::new()).unwrap();
        assert_eq!(unset.filter("abc").unwrap(), FilterOutput::Decline);
    }

    #[test]
    fn test_unequal_lengths_use_shorter() {
        let filter = TranslateFilter::new("abc", "x");
        assert_eq!(
            filter.filter("abc").unwrap(),
            FilterOutput::Changed("xbc".to_string())
        );
    }
}
