//! Identifier case conversions and word reversal.

use super::{FilterArgs, TextFilter};
use crate::domain::{FilterError, FilterOutput};

/// Converts `words_with_underscores` to CamelCase or mixedCase.
#[derive(Debug, Clone)]
pub struct CamelCaseFilter {
    initial_caps: bool,
}

impl CamelCaseFilter {
    pub const ID: &'static str = "camel_case";
    const OPTIONS: &'static [&'static str] = &["initial_caps"];

    pub fn new(initial_caps: bool) -> Self {
        Self { initial_caps }
    }

    pub fn from_args(args: &FilterArgs) -> Result<Self, FilterError> {
        args.reject_unknown(Self::ID, Self::OPTIONS)?;
        Ok(Self::new(args.get_bool("initial_caps")?.unwrap_or(true)))
    }

    fn convert(&self, data: &str) -> String {
        let mut next_upper = self.initial_caps;
        let mut out = String::with_capacity(data.len());
        for c in data.chars() {
            if c == '_' {
                next_upper = true;
            } else if c.is_lowercase() {
                if next_upper {
                    out.extend(c.to_uppercase());
                } else {
                    out.push(c);
                }
                next_upper = false;
            } else {
                next_upper = self.initial_caps && !c.is_alphanumeric();
                out.push(c);
            }
        }
        out
    }
}

impl TextFilter for CamelCaseFilter {
    fn filter(&self, input: &str) -> Result<FilterOutput, FilterError> {
        Ok(FilterOutput::compare(input, self.convert(input)))
    }
}

/// Converts CamelCase to `words_with_underscores`.
#[derive(Debug, Clone)]
pub struct SnakeCaseFilter;

impl SnakeCaseFilter {
    pub const ID: &'static str = "snake_case";

    pub fn from_args(args: &FilterArgs) -> Result<Self, FilterError> {
        args.reject_unknown(Self::ID, &[])?;
        Ok(Self)
    }

    fn convert(data: &str) -> String {
        let mut prev_lower = false;
        let mut out = String::with_capacity(data.len() + data.len() / 4);
        for c in data.chars() {
            if c.is_uppercase() {
                if prev_lower {
                    out.push('_');
                }
                out.extend(c.to_lowercase());
                prev_lower = false;
            } else if c.is_lowercase() {
                prev_lower = true;
                out.push(c);
            } else {
                prev_lower = false;
                out.push(c);
            }
        }
        out
    }
}

impl TextFilter for SnakeCaseFilter {
    fn filter(&self, input: &str) -> Result<FilterOutput, FilterError> {
        Ok(FilterOutput::compare(input, Self::convert(input)))
    }
}

/// Reverses the order of space-separated words.
///
/// Splits on the space character only, so runs of spaces and other
/// whitespace stay where they are as empty or compound tokens.
#[derive(Debug, Clone)]
pub struct ReverseWordsFilter;

impl ReverseWordsFilter {
    pub const ID: &'static str = "reverse_words";

    pub fn from_args(args: &FilterArgs) -> Result<Self, FilterError> {
        args.reject_unknown(Self::ID, &[])?;
        Ok(Self)
    }
}

impl TextFilter for ReverseWordsFilter {
    fn filter(&self, input: &str) -> Result<FilterOutput, FilterError> {
        let reversed = input.split(' ').rev().collect::<Vec<_>>().join(" ");
        Ok(FilterOutput::compare(input, reversed))
    }
}
