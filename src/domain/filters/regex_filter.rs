//! Regular expression substitution filter.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use regex::{Captures, Regex, RegexBuilder};

use super::{FilterArgs, TextFilter};
use crate::domain::{FilterError, FilterOutput};

/// Computes the replacement text for one match.
pub type ReplaceFn = Arc<dyn Fn(&Captures<'_>) -> String + Send + Sync>;

/// Replacement applied to each match.
#[derive(Clone)]
pub enum RegexReplacement {
    /// Expansion template in `regex` syntax (`$1`, `${name}`)
    Template(String),
    /// Function of the match
    Function(ReplaceFn),
}

impl fmt::Debug for RegexReplacement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegexReplacement::Template(t) => f.debug_tuple("Template").field(t).finish(),
            RegexReplacement::Function(_) => f.write_str("Function(..)"),
        }
    }
}

impl RegexReplacement {
    /// Build a template from backslash-style backreferences.
    ///
    /// Accepts `\1`..`\99`, `\g<1>`, `\g<name>`, octal escapes (`\0`,
    /// `\012`), and `\a \b \f \n \r \t \v \\`. Other ASCII letters after a
    /// backslash are errors. Everything else, including `$`, is literal.
    pub fn from_backslash_template(template: &str) -> Result<Self, FilterError> {
        Ok(RegexReplacement::Template(convert_template(template)?))
    }

    pub fn function<F>(f: F) -> Self
    where
        F: Fn(&Captures<'_>) -> String + Send + Sync + 'static,
    {
        RegexReplacement::Function(Arc::new(f))
    }
}

/// Global regex substitution.
#[derive(Debug, Clone)]
pub struct RegexFilter {
    regex: Option<Regex>,
    replacement: Option<RegexReplacement>,
    count: usize,
}

impl RegexFilter {
    pub const ID: &'static str = "regex";
    const OPTIONS: &'static [&'static str] =
        &["regex", "replacement", "count", "lines", "ignore_case"];

    /// Create a new RegexFilter.
    ///
    /// `count` limits the number of substitutions, 0 meaning unlimited.
    /// With `lines`, `^` and `$` match at every line boundary.
    ///
    /// # Errors
    ///
    /// Returns error if the pattern is not a valid regex.
    pub fn new(
        pattern: &str,
        replacement: RegexReplacement,
        count: usize,
        lines: bool,
    ) -> Result<Self, FilterError> {
        Self::build(Some(pattern), Some(replacement), count, lines, false)
    }

    fn build(
        pattern: Option<&str>,
        replacement: Option<RegexReplacement>,
        count: usize,
        lines: bool,
        ignore_case: bool,
    ) -> Result<Self, FilterError> {
        let regex = pattern
            .map(|p| {
                RegexBuilder::new(p)
                    .multi_line(lines)
                    .case_insensitive(ignore_case)
                    .build()
            })
            .transpose()?;
        if let (Some(regex), Some(RegexReplacement::Template(t))) = (&regex, &replacement) {
            check_group_references(regex, t)?;
        }
        Ok(Self {
            regex,
            replacement,
            count,
        })
    }

    pub fn from_args(args: &FilterArgs) -> Result<Self, FilterError> {
        args.reject_unknown(Self::ID, Self::OPTIONS)?;
        let pattern = args.get_str("regex")?;
        let replacement = args
            .get_str("replacement")?
            .map(|t| RegexReplacement::from_backslash_template(&t))
            .transpose()?;
        let count = args.get_usize("count")?.unwrap_or(0);
        let lines = args.get_bool("lines")?.unwrap_or(false);
        let ignore_case = args.get_bool("ignore_case")?.unwrap_or(false);
        Self::build(pattern.as_deref(), replacement, count, lines, ignore_case)
    }

    /// Apply the substitution, or `None` when pattern or replacement is unset.
    pub fn substitute<'t>(&self, input: &'t str) -> Option<Cow<'t, str>> {
        let regex = self.regex.as_ref()?;
        let replaced = match self.replacement.as_ref()? {
            RegexReplacement::Template(t) => regex.replacen(input, self.count, t.as_str()),
            RegexReplacement::Function(f) => {
                regex.replacen(input, self.count, |caps: &Captures<'_>| f(caps))
            }
        };
        Some(replaced)
    }
}

impl TextFilter for RegexFilter {
    fn filter(&self, input: &str) -> Result<FilterOutput, FilterError> {
        Ok(FilterOutput::from_option(
            input,
            self.substitute(input).map(Cow::into_owned),
        ))
    }
}

/// Translate a backslash-style template into `regex` expansion syntax.
fn convert_template(template: &str) -> Result<String, FilterError> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            push_literal(&mut out, c);
            continue;
        }
        match chars.next() {
            // \0 is always octal: up to two more octal digits follow
            Some('0') => {
                let mut digits = String::from("0");
                while digits.len() < 3 {
                    match chars.next_if(|d| d.is_digit(8)) {
                        Some(d) => digits.push(d),
                        None => break,
                    }
                }
                push_literal(&mut out, octal_char(&digits)?);
            }
            Some(d @ '1'..='9') => {
                let mut digits = d.to_string();
                if let Some(e) = chars.next_if(char::is_ascii_digit) {
                    digits.push(e);
                    // Three octal digits make a character, not a group
                    if d.is_digit(8) && e.is_digit(8) {
                        if let Some(f) = chars.next_if(|f| f.is_digit(8)) {
                            digits.push(f);
                            push_literal(&mut out, octal_char(&digits)?);
                            continue;
                        }
                    }
                }
                out.push_str(&format!("${{{}}}", digits));
            }
            Some('g') => {
                if chars.next() != Some('<') {
                    return Err(FilterError::config("replacement: expected '<' after \\g"));
                }
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some('>') => break,
                        Some(ch) => name.push(ch),
                        None => {
                            return Err(FilterError::config(
                                "replacement: unterminated group name",
                            ))
                        }
                    }
                }
                let valid = name.chars().all(|ch| ch.is_alphanumeric() || ch == '_');
                if name.is_empty() || !valid {
                    return Err(FilterError::config(format!(
                        "replacement: bad group name '{}'",
                        name
                    )));
                }
                out.push_str(&format!("${{{}}}", name));
            }
            Some('a') => out.push('\u{07}'),
            Some('b') => out.push('\u{08}'),
            Some('f') => out.push('\u{0c}'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('v') => out.push('\u{0b}'),
            Some('\\') => out.push('\\'),
            Some(other) if other.is_ascii_alphabetic() => {
                return Err(FilterError::config(format!(
                    "replacement: bad escape \\{}",
                    other
                )));
            }
            Some(other) => {
                out.push('\\');
                push_literal(&mut out, other);
            }
            None => {
                return Err(FilterError::config("replacement: trailing backslash"));
            }
        }
    }

    Ok(out)
}

fn push_literal(out: &mut String, c: char) {
    if c == '$' {
        out.push_str("$$");
    } else {
        out.push(c);
    }
}

fn octal_char(digits: &str) -> Result<char, FilterError> {
    match u8::from_str_radix(digits, 8) {
        Ok(value) => Ok(char::from(value)),
        Err(_) => Err(FilterError::config(format!(
            "replacement: octal escape \\{} out of range",
            digits
        ))),
    }
}

/// Every `${group}` in a converted template must exist in `regex`.
fn check_group_references(regex: &Regex, template: &str) -> Result<(), FilterError> {
    let mut rest = template;
    while let Some(pos) = rest.find('$') {
        rest = &rest[pos + 1..];
        if let Some(after) = rest.strip_prefix('$') {
            rest = after;
            continue;
        }
        let Some(body) = rest.strip_prefix('{') else {
            continue;
        };
        let Some(end) = body.find('}') else {
            break;
        };
        let group = &body[..end];
        let exists = match group.parse::<usize>() {
            Ok(index) => index < regex.captures_len(),
            Err(_) => regex.capture_names().flatten().any(|name| name == group),
        };
        if !exists {
            return Err(FilterError::config(format!(
                "replacement: invalid group reference {}",
                group
            )));
        }
        rest = &body[end + 1..];
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template(pattern: &str, replacement: &str) -> RegexFilter {
        RegexFilter::new(
            pattern,
            RegexReplacement::from_backslash_template(replacement).unwrap(),
            0,
            false,
        )
        .unwrap()
    }

    #[test]
    fn test_collapse_spaces() {
        let filter = template(r"\s+", " ");
        assert_eq!(
            filter.filter("a  b\n\tc").unwrap(),
            FilterOutput::Changed("a b c".to_string())
        );
        assert_eq!(filter.filter("a b").unwrap(), FilterOutput::Unchanged);
    }

    #[test]
    fn test_backreferences() {
        let filter = template(r"(\w+)=(\w+)", r"\2=\1");
        assert_eq!(
            filter.filter("a=b c=d").unwrap(),
            FilterOutput::Changed("b=a d=c".to_string())
        );

        let filter = template(r"(?P<key>\w+):", r"\g<key>\g<1>$");
        assert_eq!(
            filter.filter("x:").unwrap(),
            FilterOutput::Changed("xx$".to_string())
        );
    }

    #[test]
    fn test_count_limits_substitutions() {
        let filter = RegexFilter::new(
            "a",
            RegexReplacement::Template("b".to_string()),
            2,
            false,
        )
        .unwrap();
        assert_eq!(
            filter.filter("aaaa").unwrap(),
            FilterOutput::Changed("bbaa".to_string())
        );
    }

    #[test]
    fn test_lines_mode_anchors() {
        let whole = template("^", "> ");
        assert_eq!(
            whole.filter("a\nb").unwrap(),
            FilterOutput::Changed("> a\nb".to_string())
        );

        let lines = RegexFilter::new(
            "^",
            RegexReplacement::Template("> ".to_string()),
            0,
            true,
        )
        .unwrap();
        assert_eq!(
            lines.filter("a\nb").unwrap(),
            FilterOutput::Changed("> a\n> b".to_string())
        );
    }

    #[test]
    fn test_function_replacement() {
        let filter = RegexFilter::new(
            r"\d+",
            RegexReplacement::function(|caps| format!("<{}>", &caps[0])),
            0,
            false,
        )
        .unwrap();
        assert_eq!(
            filter.filter("a1b22").unwrap(),
            FilterOutput::Changed("a<1>b<22>".to_string())
        );
    }

    #[test]
    fn test_missing_options_decline() {
        let no_replacement =
            RegexFilter::from_args(&FilterArgs::new().with("regex", "a")).unwrap();
        assert_eq!(no_replacement.filter("a").unwrap(), FilterOutput::Decline);

        let no_regex =
            RegexFilter::from_args(&FilterArgs::new().with("replacement", "b")).unwrap();
        assert_eq!(no_regex.filter("a").unwrap(), FilterOutput::Decline);
    }

    #[test]
    fn test_invalid_pattern_is_config_error() {
        let err = RegexFilter::from_args(
            &FilterArgs::new().with("regex", "(").with("replacement", ""),
        )
        .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_ignore_case_option() {
        let filter = RegexFilter::from_args(
            &FilterArgs::new()
                .with("regex", "abc")
                .with("replacement", "x")
                .with("ignore_case", true),
        )
        .unwrap();
        assert_eq!(
            filter.filter("ABC abc").unwrap(),
            FilterOutput::Changed("x x".to_string())
        );
    }

    #[test]
    fn test_convert_template() {
        assert_eq!(convert_template(r"\1-\12").unwrap(), "${1}-${12}");
        assert_eq!(convert_template(r"a\nb\\c").unwrap(), "a\nb\\c");
        assert_eq!(convert_template("$5").unwrap(), "$$5");
        assert_eq!(convert_template(r"\g<0>").unwrap(), "${0}");
        assert_eq!(convert_template(r"\-").unwrap(), r"\-");
        assert!(convert_template(r"\g<x").is_err());
        assert!(convert_template(r"\g<a-b>").is_err());
        assert!(convert_template(r"\q").is_err());
        assert!(convert_template("x\\").is_err());
    }

    #[test]
    fn test_octal_escapes_in_template() {
        assert_eq!(convert_template(r"\0").unwrap(), "\0");
        assert_eq!(convert_template(r"a\012b").unwrap(), "a\nb");
        assert_eq!(convert_template(r"\101\08").unwrap(), "A\08");
        assert_eq!(convert_template(r"\044").unwrap(), "$$");
        // Two digits, or a non-octal digit, is still a group
        assert_eq!(convert_template(r"\10").unwrap(), "${10}");
        assert_eq!(convert_template(r"\181").unwrap(), "${18}1");
        assert!(convert_template(r"\477").is_err());

        let filter = template("x", r"[\0]");
        assert_eq!(
            filter.filter("x").unwrap(),
            FilterOutput::Changed("[\0]".to_string())
        );
    }

    #[test]
    fn test_missing_group_is_config_error() {
        let build = |pattern: &str, replacement: &str| {
            RegexFilter::from_args(
                &FilterArgs::new()
                    .with("regex", pattern)
                    .with("replacement", replacement),
            )
        };

        assert!(build(r"(a)", r"\1").is_ok());
        assert!(build(r"a", r"\g<0>").is_ok());
        assert!(build(r"(?P<k>a)", r"\g<k>").is_ok());

        let err = build(r"(a)", r"\2").unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("invalid group reference 2"), "{}", err);
        assert!(build(r"(a)", r"\g<name>").unwrap_err().is_configuration());
        // A literal `$` never counts as a reference
        assert!(build(r"a", "${9}").is_ok());
    }
}
