//! Encoding filters: base64, percent-encoding and backslash escapes.

use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use base64::Engine;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use super::{FilterArgs, TextFilter};
use crate::domain::{FilterError, FilterOutput};

/// Base64 encoder/decoder for UTF-8 text.
#[derive(Debug, Clone)]
pub struct Base64Filter {
    decode: bool,
    wrap: usize,
    urlsafe: bool,
}

impl Base64Filter {
    pub const ID: &'static str = "base64";
    const OPTIONS: &'static [&'static str] = &["decode", "wrap", "urlsafe"];
    const DEFAULT_WRAP: usize = 64;

    /// Create a new Base64Filter. `wrap` of 0 disables line wrapping.
    pub fn new(decode: bool, wrap: usize, urlsafe: bool) -> Self {
        Self {
            decode,
            wrap,
            urlsafe,
        }
    }

    pub fn from_args(args: &FilterArgs) -> Result<Self, FilterError> {
        args.reject_unknown(Self::ID, Self::OPTIONS)?;
        Ok(Self::new(
            args.get_bool("decode")?.unwrap_or(false),
            args.get_usize("wrap")?.unwrap_or(Self::DEFAULT_WRAP),
            args.get_bool("urlsafe")?.unwrap_or(false),
        ))
    }

    fn encode(&self, text: &str) -> String {
        let encoded = if self.urlsafe {
            URL_SAFE.encode(text.as_bytes())
        } else {
            STANDARD.encode(text.as_bytes())
        };
        if self.wrap == 0 {
            return encoded;
        }
        // Encoded output is ASCII, so byte chunks are character chunks.
        encoded
            .as_bytes()
            .chunks(self.wrap)
            .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn decode(&self, text: &str) -> Result<String, FilterError> {
        let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
        let decoded = if self.urlsafe {
            URL_SAFE.decode(compact.as_bytes())
        } else {
            STANDARD.decode(compact.as_bytes())
        };
        let bytes = decoded.map_err(|e| FilterError::InvalidInput(format!("base64: {}", e)))?;
        String::from_utf8(bytes)
            .map_err(|_| FilterError::InvalidInput("base64: decoded data is not UTF-8".to_string()))
    }
}

impl TextFilter for Base64Filter {
    fn filter(&self, input: &str) -> Result<FilterOutput, FilterError> {
        let output = if self.decode {
            self.decode(input)?
        } else {
            self.encode(input)
        };
        Ok(FilterOutput::compare(input, output))
    }
}

/// Characters left as-is when percent-encoding: alphanumerics and `_.-~/`.
const URL_KEEP: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'.')
    .remove(b'-')
    .remove(b'~')
    .remove(b'/');

/// Percent-encoder/decoder.
#[derive(Debug, Clone)]
pub struct UrlEncodeFilter {
    decode: bool,
}

impl UrlEncodeFilter {
    pub const ID: &'static str = "urlencode";
    const OPTIONS: &'static [&'static str] = &["decode"];

    pub fn new(decode: bool) -> Self {
        Self { decode }
    }

    pub fn from_args(args: &FilterArgs) -> Result<Self, FilterError> {
        args.reject_unknown(Self::ID, Self::OPTIONS)?;
        Ok(Self::new(args.get_bool("decode")?.unwrap_or(false)))
    }
}

impl TextFilter for UrlEncodeFilter {
    fn filter(&self, input: &str) -> Result<FilterOutput, FilterError> {
        let output = if self.decode {
            percent_decode_str(input).decode_utf8_lossy().into_owned()
        } else {
            utf8_percent_encode(input, URL_KEEP).to_string()
        };
        Ok(FilterOutput::compare(input, output))
    }
}

/// Converts between text and its backslash-escaped form.
#[derive(Debug, Clone)]
pub struct EscapeFilter {
    decode: bool,
}

impl EscapeFilter {
    pub const ID: &'static str = "escape";
    const OPTIONS: &'static [&'static str] = &["decode"];

    pub fn new(decode: bool) -> Self {
        Self { decode }
    }

    pub fn from_args(args: &FilterArgs) -> Result<Self, FilterError> {
        args.reject_unknown(Self::ID, Self::OPTIONS)?;
        Ok(Self::new(args.get_bool("decode")?.unwrap_or(false)))
    }
}

impl TextFilter for EscapeFilter {
    fn filter(&self, input: &str) -> Result<FilterOutput, FilterError> {
        let output = if self.decode {
            unescape(input)?
        } else {
            escape(input)
        };
        Ok(FilterOutput::compare(input, output))
    }
}

/// Escape tabs, newlines, carriage returns, backslashes and every
/// non-printable or non-ASCII character.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            ' '..='~' => out.push(c),
            _ => {
                let cp = c as u32;
                if cp < 0x100 {
                    out.push_str(&format!("\\x{:02x}", cp));
                } else if cp < 0x10000 {
                    out.push_str(&format!("\\u{:04x}", cp));
                } else {
                    out.push_str(&format!("\\U{:08x}", cp));
                }
            }
        }
    }
    out
}

/// Expand backslash escape sequences, numeric and `\N{NAME}` alike.
///
/// Unknown escapes are kept verbatim; malformed numeric or named escapes
/// are errors.
pub fn unescape(text: &str) -> Result<String, FilterError> {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(next) = chars.next() else {
            return Err(FilterError::InvalidInput(
                "escape: trailing backslash".to_string(),
            ));
        };
        match next {
            '\n' => {}
            '\\' => out.push('\\'),
            '\'' => out.push('\''),
            '"' => out.push('"'),
            'a' => out.push('\u{07}'),
            'b' => out.push('\u{08}'),
            'f' => out.push('\u{0c}'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'v' => out.push('\u{0b}'),
            '0'..='7' => {
                let mut value = next.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match chars.peek().and_then(|d| d.to_digit(8)) {
                        Some(d) => {
                            value = value * 8 + d;
                            chars.next();
                        }
                        None => break,
                    }
                }
                out.push(code_point(value)?);
            }
            'x' => out.push(hex_escape(&mut chars, 2, 'x')?),
            'u' => out.push(hex_escape(&mut chars, 4, 'u')?),
            'U' => out.push(hex_escape(&mut chars, 8, 'U')?),
            'N' => out.push(named_escape(&mut chars)?),
            other => {
                out.push('\\');
                out.push(other);
            }
        }
    }

    Ok(out)
}

fn hex_escape<I>(chars: &mut I, digits: usize, marker: char) -> Result<char, FilterError>
where
    I: Iterator<Item = char>,
{
    let hex: String = chars.by_ref().take(digits).collect();
    if hex.chars().count() != digits || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(FilterError::InvalidInput(format!(
            "escape: truncated \\{}XX escape",
            marker
        )));
    }
    let value = u32::from_str_radix(&hex, 16)
        .map_err(|e| FilterError::InvalidInput(format!("escape: {}", e)))?;
    code_point(value)
}

/// `\N{NAME}`: a character by its Unicode name.
fn named_escape<I>(chars: &mut I) -> Result<char, FilterError>
where
    I: Iterator<Item = char>,
{
    if chars.next() != Some('{') {
        return Err(FilterError::InvalidInput(
            "escape: malformed \\N character escape".to_string(),
        ));
    }
    let mut name = String::new();
    let mut closed = false;
    for c in chars.by_ref() {
        if c == '}' {
            closed = true;
            break;
        }
        name.push(c);
    }
    if !closed || name.is_empty() {
        return Err(FilterError::InvalidInput(
            "escape: malformed \\N character escape".to_string(),
        ));
    }
    unicode_names2::character(&name).ok_or_else(|| {
        FilterError::InvalidInput(format!("escape: unknown Unicode character name '{}'", name))
    })
}

fn code_point(value: u32) -> Result<char, FilterError> {
    char::from_u32(value).ok_or_else(|| {
        FilterError::InvalidInput(format!("escape: invalid code point U+{:X}", value))
    })
}
