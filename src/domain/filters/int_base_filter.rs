//! Integer base conversion, built on the regex filter.

use regex::Captures;

use super::regex_filter::{RegexFilter, RegexReplacement};
use super::{FilterArgs, TextFilter};
use crate::domain::{FilterError, FilterOutput};

/// Supported number bases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Base {
    Octal,
    Decimal,
    Hex,
}

impl Base {
    pub fn from_radix(radix: i64) -> Result<Self, FilterError> {
        match radix {
            8 => Ok(Base::Octal),
            10 => Ok(Base::Decimal),
            16 => Ok(Base::Hex),
            other => Err(FilterError::config(format!(
                "unsupported base {}; expected 8, 10 or 16",
                other
            ))),
        }
    }

    fn radix(self) -> u32 {
        match self {
            Base::Octal => 8,
            Base::Decimal => 10,
            Base::Hex => 16,
        }
    }

    /// Pattern matching one number written in this base.
    fn pattern(self) -> &'static str {
        match self {
            Base::Octal => r"\b[0-7]+\b",
            Base::Decimal => r"\b[0-9]+\b",
            Base::Hex => r"\b(?:0[Xx])?[0-9a-fA-F]+\b",
        }
    }

    fn prefix(self) -> &'static str {
        match self {
            Base::Octal => "0",
            Base::Decimal => "",
            Base::Hex => "0x",
        }
    }

    fn parse(self, text: &str) -> Option<Natural> {
        let digits = match self {
            Base::Hex => text
                .strip_prefix("0x")
                .or_else(|| text.strip_prefix("0X"))
                .unwrap_or(text),
            _ => text,
        };
        Natural::parse(digits, self.radix())
    }

    fn format(self, value: &Natural) -> String {
        value.to_str_radix(self.radix())
    }
}

/// Unsigned integer of any size, as little-endian 32-bit limbs.
///
/// Zero has no limbs and the most significant limb is never zero.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Natural {
    limbs: Vec<u32>,
}

impl Natural {
    fn parse(digits: &str, radix: u32) -> Option<Self> {
        if digits.is_empty() {
            return None;
        }
        let mut limbs: Vec<u32> = Vec::new();
        for c in digits.chars() {
            let mut carry = u64::from(c.to_digit(radix)?);
            for limb in limbs.iter_mut() {
                let v = u64::from(*limb) * u64::from(radix) + carry;
                *limb = v as u32;
                carry = v >> 32;
            }
            if carry > 0 {
                limbs.push(carry as u32);
            }
        }
        Some(Self { limbs })
    }

    /// Lowercase digits, most significant first.
    fn to_str_radix(&self, radix: u32) -> String {
        let mut limbs = self.limbs.clone();
        let mut digits = Vec::new();
        while !limbs.is_empty() {
            let mut rem = 0u64;
            for limb in limbs.iter_mut().rev() {
                let v = (rem << 32) | u64::from(*limb);
                *limb = (v / u64::from(radix)) as u32;
                rem = v % u64::from(radix);
            }
            digits.push(char::from_digit(rem as u32, radix).unwrap_or('0'));
            while limbs.last() == Some(&0) {
                limbs.pop();
            }
        }
        if digits.is_empty() {
            return "0".to_string();
        }
        digits.iter().rev().collect()
    }
}

/// Rewrites every number found in `from` base into `to` base.
#[derive(Debug, Clone)]
pub struct IntBaseFilter {
    inner: RegexFilter,
}

impl IntBaseFilter {
    pub const ID: &'static str = "int_base";
    const OPTIONS: &'static [&'static str] = &["from_base", "to_base", "case", "prefix"];

    /// Create a new IntBaseFilter.
    ///
    /// Numbers of any size are converted. A match that fails to parse is
    /// left as it was.
    pub fn new(from: Base, to: Base, uppercase: bool, prefix: bool) -> Result<Self, FilterError> {
        let replacement = RegexReplacement::function(move |caps: &Captures<'_>| {
            let text = &caps[0];
            match from.parse(text) {
                Some(value) => {
                    let mut digits = to.format(&value);
                    if uppercase {
                        digits = digits.to_uppercase();
                    }
                    if prefix {
                        format!("{}{}", to.prefix(), digits)
                    } else {
                        digits
                    }
                }
                None => text.to_string(),
            }
        });
        let inner = RegexFilter::new(from.pattern(), replacement, 0, false)?;
        Ok(Self { inner })
    }

    pub fn from_args(args: &FilterArgs) -> Result<Self, FilterError> {
        args.reject_unknown(Self::ID, Self::OPTIONS)?;
        let from = Base::from_radix(args.get_int("from_base")?.unwrap_or(10))?;
        let to = Base::from_radix(args.get_int("to_base")?.unwrap_or(16))?;
        let uppercase = match args.get_str("case")?.as_deref() {
            None | Some("lower") => false,
            Some("upper") => true,
            Some(other) => {
                return Err(FilterError::config(format!(
                    "case must be \"upper\" or \"lower\", found \"{}\"",
                    other
                )))
            }
        };
        let prefix = args.get_bool("prefix")?.unwrap_or(true);
        Self::new(from, to, uppercase, prefix)
    }
}

impl TextFilter for IntBaseFilter {
    fn filter(&self, input: &str) -> Result<FilterOutput, FilterError> {
        self.inner.filter(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn convert(input: &str, from: Base, to: Base, upper: bool, prefix: bool) -> String {
        match IntBaseFilter::new(from, to, upper, prefix)
            .unwrap()
            .filter(input)
            .unwrap()
        {
            FilterOutput::Changed(s) => s,
            FilterOutput::Unchanged => input.to_string(),
            FilterOutput::Decline => panic!("int_base declined"),
        }
    }

    #[test]
    fn test_decimal_to_hex() {
        assert_eq!(convert("255", Base::Decimal, Base::Hex, false, true), "0xff");
        assert_eq!(convert("255", Base::Decimal, Base::Hex, true, true), "0xFF");
        assert_eq!(convert("255", Base::Decimal, Base::Hex, false, false), "ff");
    }

    #[test]
    fn test_hex_to_decimal() {
        assert_eq!(convert("0xFF", Base::Hex, Base::Decimal, false, true), "255");
        assert_eq!(convert("0Xff", Base::Hex, Base::Decimal, false, true), "255");
        assert_eq!(convert("ff", Base::Hex, Base::Decimal, false, true), "255");
    }

    #[test]
    fn test_octal() {
        assert_eq!(convert("8", Base::Decimal, Base::Octal, false, true), "010");
        assert_eq!(convert("17", Base::Octal, Base::Decimal, false, true), "15");
    }

    #[test]
    fn test_converts_every_number_in_text() {
        assert_eq!(
            convert("rgb(255, 128, 0)", Base::Decimal, Base::Hex, false, true),
            "rgb(0xff, 0x80, 0x0)"
        );
    }

    #[test]
    fn test_numbers_beyond_machine_width() {
        // 2^128
        assert_eq!(
            convert(
                "340282366920938463463374607431768211456",
                Base::Decimal,
                Base::Hex,
                false,
                true
            ),
            format!("0x1{}", "0".repeat(32))
        );
        // 2^256 - 1
        assert_eq!(
            convert(&"f".repeat(64), Base::Hex, Base::Decimal, false, true),
            "115792089237316195423570985008687907853269984665640564039457584007913129639935"
        );
    }

    #[test]
    fn test_digest_survives_hex_decimal_hex() {
        let digest = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";
        let decimal = convert(digest, Base::Hex, Base::Decimal, false, true);
        assert_ne!(decimal, digest);
        assert!(decimal.chars().all(|c| c.is_ascii_digit()));
        assert_eq!(
            convert(&decimal, Base::Decimal, Base::Hex, false, true),
            format!("0x{}", digest)
        );
    }

    #[test]
    fn test_zero_and_leading_zeros() {
        assert_eq!(convert("0", Base::Decimal, Base::Hex, false, true), "0x0");
        assert_eq!(convert("007", Base::Decimal, Base::Hex, false, false), "7");
        assert_eq!(convert("0x00", Base::Hex, Base::Decimal, false, true), "0");
    }

    #[test]
    fn test_unknown_base_is_config_error() {
        let err = IntBaseFilter::from_args(&FilterArgs::new().with("from_base", 2)).unwrap_err();
        assert!(err.is_configuration());

        let err = IntBaseFilter::from_args(&FilterArgs::new().with("case", "title")).unwrap_err();
        assert!(err.is_configuration());
    }
}
