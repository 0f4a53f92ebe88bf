use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;

/// Amounts are exact decimals in the single implicit currency.
/// Whatever the user typed is kept digit for digit: "100.999" stays 100.999.
pub type Amount = Decimal;

/// Largest amount accepted for a new expense: the largest integer a browser
/// number holds exactly, so data stays exchangeable with the web version.
pub const MAX_AMOUNT_UNITS: i64 = 9_007_199_254_740_991;

pub fn max_amount() -> Amount {
    Amount::from(MAX_AMOUNT_UNITS)
}

/// Format an amount with at least two decimals, for machine-readable output.
/// Extra decimals are kept, never rounded.
/// Example: 50 -> "50.00", 12.5 -> "12.50", 0.001 -> "0.001"
pub fn format_fixed(amount: Amount) -> String {
    let mut fixed = amount.normalize();
    if fixed.scale() < 2 {
        fixed.rescale(2);
    }
    fixed.to_string()
}

/// Format an amount for display: thousands are grouped and trailing zero decimals dropped.
/// Example: 1234.5 -> "1,234.5", 120 -> "120", 12.05 -> "12.05"
pub fn format_amount(amount: Amount) -> String {
    let sign = if amount.is_sign_negative() && !amount.is_zero() {
        "-"
    } else {
        ""
    };
    let digits = amount.abs().normalize().to_string();
    let (units, decimals) = digits.split_once('.').unwrap_or((digits.as_str(), ""));

    if decimals.is_empty() {
        format!("{}{}", sign, group_thousands(units))
    } else {
        format!("{}{}.{}", sign, group_thousands(units), decimals)
    }
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

/// Parse user input into an exact amount.
/// Example: "50.00" -> 50, "12.5" -> 12.5, ".5" -> 0.5, "100.999" -> 100.999
///
/// Only plain decimal notation is accepted: no exponents, no thousands
/// separators, no `NaN`/`Infinity`. Trailing zero decimals are dropped.
pub fn parse_amount(input: &str) -> Result<Amount, ParseAmountError> {
    let input = input.trim();
    let (sign, number) = match input.as_bytes().first() {
        Some(b'-') => ("-", &input[1..]),
        Some(b'+') => ("", &input[1..]),
        _ => ("", input),
    };

    let (units, decimals) = number.split_once('.').unwrap_or((number, ""));

    if units.is_empty() && decimals.is_empty() {
        return Err(ParseAmountError::InvalidFormat);
    }
    if !is_ascii_digits(units) || !is_ascii_digits(decimals) {
        return Err(ParseAmountError::InvalidFormat);
    }

    let units = if units.is_empty() { "0" } else { units };
    let canonical = if decimals.is_empty() {
        format!("{}{}", sign, units)
    } else {
        format!("{}{}.{}", sign, units, decimals)
    };

    Amount::from_str(&canonical)
        .map(|amount| amount.normalize())
        .map_err(|_| ParseAmountError::OutOfRange)
}

fn is_ascii_digits(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_digit())
}

/// Parse a JSON number as stored on disk. Browsers write very small or very
/// large numbers in exponent form (`1e-7`), so that is accepted here.
pub fn parse_stored_amount(text: &str) -> Option<Amount> {
    let text = text.trim();
    Amount::from_str(text)
        .or_else(|_| Amount::from_scientific(text))
        .ok()
        .map(|amount| amount.normalize())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseAmountError {
    InvalidFormat,
    OutOfRange,
}

impl fmt::Display for ParseAmountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseAmountError::InvalidFormat => write!(f, "invalid money format"),
            ParseAmountError::OutOfRange => write!(f, "amount has too many digits"),
        }
    }
}

impl std::error::Error for ParseAmountError {}

/// Serde adapter writing amounts as plain JSON numbers with every digit kept
/// (`120.5`, `0.001`), instead of going through `f64`.
pub mod amount_json {
    use serde::de::Error as _;
    use serde::ser::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use serde_json::value::RawValue;

    use super::{Amount, parse_stored_amount};

    pub fn serialize<S: Serializer>(amount: &Amount, serializer: S) -> Result<S::Ok, S::Error> {
        let number = RawValue::from_string(amount.normalize().to_string())
            .map_err(S::Error::custom)?;
        number.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Amount, D::Error> {
        let number = Box::<RawValue>::deserialize(deserializer)?;
        parse_stored_amount(number.get())
            .ok_or_else(|| D::Error::custom(format!("invalid amount: {}", number.get())))
    }
}
