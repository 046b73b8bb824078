//! Salary text normalization
//!
//! Job boards publish compensation as loosely formatted text: hourly or
//! monthly, ranges or single figures, with assorted currency markers and
//! thousands separators. This module turns that text into the canonical
//! `"{min} - {max} {CURRENCY}"` form used by stored postings.

use std::fmt;
use thiserror::Error;

/// Average number of working hours in a month, used to scale hourly rates
pub const HOURS_PER_MONTH: u64 = 168;

/// Fixed EUR→PLN rate of the historical salary migration, in grosz per euro
pub const EUR_TO_PLN_RATE_CENTS: u64 = 430;

/// Bounds with at most this many digits are read as hourly rates
const HOURLY_MAX_DIGITS: usize = 3;

/// Currency markers recognised in salary text (matched lowercase)
const CURRENCY_TOKENS: &[(&str, Currency)] = &[
    ("pln", Currency::Pln),
    ("zł", Currency::Pln),
    ("eur", Currency::Eur),
    ("€", Currency::Eur),
    ("usd", Currency::Usd),
    ("$", Currency::Usd),
];

/// Why a salary string could not be normalized
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SalaryError {
    #[error("salary text is empty")]
    Empty,

    #[error("non-numeric salary bound: {0:?}")]
    NonNumeric(String),

    #[error("malformed salary range: {0:?}")]
    MalformedRange(String),

    #[error("salary mentions more than one currency: {0:?}")]
    MixedCurrency(String),

    #[error("salary bound {0} is below a plausible monthly figure")]
    Implausible(u64),
}

/// Currencies the normalizer can re-attach
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Currency {
    Pln,
    Eur,
    Usd,
}

impl Currency {
    /// ISO code emitted in canonical salary strings
    pub fn code(&self) -> &'static str {
        match self {
            Self::Pln => "PLN",
            Self::Eur => "EUR",
            Self::Usd => "USD",
        }
    }
}

/// A parsed monthly salary range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SalaryRange {
    pub min: u64,
    pub max: u64,
    pub currency: Currency,
}

impl fmt::Display for SalaryRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.min == self.max {
            write!(f, "{} {}", group_thousands(self.min), self.currency.code())
        } else {
            write!(
                f,
                "{} - {} {}",
                group_thousands(self.min),
                group_thousands(self.max),
                self.currency.code()
            )
        }
    }
}

/// Normalizes free-form salary text into its canonical form
///
/// Unparseable input (including the empty string) is returned unchanged so
/// the raw signal is never lost. The function is idempotent.
///
/// # Examples
///
/// ```
/// use jobharvest::normalize::standardize_salary;
///
/// assert_eq!(standardize_salary("100 - 140 PLN"), "16 800 - 23 520 PLN");
/// assert_eq!(standardize_salary("10000-15000 PLN"), "10 000 - 15 000 PLN");
/// assert_eq!(standardize_salary("invalid salary"), "invalid salary");
/// ```
pub fn standardize_salary(raw: &str) -> String {
    match parse_salary(raw) {
        Ok(range) => range.to_string(),
        Err(e) => {
            if !raw.is_empty() {
                tracing::debug!("Keeping raw salary {:?}: {}", raw, e);
            }
            raw.to_string()
        }
    }
}

/// Parses salary text into a monthly range
///
/// Bounds with three or fewer digits are treated as hourly rates and scaled
/// by [`HOURS_PER_MONTH`], independently for the lower and upper bound.
/// Text without a currency marker is assumed to be PLN.
pub fn parse_salary(raw: &str) -> Result<SalaryRange, SalaryError> {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return Err(SalaryError::Empty);
    }

    let (amount, currency) = strip_currency(&collapsed)?;

    let parts: Vec<&str> = amount.split(['-', '–', '—']).collect();
    let (min_raw, max_raw) = match parts.as_slice() {
        [single] => (*single, *single),
        [low, high] => (*low, *high),
        _ => return Err(SalaryError::MalformedRange(collapsed)),
    };

    let min = to_monthly(parse_bound(min_raw)?)?;
    let max = to_monthly(parse_bound(max_raw)?)?;

    Ok(SalaryRange { min, max, currency })
}

/// Converts an explicitly EUR-denominated salary to PLN at the fixed
/// migration rate
///
/// Returns `None` when the text is not marked as EUR or cannot be parsed.
/// Amounts are truncated to whole złoty.
pub fn convert_eur_to_pln(raw: &str) -> Option<String> {
    let range = parse_salary(raw).ok()?;
    if range.currency != Currency::Eur {
        return None;
    }

    let converted = SalaryRange {
        min: range.min.checked_mul(EUR_TO_PLN_RATE_CENTS)? / 100,
        max: range.max.checked_mul(EUR_TO_PLN_RATE_CENTS)? / 100,
        currency: Currency::Pln,
    };
    Some(converted.to_string())
}

/// Returns the monthly PLN bounds of a salary string, if it has any
pub fn salary_bounds(raw: &str) -> Option<(u64, u64)> {
    match parse_salary(raw) {
        Ok(range) if range.currency == Currency::Pln => Some((range.min, range.max)),
        _ => None,
    }
}

/// Removes currency markers, returning the remaining text and the currency
fn strip_currency(text: &str) -> Result<(String, Currency), SalaryError> {
    let mut remaining = text.to_lowercase();
    let mut found: Option<Currency> = None;

    for (token, currency) in CURRENCY_TOKENS {
        if remaining.contains(token) {
            match found {
                Some(existing) if existing != *currency => {
                    return Err(SalaryError::MixedCurrency(text.to_string()));
                }
                _ => found = Some(*currency),
            }
            remaining = remaining.replace(token, " ");
        }
    }

    Ok((remaining, found.unwrap_or(Currency::Pln)))
}

/// Parses one bound, returning its value and significant digit count
fn parse_bound(raw: &str) -> Result<(u64, usize), SalaryError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(SalaryError::MalformedRange(raw.to_string()));
    }

    let integer_part = strip_decimal_remainder(trimmed);
    let digits: String = integer_part
        .chars()
        .filter(|c| !is_grouping_separator(*c))
        .collect();

    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(SalaryError::NonNumeric(trimmed.to_string()));
    }

    let value: u64 = digits
        .parse()
        .map_err(|_| SalaryError::NonNumeric(trimmed.to_string()))?;

    Ok((value, value.to_string().len()))
}

/// Drops a trailing one- or two-digit fraction such as `,00` or `.5`
fn strip_decimal_remainder(text: &str) -> &str {
    if let Some(pos) = text.rfind([',', '.']) {
        let fraction = &text[pos + 1..];
        if (1..=2).contains(&fraction.len()) && fraction.chars().all(|c| c.is_ascii_digit()) {
            return &text[..pos];
        }
    }
    text
}

fn is_grouping_separator(c: char) -> bool {
    matches!(
        c,
        ' ' | ',' | '.' | '\'' | '\u{a0}' | '\u{202f}' | '\u{2009}'
    )
}

/// Scales hourly bounds to a monthly figure
///
/// Results below 1000 are rejected: they would be re-read as hourly rates on
/// a second pass and break idempotence.
fn to_monthly((value, digit_count): (u64, usize)) -> Result<u64, SalaryError> {
    let monthly = if digit_count <= HOURLY_MAX_DIGITS {
        value
            .checked_mul(HOURS_PER_MONTH)
            .ok_or(SalaryError::Implausible(value))?
    } else {
        value
    };

    if monthly < 1000 {
        return Err(SalaryError::Implausible(monthly));
    }
    Ok(monthly)
}

/// Formats an integer with single-space thousands grouping
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(' ');
        }
        out.push(ch);
    }
    out
}
