//! Duration input parsing and display formatting.
//!
//! Accepted inputs (case-insensitive, surrounding whitespace ignored):
//! - `90` bare minutes
//! - `1:30` hours and minutes
//! - `1h30m`, `1h 30m`, `2h`

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

static BARE_MINUTES_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]+$").expect("valid bare minutes regex"));
static COLON_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9]{1,3}):([0-9]{1,2})$").expect("valid h:mm regex"));
static HOURS_MINUTES_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9]+)h(?:\s*([0-9]+)m)?$").expect("valid xhym regex"));

/// Which duration notation a range error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationFormat {
    /// `H:MM`
    Colon,
    /// `XhYm`
    HoursMinutes,
}

/// Rejected duration input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DurationError {
    Empty,
    NonPositive,
    MinutesOutOfRange { format: DurationFormat, minutes: u32 },
    TooLarge,
    UnrecognizedFormat(String),
}

impl Display for DurationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "duration is required"),
            Self::NonPositive => write!(f, "duration must be greater than zero"),
            Self::MinutesOutOfRange {
                format: DurationFormat::Colon,
                minutes,
            } => write!(
                f,
                "in the h:mm format minutes must be between 00 and 59, got {minutes}"
            ),
            Self::MinutesOutOfRange {
                format: DurationFormat::HoursMinutes,
                minutes,
            } => write!(
                f,
                "in the `xh ym` format minutes must be between 0 and 59, got {minutes}"
            ),
            Self::TooLarge => write!(f, "duration is too large"),
            Self::UnrecognizedFormat(input) => write!(
                f,
                "unrecognized duration `{input}`; use 90, 1:30 or 1h 30m"
            ),
        }
    }
}

impl Error for DurationError {}

/// Parses user duration input into whole minutes.
///
/// # Errors
/// Returns the specific rule that failed: empty input, a non-positive total,
/// a minutes component outside `0..=59`, overflow, or an unknown notation.
pub fn parse_duration(raw: &str) -> Result<u32, DurationError> {
    let input = raw.trim().to_lowercase();
    if input.is_empty() {
        return Err(DurationError::Empty);
    }

    if BARE_MINUTES_RE.is_match(&input) {
        return positive(parse_number(&input)?);
    }

    if let Some(caps) = COLON_RE.captures(&input) {
        let hours = parse_number(&caps[1])?;
        let minutes = parse_number(&caps[2])?;
        return combine(hours, minutes, DurationFormat::Colon);
    }

    if let Some(caps) = HOURS_MINUTES_RE.captures(&input) {
        let hours = parse_number(&caps[1])?;
        let minutes = match caps.get(2) {
            Some(value) => parse_number(value.as_str())?,
            None => 0,
        };
        return combine(hours, minutes, DurationFormat::HoursMinutes);
    }

    Err(DurationError::UnrecognizedFormat(raw.trim().to_string()))
}

/// Table label form, e.g. `125` -> `02h05`.
pub fn format_duration_label(minutes: u32) -> String {
    format!("{:02}h{:02}", minutes / 60, minutes % 60)
}

/// Editable input form, e.g. `125` -> `2:05`. Parses back to the same value.
pub fn format_duration_input(minutes: u32) -> String {
    format!("{}:{:02}", minutes / 60, minutes % 60)
}

fn parse_number(digits: &str) -> Result<u32, DurationError> {
    // Input is an ASCII digit run; parsing fails only on overflow.
    digits.parse::<u32>().map_err(|_| DurationError::TooLarge)
}

fn combine(hours: u32, minutes: u32, format: DurationFormat) -> Result<u32, DurationError> {
    if minutes >= 60 {
        return Err(DurationError::MinutesOutOfRange { format, minutes });
    }
    let total = hours
        .checked_mul(60)
        .and_then(|value| value.checked_add(minutes))
        .ok_or(DurationError::TooLarge)?;
    positive(total)
}

fn positive(total: u32) -> Result<u32, DurationError> {
    if total == 0 {
        Err(DurationError::NonPositive)
    } else {
        Ok(total)
    }
}
