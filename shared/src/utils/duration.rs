//! Parsing of human-readable lifetimes such as `"15m"`, `"1h"` or `"7d"`.

use std::time::Duration;

use crate::config::ConfigError;

/// Parse a lifetime string into a [`Duration`].
///
/// Accepted forms are a positive integer followed by one of `s`, `m`, `h`
/// or `d`. A bare integer is read as seconds.
///
/// ```
/// use std::time::Duration;
/// use pa_shared::duration::parse_duration;
///
/// assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
/// assert_eq!(parse_duration("7d").unwrap(), Duration::from_secs(7 * 86_400));
/// ```
pub fn parse_duration(input: &str) -> Result<Duration, ConfigError> {
    let trimmed = input.trim();
    let invalid = || ConfigError::InvalidDuration {
        value: input.to_string(),
    };

    if trimmed.is_empty() {
        return Err(invalid());
    }

    let split_at = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    let (digits, unit) = trimmed.split_at(split_at);

    let amount: u64 = digits.parse().map_err(|_| invalid())?;
    let multiplier = match unit.trim() {
        "" | "s" => 1,
        "m" => 60,
        "h" => 3_600,
        "d" => 86_400,
        _ => return Err(invalid()),
    };

    amount
        .checked_mul(multiplier)
        .map(Duration::from_secs)
        .ok_or_else(invalid)
}
