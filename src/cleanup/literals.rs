//! Size (`500M`) and age (`2w`) literals used by cleanup options.

use std::time::Duration;

use crate::options::{ConfigurationError, invalid};

const KIB: u64 = 1024;

/// Parses a byte size such as `750`, `500K`, `20M` or `1G`. Units are
/// binary multiples and case-insensitive; a trailing `B` is optional.
///
/// # Errors
///
/// Returns [`ConfigurationError::InvalidValue`] naming `option` when the
/// literal is malformed or overflows.
pub fn parse_size(option: &str, literal: &str) -> Result<u64, ConfigurationError> {
    let upper = literal.trim().to_ascii_uppercase();
    let without_suffix = upper
        .strip_suffix('B')
        .filter(|rest| !rest.is_empty())
        .unwrap_or(upper.as_str());
    let (digits, multiplier) = [('K', KIB), ('M', KIB.pow(2)), ('G', KIB.pow(3)), ('T', KIB.pow(4))]
        .into_iter()
        .find_map(|(unit, factor)| {
            without_suffix
                .strip_suffix(unit)
                .map(|digits| (digits, factor))
        })
        .unwrap_or((without_suffix, 1));
    let value = parse_digits(option, digits, "expected a size such as 500M")?;
    value
        .checked_mul(multiplier)
        .ok_or_else(|| invalid(option, "size is too large"))
}

/// Parses an age such as `30s`, `15i`, `12h`, `14d`, `2w`, `3m` or `1y`.
/// `i` means minutes, `m` means 31-day months and `y` 365-day years. The
/// number must be positive.
///
/// # Errors
///
/// Returns [`ConfigurationError::InvalidValue`] naming `option` when the
/// literal is malformed, zero, or overflows.
pub fn parse_age(option: &str, literal: &str) -> Result<Duration, ConfigurationError> {
    let lower = literal.trim().to_ascii_lowercase();
    let Some(unit) = lower.chars().last() else {
        return Err(invalid(option, "expected an age such as 2w"));
    };
    let seconds_per_unit: u64 = match unit {
        's' => 1,
        'i' => 60,
        'h' => 3_600,
        'd' => 86_400,
        'w' => 604_800,
        'm' => 2_678_400,
        'y' => 31_536_000,
        _ => return Err(invalid(option, "expected an age unit of s, i, h, d, w, m or y")),
    };
    let digits = lower.strip_suffix(unit).unwrap_or_default();
    let count = parse_digits(option, digits, "expected an age such as 2w")?;
    if count == 0 {
        return Err(invalid(option, "age must be greater than zero"));
    }
    count
        .checked_mul(seconds_per_unit)
        .map(Duration::from_secs)
        .ok_or_else(|| invalid(option, "age is too large"))
}

fn parse_digits(option: &str, digits: &str, hint: &str) -> Result<u64, ConfigurationError> {
    if digits.is_empty() || !digits.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(invalid(option, hint));
    }
    digits.parse::<u64>().map_err(|_| invalid(option, hint))
}
