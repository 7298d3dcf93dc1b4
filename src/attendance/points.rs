use crate::error::ValidationError;

/// Largest points value accepted from users.
pub const MAX_POINTS: i64 = 1_000_000_000_000_000;

/// Parses a points value as typed by users: `100`, `4,300`, `4.3K`, `2.5M`.
///
/// Separators are stripped, a trailing `K`/`M` scales the number, and any
/// fraction left after scaling is truncated.
pub fn parse_points(input: &str) -> Result<i64, ValidationError> {
    let invalid = || ValidationError::InvalidPoints(input.to_string());

    let cleaned: String = input
        .trim()
        .chars()
        .filter(|c| !matches!(c, ',' | '_' | ' ' | '\''))
        .collect::<String>()
        .to_ascii_uppercase();

    let (number, multiplier) = match cleaned.strip_suffix('K') {
        Some(rest) => (rest, 1_000i64),
        None => match cleaned.strip_suffix('M') {
            Some(rest) => (rest, 1_000_000i64),
            None => (cleaned.as_str(), 1i64),
        },
    };

    let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));
    if whole.is_empty() && fraction.is_empty() {
        return Err(invalid());
    }
    if !whole.chars().chain(fraction.chars()).all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }

    let whole: i64 = if whole.is_empty() { 0 } else { whole.parse().map_err(|_| invalid())? };
    let scaled = whole.checked_mul(multiplier).ok_or_else(invalid)?;

    // Only the digits that can still matter after scaling.
    let mut frac_value = 0i64;
    let mut unit = multiplier;
    for digit in fraction.chars() {
        unit /= 10;
        if unit == 0 {
            break;
        }
        frac_value += digit.to_digit(10).map(i64::from).ok_or_else(invalid)? * unit;
    }

    scaled
        .checked_add(frac_value)
        .filter(|p| *p <= MAX_POINTS)
        .ok_or_else(invalid)
}

/// Compact points label, the inverse of [`parse_points`] up to one decimal.
pub fn format_points(points: i64) -> String {
    fn scaled(points: i64, unit: i64, suffix: &str) -> String {
        let tenths = i128::from(points) * 10 / i128::from(unit);
        if tenths % 10 == 0 {
            format!("{}{}", tenths / 10, suffix)
        } else {
            format!("{}.{}{}", tenths / 10, tenths % 10, suffix)
        }
    }

    match points.unsigned_abs() {
        p if p >= 1_000_000 => scaled(points, 1_000_000, "M"),
        p if p >= 1_000 => scaled(points, 1_000, "K"),
        _ => points.to_string(),
    }
}
