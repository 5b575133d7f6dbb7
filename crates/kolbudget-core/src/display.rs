//! Whole-dollar currency rendering for derived totals.

use crate::model::Span;

/// Render an amount as en-US dollars with no fractional digits.
///
/// ```
/// use kolbudget_core::display::format_usd;
/// assert_eq!(format_usd(1_500), "$1,500");
/// assert_eq!(format_usd(-500), "-$500");
/// ```
#[must_use]
pub fn format_usd(amount: impl Into<i128>) -> String {
    let amount = amount.into();
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 2);
    if amount < 0 {
        grouped.push('-');
    }
    grouped.push('$');
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

/// `"$min - $max"`, the form used in every range cell.
#[must_use]
pub fn format_range<T>(span: Span<T>) -> String
where
    T: Into<i128> + Copy,
{
    format!("{} - {}", format_usd(span.min), format_usd(span.max))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_thousands() {
        assert_eq!(format_usd(0_u64), "$0");
        assert_eq!(format_usd(999_u64), "$999");
        assert_eq!(format_usd(1_000_u64), "$1,000");
        assert_eq!(format_usd(172_000_u64), "$172,000");
        assert_eq!(format_usd(1_234_567_u64), "$1,234,567");
    }

    #[test]
    fn negative_sign_precedes_symbol() {
        assert_eq!(format_usd(-30_900_i64), "-$30,900");
        assert_eq!(format_usd(i64::MIN), "-$9,223,372,036,854,775,808");
    }

    #[test]
    fn ranges() {
        assert_eq!(format_range(Span::new(500_u64, 1000_u64)), "$500 - $1,000");
        assert_eq!(format_range(Span::new(-30_900_i64, 163_200_i64)), "-$30,900 - $163,200");
    }
}
