//! # Units Module
//!
//! Presentation helpers for the two "currencies" of the hisaab: cash and
//! gold mass.
//!
//! ## Why the Engine Never Rounds
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ROUNDING DRIFT                                                         │
//! │                                                                         │
//! │  Rounding every line to 2 dp before summing:                            │
//! │    3 × round(1.004) = 3.00, but round(3 × 1.004) = 3.01  ❌ drift      │
//! │                                                                         │
//! │  OUR RULE:                                                              │
//! │    Engine values stay full-precision f64 end to end.                    │
//! │    Only the presentation layer calls round_currency / round_grams.      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use sunar_core::units::{format_currency, format_grams, round_currency};
//!
//! assert_eq!(round_currency(197_500.004), 197_500.0);
//! assert_eq!(format_currency(197_500.0), "Rs. 197,500.00");
//! assert_eq!(format_grams(11.6638), "11.664 g");
//! ```

/// Decimal places used when presenting cash amounts.
pub const CURRENCY_DECIMALS: i32 = 2;

/// Decimal places used when presenting gold mass.
pub const GRAM_DECIMALS: i32 = 3;

/// Grams in one tola.
pub const GRAMS_PER_TOLA: f64 = 11.6638;

/// Balances closer to zero than this are treated as settled.
///
/// Absorbs floating-point noise from long chains of additions.
pub const SETTLED_TOLERANCE: f64 = 0.001;

/// Rounds a value to `decimals` places, half away from zero.
fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Rounds a cash amount to 2 decimal places for display.
#[inline]
pub fn round_currency(amount: f64) -> f64 {
    round_to(amount, CURRENCY_DECIMALS)
}

/// Rounds a gold mass to 3 decimal places for display.
#[inline]
pub fn round_grams(grams: f64) -> f64 {
    round_to(grams, GRAM_DECIMALS)
}

/// Converts grams to tola.
#[inline]
pub fn grams_to_tola(grams: f64) -> f64 {
    grams / GRAMS_PER_TOLA
}

/// Converts tola to grams.
#[inline]
pub fn tola_to_grams(tola: f64) -> f64 {
    tola * GRAMS_PER_TOLA
}

/// Whether a balance is within [`SETTLED_TOLERANCE`] of zero.
#[inline]
pub fn is_negligible(value: f64) -> bool {
    value.abs() < SETTLED_TOLERANCE
}

/// Formats a cash amount as `Rs. 1,234.50` (or `-Rs. 1,234.50`).
///
/// ## Note
/// For receipts and debugging. Localized UI formatting belongs to the
/// frontend.
pub fn format_currency(amount: f64) -> String {
    let rounded = round_currency(amount);
    let sign = if rounded < 0.0 { "-" } else { "" };
    let fixed = format!("{:.2}", rounded.abs());
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    format!("{}Rs. {}.{}", sign, group_thousands(whole), fraction)
}

/// Formats a gold mass as `12.345 g`.
pub fn format_grams(grams: f64) -> String {
    format!("{:.3} g", round_grams(grams))
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

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_currency() {
        assert_eq!(round_currency(10.994), 10.99);
        assert_eq!(round_currency(10.996), 11.0);
        assert_eq!(round_currency(-5.555_1), -5.56);
    }

    #[test]
    fn test_round_grams() {
        assert_eq!(round_grams(11.6638), 11.664);
        assert_eq!(round_grams(0.0004), 0.0);
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(0.0), "Rs. 0.00");
        assert_eq!(format_currency(999.5), "Rs. 999.50");
        assert_eq!(format_currency(1000.0), "Rs. 1,000.00");
        assert_eq!(format_currency(1_234_567.891), "Rs. 1,234,567.89");
        assert_eq!(format_currency(-600.0), "-Rs. 600.00");
    }

    #[test]
    fn test_format_grams() {
        assert_eq!(format_grams(10.0), "10.000 g");
        assert_eq!(format_grams(-2.5), "-2.500 g");
    }

    #[test]
    fn test_tola_conversion() {
        assert!((tola_to_grams(1.0) - 11.6638).abs() < 1e-12);
        assert!((grams_to_tola(23.3276) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_negligible() {
        assert!(is_negligible(0.0009));
        assert!(is_negligible(-0.0009));
        assert!(!is_negligible(0.001));
        assert!(!is_negligible(-1.0));
    }

    /// Documents why engine values stay unrounded: per-line rounding drifts.
    #[test]
    fn test_per_line_rounding_drifts() {
        let line = 1.004;
        let rounded_then_summed = round_currency(line) * 3.0;
        let summed_then_rounded = round_currency(line * 3.0);
        assert!((rounded_then_summed - summed_then_rounded).abs() > 0.009);
    }
}
