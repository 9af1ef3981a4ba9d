//! Number formatting and fixed-precision division.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};

/// Fractional digits kept when a number is turned into text.
const FRACTION_DIGITS: u32 = 9;

/// Significant digits kept by division.
const DIVISION_DIGITS: u32 = 7;

/// Largest integral magnitude formatted through the integer fast path.
const INTEGER_FAST_PATH: f64 = 1e15;

/// Format a number the way Rockstar prints it: at most nine fractional
/// digits, no trailing zeros, no decimal point for integral values and no
/// grouping separators.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n.fract() == 0.0 && n.abs() < INTEGER_FAST_PATH {
        let mut buf = itoa::Buffer::new();
        return buf.format(n as i64).to_string();
    }
    match Decimal::from_f64(n) {
        Some(d) => d
            .round_dp_with_strategy(FRACTION_DIGITS, RoundingStrategy::MidpointNearestEven)
            .normalize()
            .to_string(),
        None => {
            let mut buf = ryu::Buffer::new();
            buf.format_finite(n).trim_end_matches(".0").to_string()
        }
    }
}

/// Divide through decimal arithmetic rounded to seven significant digits,
/// so repeating decimals come out the same on every run.
///
/// Returns `None` when dividing by zero.
pub fn divide(a: f64, b: f64) -> Option<f64> {
    if b == 0.0 {
        return None;
    }
    let decimal = Decimal::from_f64(a)
        .zip(Decimal::from_f64(b))
        .and_then(|(x, y)| x.checked_div(y))
        .and_then(|q| q.round_sf(DIVISION_DIGITS))
        .and_then(|q| q.to_f64());
    // Values outside the decimal range fall back to plain float division.
    Some(decimal.unwrap_or(a / b))
}

/// Parse an integer in the given radix, as used by `Cast ... with`.
pub fn parse_radix(text: &str, radix: f64) -> Option<f64> {
    let radix = radix as u32;
    if !(2..=36).contains(&radix) {
        return None;
    }
    i64::from_str_radix(text.trim(), radix).ok().map(|n| n as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_integral() {
        assert_eq!(format_number(5.0), "5");
        assert_eq!(format_number(-12.0), "-12");
        assert_eq!(format_number(1337.0), "1337");
    }

    #[test]
    fn test_format_fraction_trims_and_rounds() {
        assert_eq!(format_number(3.14), "3.14");
        assert_eq!(format_number(0.1 + 0.2), "0.3");
        assert_eq!(format_number(1.0 / 3.0), "0.333333333");
    }

    #[test]
    fn test_divide_is_seven_significant_digits() {
        assert_eq!(divide(10.0, 3.0), Some(3.333333));
        assert_eq!(divide(1.0, 4.0), Some(0.25));
        assert_eq!(divide(2.0, 3.0), Some(0.6666667));
        assert_eq!(divide(1.0, 0.0), None);
    }

    #[test]
    fn test_parse_radix() {
        assert_eq!(parse_radix("ff", 16.0), Some(255.0));
        assert_eq!(parse_radix("101", 2.0), Some(5.0));
        assert_eq!(parse_radix("zz", 10.0), None);
        assert_eq!(parse_radix("1", 99.0), None);
    }
}
