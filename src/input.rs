//! Parsing of raw text coming from input fields.
//!
//! Parsing is lenient in the way a browser number field is: the longest
//! leading decimal literal is used and anything after it is ignored, so
//! `"20ms"` reads as `20`. Text with no leading number is rejected.

use crate::RejectedEdit;
use once_cell::sync::Lazy;
use regex::Regex;

// Optional sign, integer and/or fraction digits, optional exponent.
static LEADING_NUMBER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?").unwrap());

fn parse_error(input: &str) -> RejectedEdit {
    RejectedEdit::Parse {
        input: input.to_string(),
    }
}

/// Parse the leading number of `input`.
pub fn parse_number(input: &str) -> Result<f64, RejectedEdit> {
    let trimmed = input.trim_start();
    let literal = LEADING_NUMBER_REGEX
        .find(trimmed)
        .ok_or_else(|| parse_error(input))?;

    literal
        .as_str()
        .parse::<f64>()
        .map_err(|_| parse_error(input))
}

/// Parse a finite number `>= 0`. Negative zero is normalized to zero.
pub fn parse_non_negative(input: &str) -> Result<f64, RejectedEdit> {
    let value = parse_number(input)?;
    if !value.is_finite() || value < 0.0 {
        return Err(parse_error(input));
    }
    Ok(if value == 0.0 { 0.0 } else { value })
}

/// Parse a non-negative number and check it against `[min, max]`.
pub fn parse_bounded(
    input: &str,
    field: &'static str,
    min: f64,
    max: f64,
) -> Result<f64, RejectedEdit> {
    let value = parse_non_negative(input)?;
    if value < min || value > max {
        return Err(RejectedEdit::OutOfBounds {
            field,
            value,
            min,
            max,
        });
    }
    Ok(value)
}

/// Parse a whole count in `[min, max]`. Fractional values are rejected.
pub fn parse_count(input: &str, field: &'static str, min: u32, max: u32) -> Result<u32, RejectedEdit> {
    let value = parse_bounded(input, field, f64::from(min), f64::from(max))?;
    if value.fract() != 0.0 {
        return Err(parse_error(input));
    }
    Ok(value as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn takes_leading_number_and_ignores_suffix() {
        assert_eq!(parse_number("20"), Ok(20.0));
        assert_eq!(parse_number("  12.5ms"), Ok(12.5));
        assert_eq!(parse_number(".5"), Ok(0.5));
        assert_eq!(parse_number("7."), Ok(7.0));
        assert_eq!(parse_number("1e2x"), Ok(100.0));
        assert_eq!(parse_number("3e"), Ok(3.0));
        assert_eq!(parse_number("-4"), Ok(-4.0));
    }

    #[test]
    fn rejects_text_without_a_leading_number() {
        for input in ["", "   ", "abc", "ms20", ".", "-", "NaN", "Infinity"] {
            assert!(
                matches!(parse_number(input), Err(RejectedEdit::Parse { .. })),
                "{:?} should not parse",
                input
            );
        }
    }

    #[test]
    fn non_negative_rejects_negative_and_overflow() {
        assert!(parse_non_negative("-0.1").is_err());
        assert!(parse_non_negative("1e400").is_err());
        assert_eq!(parse_non_negative("0"), Ok(0.0));

        let zero = parse_non_negative("-0").unwrap();
        assert!(zero.is_sign_positive());
    }

    #[test]
    fn bounded_reports_out_of_bounds() {
        assert_eq!(parse_bounded("100", "Amplitude", 0.0, 100.0), Ok(100.0));
        assert_eq!(
            parse_bounded("100.5", "Amplitude", 0.0, 100.0),
            Err(RejectedEdit::OutOfBounds {
                field: "Amplitude",
                value: 100.5,
                min: 0.0,
                max: 100.0,
            })
        );
    }

    #[test]
    fn counts_must_be_whole_and_in_range() {
        assert_eq!(parse_count("4", "Pulse count", 1, 511), Ok(4));
        assert_eq!(parse_count("511", "Pulse count", 1, 511), Ok(511));
        assert!(parse_count("2.5", "Pulse count", 1, 511).is_err());
        assert!(parse_count("0", "Pulse count", 1, 511).is_err());
        assert!(parse_count("512", "Pulse count", 1, 511).is_err());
    }
}
