//! Millimetre normalisation and grid rounding.
//!
//! Full unit handling (inches, mils, expressions) belongs to the caller.
//! This module only accepts what the molecule spec format itself produces:
//! bare numbers and numbers with an `mm` suffix.

use std::sync::OnceLock;

use regex::Regex;

/// Tolerance used when comparing millimetre values derived from arithmetic.
pub const EPSILON_MM: f64 = 1e-9;

fn length_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^\s*(\d+(?:\.\d*)?|\.\d+)\s*(?:mm)?\s*$").expect("length regex is valid")
    })
}

/// Parses a length such as `"2"`, `"2mm"` or `"0.2 mm"` into millimetres.
///
/// Returns `None` for anything else, including negative values.
#[must_use]
pub fn parse_mm(text: &str) -> Option<f64> {
    let caps = length_regex().captures(text)?;
    caps.get(1)?.as_str().parse::<f64>().ok()
}

/// Rounds a value down to the nearest multiple of `step`.
///
/// Values within [`EPSILON_MM`] of the next multiple snap up to it so that
/// results of float arithmetic such as `5.999_999_999_9` land on the grid.
#[must_use]
pub fn floor_to(value: f64, step: f64) -> f64 {
    ((value + EPSILON_MM) / step).floor() * step
}

/// Rounds a value to the nearest multiple of `step`.
#[must_use]
pub fn round_to(value: f64, step: f64) -> f64 {
    (value / step).round() * step
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_bare_and_suffixed() {
        assert_eq!(parse_mm("2"), Some(2.0));
        assert_eq!(parse_mm("2mm"), Some(2.0));
        assert_eq!(parse_mm(" 0.2 mm "), Some(0.2));
        assert_eq!(parse_mm("1.5MM"), Some(1.5));
        assert_eq!(parse_mm(".5"), Some(0.5));
    }

    #[test]
    fn parse_rejects_other_units() {
        assert_eq!(parse_mm("2in"), None);
        assert_eq!(parse_mm("-2mm"), None);
        assert_eq!(parse_mm("mm"), None);
        assert_eq!(parse_mm(""), None);
    }

    #[test]
    fn floor_to_grid() {
        assert!((floor_to(3.0, 2.0) - 2.0).abs() < EPSILON_MM);
        assert!((floor_to(4.0, 2.0) - 4.0).abs() < EPSILON_MM);
        assert!((floor_to(1.9, 2.0) - 0.0).abs() < EPSILON_MM);
        assert!((floor_to(5.999_999_999_99, 2.0) - 6.0).abs() < EPSILON_MM);
    }

    #[test]
    fn round_to_works() {
        assert!((round_to(1.4, 1.0) - 1.0).abs() < EPSILON_MM);
        assert!((round_to(1.5, 1.0) - 2.0).abs() < EPSILON_MM);
        assert!((round_to(2.9, 2.0) - 2.0).abs() < EPSILON_MM);
    }
}
