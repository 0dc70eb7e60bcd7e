//! Wing parsing and per-side resolution.
//!
//! A wing value is a bare number, `"nominal"`, or a length with an optional
//! mode suffix (`"2mm"`, `"3 absolute"`, `"4mm padding"`). Each value is parsed
//! once into a [`WingEntry`]; [`Wings::resolve`] then applies the override
//! rules to produce one magnitude per side and a single mode.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::molecule::error::LayoutError;
use crate::molecule::units::parse_mm;

/// Magnitude `"nominal"` resolves to (mm).
pub const NOMINAL_WING_MM: f64 = 0.2;

/// Raw wing value as written in a spec.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WingValue {
    /// Bare magnitude in mm.
    Millimetres(f64),
    /// `"nominal"` or a length with optional mode suffix.
    Text(String),
}

impl From<f64> for WingValue {
    fn from(value: f64) -> Self {
        Self::Millimetres(value)
    }
}

impl From<&str> for WingValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for WingValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// How wing magnitudes are measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WingMode {
    /// Magnitude is extra material beyond the nominal board edge.
    #[default]
    Padding,
    /// Magnitude is measured from the pin centre line, so half the pin
    /// offset is already included on each side.
    Absolute,
}

/// A single parsed wing value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WingEntry {
    /// Magnitude in mm.
    pub magnitude: f64,
    /// Mode suffix, if the value carried one.
    pub mode: Option<WingMode>,
}

fn wing_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^\s*(nominal|[0-9.]+\s*(?:mm)?)\s*(absolute|abs|padding|relative|rel)?\s*$")
            .expect("wing regex is valid")
    })
}

impl WingEntry {
    /// Parses a raw wing value.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::InvalidLength`] if the value is negative or not a
    /// recognised wing string.
    pub fn parse(value: &WingValue, field: &'static str) -> Result<Self, LayoutError> {
        let invalid = |raw: String| LayoutError::InvalidLength { field, value: raw };

        match value {
            WingValue::Millimetres(mm) if *mm >= 0.0 && mm.is_finite() => Ok(Self {
                magnitude: *mm,
                mode: None,
            }),
            WingValue::Millimetres(mm) => Err(invalid(mm.to_string())),
            WingValue::Text(text) => {
                let caps = wing_regex()
                    .captures(text)
                    .ok_or_else(|| invalid(text.clone()))?;

                let magnitude_text = &caps[1];
                let magnitude = if magnitude_text.eq_ignore_ascii_case("nominal") {
                    NOMINAL_WING_MM
                } else {
                    parse_mm(magnitude_text).ok_or_else(|| invalid(text.clone()))?
                };

                let mode = caps.get(2).map(|m| {
                    if m.as_str().to_lowercase().starts_with("abs") {
                        WingMode::Absolute
                    } else {
                        WingMode::Padding
                    }
                });

                Ok(Self { magnitude, mode })
            }
        }
    }
}

/// Resolved per-side wings.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Wings {
    /// Top magnitude (mm).
    pub top: f64,
    /// Bottom magnitude (mm).
    pub bottom: f64,
    /// Left magnitude (mm).
    pub left: f64,
    /// Right magnitude (mm).
    pub right: f64,
    /// Mode shared by all sides.
    pub mode: WingMode,
}

/// Wing extents beyond the nominal board edge, per side.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WingExtents {
    /// Top extent (mm).
    pub top: f64,
    /// Bottom extent (mm).
    pub bottom: f64,
    /// Left extent (mm).
    pub left: f64,
    /// Right extent (mm).
    pub right: f64,
}

impl WingExtents {
    /// Applies `f` to every side.
    #[must_use]
    pub fn map(self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            top: f(self.top),
            bottom: f(self.bottom),
            left: f(self.left),
            right: f(self.right),
        }
    }
}

impl Wings {
    /// Resolves the overall wing and per-side overrides.
    ///
    /// Per-side values replace the overall value for their side. The mode comes
    /// from the first per-side value (top, bottom, left, right) that carries a
    /// suffix, otherwise from the overall value, otherwise [`WingMode::Padding`].
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::InvalidLength`] for any value that fails to parse.
    pub fn resolve(
        overall: Option<&WingValue>,
        top: Option<&WingValue>,
        bottom: Option<&WingValue>,
        left: Option<&WingValue>,
        right: Option<&WingValue>,
    ) -> Result<Self, LayoutError> {
        let parse = |value: Option<&WingValue>, field| {
            value.map(|v| WingEntry::parse(v, field)).transpose()
        };

        let overall = parse(overall, "wing")?;
        let sides = [
            parse(top, "wingTop")?,
            parse(bottom, "wingBottom")?,
            parse(left, "wingLeft")?,
            parse(right, "wingRight")?,
        ];

        let mode = sides
            .iter()
            .flatten()
            .find_map(|entry| entry.mode)
            .or_else(|| overall.and_then(|entry| entry.mode))
            .unwrap_or_default();

        let default = overall.map_or(0.0, |entry| entry.magnitude);
        let [top, bottom, left, right] =
            sides.map(|side| side.map_or(default, |entry| entry.magnitude));

        Ok(Self {
            top,
            bottom,
            left,
            right,
            mode,
        })
    }

    /// Returns `true` when all four sides have the same magnitude.
    #[must_use]
    pub fn is_uniform(&self) -> bool {
        [self.bottom, self.left, self.right]
            .iter()
            .all(|side| (side - self.top).abs() < f64::EPSILON)
    }

    /// Returns how far each wing reaches past the nominal board edge.
    ///
    /// Padding magnitudes are used as-is. Absolute magnitudes already contain
    /// half the pin offset, which is removed and clamped at zero.
    #[must_use]
    pub fn extents(&self, pin_offset_mm: f64) -> WingExtents {
        let raw = WingExtents {
            top: self.top,
            bottom: self.bottom,
            left: self.left,
            right: self.right,
        };

        match self.mode {
            WingMode::Padding => raw,
            WingMode::Absolute => raw.map(|m| (m - pin_offset_mm / 2.0).max(0.0)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(value: impl Into<WingValue>) -> WingEntry {
        WingEntry::parse(&value.into(), "wing").unwrap()
    }

    #[test]
    fn parse_plain_values() {
        assert_eq!(entry(3.0), WingEntry { magnitude: 3.0, mode: None });
        assert_eq!(entry("2mm"), WingEntry { magnitude: 2.0, mode: None });
        assert_eq!(entry("2"), WingEntry { magnitude: 2.0, mode: None });
    }

    #[test]
    fn parse_nominal() {
        let parsed = entry("nominal");
        assert!((parsed.magnitude - NOMINAL_WING_MM).abs() < f64::EPSILON);
        assert_eq!(parsed.mode, None);

        let parsed = entry("Nominal absolute");
        assert_eq!(parsed.mode, Some(WingMode::Absolute));
    }

    #[test]
    fn parse_mode_suffixes() {
        assert_eq!(entry("4mm absolute").mode, Some(WingMode::Absolute));
        assert_eq!(entry("4 padding").mode, Some(WingMode::Padding));
        assert_eq!(entry("4mm relative").mode, Some(WingMode::Padding));
    }

    #[test]
    fn reject_bad_values() {
        assert!(WingEntry::parse(&WingValue::Millimetres(-1.0), "wing").is_err());
        assert!(WingEntry::parse(&"wide".into(), "wingTop").is_err());
        let err = WingEntry::parse(&"2in".into(), "wingLeft").unwrap_err();
        assert_eq!(
            err,
            LayoutError::InvalidLength {
                field: "wingLeft",
                value: "2in".to_string()
            }
        );
    }

    #[test]
    fn overall_applies_to_every_side() {
        let wings = Wings::resolve(Some(&"2mm".into()), None, None, None, None).unwrap();
        assert!(wings.is_uniform());
        assert!((wings.top - 2.0).abs() < f64::EPSILON);
        assert_eq!(wings.mode, WingMode::Padding);
    }

    #[test]
    fn per_side_overrides() {
        let wings = Wings::resolve(
            Some(&"2mm".into()),
            None,
            Some(&WingValue::Millimetres(0.0)),
            Some(&"4mm".into()),
            None,
        )
        .unwrap();

        assert!((wings.top - 2.0).abs() < f64::EPSILON);
        assert!(wings.bottom.abs() < f64::EPSILON);
        assert!((wings.left - 4.0).abs() < f64::EPSILON);
        assert!((wings.right - 2.0).abs() < f64::EPSILON);
        assert!(!wings.is_uniform());
    }

    #[test]
    fn mode_from_first_explicit_side() {
        let wings = Wings::resolve(
            Some(&"2mm padding".into()),
            None,
            Some(&"3mm absolute".into()),
            Some(&"3mm padding".into()),
            None,
        )
        .unwrap();
        assert_eq!(wings.mode, WingMode::Absolute);
    }

    #[test]
    fn mode_falls_back_to_overall() {
        let wings = Wings::resolve(
            Some(&"4mm absolute".into()),
            Some(&"2mm".into()),
            None,
            None,
            None,
        )
        .unwrap();
        assert_eq!(wings.mode, WingMode::Absolute);
    }

    #[test]
    fn absolute_extents_remove_half_offset() {
        let wings = Wings {
            top: 5.0,
            bottom: 0.5,
            left: 1.0,
            right: 3.0,
            mode: WingMode::Absolute,
        };
        let extents = wings.extents(2.0);
        assert!((extents.top - 4.0).abs() < f64::EPSILON);
        assert!(extents.bottom.abs() < f64::EPSILON);
        assert!(extents.left.abs() < f64::EPSILON);
        assert!((extents.right - 2.0).abs() < f64::EPSILON);
    }
}
