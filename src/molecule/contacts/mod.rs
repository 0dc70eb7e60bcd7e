//! Contact packing.
//!
//! Contacts are discrete components placed into margins on a fixed grid whose
//! spacing equals the contact bounding box of their [`SizeClass`].
//!
//! - [`grid`] holds the per-margin placement primitive and the lookup grid
//! - [`packer`] holds the two entry points, [`fill_margins`] and
//!   [`place_contacts`]

pub mod grid;
pub mod packer;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::molecule::margin::MarginKind;
use crate::molecule::spec::SizeClass;

pub use grid::{capacity, primary_offsets, ContactGrid};
pub use packer::{default_fill_kinds, fill_margins, place_contacts};

/// Fixed perpendicular shift for [`PerpendicularAlignment::Outer`] and
/// [`PerpendicularAlignment::Inner`] (mm).
pub const PERPENDICULAR_STEP_MM: f64 = 2.0;

/// Placement along a margin's packing axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", try_from = "String")]
pub enum Alignment {
    /// Start of the packing direction (counter-clockwise end).
    Left,
    /// Centred, snapped to whole millimetres.
    #[default]
    Center,
    /// End of the packing direction (clockwise end).
    Right,
    /// First and last at the extremes, the rest evenly between.
    SpaceBetween,
}

impl Alignment {
    /// Returns the canonical name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
            Self::SpaceBetween => "space-between",
        }
    }
}

impl fmt::Display for Alignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Alignment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .flat_map(char::to_lowercase)
            .collect();

        match key.as_str() {
            "left" | "ccw" | "counterclockwise" => Ok(Self::Left),
            "center" | "centre" => Ok(Self::Center),
            "right" | "cw" | "clockwise" => Ok(Self::Right),
            "spacebetween" => Ok(Self::SpaceBetween),
            _ => Err(format!(
                "Invalid alignment '{s}'. Must be one of: left, center, right, space-between, cw, ccw"
            )),
        }
    }
}

impl TryFrom<String> for Alignment {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Qualitative perpendicular placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum PerpendicularAlignment {
    /// Shifted away from the board centre.
    Outer,
    /// On the margin centre line.
    #[default]
    Center,
    /// Shifted toward the board centre.
    Inner,
}

impl FromStr for PerpendicularAlignment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "outer" | "outside" => Ok(Self::Outer),
            "center" | "centre" => Ok(Self::Center),
            "inner" | "inside" => Ok(Self::Inner),
            _ => Err(format!(
                "Invalid perpendicular alignment '{s}'. Must be one of: outer, center, inner"
            )),
        }
    }
}

impl TryFrom<String> for PerpendicularAlignment {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Shift across a margin's packing axis.
///
/// Positive numeric shifts point away from the board centre, like `Outer`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Shift {
    /// Exact shift in mm.
    Numeric(f64),
    /// Fixed step or none.
    Qualitative(PerpendicularAlignment),
}

impl Default for Shift {
    fn default() -> Self {
        Self::Qualitative(PerpendicularAlignment::Center)
    }
}

impl From<PerpendicularAlignment> for Shift {
    fn from(value: PerpendicularAlignment) -> Self {
        Self::Qualitative(value)
    }
}

impl From<f64> for Shift {
    fn from(value: f64) -> Self {
        Self::Numeric(value)
    }
}

/// A caller-named contact to place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactRequest {
    /// Contact name, echoed in the output.
    pub name: String,

    /// Target margin name. Unknown names are skipped.
    #[serde(alias = "marginKind", alias = "margin_kind")]
    pub margin: String,

    /// Contact size class.
    #[serde(alias = "sizeClass")]
    pub size_class: SizeClass,

    /// Optional shift across the packing axis.
    #[serde(default, alias = "perpendicularShift", skip_serializing_if = "Option::is_none")]
    pub perpendicular_shift: Option<Shift>,
}

impl ContactRequest {
    /// Creates a request with no perpendicular shift.
    #[must_use]
    pub fn new(name: impl Into<String>, margin: impl Into<String>, size_class: SizeClass) -> Self {
        Self {
            name: name.into(),
            margin: margin.into(),
            size_class,
            perpendicular_shift: None,
        }
    }

    /// Sets the perpendicular shift.
    #[must_use]
    pub fn with_shift(mut self, shift: impl Into<Shift>) -> Self {
        self.perpendicular_shift = Some(shift.into());
        self
    }
}

/// A placed contact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactPosition {
    /// Contact name.
    pub name: String,
    /// Centre X (mm).
    pub x: f64,
    /// Centre Y (mm).
    pub y: f64,
    /// Margin the contact was placed in.
    pub margin: MarginKind,
    /// 0-based order along the margin's packing direction.
    pub grid_index: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alignment_aliases() {
        assert_eq!("ccw".parse::<Alignment>(), Ok(Alignment::Left));
        assert_eq!("counterclockwise".parse::<Alignment>(), Ok(Alignment::Left));
        assert_eq!("cw".parse::<Alignment>(), Ok(Alignment::Right));
        assert_eq!("Clockwise".parse::<Alignment>(), Ok(Alignment::Right));
        assert_eq!("space-between".parse::<Alignment>(), Ok(Alignment::SpaceBetween));
        assert_eq!("spaceBetween".parse::<Alignment>(), Ok(Alignment::SpaceBetween));
        assert!("middle".parse::<Alignment>().is_err());
    }

    #[test]
    fn shift_deserialises_both_forms() {
        let numeric: Shift = serde_json::from_str("1.5").unwrap();
        assert_eq!(numeric, Shift::Numeric(1.5));

        let qualitative: Shift = serde_json::from_str(r#""outer""#).unwrap();
        assert_eq!(qualitative, Shift::Qualitative(PerpendicularAlignment::Outer));

        assert!(serde_json::from_str::<Shift>(r#""sideways""#).is_err());
    }

    #[test]
    fn request_accepts_camel_case_keys() {
        let json = r#"{
            "name": "GND",
            "marginKind": "Left",
            "sizeClass": "Medium",
            "perpendicularShift": "inner"
        }"#;
        let request: ContactRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.margin, "Left");
        assert_eq!(request.size_class, SizeClass::Medium);
        assert_eq!(
            request.perpendicular_shift,
            Some(Shift::Qualitative(PerpendicularAlignment::Inner))
        );
    }

    #[test]
    fn request_builder() {
        let request = ContactRequest::new("A", MarginKind::Top, SizeClass::Large).with_shift(-1.0);
        assert_eq!(request.margin, "Top");
        assert_eq!(request.perpendicular_shift, Some(Shift::Numeric(-1.0)));
    }
}
