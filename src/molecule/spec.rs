//! Molecule input model: the compact, user-facing description of a footprint.
//!
//! A [`MoleculeSpec`] holds values the way users write them (strings such as
//! `"8x8"`, `"2mm absolute"` or `"nominal"`). [`MoleculeSpec::resolve`] turns it
//! into a [`ResolvedMolecule`] with every field normalised to millimetres and
//! closed enums, which is what the layout calculator works from.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::molecule::error::LayoutError;
use crate::molecule::units::parse_mm;
use crate::molecule::wing::{WingValue, Wings};

/// Board size used when a spec does not give one.
pub const DEFAULT_SIZE: &str = "8x8";

/// Pin layout of a molecule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoleculeType {
    /// Two pins on a horizontal axis.
    TwoPin,
    /// Four pins at the corners of a rectangle.
    FourPin,
}

impl MoleculeType {
    /// Returns the canonical spec key.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::TwoPin => "TwoPin",
            Self::FourPin => "FourPin",
        }
    }
}

impl fmt::Display for MoleculeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MoleculeType {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalise_key(s).as_str() {
            "twopin" | "2pin" => Ok(Self::TwoPin),
            "fourpin" | "4pin" => Ok(Self::FourPin),
            _ => Err(LayoutError::InvalidMoleculeType {
                value: Some(s.to_string()),
            }),
        }
    }
}

/// How the size in a spec relates to the board outline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeMode {
    /// Size is the pin grid; the pin offset is added to get the board.
    #[default]
    Relative,
    /// Size is the board outline itself.
    Absolute,
}

/// Parsed `size` field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoardSize {
    /// Width in mm.
    pub width: f64,
    /// Height in mm.
    pub height: f64,
    /// Sizing mode.
    pub mode: SizeMode,
}

impl BoardSize {
    /// Creates a board size.
    #[must_use]
    pub const fn new(width: f64, height: f64, mode: SizeMode) -> Self {
        Self {
            width,
            height,
            mode,
        }
    }
}

impl Default for BoardSize {
    fn default() -> Self {
        Self::new(8.0, 8.0, SizeMode::Relative)
    }
}

fn size_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)^\s*(\d+(?:\.\d*)?|\.\d+)\s*(?:mm)?\s*x\s*(\d+(?:\.\d*)?|\.\d+)\s*(?:mm)?(?:\s+(absolute|abs|relative|rel))?\s*$",
        )
        .expect("size regex is valid")
    })
}

impl FromStr for BoardSize {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || LayoutError::InvalidSize {
            value: s.to_string(),
        };
        let caps = size_regex().captures(s).ok_or_else(invalid)?;

        let width = caps[1].parse::<f64>().map_err(|_| invalid())?;
        let height = caps[2].parse::<f64>().map_err(|_| invalid())?;
        let mode = match caps.get(3).map(|m| m.as_str().to_lowercase()) {
            Some(m) if m.starts_with("abs") => SizeMode::Absolute,
            _ => SizeMode::Relative,
        };

        Ok(Self::new(width, height, mode))
    }
}

/// Contact size class.
///
/// The class fixes both the contact bounding box and the packing grid spacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum SizeClass {
    /// 2mm contacts.
    #[default]
    Medium,
    /// 6mm contacts.
    Large,
}

impl SizeClass {
    /// Returns the contact bounding box edge (and grid spacing) in mm.
    #[must_use]
    pub const fn contact_size_mm(&self) -> f64 {
        match self {
            Self::Medium => 2.0,
            Self::Large => 6.0,
        }
    }

    /// Returns the lowercase name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Medium => "medium",
            Self::Large => "large",
        }
    }
}

impl fmt::Display for SizeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SizeClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "medium" | "m" => Ok(Self::Medium),
            "large" | "l" => Ok(Self::Large),
            other => Err(format!(
                "Invalid size class '{other}'. Must be one of: medium, large"
            )),
        }
    }
}

impl TryFrom<String> for SizeClass {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Pin length class. Informational; it does not change board geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PinLength {
    /// Short pin.
    Short,
    /// Standard pin.
    Standard,
    /// Long pin.
    Long,
}

impl PinLength {
    /// Returns the lowercase name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Short => "short",
            Self::Standard => "standard",
            Self::Long => "long",
        }
    }
}

/// Geometry attached to a pin type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PinSpec {
    /// Distance added to the pin grid to reach the nominal board edge (mm).
    pub offset_mm: f64,
    /// Contact size class of the pin footprint.
    pub size_class: SizeClass,
    /// Pin length class.
    pub length: PinLength,
}

/// Supported pin types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PinType {
    /// Medium machine pin, short.
    MediumShort,
    /// Medium machine pin, standard length.
    #[default]
    MediumStandard,
    /// Medium machine pin, long.
    MediumLong,
    /// Large machine pin, short.
    LargeShort,
    /// Large machine pin, standard length.
    LargeStandard,
    /// Large machine pin, long.
    LargeLong,
}

impl PinType {
    /// Every pin type, in table order.
    pub const ALL: [Self; 6] = [
        Self::MediumShort,
        Self::MediumStandard,
        Self::MediumLong,
        Self::LargeShort,
        Self::LargeStandard,
        Self::LargeLong,
    ];

    /// Looks up the geometry for this pin type.
    #[must_use]
    pub const fn spec(&self) -> PinSpec {
        const MEDIUM: f64 = 2.0;
        const LARGE: f64 = 6.0;

        let (offset_mm, size_class, length) = match self {
            Self::MediumShort => (MEDIUM, SizeClass::Medium, PinLength::Short),
            Self::MediumStandard => (MEDIUM, SizeClass::Medium, PinLength::Standard),
            Self::MediumLong => (MEDIUM, SizeClass::Medium, PinLength::Long),
            Self::LargeShort => (LARGE, SizeClass::Large, PinLength::Short),
            Self::LargeStandard => (LARGE, SizeClass::Large, PinLength::Standard),
            Self::LargeLong => (LARGE, SizeClass::Large, PinLength::Long),
        };

        PinSpec {
            offset_mm,
            size_class,
            length,
        }
    }

    /// Returns the canonical spec key.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::MediumShort => "MediumShort",
            Self::MediumStandard => "MediumStandard",
            Self::MediumLong => "MediumLong",
            Self::LargeShort => "LargeShort",
            Self::LargeStandard => "LargeStandard",
            Self::LargeLong => "LargeLong",
        }
    }

    fn known_keys() -> String {
        Self::ALL
            .iter()
            .map(Self::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for PinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PinType {
    type Err = LayoutError;

    /// Accepts canonical keys case-insensitively, with or without a
    /// `MachinePin` prefix.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalised = normalise_key(s);
        let key = normalised
            .strip_prefix("machinepin")
            .unwrap_or(&normalised);

        Self::ALL
            .into_iter()
            .find(|pin| pin.as_str().eq_ignore_ascii_case(key))
            .ok_or_else(|| LayoutError::InvalidPinType {
                value: s.to_string(),
                known: Self::known_keys(),
            })
    }
}

/// Raw `roundEdges` value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RoundEdgesValue {
    /// `true` enables automatic rounding, `false` disables it.
    Flag(bool),
    /// Explicit radius in mm.
    Millimetres(f64),
    /// `"auto"`, `"off"`, or a length string.
    Text(String),
}

/// Resolved border rounding.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum RoundEdges {
    /// Square corners.
    #[default]
    Off,
    /// Radius derived from the pin contact size.
    Auto,
    /// Explicit radius in mm.
    Radius(f64),
}

impl RoundEdges {
    fn resolve(value: Option<&RoundEdgesValue>) -> Result<Self, LayoutError> {
        let Some(value) = value else {
            return Ok(Self::Off);
        };

        match value {
            RoundEdgesValue::Flag(true) => Ok(Self::Auto),
            RoundEdgesValue::Flag(false) => Ok(Self::Off),
            RoundEdgesValue::Millimetres(mm) if mm.is_finite() && *mm >= 0.0 => {
                Ok(Self::Radius(*mm))
            }
            RoundEdgesValue::Millimetres(mm) => Err(LayoutError::InvalidLength {
                field: "roundEdges",
                value: mm.to_string(),
            }),
            RoundEdgesValue::Text(text) => match text.trim().to_lowercase().as_str() {
                "auto" | "true" | "on" => Ok(Self::Auto),
                "" | "off" | "none" | "false" => Ok(Self::Off),
                other => parse_mm(other)
                    .map(Self::Radius)
                    .ok_or_else(|| LayoutError::InvalidLength {
                        field: "roundEdges",
                        value: text.clone(),
                    }),
            },
        }
    }
}

/// A molecule as written by the user.
///
/// Field names follow the camelCase JSON spec format.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MoleculeSpec {
    /// `"TwoPin"` or `"FourPin"`. Required.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub molecule_type: Option<String>,

    /// `"<w>x<h>[ absolute|relative]"`. Default `"8x8"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,

    /// Pin-type key. Default `MediumStandard`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pin_type: Option<String>,

    /// Wing applied to every side unless overridden.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wing: Option<WingValue>,

    /// Top wing override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wing_top: Option<WingValue>,

    /// Bottom wing override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wing_bottom: Option<WingValue>,

    /// Left wing override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wing_left: Option<WingValue>,

    /// Right wing override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wing_right: Option<WingValue>,

    /// Border rounding.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub round_edges: Option<RoundEdgesValue>,
}

impl MoleculeSpec {
    /// Starts a spec for the given molecule type with all other fields defaulted.
    #[must_use]
    pub fn new(molecule_type: MoleculeType) -> Self {
        Self {
            molecule_type: Some(molecule_type.as_str().to_string()),
            ..Self::default()
        }
    }

    /// Sets the size string.
    #[must_use]
    pub fn with_size(mut self, size: impl Into<String>) -> Self {
        self.size = Some(size.into());
        self
    }

    /// Sets the pin type.
    #[must_use]
    pub fn with_pin_type(mut self, pin_type: PinType) -> Self {
        self.pin_type = Some(pin_type.as_str().to_string());
        self
    }

    /// Sets the wing for all sides.
    #[must_use]
    pub fn with_wing(mut self, wing: impl Into<WingValue>) -> Self {
        self.wing = Some(wing.into());
        self
    }

    /// Overrides the top wing.
    #[must_use]
    pub fn with_wing_top(mut self, wing: impl Into<WingValue>) -> Self {
        self.wing_top = Some(wing.into());
        self
    }

    /// Overrides the bottom wing.
    #[must_use]
    pub fn with_wing_bottom(mut self, wing: impl Into<WingValue>) -> Self {
        self.wing_bottom = Some(wing.into());
        self
    }

    /// Overrides the left wing.
    #[must_use]
    pub fn with_wing_left(mut self, wing: impl Into<WingValue>) -> Self {
        self.wing_left = Some(wing.into());
        self
    }

    /// Overrides the right wing.
    #[must_use]
    pub fn with_wing_right(mut self, wing: impl Into<WingValue>) -> Self {
        self.wing_right = Some(wing.into());
        self
    }

    /// Sets border rounding.
    #[must_use]
    pub fn with_round_edges(mut self, round_edges: RoundEdgesValue) -> Self {
        self.round_edges = Some(round_edges);
        self
    }

    /// Normalises every field.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::InvalidMoleculeType`] when `type` is missing or
    /// unknown, [`LayoutError::InvalidPinType`] for an unknown `pinType`, and
    /// [`LayoutError::InvalidSize`] / [`LayoutError::InvalidLength`] for values
    /// that cannot be normalised to millimetres.
    pub fn resolve(&self) -> Result<ResolvedMolecule, LayoutError> {
        let molecule_type = self
            .molecule_type
            .as_deref()
            .ok_or(LayoutError::InvalidMoleculeType { value: None })?
            .parse::<MoleculeType>()?;

        let size = self
            .size
            .as_deref()
            .unwrap_or(DEFAULT_SIZE)
            .parse::<BoardSize>()?;

        let wings = Wings::resolve(
            self.wing.as_ref(),
            self.wing_top.as_ref(),
            self.wing_bottom.as_ref(),
            self.wing_left.as_ref(),
            self.wing_right.as_ref(),
        )?;

        let pin_type = match self.pin_type.as_deref() {
            Some(key) => key.parse::<PinType>()?,
            None => PinType::default(),
        };

        let round_edges = RoundEdges::resolve(self.round_edges.as_ref())?;

        Ok(ResolvedMolecule {
            molecule_type,
            size,
            pin_type,
            pin: pin_type.spec(),
            wings,
            round_edges,
        })
    }
}

/// A fully normalised molecule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedMolecule {
    /// Pin layout.
    pub molecule_type: MoleculeType,
    /// Board size.
    pub size: BoardSize,
    /// Pin type key.
    pub pin_type: PinType,
    /// Pin geometry looked up from the pin type.
    pub pin: PinSpec,
    /// Per-side wings.
    pub wings: Wings,
    /// Border rounding.
    pub round_edges: RoundEdges,
}

/// Lowercases and strips separators so `"Four-Pin"` and `"four_pin"` compare equal.
fn normalise_key(s: &str) -> String {
    s.chars()
        .filter(|c| !matches!(c, '-' | '_' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::molecule::wing::WingMode;

    #[test]
    fn round_edges_rejects_negative_radius() {
        for bad in [-3.0, f64::INFINITY, f64::NAN] {
            let err = RoundEdges::resolve(Some(&RoundEdgesValue::Millimetres(bad))).unwrap_err();
            assert!(
                matches!(err, LayoutError::InvalidLength { field: "roundEdges", .. }),
                "{bad}: {err:?}"
            );
        }

        let radius = RoundEdges::resolve(Some(&RoundEdgesValue::Millimetres(1.5))).unwrap();
        assert_eq!(radius, RoundEdges::Radius(1.5));
    }

    #[test]
    fn parse_relative_size() {
        let size: BoardSize = "8x8".parse().unwrap();
        assert_eq!(size, BoardSize::new(8.0, 8.0, SizeMode::Relative));
    }

    #[test]
    fn parse_absolute_size() {
        let size: BoardSize = "32x32 absolute".parse().unwrap();
        assert_eq!(size, BoardSize::new(32.0, 32.0, SizeMode::Absolute));
    }

    #[test]
    fn parse_size_with_units_and_case() {
        let size: BoardSize = "12mm X 6mm Relative".parse().unwrap();
        assert_eq!(size, BoardSize::new(12.0, 6.0, SizeMode::Relative));
    }

    #[test]
    fn reject_malformed_size() {
        assert!(matches!(
            "8 by 8".parse::<BoardSize>(),
            Err(LayoutError::InvalidSize { .. })
        ));
        assert!("8x".parse::<BoardSize>().is_err());
    }

    #[test]
    fn molecule_type_aliases() {
        assert_eq!("FourPin".parse::<MoleculeType>(), Ok(MoleculeType::FourPin));
        assert_eq!("4pin".parse::<MoleculeType>(), Ok(MoleculeType::FourPin));
        assert_eq!("two_pin".parse::<MoleculeType>(), Ok(MoleculeType::TwoPin));
        assert!("SixPin".parse::<MoleculeType>().is_err());
    }

    #[test]
    fn pin_type_table() {
        let medium = PinType::MediumStandard.spec();
        assert!((medium.offset_mm - 2.0).abs() < f64::EPSILON);
        assert_eq!(medium.size_class, SizeClass::Medium);

        let large = PinType::LargeShort.spec();
        assert!((large.offset_mm - 6.0).abs() < f64::EPSILON);
        assert_eq!(large.size_class, SizeClass::Large);
        assert_eq!(large.length, PinLength::Short);
    }

    #[test]
    fn pin_type_keys() {
        assert_eq!("MediumStandard".parse::<PinType>(), Ok(PinType::MediumStandard));
        assert_eq!(
            "MachinePinLargeLong".parse::<PinType>(),
            Ok(PinType::LargeLong)
        );
        assert_eq!("mediumshort".parse::<PinType>(), Ok(PinType::MediumShort));

        let err = "HugeStandard".parse::<PinType>().unwrap_err();
        assert!(matches!(err, LayoutError::InvalidPinType { .. }));
        assert!(err.to_string().contains("MediumStandard"));
    }

    #[test]
    fn size_class_parsing() {
        assert_eq!("Medium".parse::<SizeClass>(), Ok(SizeClass::Medium));
        assert_eq!("large".parse::<SizeClass>(), Ok(SizeClass::Large));
        assert!("huge".parse::<SizeClass>().is_err());

        let class: SizeClass = serde_json::from_str(r#""Large""#).unwrap();
        assert_eq!(class, SizeClass::Large);
        assert_eq!(serde_json::to_string(&SizeClass::Medium).unwrap(), r#""medium""#);
    }

    #[test]
    fn resolve_defaults() {
        let resolved = MoleculeSpec::new(MoleculeType::FourPin).resolve().unwrap();
        assert_eq!(resolved.size, BoardSize::default());
        assert_eq!(resolved.pin_type, PinType::MediumStandard);
        assert_eq!(resolved.round_edges, RoundEdges::Off);
        assert_eq!(resolved.wings.mode, WingMode::Padding);
        assert!(resolved.wings.left.abs() < f64::EPSILON);
    }

    #[test]
    fn resolve_requires_type() {
        let err = MoleculeSpec::default().resolve().unwrap_err();
        assert_eq!(err, LayoutError::InvalidMoleculeType { value: None });
    }

    #[test]
    fn round_edges_values() {
        let spec = |value| {
            MoleculeSpec::new(MoleculeType::TwoPin)
                .with_round_edges(value)
                .resolve()
                .map(|r| r.round_edges)
        };

        assert_eq!(spec(RoundEdgesValue::Flag(true)), Ok(RoundEdges::Auto));
        assert_eq!(spec(RoundEdgesValue::Flag(false)), Ok(RoundEdges::Off));
        assert_eq!(
            spec(RoundEdgesValue::Text("auto".to_string())),
            Ok(RoundEdges::Auto)
        );
        assert_eq!(
            spec(RoundEdgesValue::Text("1.5mm".to_string())),
            Ok(RoundEdges::Radius(1.5))
        );
        assert_eq!(spec(RoundEdgesValue::Millimetres(3.0)), Ok(RoundEdges::Radius(3.0)));
        assert!(spec(RoundEdgesValue::Text("round".to_string())).is_err());
    }

    #[test]
    fn deserialise_json_spec() {
        let json = r#"{
            "type": "FourPin",
            "size": "8x8",
            "pinType": "MediumStandard",
            "wing": "2mm",
            "wingLeft": 4,
            "roundEdges": "auto"
        }"#;

        let spec: MoleculeSpec = serde_json::from_str(json).unwrap();
        assert_eq!(spec.molecule_type.as_deref(), Some("FourPin"));
        assert_eq!(spec.wing_left, Some(WingValue::Millimetres(4.0)));

        let resolved = spec.resolve().unwrap();
        assert!((resolved.wings.left - 4.0).abs() < f64::EPSILON);
        assert!((resolved.wings.right - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn reject_unknown_spec_fields() {
        let json = r#"{"type": "FourPin", "colour": "red"}"#;
        assert!(serde_json::from_str::<MoleculeSpec>(json).is_err());
    }
}
