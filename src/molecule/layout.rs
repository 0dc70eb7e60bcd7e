//! Molecule layout calculation.
//!
//! Turns a [`MoleculeSpec`] into board dimensions, pin coordinates and the
//! catalogue of usable margins.
//!
//! # Coordinate system
//!
//! All coordinates are in millimetres relative to the centre of the pin grid,
//! with y growing upward. Asymmetric wings move the board outline, not the
//! pins; `board_offset_x`/`board_offset_y` give the board centre in this frame.
//!
//! # Margin order
//!
//! Margins are emitted base first, then wing areas, then wing edges, then
//! diagonal corners. Renderers rely on this order.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::molecule::error::LayoutError;
use crate::molecule::margin::{MarginBox, MarginKind};
use crate::molecule::spec::{MoleculeSpec, MoleculeType, ResolvedMolecule, RoundEdges, SizeMode};
use crate::molecule::units::floor_to;
use crate::molecule::wing::{WingExtents, NOMINAL_WING_MM};

/// Grid wing extents are floored to before they shape margins (mm).
pub const WING_GRID_MM: f64 = 2.0;

/// A structural pin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pin {
    /// Pin name (`P1`, `P2`, …, clockwise from the top-left).
    pub name: String,
    /// Centre X (mm).
    pub x: f64,
    /// Centre Y (mm).
    pub y: f64,
}

impl Pin {
    fn new(number: usize, x: f64, y: f64) -> Self {
        Self {
            name: format!("P{number}"),
            x,
            y,
        }
    }
}

/// Calculated molecule layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutResult {
    /// Board width including wings (mm).
    pub board_width: f64,
    /// Board height including wings (mm).
    pub board_height: f64,
    /// Board centre X relative to the pin grid (mm).
    pub board_offset_x: f64,
    /// Board centre Y relative to the pin grid (mm).
    pub board_offset_y: f64,
    /// Corner radius of the board outline (mm).
    pub border_radius: f64,
    /// Pins.
    pub pins: Vec<Pin>,
    /// Usable margins, in contract order.
    pub margins: Vec<MarginBox>,
}

impl LayoutResult {
    /// Looks up a margin by kind.
    #[must_use]
    pub fn margin(&self, kind: MarginKind) -> Option<&MarginBox> {
        self.margins.iter().find(|m| m.kind == kind)
    }

    /// Returns `true` if a margin of this kind was emitted.
    #[must_use]
    pub fn has_margin(&self, kind: MarginKind) -> bool {
        self.margin(kind).is_some()
    }
}

/// Calculator for molecule layouts.
#[derive(Debug, Default, Clone, Copy)]
pub struct LayoutCalculator;

impl LayoutCalculator {
    /// Creates a new layout calculator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Resolves `spec` and calculates its layout.
    ///
    /// # Errors
    ///
    /// Returns a [`LayoutError`] if the spec cannot be resolved.
    pub fn calculate(&self, spec: &MoleculeSpec) -> Result<LayoutResult, LayoutError> {
        let molecule = spec.resolve()?;
        Ok(self.layout(&molecule))
    }

    /// Calculates the layout of an already resolved molecule.
    #[must_use]
    pub fn layout(&self, molecule: &ResolvedMolecule) -> LayoutResult {
        let frame = Frame::new(molecule);

        // Board outline. Absolute wings only extend past the nominal edge,
        // so an unset side never pulls the outline inside the pins.
        let reach = molecule.wings.extents(frame.pin_offset);
        let board_width = frame.nominal_width + reach.left + reach.right;
        let board_height = frame.nominal_height + reach.top + reach.bottom;

        let board_offset_x = (reach.right - reach.left) / 2.0;
        let board_offset_y = (reach.top - reach.bottom) / 2.0;

        let border_radius = match molecule.round_edges {
            RoundEdges::Off => 0.0,
            RoundEdges::Auto => frame.contact_size / 2.0 + NOMINAL_WING_MM,
            RoundEdges::Radius(radius) => radius,
        };

        let pins = frame.pins();

        let mut margins = MarginList::default();
        frame.base_margins(&mut margins);
        frame.wing_area_margins(&mut margins);
        frame.wing_edge_margins(&mut margins);
        frame.diagonal_margins(&mut margins);
        let margins = margins.into_inner();

        debug!(
            molecule_type = %molecule.molecule_type,
            pin_type = %molecule.pin_type,
            board_width,
            board_height,
            margins = margins.len(),
            "Calculated molecule layout"
        );

        LayoutResult {
            board_width,
            board_height,
            board_offset_x,
            board_offset_y,
            border_radius,
            pins,
            margins,
        }
    }
}

/// Resolves and lays out a spec with the default calculator.
///
/// # Errors
///
/// Returns a [`LayoutError`] if the spec cannot be resolved.
pub fn calculate(spec: &MoleculeSpec) -> Result<LayoutResult, LayoutError> {
    LayoutCalculator::new().calculate(spec)
}

/// Margin accumulator that drops empty boxes.
#[derive(Default)]
struct MarginList(Vec<MarginBox>);

impl MarginList {
    fn push(&mut self, kind: MarginKind, center_x: f64, center_y: f64, width: f64, height: f64) {
        let margin = MarginBox::new(kind, center_x, center_y, width, height);
        if margin.is_usable() {
            self.0.push(margin);
        }
    }

    fn into_inner(self) -> Vec<MarginBox> {
        self.0
    }
}

/// Derived dimensions shared by the margin builders.
struct Frame {
    molecule_type: MoleculeType,
    nominal_width: f64,
    nominal_height: f64,
    pin_offset: f64,
    contact_size: f64,
    /// Inner board space: nominal minus pin offset.
    inner_width: f64,
    inner_height: f64,
    /// Wing extents floored to the wing grid.
    wing: WingExtents,
}

impl Frame {
    fn new(molecule: &ResolvedMolecule) -> Self {
        let pin_offset = molecule.pin.offset_mm;
        let size = molecule.size;

        let (nominal_width, nominal_height) = match size.mode {
            SizeMode::Absolute => (size.width, size.height),
            SizeMode::Relative => (size.width + pin_offset, size.height + pin_offset),
        };

        let wing = molecule
            .wings
            .extents(pin_offset)
            .map(|extent| floor_to(extent, WING_GRID_MM));

        Self {
            molecule_type: molecule.molecule_type,
            nominal_width,
            nominal_height,
            pin_offset,
            contact_size: molecule.pin.size_class.contact_size_mm(),
            inner_width: nominal_width - pin_offset,
            inner_height: nominal_height - pin_offset,
            wing,
        }
    }

    /// Half the pin span in X. Boards narrower than the pin offset collapse
    /// the pins onto the centre line instead of swapping sides.
    fn pin_x(&self) -> f64 {
        (self.inner_width / 2.0).max(0.0)
    }

    /// Half the pin span in Y.
    fn pin_y(&self) -> f64 {
        (self.inner_height / 2.0).max(0.0)
    }

    fn half_width(&self) -> f64 {
        self.nominal_width / 2.0
    }

    fn half_height(&self) -> f64 {
        self.nominal_height / 2.0
    }

    fn pins(&self) -> Vec<Pin> {
        let (px, py) = (self.pin_x(), self.pin_y());
        match self.molecule_type {
            MoleculeType::TwoPin => vec![Pin::new(1, -px, 0.0), Pin::new(2, px, 0.0)],
            MoleculeType::FourPin => vec![
                Pin::new(1, -px, py),
                Pin::new(2, px, py),
                Pin::new(3, px, -py),
                Pin::new(4, -px, -py),
            ],
        }
    }

    fn base_margins(&self, out: &mut MarginList) {
        if self.inner_width <= 0.0 || self.inner_height <= 0.0 {
            return;
        }

        let (px, py) = (self.pin_x(), self.pin_y());
        let gap_width = self.inner_width - self.pin_offset;
        let gap_height = self.inner_height - self.pin_offset;

        match self.molecule_type {
            MoleculeType::FourPin => {
                out.push(MarginKind::Left, -px, 0.0, self.pin_offset, gap_height);
                out.push(MarginKind::Right, px, 0.0, self.pin_offset, gap_height);
                out.push(MarginKind::Top, 0.0, py, gap_width, self.pin_offset);
                out.push(MarginKind::Bottom, 0.0, -py, gap_width, self.pin_offset);
                out.push(MarginKind::Center, 0.0, 0.0, gap_width, gap_height);
            }
            MoleculeType::TwoPin => {
                out.push(MarginKind::Center, 0.0, 0.0, gap_width, self.nominal_height);
            }
        }
    }

    fn wing_area_margins(&self, out: &mut MarginList) {
        let w = self.wing;
        let (hw, hh) = (self.half_width(), self.half_height());

        let band_width = self.nominal_width + w.left + w.right;
        let band_height = self.nominal_height + w.top + w.bottom;
        let shift_x = (w.right - w.left) / 2.0;
        let shift_y = (w.top - w.bottom) / 2.0;

        if w.top >= WING_GRID_MM {
            out.push(MarginKind::TopWing, shift_x, hh + w.top / 2.0, band_width, w.top);
        }
        if w.bottom >= WING_GRID_MM {
            out.push(MarginKind::BottomWing, shift_x, -(hh + w.bottom / 2.0), band_width, w.bottom);
        }
        if w.left >= WING_GRID_MM {
            out.push(MarginKind::LeftWing, -(hw + w.left / 2.0), shift_y, w.left, band_height);
        }
        if w.right >= WING_GRID_MM {
            out.push(MarginKind::RightWing, hw + w.right / 2.0, shift_y, w.right, band_height);
        }
    }

    fn wing_edge_margins(&self, out: &mut MarginList) {
        let w = self.wing;
        let c = self.contact_size;
        let (px, py) = (self.pin_x(), self.pin_y());

        let top = (w.top >= c).then(|| self.half_height() + w.top / 2.0);
        let bottom = (w.bottom >= c).then(|| -(self.half_height() + w.bottom / 2.0));
        let left = (w.left >= c).then(|| -(self.half_width() + w.left / 2.0));
        let right = (w.right >= c).then(|| self.half_width() + w.right / 2.0);

        match self.molecule_type {
            MoleculeType::FourPin => {
                if let Some(y) = top {
                    out.push(MarginKind::TopLeftPinTop, -px, y, c, w.top);
                    out.push(MarginKind::TopRightPinTop, px, y, c, w.top);
                }
                if let Some(x) = right {
                    out.push(MarginKind::TopRightPinRight, x, py, w.right, c);
                    out.push(MarginKind::BottomRightPinRight, x, -py, w.right, c);
                }
                if let Some(y) = bottom {
                    out.push(MarginKind::BottomRightPinBottom, px, y, c, w.bottom);
                    out.push(MarginKind::BottomLeftPinBottom, -px, y, c, w.bottom);
                }
                if let Some(x) = left {
                    out.push(MarginKind::BottomLeftPinLeft, x, -py, w.left, c);
                    out.push(MarginKind::TopLeftPinLeft, x, py, w.left, c);
                }
            }
            MoleculeType::TwoPin => {
                if let Some(x) = left {
                    out.push(MarginKind::LeftPinLeft, x, 0.0, w.left, c);
                }
                if let Some(x) = right {
                    out.push(MarginKind::RightPinRight, x, 0.0, w.right, c);
                }
            }
        }
    }

    fn diagonal_margins(&self, out: &mut MarginList) {
        if self.molecule_type != MoleculeType::FourPin {
            return;
        }

        let w = self.wing;
        let c = self.contact_size;
        let (hw, hh) = (self.half_width(), self.half_height());

        let corners = [
            (MarginKind::TopLeftDiagonal, w.left, w.top, -1.0, 1.0),
            (MarginKind::TopRightDiagonal, w.right, w.top, 1.0, 1.0),
            (MarginKind::BottomRightDiagonal, w.right, w.bottom, 1.0, -1.0),
            (MarginKind::BottomLeftDiagonal, w.left, w.bottom, -1.0, -1.0),
        ];

        for (kind, width, height, sx, sy) in corners {
            if width >= c && height >= c {
                out.push(kind, sx * (hw + width / 2.0), sy * (hh + height / 2.0), width, height);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::molecule::spec::PinType;

    const EPS: f64 = 1e-9;

    fn four_pin() -> MoleculeSpec {
        MoleculeSpec::new(MoleculeType::FourPin)
            .with_size("8x8")
            .with_pin_type(PinType::MediumStandard)
    }

    #[test]
    fn four_pin_base_margins_tile_the_board() {
        let layout = calculate(&four_pin()).unwrap();

        let kinds: Vec<_> = layout.margins.iter().map(|m| m.kind).collect();
        assert_eq!(
            kinds,
            [
                MarginKind::Left,
                MarginKind::Right,
                MarginKind::Top,
                MarginKind::Bottom,
                MarginKind::Center
            ]
        );

        let left = layout.margin(MarginKind::Left).unwrap();
        assert!((left.center_x + 4.0).abs() < EPS);
        assert!((left.width - 2.0).abs() < EPS);
        assert!((left.height - 6.0).abs() < EPS);

        let center = layout.margin(MarginKind::Center).unwrap();
        assert!((center.width - 6.0).abs() < EPS);
        assert!((center.height - 6.0).abs() < EPS);

        let margin_area: f64 = layout.margins.iter().map(|m| m.width * m.height).sum();
        let pin_area = 4.0 * 2.0 * 2.0;
        assert!((margin_area + pin_area - 100.0).abs() < EPS);
    }

    #[test]
    fn four_pin_pins_clockwise() {
        let layout = calculate(&four_pin()).unwrap();
        let coords: Vec<_> = layout.pins.iter().map(|p| (p.name.as_str(), p.x, p.y)).collect();
        assert_eq!(
            coords,
            [("P1", -4.0, 4.0), ("P2", 4.0, 4.0), ("P3", 4.0, -4.0), ("P4", -4.0, -4.0)]
        );
    }

    #[test]
    fn absolute_size_keeps_outline() {
        let spec = MoleculeSpec::new(MoleculeType::FourPin).with_size("32x32 absolute");
        let layout = calculate(&spec).unwrap();
        assert!((layout.board_width - 32.0).abs() < EPS);
        assert!((layout.pins[1].x - 15.0).abs() < EPS);
    }

    #[test]
    fn two_pin_center_spans_gap() {
        let spec = MoleculeSpec::new(MoleculeType::TwoPin).with_size("8x4");
        let layout = calculate(&spec).unwrap();

        assert_eq!(layout.pins.len(), 2);
        assert!((layout.pins[0].x + 4.0).abs() < EPS);
        assert!(layout.pins[0].y.abs() < EPS);

        assert_eq!(layout.margins.len(), 1);
        let center = &layout.margins[0];
        assert_eq!(center.kind, MarginKind::Center);
        assert!((center.width - 6.0).abs() < EPS);
        assert!((center.height - 6.0).abs() < EPS);
    }

    #[test]
    fn tiny_board_omits_base_margins() {
        let spec = MoleculeSpec::new(MoleculeType::FourPin).with_size("2x2 absolute");
        let layout = calculate(&spec).unwrap();
        assert!(layout.margins.is_empty());
    }

    #[test]
    fn auto_round_edges() {
        let spec = four_pin().with_round_edges(crate::molecule::spec::RoundEdgesValue::Flag(true));
        let layout = calculate(&spec).unwrap();
        assert!((layout.border_radius - 1.2).abs() < EPS);
    }

    #[test]
    fn absolute_wings_measured_from_pin_centres() {
        let spec = four_pin().with_wing("4mm absolute");
        let layout = calculate(&spec).unwrap();

        // 10 + 3 + 3
        assert!((layout.board_width - 16.0).abs() < EPS);
        assert!((layout.board_height - 16.0).abs() < EPS);

        // Each side reaches 3mm past the nominal edge, floored to 2mm.
        let top = layout.margin(MarginKind::TopWing).unwrap();
        assert!((top.height - 2.0).abs() < EPS);
    }

    #[test]
    fn absolute_wing_leaves_unwinged_axis_nominal() {
        let spec = four_pin().with_wing_left("3 absolute");
        let layout = calculate(&spec).unwrap();

        assert!((layout.board_width - 12.0).abs() < EPS);
        assert!((layout.board_height - 10.0).abs() < EPS);
        assert!((layout.board_offset_x + 1.0).abs() < EPS);
        assert!(layout.board_offset_y.abs() < EPS);
    }

    #[test]
    fn undersized_board_keeps_pins_in_order() {
        let spec = MoleculeSpec::new(MoleculeType::TwoPin)
            .with_size("4x4 absolute")
            .with_pin_type(PinType::LargeStandard);
        let layout = calculate(&spec).unwrap();

        assert!(layout.pins[0].x.abs() < EPS);
        assert!(layout.pins[1].x.abs() < EPS);
        assert!(layout.pins[0].x <= layout.pins[1].x);
        assert!(layout.margins.is_empty());
    }

    #[test]
    fn nominal_wing_adds_no_margins() {
        let spec = four_pin().with_wing("nominal");
        let layout = calculate(&spec).unwrap();
        assert!((layout.board_width - 10.4).abs() < EPS);
        assert_eq!(layout.margins.len(), 5);
    }

    #[test]
    fn large_pins_need_large_wings_for_edges() {
        let spec = MoleculeSpec::new(MoleculeType::FourPin)
            .with_size("12x12")
            .with_pin_type(PinType::LargeStandard)
            .with_wing(4.0);
        let layout = calculate(&spec).unwrap();

        assert!(layout.has_margin(MarginKind::TopWing));
        assert!(!layout.has_margin(MarginKind::TopLeftPinTop));
        assert!(!layout.has_margin(MarginKind::TopLeftDiagonal));

        let spec = spec.with_wing(6.0);
        let layout = calculate(&spec).unwrap();
        assert!(layout.has_margin(MarginKind::TopLeftPinTop));
        assert!(layout.has_margin(MarginKind::TopLeftDiagonal));
    }
}
