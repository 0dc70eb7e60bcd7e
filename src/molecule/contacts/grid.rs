//! Grid placement inside a single margin.
//!
//! Positions are computed in two steps: [`primary_offsets`] gives distances
//! from the margin's packing start edge, and [`slot_point`] maps a distance
//! and a perpendicular shift to board coordinates.

use indexmap::IndexMap;
use serde::Serialize;

use crate::molecule::contacts::{Alignment, PerpendicularAlignment, Shift, PERPENDICULAR_STEP_MM};
use crate::molecule::margin::{Axis, MarginBox, MarginKind, Point};
use crate::molecule::spec::SizeClass;
use crate::molecule::units::{round_to, EPSILON_MM};

/// Step centred groups are snapped to (mm).
///
/// Whole millimetres rather than the 2mm contact pitch: three medium contacts
/// in an 8mm margin land at 2, 4 and 6, centred on the margin. A 2mm snap
/// would shift them to 3, 5 and 7.
pub const CENTER_SNAP_MM: f64 = 1.0;

/// Number of contacts of `size_class` that fit along `extent`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // floor of a non-negative ratio
pub fn capacity(extent: f64, size_class: SizeClass) -> usize {
    if extent <= 0.0 {
        return 0;
    }
    ((extent + EPSILON_MM) / size_class.contact_size_mm()).floor() as usize
}

/// Distances of `count` contact centres from the packing start edge.
///
/// `count` is expected to be within [`capacity`]; larger counts still produce
/// positions but they overrun the margin.
#[must_use]
#[allow(clippy::cast_precision_loss)] // contact counts are tiny
pub fn primary_offsets(
    extent: f64,
    count: usize,
    size_class: SizeClass,
    alignment: Alignment,
) -> Vec<f64> {
    if count == 0 {
        return Vec::new();
    }

    let spacing = size_class.contact_size_mm();
    let half = spacing / 2.0;

    let used = (count - 1) as f64 * spacing + spacing;
    let leftover = extent - used;

    let start = match alignment {
        Alignment::Left => 0.0,
        Alignment::Center => round_to(leftover / 2.0, CENTER_SNAP_MM),
        Alignment::Right => leftover,
        Alignment::SpaceBetween => {
            if count == 1 {
                return vec![extent / 2.0];
            }
            let step = (extent - spacing) / (count - 1) as f64;
            return (0..count).map(|i| half + step * i as f64).collect();
        }
    };

    (0..count)
        .map(|i| start + half + spacing * i as f64)
        .collect()
}

/// Perpendicular shift in board coordinates for `margin`.
#[must_use]
pub fn perpendicular_offset(margin: &MarginBox, shift: Shift) -> f64 {
    let outward = match shift {
        Shift::Qualitative(PerpendicularAlignment::Center) => return 0.0,
        Shift::Qualitative(PerpendicularAlignment::Outer) => PERPENDICULAR_STEP_MM,
        Shift::Qualitative(PerpendicularAlignment::Inner) => -PERPENDICULAR_STEP_MM,
        Shift::Numeric(value) => value,
    };
    outward * margin.outward_sign()
}

/// Maps a packing distance and perpendicular shift to a board point.
#[must_use]
pub fn slot_point(margin: &MarginBox, along: f64, across: f64) -> Point {
    let axis = margin.primary_axis();

    let primary = if margin.kind.side().packs_forward() {
        margin.low(axis) + along
    } else {
        margin.high(axis) - along
    };
    let secondary = margin.center_on(axis.perpendicular()) + across;

    match axis {
        Axis::X => Point::new(primary, secondary),
        Axis::Y => Point::new(secondary, primary),
    }
}

/// Positions of `count` contacts in `margin`, centred on the packing axis.
#[must_use]
pub fn slot_points(
    margin: &MarginBox,
    count: usize,
    size_class: SizeClass,
    alignment: Alignment,
) -> Vec<Point> {
    let extent = margin.extent(margin.primary_axis());
    primary_offsets(extent, count, size_class, alignment)
        .into_iter()
        .map(|along| slot_point(margin, along, 0.0))
        .collect()
}

/// Precomputed slot positions per margin.
///
/// Built once, then read with [`ContactGrid::position`] without recomputing
/// any geometry.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ContactGrid {
    slots: IndexMap<MarginKind, Vec<Point>>,
}

impl ContactGrid {
    /// Creates an empty grid.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fills each of `kinds` present in `margins` to capacity.
    ///
    /// Kinds without a matching margin are left out.
    #[must_use]
    pub fn build(
        margins: &[MarginBox],
        kinds: &[MarginKind],
        size_class: SizeClass,
        alignment: Alignment,
    ) -> Self {
        let mut grid = Self::new();
        for kind in kinds {
            let Some(margin) = margins.iter().find(|m| m.kind == *kind) else {
                continue;
            };
            let count = capacity(margin.extent(margin.primary_axis()), size_class);
            grid.insert(*kind, slot_points(margin, count, size_class, alignment));
        }
        grid
    }

    /// Stores the ordered positions for a margin, replacing any previous ones.
    pub fn insert(&mut self, kind: MarginKind, positions: Vec<Point>) {
        self.slots.insert(kind, positions);
    }

    /// Returns the stored position at `index` in `kind`.
    #[must_use]
    pub fn position(&self, kind: MarginKind, index: usize) -> Option<Point> {
        self.slots.get(&kind)?.get(index).copied()
    }

    /// Returns all stored positions for `kind`.
    #[must_use]
    pub fn slots(&self, kind: MarginKind) -> Option<&[Point]> {
        self.slots.get(&kind).map(Vec::as_slice)
    }

    /// Iterates margins in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (MarginKind, &[Point])> {
        self.slots.iter().map(|(kind, points)| (*kind, points.as_slice()))
    }

    /// Total number of stored positions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.values().map(Vec::len).sum()
    }

    /// Returns `true` if no positions are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
