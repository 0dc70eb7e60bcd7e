//! Contact packing entry points.

use std::collections::HashMap;

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::molecule::contacts::grid::{
    capacity, perpendicular_offset, primary_offsets, slot_point, ContactGrid,
};
use crate::molecule::contacts::{Alignment, ContactPosition, ContactRequest};
use crate::molecule::error::PackError;
use crate::molecule::margin::{MarginBox, MarginKind};
use crate::molecule::spec::{MoleculeType, SizeClass};

/// Prefix of auto-generated contact names.
pub const AUTO_NAME_PREFIX: &str = "MC";

/// Margins [`fill_margins`] visits by default for a molecule type.
#[must_use]
pub fn default_fill_kinds(molecule_type: MoleculeType) -> Vec<MarginKind> {
    match molecule_type {
        MoleculeType::FourPin => vec![
            MarginKind::Left,
            MarginKind::Top,
            MarginKind::Right,
            MarginKind::Bottom,
        ],
        MoleculeType::TwoPin => vec![MarginKind::Center],
    }
}

/// Orders `kinds` clockwise (Left, Top, Right, Bottom) followed by any other
/// kinds in the order given, dropping duplicates.
fn clockwise_order(kinds: &[MarginKind]) -> Vec<MarginKind> {
    let mut ordered: Vec<MarginKind> = Vec::with_capacity(kinds.len());
    for kind in kinds {
        if !ordered.contains(kind) {
            ordered.push(*kind);
        }
    }
    ordered.sort_by_key(|kind| kind.clockwise_rank().unwrap_or(u8::MAX));
    ordered
}

/// Fills the named margins to capacity with auto-named contacts
/// (`MC1`, `MC2`, …).
///
/// Margins are visited clockwise; kinds missing from `margins` are skipped.
/// `alignment` defaults to [`Alignment::Center`].
#[must_use]
pub fn fill_margins(
    margins: &[MarginBox],
    kinds: &[MarginKind],
    size_class: SizeClass,
    alignment: Option<Alignment>,
) -> Vec<ContactPosition> {
    let grid = ContactGrid::build(
        margins,
        &clockwise_order(kinds),
        size_class,
        alignment.unwrap_or_default(),
    );

    let contacts: Vec<ContactPosition> = grid
        .iter()
        .flat_map(|(kind, points)| {
            points
                .iter()
                .enumerate()
                .map(move |(index, point)| (kind, index, *point))
        })
        .enumerate()
        .map(|(n, (margin, grid_index, point))| ContactPosition {
            name: format!("{AUTO_NAME_PREFIX}{}", n + 1),
            x: point.x,
            y: point.y,
            margin,
            grid_index,
        })
        .collect();

    debug!(
        size_class = %size_class,
        contacts = contacts.len(),
        "Filled margins"
    );

    contacts
}

/// Places caller-named contacts into their requested margins.
///
/// Requests are grouped by margin in first-appearance order and keep their
/// request order within a margin. `per_margin` overrides `default_alignment`
/// for individual margins.
///
/// Requests naming an unknown margin, or a margin absent from `margins`, are
/// skipped.
///
/// # Errors
///
/// Returns [`PackError::MixedSize`] if one margin receives contacts of
/// different size classes, or [`PackError::CapacityExceeded`] if a margin
/// receives more contacts than its grid holds.
pub fn place_contacts(
    margins: &[MarginBox],
    requests: &[ContactRequest],
    default_alignment: Alignment,
    per_margin: Option<&HashMap<MarginKind, Alignment>>,
) -> Result<Vec<ContactPosition>, PackError> {
    let mut groups: IndexMap<MarginKind, (&MarginBox, Vec<&ContactRequest>)> = IndexMap::new();

    for request in requests {
        let Ok(kind) = request.margin.parse::<MarginKind>() else {
            warn!(contact = %request.name, margin = %request.margin, "Skipping contact for unknown margin");
            continue;
        };
        let Some(margin) = margins.iter().find(|m| m.kind == kind) else {
            warn!(contact = %request.name, margin = %kind, "Skipping contact for margin not in layout");
            continue;
        };
        groups
            .entry(kind)
            .or_insert_with(|| (margin, Vec::new()))
            .1
            .push(request);
    }

    let mut placed = Vec::with_capacity(requests.len());

    for (kind, (margin, group)) in &groups {
        let size_class = uniform_size_class(*kind, group)?;

        let axis = margin.primary_axis();
        let available = capacity(margin.extent(axis), size_class);
        if group.len() > available {
            return Err(PackError::CapacityExceeded {
                margin: *kind,
                requested: group.len(),
                capacity: available,
            });
        }

        let alignment = per_margin
            .and_then(|overrides| overrides.get(kind).copied())
            .unwrap_or(default_alignment);
        let offsets = primary_offsets(margin.extent(axis), group.len(), size_class, alignment);

        for (grid_index, (request, along)) in group.iter().zip(offsets).enumerate() {
            let across = perpendicular_offset(margin, request.perpendicular_shift.unwrap_or_default());
            let point = slot_point(margin, along, across);
            placed.push(ContactPosition {
                name: request.name.clone(),
                x: point.x,
                y: point.y,
                margin: *kind,
                grid_index,
            });
        }
    }

    debug!(
        requested = requests.len(),
        placed = placed.len(),
        margins = groups.len(),
        "Placed contacts"
    );

    Ok(placed)
}

/// Returns the single size class shared by `group`.
fn uniform_size_class(kind: MarginKind, group: &[&ContactRequest]) -> Result<SizeClass, PackError> {
    let first = group.first().map_or_else(SizeClass::default, |r| r.size_class);

    if group.iter().all(|r| r.size_class == first) {
        return Ok(first);
    }

    Err(PackError::MixedSize {
        margin: kind,
        contacts: group
            .iter()
            .map(|r| format!("{} ({})", r.name, r.size_class))
            .collect(),
    })
}
