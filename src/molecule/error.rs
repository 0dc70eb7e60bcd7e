//! Error types for molecule layout and contact packing.
//!
//! Both families are deterministic: the same input always reproduces the same
//! error, so callers must change the input rather than retry.

use thiserror::Error;

use crate::molecule::margin::MarginKind;

/// Errors raised while resolving a [`MoleculeSpec`](crate::molecule::MoleculeSpec).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    /// The molecule `type` is missing or not one of the supported layouts.
    #[error("Invalid molecule type: {}. Must be one of: TwoPin, FourPin", display_opt(.value))]
    InvalidMoleculeType {
        /// The raw value supplied, if any.
        value: Option<String>,
    },

    /// The `pinType` key is not in the pin-type table.
    #[error("Invalid pin type '{value}'. Known pin types: {known}")]
    InvalidPinType {
        /// The raw value supplied.
        value: String,
        /// Comma separated list of accepted keys.
        known: String,
    },

    /// The `size` string could not be parsed.
    #[error("Invalid size '{value}'. Expected '<width>x<height>[ absolute|relative]'")]
    InvalidSize {
        /// The raw value supplied.
        value: String,
    },

    /// A magnitude string could not be normalised to millimetres.
    #[error("Invalid length for '{field}': '{value}'")]
    InvalidLength {
        /// The spec field holding the value.
        field: &'static str,
        /// The raw value supplied.
        value: String,
    },
}

fn display_opt(value: &Option<String>) -> String {
    value
        .as_deref()
        .map_or_else(|| "<missing>".to_string(), |v| format!("'{v}'"))
}

/// Errors raised while packing contacts into margins.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PackError {
    /// Contacts of different size classes were routed to the same margin.
    #[error("Mixed contact sizes in margin {margin}: {}", .contacts.join(", "))]
    MixedSize {
        /// The margin the contacts were routed to.
        margin: MarginKind,
        /// Offending contacts, formatted as `name (size)`.
        contacts: Vec<String>,
    },

    /// More contacts were routed to a margin than its grid can hold.
    #[error("Too many contacts for margin {margin}. Requested: {requested}, Capacity: {capacity}")]
    CapacityExceeded {
        /// The overfull margin.
        margin: MarginKind,
        /// Number of contacts requested.
        requested: usize,
        /// Number of grid slots available.
        capacity: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_error_reports_numbers() {
        let error = PackError::CapacityExceeded {
            margin: MarginKind::Left,
            requested: 5,
            capacity: 4,
        };
        let msg = error.to_string();
        assert!(msg.contains("Requested: 5, Capacity: 4"));
        assert!(msg.contains("Left"));
    }

    #[test]
    fn mixed_size_error_names_contacts() {
        let error = PackError::MixedSize {
            margin: MarginKind::Top,
            contacts: vec!["A (medium)".to_string(), "B (large)".to_string()],
        };
        assert_eq!(
            error.to_string(),
            "Mixed contact sizes in margin Top: A (medium), B (large)"
        );
    }

    #[test]
    fn missing_type_display() {
        let error = LayoutError::InvalidMoleculeType { value: None };
        assert!(error.to_string().contains("<missing>"));

        let error = LayoutError::InvalidMoleculeType {
            value: Some("SixPin".to_string()),
        };
        assert!(error.to_string().contains("'SixPin'"));
    }
}
