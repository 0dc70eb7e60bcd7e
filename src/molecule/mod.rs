//! Molecule layout and contact packing engine.
//!
//! A molecule is a small PCB footprint: a board outline with two or four
//! structural pins at fixed positions, optional wing extensions, and
//! rectangular margins into which contacts are packed.
//!
//! The engine is two pure stages evaluated in order:
//!
//! 1. [`LayoutCalculator`] turns a [`MoleculeSpec`] into a [`LayoutResult`]
//!    (board dimensions, pins, usable margins).
//! 2. [`fill_margins`] and [`place_contacts`] position contacts on a fixed
//!    grid inside those margins.
//!
//! ```
//! use molecule_layout::molecule::{
//!     calculate, default_fill_kinds, fill_margins, MoleculeSpec, MoleculeType, SizeClass,
//! };
//!
//! let layout = calculate(&MoleculeSpec::new(MoleculeType::FourPin)).unwrap();
//! let contacts = fill_margins(
//!     &layout.margins,
//!     &default_fill_kinds(MoleculeType::FourPin),
//!     SizeClass::Medium,
//!     None,
//! );
//! assert_eq!(contacts.len(), 12);
//! ```

pub mod contacts;
pub mod error;
pub mod layout;
pub mod margin;
pub mod spec;
pub mod units;
pub mod wing;

pub use contacts::{
    default_fill_kinds, fill_margins, place_contacts, Alignment, ContactGrid, ContactPosition,
    ContactRequest, PerpendicularAlignment, Shift,
};
pub use error::{LayoutError, PackError};
pub use layout::{calculate, LayoutCalculator, LayoutResult, Pin};
pub use margin::{MarginBox, MarginKind, Point, Side};
pub use spec::{
    BoardSize, MoleculeSpec, MoleculeType, PinLength, PinSpec, PinType, ResolvedMolecule,
    RoundEdges, RoundEdgesValue, SizeClass, SizeMode,
};
pub use wing::{WingMode, WingValue, Wings};
