//! molecule-layout: layout and contact-packing engine for molecule footprints
//!
//! A molecule is a small PCB footprint with two or four structural pins, optional
//! wing extensions and a set of rectangular margins into which contacts are packed.
//! This library computes the board geometry and places contacts on a fixed grid.
//!
//! # Architecture
//!
//! The engine is pure and synchronous:
//!
//! - **Layout**: `MoleculeSpec` → board dimensions, pins, usable margins
//! - **Packing**: margins + contact requests → contact positions
//!
//! Around it sit thin surfaces that never feed back into the engine:
//! a CLI, a stdio MCP server, CSV export and batch loading of spec files.
//!
//! # Modules
//!
//! - [`molecule`]: Layout calculator and contact packer
//! - [`batch`]: Glob-driven loading of spec files
//! - [`export`]: CSV tabulation of results
//! - [`config`]: Configuration loading and validation
//! - [`error`]: Error types for the surfaces
//! - [`mcp`]: MCP protocol implementation

pub mod batch;
pub mod config;
pub mod error;
pub mod export;
pub mod mcp;
pub mod molecule;
