//! # Gatebench Core
//!
//! Element model, element-type registry and the chunked board index that
//! keeps placed wires and components collision-free. Wires merge, split and
//! track their junctions as the board is edited.
//!
//! This crate is what the netlist compiler reads circuits from.

pub mod geometry;
pub mod element;
pub mod element_type;
pub mod board;
pub mod config;
pub mod error;
pub mod spatial;

pub use board::{Board, BoardChange, JunctionEvent, NormalizeRule};
pub use config::BoardConfig;
pub use element::{Element, ElementId, Rotation, UNASSIGNED_ID};
pub use element_type::{type_ids, ElementType, TypeId, TypeKind, TypeProvider, TypeRegistry};
pub use error::BoardError;
pub use geometry::{GridRect, Point};
