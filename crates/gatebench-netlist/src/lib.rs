//! # Gatebench Netlist
//!
//! Hierarchical netlist compiler. Each circuit type is compiled once into
//! locally labeled simulation units and cached; a compile pass then expands
//! nested circuit instances depth-first into one flat, globally labeled
//! unit list for the simulation engine.
//!
//! Only types whose boards were edited (or whose nested types changed) are
//! recompiled between passes.

pub mod circuit;
pub mod compiled;
pub mod compiler;
pub mod error;
pub mod flatten;
pub mod unit;

pub use circuit::{Circuit, CircuitSet};
pub use compiled::CompiledCircuit;
pub use compiler::{CompilerConfig, NetlistCompiler};
pub use error::{CompileError, Result};
pub use flatten::{FlattenedNetlist, InstancePath, LinkSources, PinSource, WireSource};
pub use unit::{decode_units, encode_units, LinkId, SimulationUnit, UNLINKED};
