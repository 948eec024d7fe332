use thiserror::Error;

use gatebench_core::TypeId;

use crate::unit::LinkId;

#[derive(Error, Debug)]
pub enum CompileError {
    #[error("Element type {0} could not be resolved")]
    TypeNotFound(TypeId),

    #[error("Circuit types reference each other in a cycle: {}", format_cycle(.0))]
    CyclicDependency(Vec<TypeId>),

    #[error("Link id {0} does not fit the 32-bit netlist encoding")]
    LinkOverflow(LinkId),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

fn format_cycle(cycle: &[TypeId]) -> String {
    cycle
        .iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

pub type Result<T> = std::result::Result<T, CompileError>;
