use thiserror::Error;

use crate::geometry::Point;

#[derive(Error, Debug)]
pub enum BoardError {
    #[error("Invalid wire from ({}, {}) to ({}, {}): wires must be straight and non-empty", start.x, start.y, end.x, end.y)]
    InvalidWire { start: Point, end: Point },

    #[error("Invalid chunk size {0}: must be positive")]
    InvalidChunkSize(i64),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
