use serde::{Deserialize, Serialize};

use crate::error::BoardError;

/// Tunables for a board's spatial index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    /// Edge length of a chunk in grid cells.
    pub chunk_size: i64,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self { chunk_size: 16 }
    }
}

impl BoardConfig {
    pub fn with_chunk_size(chunk_size: i64) -> Result<Self, BoardError> {
        let config = Self { chunk_size };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), BoardError> {
        if self.chunk_size <= 0 {
            return Err(BoardError::InvalidChunkSize(self.chunk_size));
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, BoardError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }
}
