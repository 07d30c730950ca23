use thiserror::Error;

use crate::mdp::Cell;

/// Errors produced while building or solving a grid world.
#[derive(Debug, Error)]
pub enum Error {
    #[error("cell {cell} lies outside the {rows}x{cols} grid")]
    OutOfBounds { cell: Cell, rows: usize, cols: usize },

    #[error("cell {cell} has no legal action")]
    NoLegalAction { cell: Cell },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
