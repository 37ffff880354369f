//! Contains all possible errors that can occur in the crate.

use std::fmt::{Display, Error, Formatter};

/// Generic error enumeration for every fallible operation on terrain data.
#[derive(Debug)]
pub enum TerrainError {
    /// Terrain size must be at least 1. Stores the rejected value.
    InvalidSize(i32),

    /// Generic input/output error, occurs when loading or saving terrain data.
    Io(std::io::Error),
}

impl From<std::io::Error> for TerrainError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl Display for TerrainError {
    fn fmt(&self, f: &mut Formatter) -> Result<(), Error> {
        match self {
            Self::InvalidSize(size) => {
                write!(f, "invalid terrain size {}, must be at least 1", size)
            }
            Self::Io(io) => write!(f, "io error: {}", io),
        }
    }
}

impl std::error::Error for TerrainError {}
