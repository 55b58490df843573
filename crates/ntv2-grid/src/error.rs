//! Error types for the NTv2 grid crate.

use thiserror::Error;

/// Errors that can occur when reading or sampling NTv2 grids.
#[derive(Debug, Error)]
pub enum GridError {
    /// I/O error reading the grid source.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The source ended before a complete record could be read.
    #[error("Truncated {context} at byte offset {offset}: needed {needed} more bytes")]
    Truncated {
        /// Byte offset of the record that could not be read.
        offset: u64,
        /// Number of bytes the record required.
        needed: usize,
        /// What was being decoded.
        context: &'static str,
    },

    /// The declared node count does not match the lattice dimensions.
    #[error(
        "Sub-grid {name} has inconsistent grid dimensions: {node_count} nodes declared, \
         {columns} x {rows} lattice"
    )]
    InconsistentDimensions {
        /// Sub-grid name.
        name: String,
        /// Node count stored in the header.
        node_count: i64,
        /// Longitude column count derived from the bounds.
        columns: usize,
        /// Latitude row count derived from the bounds.
        rows: usize,
    },

    /// Any other malformed header or file structure.
    #[error("Invalid NTv2 format: {0}")]
    InvalidFormat(String),

    /// Coordinate is outside the lattice of the sub-grid being sampled.
    #[error("Coordinate (lon {lon}, lat {lat}) is outside sub-grid {name}")]
    OutOfBounds {
        /// Sub-grid name.
        name: String,
        /// Requested longitude (positive west seconds).
        lon: f64,
        /// Requested latitude (seconds).
        lat: f64,
    },
}

impl GridError {
    /// Create an invalid format error.
    pub fn invalid_format(message: impl Into<String>) -> Self {
        GridError::InvalidFormat(message.into())
    }
}
