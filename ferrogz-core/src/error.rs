//! Error types for ferrogz operations.
//!
//! A single error enum covers every failure mode of the compressor: I/O
//! failures from the underlying byte source or sink, and internal misuse
//! of the bit-level writer. A clean end of input is never an error; it is
//! reported as `Ok(0)` by the byte source.

use std::io;
use thiserror::Error;

/// The main error type for ferrogz operations.
#[derive(Debug, Error)]
pub enum FerrogzError {
    /// I/O error from the underlying reader/writer. Covers failed reads
    /// and writes, including a sink accepting fewer bytes than offered
    /// (`WriteZero`).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Byte-oriented write requested while the bit register holds a
    /// partial byte.
    #[error("byte write with unfinished bits: {nbits} bits pending")]
    UnfinishedBits {
        /// Number of bits pending in the register.
        nbits: u32,
    },
}

/// Result type alias for ferrogz operations.
pub type Result<T> = std::result::Result<T, FerrogzError>;

impl FerrogzError {
    /// Create an unfinished-bits error.
    pub fn unfinished_bits(nbits: u32) -> Self {
        Self::UnfinishedBits { nbits }
    }
}
