//! # ferrogz Core
//!
//! Core components for the ferrogz compressor.
//!
//! This crate provides the building blocks underneath the DEFLATE
//! encoder:
//!
//! - [`bitstream`]: LSB-first bit sink for variable-length codes
//! - [`crc`]: CRC-32 checksum for the gzip container
//! - [`traits`]: flush modes and compression levels
//! - [`error`]: error types
//!
//! ## Architecture
//!
//! ferrogz is layered bottom-up:
//!
//! ```text
//! +----------------------------------------------------------+
//! | L3: Container                                            |
//! |     gzip / zlib / raw framing, stream checksums          |
//! +----------------------------------------------------------+
//! | L2: Codec                                                |
//! |     LZ77 match finder, Huffman coding, block encoder     |
//! +----------------------------------------------------------+
//! | L1: BitStream (this crate)                               |
//! |     BitWriter, CRC                                       |
//! +----------------------------------------------------------+
//! ```
//!
//! ## Example
//!
//! ```rust
//! use ferrogz_core::bitstream::BitWriter;
//! use ferrogz_core::crc::Crc32;
//!
//! let mut out = Vec::new();
//! let mut writer = BitWriter::new(&mut out);
//! writer.write_bits(0b0110, 4).unwrap();
//! writer.flush().unwrap();
//!
//! let crc = Crc32::compute(b"Hello, World!");
//! assert_eq!(crc, 0xEC4AC3D0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod bitstream;
pub mod crc;
pub mod error;
pub mod traits;

// Re-exports for convenience
pub use bitstream::BitWriter;
pub use crc::Crc32;
pub use error::{FerrogzError, Result};
pub use traits::{CompressionLevel, FlushMode};
