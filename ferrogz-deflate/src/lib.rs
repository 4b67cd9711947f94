//! # ferrogz Deflate
//!
//! Pure Rust DEFLATE compressor (RFC 1951) with gzip (RFC 1952) and
//! zlib (RFC 1950) framing.
//!
//! The encoder runs an LZ77 match finder with lazy matching over a
//! 32 KiB sliding window, builds length-limited optimum Huffman codes
//! per block, and picks the cheapest of the stored, fixed and dynamic
//! block encodings. Decompression is out of scope; any RFC 1951
//! decoder recovers the input exactly.
//!
//! ## Example
//!
//! ```rust
//! use ferrogz_deflate::gzip_compress;
//! use ferrogz_core::CompressionLevel;
//!
//! let compressed = gzip_compress(b"Hello, World!", CompressionLevel::DEFAULT).unwrap();
//! assert_eq!(&compressed[..2], &[0x1F, 0x8B]);
//! ```
//!
//! ## Compression levels
//!
//! Levels 4-9 tune the match finder's search depth and lazy-matching
//! thresholds. `CompressionLevel::FAST` (4) favors throughput,
//! `CompressionLevel::BEST` (9) ratio; the default is 6.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod block;
pub mod container;
pub mod deflate;
pub mod gzip;
pub mod hash_chain;
pub mod huffman;
pub mod tables;
pub mod token;
pub mod window;
pub mod zlib;

// Re-exports
pub use container::Container;
pub use deflate::{Compressor, SimpleCompressor, compress_to_vec, deflate};
pub use gzip::{gzip, gzip_compress};
pub use huffman::HuffmanBuilder;
pub use token::{Token, TokenKind};
pub use zlib::{Adler32, zlib_compress};
