//! Gzip framing (RFC 1952).
//!
//! A gzip member is a fixed 10-byte header, the DEFLATE payload, and an
//! 8-byte trailer holding the CRC-32 of the uncompressed data followed
//! by its length modulo 2^32, both little-endian. The header carries no
//! optional fields: zero flags, zero mtime, OS code 3 (Unix).

use crate::container::Container;
use crate::deflate::{Compressor, compress_to_vec};
use ferrogz_core::error::Result;
use ferrogz_core::traits::CompressionLevel;
use std::io::{Read, Write};

/// Compress `data` into a gzip member.
///
/// # Example
///
/// ```
/// use ferrogz_deflate::gzip_compress;
/// use ferrogz_core::CompressionLevel;
///
/// let compressed = gzip_compress(b"Hello, World!", CompressionLevel::DEFAULT).unwrap();
/// assert_eq!(&compressed[..2], &[0x1F, 0x8B]);
/// ```
pub fn gzip_compress(data: &[u8], level: CompressionLevel) -> Result<Vec<u8>> {
    compress_to_vec(Container::Gzip, data, level)
}

/// Stream `reader` into `writer` as a gzip member.
pub fn gzip<R: Read, W: Write>(reader: &mut R, writer: W, level: CompressionLevel) -> Result<()> {
    let mut compressor = Compressor::new(Container::Gzip, writer, level)?;
    compressor.compress(reader)?;
    compressor.finish()
}
