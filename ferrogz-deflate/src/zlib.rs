//! Zlib framing (RFC 1950) and the Adler-32 checksum.
//!
//! The zlib format wraps raw DEFLATE data with a two-byte header and a
//! big-endian Adler-32 trailer:
//!
//! ```text
//! +---+---+============+---+---+---+---+
//! |CMF|FLG| compressed |    ADLER32    |
//! +---+---+============+---+---+---+---+
//! ```
//!
//! The header is fixed at `78 9C`: CM=8 (deflate), CINFO=7 (32K window),
//! FLEVEL=2 (default), no preset dictionary, FCHECK making the pair a
//! multiple of 31.

use crate::container::Container;
use crate::deflate::compress_to_vec;
use ferrogz_core::error::Result;
use ferrogz_core::traits::CompressionLevel;

/// Largest prime smaller than 65536.
const ADLER_MOD: u32 = 65521;

/// Bytes processed between modulo reductions without overflowing.
const NMAX: usize = 5552;

/// Streaming Adler-32 calculator.
///
/// Faster than CRC-32 at the cost of weaker error detection; the zlib
/// container uses it for its trailer.
#[derive(Debug, Clone)]
pub struct Adler32 {
    a: u32,
    b: u32,
}

impl Adler32 {
    /// Create a new calculator.
    pub fn new() -> Self {
        Self { a: 1, b: 0 }
    }

    /// Feed more data into the checksum.
    pub fn update(&mut self, data: &[u8]) {
        let mut a = self.a;
        let mut b = self.b;

        let mut remaining = data;
        while remaining.len() >= NMAX {
            let (chunk, rest) = remaining.split_at(NMAX);
            remaining = rest;
            for &byte in chunk {
                a += byte as u32;
                b += a;
            }
            a %= ADLER_MOD;
            b %= ADLER_MOD;
        }
        for &byte in remaining {
            a += byte as u32;
            b += a;
        }

        self.a = a % ADLER_MOD;
        self.b = b % ADLER_MOD;
    }

    /// Return the checksum of the data fed so far.
    pub fn finish(&self) -> u32 {
        (self.b << 16) | self.a
    }

    /// Compute the Adler-32 of a buffer in one shot.
    pub fn checksum(data: &[u8]) -> u32 {
        let mut adler = Self::new();
        adler.update(data);
        adler.finish()
    }
}

impl Default for Adler32 {
    fn default() -> Self {
        Self::new()
    }
}

/// Compress `data` into a zlib stream.
///
/// # Example
///
/// ```
/// use ferrogz_deflate::zlib_compress;
/// use ferrogz_core::CompressionLevel;
///
/// let compressed = zlib_compress(b"Hello, World!", CompressionLevel::DEFAULT).unwrap();
/// assert_eq!(&compressed[..2], &[0x78, 0x9C]);
/// ```
pub fn zlib_compress(data: &[u8], level: CompressionLevel) -> Result<Vec<u8>> {
    compress_to_vec(Container::Zlib, data, level)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read as _;

    fn unzlib(data: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        flate2::read::ZlibDecoder::new(data)
            .read_to_end(&mut out)
            .expect("decoder rejected the stream");
        out
    }

    #[test]
    fn test_adler32_empty() {
        assert_eq!(Adler32::checksum(&[]), 1);
    }

    #[test]
    fn test_adler32_known_values() {
        assert_eq!(Adler32::checksum(b"Hello"), 0x058C_01F5);
        // RFC 1950 example alphabet
        assert_eq!(Adler32::checksum(b"Wikipedia"), 0x11E6_0398);
    }

    #[test]
    fn test_adler32_incremental() {
        let data = b"Hello, World!";
        let one_shot = Adler32::checksum(data);

        let mut adler = Adler32::new();
        adler.update(&data[..6]);
        adler.update(&data[6..]);
        assert_eq!(adler.finish(), one_shot);
    }

    #[test]
    fn test_adler32_large_input() {
        // cross the NMAX reduction boundary
        let data = vec![0xFFu8; 3 * NMAX + 17];
        let mut adler = Adler32::new();
        adler.update(&data);
        let whole = adler.finish();

        let mut split = Adler32::new();
        split.update(&data[..NMAX + 1]);
        split.update(&data[NMAX + 1..]);
        assert_eq!(split.finish(), whole);
    }

    #[test]
    fn test_zlib_header_and_trailer() {
        let data = b"trailer check";
        let compressed = zlib_compress(data, CompressionLevel::DEFAULT).unwrap();

        assert_eq!(compressed[0], 0x78);
        assert_eq!(compressed[1], 0x9C);
        let cmf_flg = (compressed[0] as u16) * 256 + compressed[1] as u16;
        assert_eq!(cmf_flg % 31, 0);

        let trailer = &compressed[compressed.len() - 4..];
        assert_eq!(trailer, &Adler32::checksum(data).to_be_bytes());
    }

    #[test]
    fn test_zlib_roundtrip() {
        let data = b"Hello, World! Hello, World!";
        let compressed = zlib_compress(data, CompressionLevel::DEFAULT).unwrap();
        assert_eq!(unzlib(&compressed), data);
    }

    #[test]
    fn test_zlib_roundtrip_empty() {
        let compressed = zlib_compress(b"", CompressionLevel::DEFAULT).unwrap();
        assert!(unzlib(&compressed).is_empty());
        // header 2 + empty final block 2 + adler 4
        assert_eq!(compressed.len(), 8);
    }

    #[test]
    fn test_zlib_levels() {
        let data: Vec<u8> = b"the quick brown fox jumps over the lazy dog "
            .iter()
            .cycle()
            .take(4096)
            .copied()
            .collect();
        for level in 4..=9 {
            let compressed = zlib_compress(&data, CompressionLevel::new(level)).unwrap();
            assert_eq!(unzlib(&compressed), data, "level {} failed", level);
        }
    }
}
