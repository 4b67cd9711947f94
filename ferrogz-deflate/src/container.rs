//! Stream containers around the DEFLATE payload.
//!
//! The compressed bit stream can travel bare or wrapped per RFC 1952
//! (gzip: 10-byte header, CRC-32 + ISIZE footer) or RFC 1950 (zlib:
//! 2-byte header, big-endian Adler-32 footer). The container is chosen
//! at construction and checked once per stream boundary, never inside
//! the token loop.

use crate::zlib::Adler32;
use ferrogz_core::crc::Crc32;
use ferrogz_core::error::Result;
use std::io::Write;

/// Framing applied around the raw DEFLATE stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Container {
    /// Bare DEFLATE, no header, footer or checksum.
    Raw,
    /// RFC 1952 framing with CRC-32 and uncompressed length.
    #[default]
    Gzip,
    /// RFC 1950 framing with Adler-32.
    Zlib,
}

impl Container {
    /// Size of the fixed header in bytes.
    pub fn header_size(self) -> usize {
        match self {
            Container::Raw => 0,
            Container::Gzip => 10,
            Container::Zlib => 2,
        }
    }

    /// Size of the footer in bytes.
    pub fn footer_size(self) -> usize {
        match self {
            Container::Raw => 0,
            Container::Gzip => 8,
            Container::Zlib => 4,
        }
    }

    /// Checksum state matching this container.
    pub(crate) fn checksum(self) -> Checksum {
        match self {
            Container::Raw => Checksum::None,
            Container::Gzip => Checksum::Crc32(Crc32::new()),
            Container::Zlib => Checksum::Adler32(Adler32::new()),
        }
    }

    pub(crate) fn write_header<W: Write>(self, writer: &mut W) -> Result<()> {
        match self {
            Container::Raw => {}
            Container::Gzip => {
                // magic, method=deflate, no flags, mtime=0, xfl=0, os=unix
                const HEADER: [u8; 10] = [0x1F, 0x8B, 0x08, 0, 0, 0, 0, 0, 0, 0x03];
                writer.write_all(&HEADER)?;
            }
            Container::Zlib => {
                // CMF 0x78: deflate with a 32K window. FLG 0x9C: default
                // FLEVEL, no preset dictionary, FCHECK making the pair a
                // multiple of 31.
                writer.write_all(&[0x78, 0x9C])?;
            }
        }
        Ok(())
    }

    pub(crate) fn write_footer<W: Write>(
        self,
        writer: &mut W,
        checksum: &Checksum,
        bytes_in: u64,
    ) -> Result<()> {
        match self {
            Container::Raw => {}
            Container::Gzip => {
                writer.write_all(&checksum.value().to_le_bytes())?;
                writer.write_all(&(bytes_in as u32).to_le_bytes())?;
            }
            Container::Zlib => {
                writer.write_all(&checksum.value().to_be_bytes())?;
            }
        }
        Ok(())
    }
}

/// Running checksum over the uncompressed input.
#[derive(Debug)]
pub(crate) enum Checksum {
    None,
    Crc32(Crc32),
    Adler32(Adler32),
}

impl Checksum {
    pub(crate) fn update(&mut self, data: &[u8]) {
        match self {
            Checksum::None => {}
            Checksum::Crc32(crc) => crc.update(data),
            Checksum::Adler32(adler) => adler.update(data),
        }
    }

    pub(crate) fn value(&self) -> u32 {
        match self {
            Checksum::None => 0,
            Checksum::Crc32(crc) => crc.finish(),
            Checksum::Adler32(adler) => adler.finish(),
        }
    }
}
