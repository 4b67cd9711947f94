//! Edge case and round-trip tests for the DEFLATE compressor.
//!
//! Round trips are verified against an independent RFC 1951 decoder.

use ferrogz_core::CompressionLevel;
use ferrogz_deflate::{Container, Compressor, compress_to_vec, deflate, gzip_compress, zlib_compress};
use std::io::Read;

fn inflate(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    flate2::read::DeflateDecoder::new(data)
        .read_to_end(&mut out)
        .expect("raw deflate stream rejected");
    out
}

fn ungzip(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    flate2::read::GzDecoder::new(data)
        .read_to_end(&mut out)
        .expect("gzip stream rejected");
    out
}

fn unzlib(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    flate2::read::ZlibDecoder::new(data)
        .read_to_end(&mut out)
        .expect("zlib stream rejected");
    out
}

/// Deterministic pseudo-random bytes (LCG, no external crates).
fn random_bytes(len: usize, mut seed: u32) -> Vec<u8> {
    let mut data = Vec::with_capacity(len);
    for _ in 0..len {
        seed = seed.wrapping_mul(1103515245).wrapping_add(12345);
        data.push((seed >> 16) as u8);
    }
    data
}

#[test]
fn test_empty_input_every_container() {
    let raw = deflate(b"", CompressionLevel::DEFAULT).unwrap();
    assert_eq!(inflate(&raw), b"");

    let gz = gzip_compress(b"", CompressionLevel::DEFAULT).unwrap();
    assert_eq!(gz.len(), 20);
    assert_eq!(ungzip(&gz), b"");

    let zl = zlib_compress(b"", CompressionLevel::DEFAULT).unwrap();
    assert_eq!(unzlib(&zl), b"");
}

#[test]
fn test_single_byte() {
    for container in [Container::Raw, Container::Gzip, Container::Zlib] {
        let out = compress_to_vec(container, b"A", CompressionLevel::DEFAULT).unwrap();
        let back = match container {
            Container::Raw => inflate(&out),
            Container::Gzip => ungzip(&out),
            Container::Zlib => unzlib(&out),
        };
        assert_eq!(back, b"A", "container {:?} failed", container);
    }
}

#[test]
fn test_window_slide_boundaries() {
    for size in [32767usize, 32768, 32769, 65535, 65536, 65537] {
        let input: Vec<u8> = (0..size).map(|i| ((i / 3) % 253) as u8).collect();
        let out = deflate(&input, CompressionLevel::DEFAULT).unwrap();
        assert_eq!(inflate(&out), input, "size {} failed", size);
    }
}

#[test]
fn test_cross_block_input() {
    // enough matches to overflow one 32768-token batch
    let mut input = Vec::new();
    while input.len() < 400_000 {
        input.extend_from_slice(b"pack my box with five dozen liquor jugs. ");
    }
    for level in [4u8, 6, 9] {
        let out = deflate(&input, CompressionLevel::new(level)).unwrap();
        assert!(out.len() < input.len() / 10);
        assert_eq!(inflate(&out), input, "level {} failed", level);
    }
}

#[test]
fn test_hundred_thousand_identical_bytes() {
    let input = vec![0x42u8; 100_000];
    let out = deflate(&input, CompressionLevel::DEFAULT).unwrap();
    assert!(out.len() <= 200, "compressed to {} bytes", out.len());
    assert_eq!(inflate(&out), input);
}

#[test]
fn test_length_258_matches() {
    // long runs produce maximum-length matches
    let mut input = vec![b'r'; 10 * 258];
    input.extend_from_slice(b"tail");
    let out = deflate(&input, CompressionLevel::BEST).unwrap();
    assert_eq!(inflate(&out), input);
}

#[test]
fn test_random_input_roundtrip() {
    // incompressible data; stored blocks should win, output stays close
    // to input size
    let input = random_bytes(70_000, 0xDEAD_BEEF);
    let out = deflate(&input, CompressionLevel::DEFAULT).unwrap();
    assert_eq!(inflate(&out), input);
    assert!(out.len() < input.len() + input.len() / 100 + 64);
}

#[test]
fn test_random_input_all_levels() {
    let input = random_bytes(10_000, 7);
    for level in 4..=9 {
        let out = deflate(&input, CompressionLevel::new(level)).unwrap();
        assert_eq!(inflate(&out), input, "level {} failed", level);
    }
}

#[test]
fn test_binary_cycle() {
    let input: Vec<u8> = (0u16..=255).cycle().take(50_000).map(|b| b as u8).collect();
    let out = deflate(&input, CompressionLevel::DEFAULT).unwrap();
    assert_eq!(inflate(&out), input);
}

#[test]
fn test_long_distance_match() {
    // a repeated marker separated by nearly the full window
    let mut input = vec![0u8; 32768];
    let marker = b"NEEDLE-IN-HAYSTACK";
    input[..marker.len()].copy_from_slice(marker);
    input[32768 - marker.len()..].copy_from_slice(marker);
    let out = deflate(&input, CompressionLevel::BEST).unwrap();
    assert_eq!(inflate(&out), input);
}

#[test]
fn test_sync_flush_stream_stays_valid() {
    let mut out = Vec::new();
    let mut c = Compressor::new(Container::Zlib, &mut out, CompressionLevel::DEFAULT).unwrap();
    let mut expected = Vec::new();
    for i in 0..10u8 {
        let chunk: Vec<u8> = (0..1000).map(|j: u32| (j as u8).wrapping_add(i)).collect();
        c.write(&chunk).unwrap();
        expected.extend_from_slice(&chunk);
        // a sync flush between every chunk inserts the 5-byte empty
        // stored block; the decoder must accept all of them
        c.flush().unwrap();
    }
    c.finish().unwrap();
    drop(c);
    assert_eq!(unzlib(&out), expected);
}

#[test]
fn test_incremental_writes_match_single_write() {
    let input = random_bytes(100_000, 99).iter().map(|b| b % 16).collect::<Vec<u8>>();

    let whole = gzip_compress(&input, CompressionLevel::DEFAULT).unwrap();

    let mut out = Vec::new();
    let mut c = Compressor::new(Container::Gzip, &mut out, CompressionLevel::DEFAULT).unwrap();
    for chunk in input.chunks(777) {
        c.write(chunk).unwrap();
    }
    c.finish().unwrap();
    drop(c);

    assert_eq!(whole, out);
    assert_eq!(ungzip(&out), input);
}

#[test]
fn test_reader_with_short_reads() {
    /// Reader that returns one byte at a time.
    struct OneByte<'a>(&'a [u8]);
    impl Read for OneByte<'_> {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.0.is_empty() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.0[0];
            self.0 = &self.0[1..];
            Ok(1)
        }
    }

    let input = b"short reads must not confuse the compressor".repeat(40);
    let mut out = Vec::new();
    let mut c = Compressor::new(Container::Gzip, &mut out, CompressionLevel::DEFAULT).unwrap();
    c.compress(&mut OneByte(&input)).unwrap();
    c.finish().unwrap();
    drop(c);
    assert_eq!(ungzip(&out), input);
}

#[test]
fn test_recompressing_decompressed_output() {
    let input: Vec<u8> = b"idempotence check ".repeat(500);
    let first = gzip_compress(&input, CompressionLevel::DEFAULT).unwrap();
    let decompressed = ungzip(&first);
    let second = gzip_compress(&decompressed, CompressionLevel::DEFAULT).unwrap();
    assert_eq!(ungzip(&second), input);
}
