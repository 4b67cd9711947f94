//! DEFLATE compression driver.
//!
//! [`Compressor`] wires the pieces together: input bytes flow into the
//! [`SlidingWindow`], the lazy match finder walks the [`HashChain`] to
//! turn them into tokens, and full batches go to the [`BlockEncoder`].
//! The container header is written on construction and the footer with
//! the running checksum on [`Compressor::finish`].
//!
//! Lazy matching follows the classic DEFLATE scheme: a match shorter
//! than the level's `lazy` threshold is held back one position in case
//! the next byte starts a longer one. The pending literal/match pair is
//! plain state on the compressor, resumed by every `tokenize` call.

use crate::block::BlockEncoder;
use crate::container::{Checksum, Container};
use crate::hash_chain::HashChain;
use crate::token::{MAX_DISTANCE, Token, TokenBatch};
use crate::window::{SlidingWindow, WINDOW_SIZE};
use ferrogz_core::error::Result;
use ferrogz_core::traits::{CompressionLevel, FlushMode};
use std::io::{Read, Write};

/// Match-finder tuning for one compression level.
#[derive(Debug, Clone, Copy)]
struct LevelParams {
    /// Reduce the chain budget once a match of this length is in hand.
    good: u16,
    /// Emit matches at least this long immediately, without lazy retry.
    lazy: u16,
    /// Stop searching entirely at this length.
    nice: u16,
    /// Maximum hash chain positions to inspect per search.
    chain: u16,
}

impl LevelParams {
    fn get(level: CompressionLevel) -> Self {
        match level.level() {
            4 => Self { good: 4, lazy: 4, nice: 16, chain: 16 },
            5 => Self { good: 8, lazy: 16, nice: 32, chain: 32 },
            6 => Self { good: 8, lazy: 16, nice: 128, chain: 128 },
            7 => Self { good: 8, lazy: 32, nice: 128, chain: 256 },
            8 => Self { good: 32, lazy: 128, nice: 258, chain: 1024 },
            _ => Self { good: 32, lazy: 258, nice: 258, chain: 4096 },
        }
    }
}

/// Streaming DEFLATE compressor over any `Write` sink.
///
/// All buffers are fixed-size and owned by the compressor; nothing on
/// the token path allocates. A compressor serves exactly one stream.
#[derive(Debug)]
pub struct Compressor<W: Write> {
    params: LevelParams,
    container: Container,
    win: SlidingWindow,
    chain: HashChain,
    tokens: TokenBatch,
    block: BlockEncoder<W>,
    checksum: Checksum,
    bytes_in: u64,
    /// Match found at the previous position, pending a lazy decision.
    prev_match: Option<Token>,
    /// Literal at the previous position, pending with the match.
    prev_literal: Option<u8>,
    finished: bool,
}

impl<W: Write> Compressor<W> {
    /// Create a compressor and write the container header.
    pub fn new(container: Container, mut writer: W, level: CompressionLevel) -> Result<Self> {
        container.write_header(&mut writer)?;
        Ok(Self {
            params: LevelParams::get(level),
            container,
            win: SlidingWindow::new(),
            chain: HashChain::new(),
            tokens: TokenBatch::new(),
            block: BlockEncoder::new(writer),
            checksum: container.checksum(),
            bytes_in: 0,
            prev_match: None,
            prev_literal: None,
            finished: false,
        })
    }

    /// Drain `reader` to the end of stream, compressing as input
    /// arrives. Short reads are fine; `Ok(0)` ends the loop cleanly.
    pub fn compress<R: Read>(&mut self, reader: &mut R) -> Result<()> {
        loop {
            let buf = self.win.writable();
            if buf.is_empty() {
                self.tokenize(FlushMode::None)?;
                self.slide();
                continue;
            }
            let n = reader.read(buf)?;
            if n == 0 {
                return Ok(());
            }
            self.checksum.update(&buf[..n]);
            self.bytes_in += n as u64;
            self.win.written(n);
            self.tokenize(FlushMode::None)?;
        }
    }

    /// Feed a chunk of input.
    pub fn write(&mut self, data: &[u8]) -> Result<()> {
        let mut data = data;
        while !data.is_empty() {
            let buf = self.win.writable();
            if buf.is_empty() {
                self.tokenize(FlushMode::None)?;
                self.slide();
                continue;
            }
            let n = buf.len().min(data.len());
            buf[..n].copy_from_slice(&data[..n]);
            self.checksum.update(&data[..n]);
            self.bytes_in += n as u64;
            self.win.written(n);
            data = &data[n..];
        }
        self.tokenize(FlushMode::None)
    }

    /// Close the current block with a sync flush (RFC 1951 empty stored
    /// block), so everything written so far is decompressible, and
    /// surface the bytes to the sink.
    pub fn flush(&mut self) -> Result<()> {
        self.tokenize(FlushMode::Sync)?;
        self.block.inner_mut().flush()?;
        Ok(())
    }

    /// Write the final block and the container footer.
    pub fn finish(&mut self) -> Result<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.tokenize(FlushMode::Finish)?;
        self.container
            .write_footer(self.block.inner_mut(), &self.checksum, self.bytes_in)?;
        self.block.inner_mut().flush()?;
        Ok(())
    }

    /// Consume the compressor and return the sink.
    pub fn into_inner(self) -> W {
        self.block.into_inner()
    }

    /// Run the match finder over the unread lookahead.
    fn tokenize(&mut self, flush: FlushMode) -> Result<()> {
        let flushing = flush != FlushMode::None;
        loop {
            let (pos, literal) = match self.win.active_lookahead(flushing) {
                Some(lookahead) => (self.win.pos(), lookahead[0]),
                None => break,
            };
            let min_len = self.prev_match.map_or(0, |m| m.length() as usize);

            let mut step = 1usize;
            if let Some(found) =
                find_match(&self.win, &mut self.chain, &self.params, pos, min_len)
            {
                // better match than the previous position had
                self.add_prev_literal()?;
                if found.length() >= self.params.lazy {
                    // long enough to take without a lazy retry
                    step = self.add_match(found)?;
                } else {
                    self.prev_literal = Some(literal);
                    self.prev_match = Some(found);
                }
            } else if let Some(pending) = self.prev_match.take() {
                // nothing better here; the deferred match stands and we
                // are already one byte past its start
                step = self.add_match(pending)? - 1;
            } else {
                self.add_prev_literal()?;
                self.prev_literal = Some(literal);
            }

            // index the skipped positions before advancing
            if step > 1 {
                self.chain
                    .bulk_add(self.win.from_pos(pos + 1), step - 1, (pos + 1) as u16);
            }
            self.win.advance(step);
        }

        if flushing {
            // the loop drained every byte, so at most a literal is left
            debug_assert!(self.prev_match.is_none());
            self.add_prev_literal()?;
            self.flush_tokens(flush)?;
        }
        Ok(())
    }

    fn add_token(&mut self, token: Token) -> Result<()> {
        self.tokens.push(token);
        if self.tokens.is_full() {
            self.flush_tokens(FlushMode::None)?;
        }
        Ok(())
    }

    fn add_prev_literal(&mut self) -> Result<()> {
        if let Some(byte) = self.prev_literal.take() {
            self.add_token(Token::literal(byte))?;
        }
        Ok(())
    }

    /// Add a match token, clear the lazy state, return its length.
    fn add_match(&mut self, token: Token) -> Result<usize> {
        self.add_token(token)?;
        self.prev_literal = None;
        self.prev_match = None;
        Ok(token.length() as usize)
    }

    /// Hand the token batch to the block encoder and reset it.
    fn flush_tokens(&mut self, flush: FlushMode) -> Result<()> {
        let eof = flush == FlushMode::Finish;
        self.block
            .write_block(self.tokens.tokens(), eof, self.win.tokens_buffer())?;
        if flush == FlushMode::Sync {
            // the empty stored block byte-aligns the stream mid-flight
            self.block.stored_block(&[], false)?;
        }
        if flush != FlushMode::None {
            self.block.flush()?;
        }
        self.tokens.reset();
        self.win.flushed();
        Ok(())
    }

    fn slide(&mut self) {
        self.win.slide();
        self.chain.slide(WINDOW_SIZE as u16);
    }
}

/// Search the hash chain for the longest match at `pos`, at least one
/// byte longer than `min_len`.
///
/// The current position is indexed as a side effect. A best length at or
/// past `good` halves the remaining chain budget; one at or past `nice`
/// ends the search immediately.
fn find_match(
    win: &SlidingWindow,
    chain: &mut HashChain,
    params: &LevelParams,
    pos: usize,
    min_len: usize,
) -> Option<Token> {
    let mut len = min_len;
    let mut prev_pos = chain.add(win.from_pos(pos), pos as u16) as usize;
    let mut best: Option<Token> = None;

    let mut tries = params.chain as usize;
    if len >= params.good as usize {
        tries /= 2;
    }

    while prev_pos > 0 && tries > 0 {
        let distance = pos - prev_pos;
        if distance > MAX_DISTANCE as usize {
            break;
        }
        let new_len = win.match_len(prev_pos, pos, len);
        if new_len > len {
            best = Some(Token::backreference(distance as u16, new_len as u16));
            if new_len >= params.nice as usize {
                return best;
            }
            len = new_len;
        }
        prev_pos = chain.prev(prev_pos as u16) as usize;
        tries -= 1;
    }
    best
}

/// Compress `data` as a bare DEFLATE stream.
pub fn deflate(data: &[u8], level: CompressionLevel) -> Result<Vec<u8>> {
    compress_to_vec(Container::Raw, data, level)
}

/// Compress `data` under the given container in one shot.
pub fn compress_to_vec(
    container: Container,
    data: &[u8],
    level: CompressionLevel,
) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    let mut compressor = Compressor::new(container, &mut output, level)?;
    compressor.write(data)?;
    compressor.finish()?;
    drop(compressor);
    Ok(output)
}

/// Which whole-buffer block type a [`SimpleCompressor`] emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SimpleKind {
    Stored,
    Huffman,
}

/// Single-pass compressor without a match finder.
///
/// Buffers input in 65,535-byte chunks and writes each as one block:
/// either stored verbatim or Huffman coded as bare literals. Useful for
/// data known to be incompressible or when LZ77 cost is unwanted.
#[derive(Debug)]
pub struct SimpleCompressor<W: Write> {
    kind: SimpleKind,
    container: Container,
    buffer: Vec<u8>,
    block: BlockEncoder<W>,
    checksum: Checksum,
    bytes_in: u64,
    finished: bool,
}

/// Chunk size of a simple compressor, the stored-block maximum.
const SIMPLE_CHUNK: usize = 65535;

impl<W: Write> SimpleCompressor<W> {
    /// Create a store-only compressor.
    pub fn stored(container: Container, writer: W) -> Result<Self> {
        Self::with_kind(SimpleKind::Stored, container, writer)
    }

    /// Create a Huffman-only compressor.
    pub fn huffman_only(container: Container, writer: W) -> Result<Self> {
        Self::with_kind(SimpleKind::Huffman, container, writer)
    }

    fn with_kind(kind: SimpleKind, container: Container, mut writer: W) -> Result<Self> {
        container.write_header(&mut writer)?;
        Ok(Self {
            kind,
            container,
            buffer: Vec::with_capacity(SIMPLE_CHUNK),
            block: BlockEncoder::new(writer),
            checksum: container.checksum(),
            bytes_in: 0,
            finished: false,
        })
    }

    /// Feed a chunk of input.
    pub fn write(&mut self, data: &[u8]) -> Result<()> {
        self.checksum.update(data);
        self.bytes_in += data.len() as u64;
        let mut data = data;
        while !data.is_empty() {
            let room = SIMPLE_CHUNK - self.buffer.len();
            let n = room.min(data.len());
            self.buffer.extend_from_slice(&data[..n]);
            data = &data[n..];
            if self.buffer.len() == SIMPLE_CHUNK {
                self.write_buffered(false)?;
            }
        }
        Ok(())
    }

    /// Drain `reader` to the end of stream.
    pub fn compress<R: Read>(&mut self, reader: &mut R) -> Result<()> {
        let mut chunk = [0u8; 4096];
        loop {
            let n = reader.read(&mut chunk)?;
            if n == 0 {
                return Ok(());
            }
            self.write(&chunk[..n])?;
        }
    }

    /// Write the final block and the container footer.
    pub fn finish(&mut self) -> Result<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.write_buffered(true)?;
        self.block.flush()?;
        self.container
            .write_footer(self.block.inner_mut(), &self.checksum, self.bytes_in)?;
        self.block.inner_mut().flush()?;
        Ok(())
    }

    fn write_buffered(&mut self, eof: bool) -> Result<()> {
        match self.kind {
            SimpleKind::Stored => self.block.stored_block(&self.buffer, eof)?,
            SimpleKind::Huffman => self.block.write_block_huff(eof, &self.buffer)?,
        }
        self.buffer.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenKind;

    fn inflate(data: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        flate2::read::DeflateDecoder::new(data)
            .read_to_end(&mut out)
            .expect("decoder rejected the stream");
        out
    }

    #[test]
    fn test_deflate_roundtrip_simple() {
        let input = b"Hello, World! Hello, World! Hello, World!";
        let compressed = deflate(input, CompressionLevel::DEFAULT).unwrap();
        assert_eq!(inflate(&compressed), input);
    }

    #[test]
    fn test_deflate_empty() {
        let compressed = deflate(b"", CompressionLevel::DEFAULT).unwrap();
        assert!(inflate(&compressed).is_empty());
        // final fixed block: 10 bits
        assert_eq!(compressed.len(), 2);
    }

    #[test]
    fn test_deflate_single_byte() {
        let compressed = deflate(b"x", CompressionLevel::DEFAULT).unwrap();
        assert_eq!(inflate(&compressed), b"x");
    }

    #[test]
    fn test_deflate_finds_matches() {
        let input = b"abcabcabcabcabcabcabcabcabcabc";
        let compressed = deflate(input, CompressionLevel::BEST).unwrap();
        assert!(compressed.len() < input.len());
        assert_eq!(inflate(&compressed), input);
    }

    #[test]
    fn test_all_levels_roundtrip() {
        let input: Vec<u8> = (0..8192u32)
            .flat_map(|i| (i % 7 + i % 13).to_le_bytes())
            .collect();
        for level in 4..=9 {
            let compressed = deflate(&input, CompressionLevel::new(level)).unwrap();
            assert_eq!(inflate(&compressed), input, "level {} failed", level);
        }
    }

    #[test]
    fn test_window_slide_boundary() {
        // inputs straddling the 32 KiB slide point
        for &size in &[32768usize, 32769, 65536, 65537, 100_000] {
            let input: Vec<u8> = (0..size).map(|i| (i * 31 % 251) as u8).collect();
            let compressed = deflate(&input, CompressionLevel::DEFAULT).unwrap();
            assert_eq!(inflate(&compressed), input, "size {} failed", size);
        }
    }

    #[test]
    fn test_highly_repetitive_input() {
        let input = vec![b'a'; 100_000];
        let compressed = deflate(&input, CompressionLevel::DEFAULT).unwrap();
        assert!(compressed.len() <= 200, "got {} bytes", compressed.len());
        assert_eq!(inflate(&compressed), input);
    }

    #[test]
    fn test_sync_flush_mid_stream() {
        let mut out = Vec::new();
        let mut c = Compressor::new(Container::Raw, &mut out, CompressionLevel::DEFAULT).unwrap();
        c.write(b"first half, first half, ").unwrap();
        c.flush().unwrap();
        let after_flush = c.block.inner_mut().len();
        c.write(b"second half, second half").unwrap();
        c.finish().unwrap();
        drop(c);

        assert!(after_flush > 0);
        assert_eq!(inflate(&out), b"first half, first half, second half, second half");
    }

    #[test]
    fn test_flush_makes_prefix_decompressible() {
        let mut out = Vec::new();
        let mut c = Compressor::new(Container::Raw, &mut out, CompressionLevel::DEFAULT).unwrap();
        c.write(b"hello hello hello hello").unwrap();
        c.flush().unwrap();
        let prefix_len = c.block.inner_mut().len();
        c.write(b" more data").unwrap();
        c.finish().unwrap();
        drop(c);

        // the flushed prefix alone must decode to everything written
        // before the flush
        let mut decoder = flate2::read::DeflateDecoder::new(&out[..prefix_len]);
        let mut prefix = Vec::new();
        // the stream is unterminated, so read what is there
        let _ = decoder.read_to_end(&mut prefix);
        assert_eq!(prefix, b"hello hello hello hello");
    }

    #[test]
    fn test_find_match_prefers_longer() {
        let mut win = SlidingWindow::new();
        let data = b"abcd0123abcdefgh0123abcdefgh";
        win.writable()[..data.len()].copy_from_slice(data);
        win.written(data.len());

        let mut chain = HashChain::new();
        let params = LevelParams::get(CompressionLevel::BEST);
        for pos in 0..20 {
            find_match(&win, &mut chain, &params, pos, 0);
        }
        // at pos 20 the 8-byte "abcdefgh" run at pos 8 must win over the
        // 4-byte "abcd" at pos 0
        let m = find_match(&win, &mut chain, &params, 20, 0).unwrap();
        match m.kind() {
            TokenKind::Match { length, distance } => {
                assert_eq!(length, 8);
                assert_eq!(distance, 12);
            }
            other => panic!("expected a match, got {:?}", other),
        }
    }

    #[test]
    fn test_stored_simple_compressor() {
        let input: Vec<u8> = (0..200_000).map(|i| (i % 256) as u8).collect();
        let mut out = Vec::new();
        let mut c = SimpleCompressor::stored(Container::Raw, &mut out).unwrap();
        c.write(&input).unwrap();
        c.finish().unwrap();
        drop(c);
        // 4 blocks of 5-byte overhead
        assert!(out.len() >= input.len());
        assert_eq!(inflate(&out), input);
    }

    #[test]
    fn test_huffman_only_compressor() {
        let input = vec![b'z'; 50_000];
        let mut out = Vec::new();
        let mut c = SimpleCompressor::huffman_only(Container::Raw, &mut out).unwrap();
        c.write(&input).unwrap();
        c.finish().unwrap();
        drop(c);
        // literal-only coding still beats stored for skewed data
        assert!(out.len() < input.len() / 4);
        assert_eq!(inflate(&out), input);
    }

    #[test]
    fn test_huffman_only_random_falls_back_to_stored() {
        // LCG noise leaves nothing for a literal Huffman code to save
        let mut seed = 0x2545_F491u32;
        let input: Vec<u8> = (0..4096)
            .map(|_| {
                seed = seed.wrapping_mul(1103515245).wrapping_add(12345);
                (seed >> 16) as u8
            })
            .collect();
        let mut out = Vec::new();
        let mut c = SimpleCompressor::huffman_only(Container::Raw, &mut out).unwrap();
        c.write(&input).unwrap();
        c.finish().unwrap();
        drop(c);
        assert_eq!(inflate(&out), input);
    }
}
