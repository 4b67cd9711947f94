//! DEFLATE block encoding.
//!
//! [`BlockEncoder`] turns a token batch into output bits. For every
//! block it measures the three encodings RFC 1951 allows - stored, fixed
//! Huffman and dynamic Huffman - and emits the cheapest. Dynamic blocks
//! transmit their own code lengths, run-length compressed over the
//! 19-symbol code length alphabet and then Huffman coded once more.

use crate::huffman::{
    CODELEN_ALPHABET_SIZE, DISTANCE_ALPHABET_SIZE, END_OF_BLOCK, HuffmanBuilder, HuffmanCode,
    LITLEN_ALPHABET_SIZE, MAX_BITS, fixed_distance_encoding, fixed_literal_encoding,
    huff_distance_encoding,
};
use crate::tables::{
    CODE_LENGTH_ORDER, DISTANCE_EXTRA_BITS, LENGTH_CODES_START, LENGTH_EXTRA_BITS,
    distance_to_code, length_to_code,
};
use crate::token::{Token, TokenKind};
use ferrogz_core::bitstream::BitWriter;
use ferrogz_core::error::Result;
use std::io::Write;

/// Largest payload of a single stored block.
const MAX_STORED_BLOCK: usize = 65535;

/// Scratch size for the RLE-compressed code length sequence: both data
/// alphabets plus the end marker.
const CODEGEN_SIZE: usize = LITLEN_ALPHABET_SIZE + DISTANCE_ALPHABET_SIZE + 1;

/// End marker inside the codegen scratch buffer.
const CODEGEN_END: u8 = 255;

/// Maximum code length for the code length alphabet itself.
const CODELEN_MAX_BITS: u32 = 7;

#[inline]
fn emit<W: Write>(writer: &mut BitWriter<W>, code: HuffmanCode) -> Result<()> {
    writer.write_bits(code.code as u64, code.len as u32)
}

/// Encodes token batches as DEFLATE blocks into a bit stream.
///
/// All frequency tables and encodings are owned and reset per block, so
/// a single encoder serves an entire stream without reallocating.
#[derive(Debug)]
pub struct BlockEncoder<W: Write> {
    writer: BitWriter<W>,
    literal_freq: [u32; LITLEN_ALPHABET_SIZE],
    distance_freq: [u32; DISTANCE_ALPHABET_SIZE],
    codegen_freq: [u32; CODELEN_ALPHABET_SIZE],
    codegen: [u8; CODEGEN_SIZE],
    literal_encoding: HuffmanBuilder,
    distance_encoding: HuffmanBuilder,
    codegen_encoding: HuffmanBuilder,
}

impl<W: Write> BlockEncoder<W> {
    /// Create an encoder writing to `writer`.
    pub fn new(writer: W) -> Self {
        Self {
            writer: BitWriter::new(writer),
            literal_freq: [0; LITLEN_ALPHABET_SIZE],
            distance_freq: [0; DISTANCE_ALPHABET_SIZE],
            codegen_freq: [0; CODELEN_ALPHABET_SIZE],
            codegen: [0; CODEGEN_SIZE],
            literal_encoding: HuffmanBuilder::new(LITLEN_ALPHABET_SIZE),
            distance_encoding: HuffmanBuilder::new(DISTANCE_ALPHABET_SIZE),
            codegen_encoding: HuffmanBuilder::new(CODELEN_ALPHABET_SIZE),
        }
    }

    /// Mutable access to the underlying writer. Only safe for container
    /// framing while the bit stream is byte aligned.
    pub fn inner_mut(&mut self) -> &mut W {
        self.writer.get_mut()
    }

    /// Consume the encoder and return the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    /// Byte-align and drain the bit stream.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()
    }

    /// Write one block holding `tokens`, choosing the cheapest of the
    /// stored / fixed / dynamic encodings.
    ///
    /// `input` is the raw byte range behind the tokens when still
    /// available; without it a stored block is not considered.
    pub fn write_block(&mut self, tokens: &[Token], eof: bool, input: Option<&[u8]>) -> Result<()> {
        let (num_literals, num_distances) = self.index_tokens(tokens);

        let (stored_bits, storable) = stored_size(input);
        // the extra bits are shared by fixed and dynamic, so they only
        // matter when a stored block is in contention
        let extra_bits = if storable {
            self.token_extra_bits(num_literals, num_distances)
        } else {
            0
        };

        // fixed Huffman is the baseline
        let mut size = self.fixed_size(extra_bits);
        let mut dynamic = false;

        Self::generate_codegen(
            &mut self.codegen,
            &mut self.codegen_freq,
            num_literals,
            num_distances,
            &self.literal_encoding,
            &self.distance_encoding,
        );
        self.codegen_encoding
            .generate(&self.codegen_freq, CODELEN_MAX_BITS);
        let (dynamic_size, num_codegens) = self.dynamic_size(&self.distance_encoding, extra_bits);

        if dynamic_size < size {
            size = dynamic_size;
            dynamic = true;
        }

        if storable && stored_bits < size {
            return self.stored_block(input.unwrap_or_default(), eof);
        }

        if dynamic {
            self.write_dynamic_header(num_literals, num_distances, num_codegens, eof)?;
        } else {
            self.write_fixed_header(eof)?;
        }
        self.write_tokens(tokens, dynamic)
    }

    /// Write a dynamic block treating `input` as bare literals, with no
    /// match search. Falls back to a stored block only when that is
    /// smaller than the Huffman size plus a 1/16 margin.
    pub fn write_block_huff(&mut self, eof: bool, input: &[u8]) -> Result<()> {
        self.literal_freq.fill(0);
        for &b in input {
            self.literal_freq[b as usize] += 1;
        }
        self.literal_freq[END_OF_BLOCK] = 1;
        let num_literals = END_OF_BLOCK + 1;

        self.distance_freq.fill(0);
        self.distance_freq[0] = 1;
        let num_distances = 1;

        self.literal_encoding.generate(&self.literal_freq, MAX_BITS);

        Self::generate_codegen(
            &mut self.codegen,
            &mut self.codegen_freq,
            num_literals,
            num_distances,
            &self.literal_encoding,
            huff_distance_encoding(),
        );
        self.codegen_encoding
            .generate(&self.codegen_freq, CODELEN_MAX_BITS);
        let (size, num_codegens) = self.dynamic_size(huff_distance_encoding(), 0);

        if let (stored, true) = stored_size(Some(input)) {
            if stored < size + (size >> 4) {
                return self.stored_block(input, eof);
            }
        }

        self.write_dynamic_header(num_literals, num_distances, num_codegens, eof)?;
        for &b in input {
            emit(&mut self.writer, self.literal_encoding.code(b as usize))?;
        }
        emit(&mut self.writer, self.literal_encoding.code(END_OF_BLOCK))
    }

    /// Write a stored block: header, alignment, LEN/NLEN, raw bytes.
    pub fn stored_block(&mut self, input: &[u8], eof: bool) -> Result<()> {
        debug_assert!(input.len() <= MAX_STORED_BLOCK);
        self.writer.write_bits(if eof { 1 } else { 0 }, 3)?;
        self.writer.flush()?;
        let len = input.len() as u16;
        self.writer.write_bits(len as u64, 16)?;
        self.writer.write_bits(!len as u64, 16)?;
        self.writer.write_bytes(input)
    }

    /// Tally token frequencies and regenerate both data encodings.
    ///
    /// Returns the trimmed alphabet sizes `(num_literals,
    /// num_distances)`. The end-of-block symbol always counts once; a
    /// block without matches still reserves one distance code so the
    /// distance tree can be transmitted.
    fn index_tokens(&mut self, tokens: &[Token]) -> (usize, usize) {
        self.literal_freq.fill(0);
        self.distance_freq.fill(0);

        for token in tokens {
            match token.kind() {
                TokenKind::Literal(byte) => {
                    self.literal_freq[byte as usize] += 1;
                }
                TokenKind::Match { length, distance } => {
                    let (len_code, _, _) = length_to_code(length);
                    self.literal_freq[len_code as usize] += 1;
                    let (dist_code, _, _) = distance_to_code(distance);
                    self.distance_freq[dist_code as usize] += 1;
                }
            }
        }
        self.literal_freq[END_OF_BLOCK] += 1;

        let mut num_literals = self.literal_freq.len();
        while self.literal_freq[num_literals - 1] == 0 {
            num_literals -= 1;
        }
        let mut num_distances = self.distance_freq.len();
        while num_distances > 0 && self.distance_freq[num_distances - 1] == 0 {
            num_distances -= 1;
        }
        if num_distances == 0 {
            self.distance_freq[0] = 1;
            num_distances = 1;
        }

        self.literal_encoding.generate(&self.literal_freq, MAX_BITS);
        self.distance_encoding
            .generate(&self.distance_freq, MAX_BITS);
        (num_literals, num_distances)
    }

    /// Sum of the extra bits carried by the current block's tokens. The
    /// first eight length codes and first four distance codes have none.
    fn token_extra_bits(&self, num_literals: usize, num_distances: usize) -> u64 {
        let mut extra = 0u64;
        for code in LENGTH_CODES_START + 8..num_literals {
            extra += self.literal_freq[code] as u64
                * LENGTH_EXTRA_BITS[code - LENGTH_CODES_START] as u64;
        }
        for code in 4..num_distances {
            extra += self.distance_freq[code] as u64 * DISTANCE_EXTRA_BITS[code] as u64;
        }
        extra
    }

    /// Bit size of the block under the fixed encodings.
    fn fixed_size(&self, extra_bits: u64) -> u64 {
        3 + fixed_literal_encoding().bit_length(&self.literal_freq)
            + fixed_distance_encoding().bit_length(&self.distance_freq)
            + extra_bits
    }

    /// Bit size of the block under the freshly generated dynamic
    /// encodings, and the number of code length codes its header needs.
    fn dynamic_size(&self, dist_enc: &HuffmanBuilder, extra_bits: u64) -> (u64, usize) {
        let mut num_codegens = self.codegen_freq.len();
        while num_codegens > 4 && self.codegen_freq[CODE_LENGTH_ORDER[num_codegens - 1]] == 0 {
            num_codegens -= 1;
        }
        let header = 3 + 5
            + 5
            + 4
            + 3 * num_codegens as u64
            + self.codegen_encoding.bit_length(&self.codegen_freq)
            + self.codegen_freq[16] as u64 * 2
            + self.codegen_freq[17] as u64 * 3
            + self.codegen_freq[18] as u64 * 7;
        let size = header
            + self.literal_encoding.bit_length(&self.literal_freq)
            + dist_enc.bit_length(&self.distance_freq)
            + extra_bits;
        (size, num_codegens)
    }

    /// RLE-compress the concatenated code lengths of both data alphabets
    /// into `codegen`, tallying `codegen_freq`.
    ///
    /// Runs of a non-zero length emit the length once, then code 16
    /// ("copy previous 3-6 times"). Zero runs emit code 17 (3-10) or 18
    /// (11-138); shorter runs are spelled out. The scratch ends with a
    /// [`CODEGEN_END`] marker.
    fn generate_codegen(
        codegen: &mut [u8; CODEGEN_SIZE],
        codegen_freq: &mut [u32; CODELEN_ALPHABET_SIZE],
        num_literals: usize,
        num_distances: usize,
        lit_enc: &HuffmanBuilder,
        dist_enc: &HuffmanBuilder,
    ) {
        codegen_freq.fill(0);

        for i in 0..num_literals {
            codegen[i] = lit_enc.code(i).len;
        }
        for i in 0..num_distances {
            codegen[num_literals + i] = dist_enc.code(i).len;
        }
        codegen[num_literals + num_distances] = CODEGEN_END;

        let mut size = codegen[0];
        let mut count: i32 = 1;
        let mut out_index = 0usize;
        let mut in_index = 1usize;
        while size != CODEGEN_END {
            // invariant: `count` copies of `size` are pending output
            let next_size = codegen[in_index];
            in_index += 1;
            if next_size == size {
                count += 1;
                continue;
            }

            if size != 0 {
                codegen[out_index] = size;
                out_index += 1;
                codegen_freq[size as usize] += 1;
                count -= 1;
                while count >= 3 {
                    let n = count.min(6);
                    codegen[out_index] = 16;
                    out_index += 1;
                    codegen[out_index] = (n - 3) as u8;
                    out_index += 1;
                    codegen_freq[16] += 1;
                    count -= n;
                }
            } else {
                while count >= 11 {
                    let n = count.min(138);
                    codegen[out_index] = 18;
                    out_index += 1;
                    codegen[out_index] = (n - 11) as u8;
                    out_index += 1;
                    codegen_freq[18] += 1;
                    count -= n;
                }
                if count >= 3 {
                    codegen[out_index] = 17;
                    out_index += 1;
                    codegen[out_index] = (count - 3) as u8;
                    out_index += 1;
                    codegen_freq[17] += 1;
                    count = 0;
                }
            }

            count -= 1;
            while count >= 0 {
                codegen[out_index] = size;
                out_index += 1;
                codegen_freq[size as usize] += 1;
                count -= 1;
            }

            size = next_size;
            count = 1;
        }
        codegen[out_index] = CODEGEN_END;
    }

    fn write_fixed_header(&mut self, eof: bool) -> Result<()> {
        self.writer.write_bits(if eof { 3 } else { 2 }, 3)
    }

    /// Dynamic block header: HLIT, HDIST, HCLEN, the permuted code
    /// length code lengths, then the RLE sequence with its extra bits.
    fn write_dynamic_header(
        &mut self,
        num_literals: usize,
        num_distances: usize,
        num_codegens: usize,
        eof: bool,
    ) -> Result<()> {
        self.writer.write_bits(if eof { 5 } else { 4 }, 3)?;
        self.writer.write_bits((num_literals - 257) as u64, 5)?;
        self.writer.write_bits((num_distances - 1) as u64, 5)?;
        self.writer.write_bits((num_codegens - 4) as u64, 4)?;

        for &sym in CODE_LENGTH_ORDER.iter().take(num_codegens) {
            let len = self.codegen_encoding.code(sym).len;
            self.writer.write_bits(len as u64, 3)?;
        }

        let mut i = 0;
        loop {
            let code_word = self.codegen[i];
            i += 1;
            if code_word == CODEGEN_END {
                break;
            }
            emit(&mut self.writer, self.codegen_encoding.code(code_word as usize))?;
            match code_word {
                16 => {
                    self.writer.write_bits(self.codegen[i] as u64, 2)?;
                    i += 1;
                }
                17 => {
                    self.writer.write_bits(self.codegen[i] as u64, 3)?;
                    i += 1;
                }
                18 => {
                    self.writer.write_bits(self.codegen[i] as u64, 7)?;
                    i += 1;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Emit every token and the end-of-block code.
    fn write_tokens(&mut self, tokens: &[Token], dynamic: bool) -> Result<()> {
        let (lit, dist): (&HuffmanBuilder, &HuffmanBuilder) = if dynamic {
            (&self.literal_encoding, &self.distance_encoding)
        } else {
            (fixed_literal_encoding(), fixed_distance_encoding())
        };

        for token in tokens {
            match token.kind() {
                TokenKind::Literal(byte) => {
                    emit(&mut self.writer, lit.code(byte as usize))?;
                }
                TokenKind::Match { length, distance } => {
                    let (len_code, len_bits, len_extra) = length_to_code(length);
                    emit(&mut self.writer, lit.code(len_code as usize))?;
                    if len_bits > 0 {
                        self.writer.write_bits(len_extra as u64, len_bits as u32)?;
                    }
                    let (dist_code, dist_bits, dist_extra) = distance_to_code(distance);
                    emit(&mut self.writer, dist.code(dist_code as usize))?;
                    if dist_bits > 0 {
                        self.writer.write_bits(dist_extra as u64, dist_bits as u32)?;
                    }
                }
            }
        }
        emit(&mut self.writer, lit.code(END_OF_BLOCK))
    }
}

/// Bit size of a stored block for `input`, and whether one is possible.
fn stored_size(input: Option<&[u8]>) -> (u64, bool) {
    match input {
        Some(buf) if buf.len() <= MAX_STORED_BLOCK => (((buf.len() + 5) * 8) as u64, true),
        _ => (0, false),
    }
}
