//! Length-limited canonical Huffman code construction.
//!
//! [`HuffmanBuilder`] turns a symbol frequency table into canonical
//! codes minimizing the total encoded bit count, subject to a maximum
//! code length. The construction is an iterative package-merge: a ladder
//! of one record per permitted bit length, where each level repeatedly
//! takes the cheaper of its next unused symbol or a pair formed on the
//! level below, until the top level has produced `2n - 2` items.
//!
//! Codes are stored bit-reversed because DEFLATE emits the most
//! significant code bit first inside an LSB-first byte stream
//! (RFC 1951 section 3.1.1).

use std::sync::OnceLock;

/// Maximum permitted code length for the data alphabets.
pub const MAX_BITS: u32 = 15;

/// Size of the literal/length alphabet (0-285).
pub const LITLEN_ALPHABET_SIZE: usize = 286;

/// Size of the distance alphabet (0-29).
pub const DISTANCE_ALPHABET_SIZE: usize = 30;

/// Size of the code length alphabet (0-18).
pub const CODELEN_ALPHABET_SIZE: usize = 19;

/// End of block symbol.
pub const END_OF_BLOCK: usize = 256;

/// Ladder capacity; one past the deepest permitted level, plus a spill
/// slot for the run-out bookkeeping.
const MAX_BITS_LIMIT: usize = MAX_BITS as usize + 1;

/// Frequency standing in for "no more items at this level".
const SENTINEL_FREQ: u32 = i32::MAX as u32;

/// A single canonical Huffman code, stored bit-reversed for emission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HuffmanCode {
    /// The code bits, reversed to `len` width.
    pub code: u16,
    /// Code length in bits; 0 for absent symbols.
    pub len: u8,
}

/// Reverse the low `len` bits of `code`.
#[inline]
fn reverse_bits(code: u16, len: u8) -> u16 {
    debug_assert!(len >= 1 && len <= 16);
    code.reverse_bits() >> (16 - len)
}

/// A symbol with its frequency, the unit the ladder operates on.
#[derive(Debug, Clone, Copy)]
struct LiteralNode {
    literal: u16,
    freq: u32,
}

/// Bookkeeping for one level of the package-merge ladder.
#[derive(Debug, Clone, Copy, Default)]
struct LevelInfo {
    /// Frequency of the item most recently added at this level.
    last_freq: u32,
    /// Frequency of the next unused symbol.
    next_char_freq: u32,
    /// Frequency of the next pair from the level below.
    next_pair_freq: u32,
    /// Items this level still owes the level above.
    needed: i32,
}

/// Builds length-limited canonical Huffman codes from frequencies.
///
/// The scratch buffers are reused across blocks; `generate` overwrites
/// the previous code table in place.
#[derive(Debug)]
pub struct HuffmanBuilder {
    codes: Vec<HuffmanCode>,
    freq_cache: Vec<LiteralNode>,
}

impl HuffmanBuilder {
    /// Create a builder for an alphabet of the given size.
    pub fn new(alphabet_size: usize) -> Self {
        Self {
            codes: vec![HuffmanCode::default(); alphabet_size],
            freq_cache: Vec::with_capacity(alphabet_size + 1),
        }
    }

    /// The code assigned to `symbol` by the last `generate` call.
    #[inline]
    pub fn code(&self, symbol: usize) -> HuffmanCode {
        self.codes[symbol]
    }

    /// All codes, indexed by symbol.
    pub fn codes(&self) -> &[HuffmanCode] {
        &self.codes
    }

    /// Sum in bits of encoding every symbol occurrence under the current
    /// codes.
    pub fn bit_length(&self, freq: &[u32]) -> u64 {
        let mut total = 0u64;
        for (i, &f) in freq.iter().enumerate() {
            if f != 0 {
                total += f as u64 * self.codes[i].len as u64;
            }
        }
        total
    }

    /// Build codes for `freq`, none longer than `max_bits`.
    ///
    /// Zero-frequency symbols get no code. With two or fewer present
    /// symbols everything has bit length 1, which sidesteps the general
    /// construction's assumption of at least one internal pair.
    pub fn generate(&mut self, freq: &[u32], max_bits: u32) {
        debug_assert!(freq.len() <= self.codes.len());
        debug_assert!(max_bits <= MAX_BITS);

        let mut list = std::mem::take(&mut self.freq_cache);
        list.clear();
        for (i, &f) in freq.iter().enumerate() {
            if f != 0 {
                list.push(LiteralNode {
                    literal: i as u16,
                    freq: f,
                });
            } else {
                self.codes[i] = HuffmanCode::default();
            }
        }

        if list.len() <= 2 {
            for (i, node) in list.iter().enumerate() {
                self.codes[node.literal as usize] = HuffmanCode {
                    code: i as u16,
                    len: 1,
                };
            }
            self.freq_cache = list;
            return;
        }

        list.sort_by(|a, b| a.freq.cmp(&b.freq).then(a.literal.cmp(&b.literal)));
        let bit_count = Self::bit_counts(&mut list, max_bits);
        self.assign(&bit_count, &mut list);
        self.freq_cache = list;
    }

    /// Count how many symbols receive each code length.
    ///
    /// `list` is sorted by ascending `(freq, literal)` and holds at least
    /// three entries. Returns `bit_count` where `bit_count[b]` is the
    /// number of symbols encoded in `b` bits.
    fn bit_counts(list: &mut Vec<LiteralNode>, max_bits: u32) -> [u32; MAX_BITS_LIMIT + 1] {
        let n = list.len() as u32;
        // a tree over n symbols cannot be deeper than n - 1
        let max_bits = (max_bits.min(n - 1)) as usize;

        // sentinel so the next-symbol cursor can run one past the end
        list.push(LiteralNode {
            literal: u16::MAX,
            freq: SENTINEL_FREQ,
        });

        let mut levels = [LevelInfo::default(); MAX_BITS_LIMIT + 2];
        // leaf_counts[i][j]: symbols used at level j by the partial tree
        // whose deepest level is i
        let mut leaf_counts = [[0u32; MAX_BITS_LIMIT + 1]; MAX_BITS_LIMIT + 2];

        for level in 1..=max_bits {
            // every level starts as if its first pair (the two cheapest
            // symbols) were already formed
            levels[level] = LevelInfo {
                last_freq: list[1].freq,
                next_char_freq: list[2].freq,
                next_pair_freq: list[0].freq + list[1].freq,
                needed: 0,
            };
            leaf_counts[level][level] = 2;
            if level == 1 {
                levels[level].next_pair_freq = SENTINEL_FREQ;
            }
        }

        // the top level must produce 2n - 2 items and already holds 2
        levels[max_bits].needed = 2 * n as i32 - 4;

        let mut level = max_bits;
        loop {
            if levels[level].next_pair_freq == SENTINEL_FREQ
                && levels[level].next_char_freq == SENTINEL_FREQ
            {
                // this level ran out of both symbols and pairs; park it
                // and never descend here again
                debug_assert!(level < max_bits);
                levels[level].needed = 0;
                levels[level + 1].next_pair_freq = SENTINEL_FREQ;
                level += 1;
                continue;
            }

            let prev_freq = levels[level].last_freq;
            if levels[level].next_char_freq < levels[level].next_pair_freq {
                // the next item on this row is a leaf
                let count = leaf_counts[level][level] + 1;
                levels[level].last_freq = levels[level].next_char_freq;
                leaf_counts[level][level] = count;
                levels[level].next_char_freq = list[count as usize].freq;
            } else {
                // the next item is a pair from the level below, which now
                // owes two more items
                levels[level].last_freq = levels[level].next_pair_freq;
                let below = leaf_counts[level - 1];
                leaf_counts[level][..level].copy_from_slice(&below[..level]);
                levels[level - 1].needed = 2;
            }

            levels[level].needed -= 1;
            if levels[level].needed == 0 {
                if level == max_bits {
                    break;
                }
                // hand the pair just completed to the level above
                levels[level + 1].next_pair_freq = prev_freq + levels[level].last_freq;
                level += 1;
            } else {
                // replenish any deficit created below
                while levels[level - 1].needed > 0 {
                    level -= 1;
                }
            }
        }

        debug_assert_eq!(
            leaf_counts[max_bits][max_bits], n,
            "package-merge must consume every symbol"
        );
        list.pop();

        let mut bit_count = [0u32; MAX_BITS_LIMIT + 1];
        let mut bits = 1;
        for level in (1..=max_bits).rev() {
            // symbols used at this level but not above it need exactly
            // `bits` bits
            bit_count[bits] = leaf_counts[max_bits][level] - leaf_counts[max_bits][level - 1];
            bits += 1;
        }
        bit_count
    }

    /// Assign canonical code values from the per-length symbol counts.
    ///
    /// Shorter lengths go to the high-frequency tail of the sorted list;
    /// within one length class codes increase with symbol index.
    fn assign(&mut self, bit_count: &[u32], list: &mut [LiteralNode]) {
        let mut code: u16 = 0;
        let mut end = list.len();
        for (bits, &count) in bit_count.iter().enumerate() {
            code <<= 1;
            if bits == 0 || count == 0 {
                continue;
            }
            let chunk = &mut list[end - count as usize..end];
            chunk.sort_by_key(|node| node.literal);
            for node in chunk.iter() {
                self.codes[node.literal as usize] = HuffmanCode {
                    code: reverse_bits(code, bits as u8),
                    len: bits as u8,
                };
                code += 1;
            }
            end -= count as usize;
        }
        debug_assert_eq!(end, 0);
    }
}

/// The fixed literal/length encoding (RFC 1951 section 3.2.6).
pub fn fixed_literal_encoding() -> &'static HuffmanBuilder {
    static ENCODING: OnceLock<HuffmanBuilder> = OnceLock::new();
    ENCODING.get_or_init(|| {
        let mut h = HuffmanBuilder::new(LITLEN_ALPHABET_SIZE);
        for ch in 0..LITLEN_ALPHABET_SIZE as u16 {
            let (bits, len): (u16, u8) = match ch {
                0..=143 => (ch + 48, 8),
                144..=255 => (ch + 400 - 144, 9),
                256..=279 => (ch - 256, 7),
                _ => (ch + 192 - 280, 8),
            };
            h.codes[ch as usize] = HuffmanCode {
                code: reverse_bits(bits, len),
                len,
            };
        }
        h
    })
}

/// The fixed distance encoding: 30 five-bit codes.
pub fn fixed_distance_encoding() -> &'static HuffmanBuilder {
    static ENCODING: OnceLock<HuffmanBuilder> = OnceLock::new();
    ENCODING.get_or_init(|| {
        let mut h = HuffmanBuilder::new(DISTANCE_ALPHABET_SIZE);
        for ch in 0..DISTANCE_ALPHABET_SIZE as u16 {
            h.codes[ch as usize] = HuffmanCode {
                code: reverse_bits(ch, 5),
                len: 5,
            };
        }
        h
    })
}

/// Single-symbol distance encoding for blocks holding only literals.
pub fn huff_distance_encoding() -> &'static HuffmanBuilder {
    static ENCODING: OnceLock<HuffmanBuilder> = OnceLock::new();
    ENCODING.get_or_init(|| {
        let mut freq = [0u32; DISTANCE_ALPHABET_SIZE];
        freq[0] = 1;
        let mut h = HuffmanBuilder::new(DISTANCE_ALPHABET_SIZE);
        h.generate(&freq, MAX_BITS);
        h
    })
}
