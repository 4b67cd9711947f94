//! Shared compression vocabulary types.

/// Flush behavior for a compression step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlushMode {
    /// No flush - keep buffering for best compression.
    #[default]
    None,
    /// Sync flush - close the current block and byte-align the output so
    /// everything produced so far is decompressible.
    Sync,
    /// Finish - complete the stream.
    Finish,
}

/// Compression level for the DEFLATE match finder.
///
/// Levels 4 through 9 trade throughput for ratio; values outside that
/// range are clamped. `FAST`, `DEFAULT` and `BEST` alias 4, 6 and 9.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionLevel(u8);

impl CompressionLevel {
    /// Fastest compression (level 4).
    pub const FAST: Self = Self(4);
    /// Default compression (level 6).
    pub const DEFAULT: Self = Self(6);
    /// Best compression (level 9, slowest).
    pub const BEST: Self = Self(9);

    /// Create a compression level, clamped to 4..=9.
    pub fn new(level: u8) -> Self {
        Self(level.clamp(4, 9))
    }

    /// Get the level value.
    pub fn level(&self) -> u8 {
        self.0
    }
}

impl Default for CompressionLevel {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<u8> for CompressionLevel {
    fn from(level: u8) -> Self {
        Self::new(level)
    }
}
