//! Fingerprint file structures

use thiserror::Error;

/// Magic bytes: "WVFP"
pub const MAGIC: [u8; 4] = [0x57, 0x56, 0x46, 0x50];

/// Current format version
pub const VERSION: u16 = 1;

/// Header flag bit 0: a digest section follows the hash payload
pub const FLAG_DIGEST: u16 = 0x1;

/// File header (20 bytes fixed size)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FpHeader {
    /// Magic bytes: "WVFP"
    pub magic: [u8; 4],
    /// Format version
    pub version: u16,
    /// Flags (bit 0: digest present)
    pub flags: u16,
    /// Source duration (milliseconds)
    pub duration_ms: u64,
    /// Number of frame hashes in the payload
    pub num_hashes: u32,
}

impl FpHeader {
    pub fn new(duration_ms: u64, num_hashes: u32, with_digest: bool) -> Self {
        Self {
            magic: MAGIC,
            version: VERSION,
            flags: if with_digest { FLAG_DIGEST } else { 0 },
            duration_ms,
            num_hashes,
        }
    }

    pub fn has_digest(&self) -> bool {
        (self.flags & FLAG_DIGEST) != 0
    }
}

/// Errors raised while reading or writing fingerprint files.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("bad magic bytes: not a fingerprint file")]
    BadMagic,
    #[error("unsupported format version: {0}")]
    UnsupportedVersion(u16),
    #[error("truncated payload: expected {expected} hashes, file holds {actual}")]
    TruncatedPayload { expected: u32, actual: u32 },
    #[error("stored digest does not match hash payload")]
    DigestMismatch,
}
