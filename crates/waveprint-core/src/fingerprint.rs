//! Fingerprint representation
//!
//! A fingerprint is an ordered sequence of 32-bit frame hashes plus a hex
//! digest over the whole sequence. The digest doubles as the identity of the
//! fingerprint for caching purposes.

use serde::{Deserialize, Serialize};

/// Compact fingerprint of an audio stream.
///
/// Invariant: `hashes.len() * 8 == digest.len()`; each hash contributes
/// exactly eight lowercase, zero-padded hex characters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fingerprint {
    /// One 32-bit hash per analysis frame, in frame order
    pub hashes: Vec<u32>,
    /// Duration of the source buffer in milliseconds
    pub duration_ms: u64,
    /// Lowercase hex concatenation of the frame hashes
    pub digest: String,
}

impl Fingerprint {
    /// Build a fingerprint from frame hashes, computing the digest.
    pub fn new(hashes: Vec<u32>, duration_ms: u64) -> Self {
        let digest = encode_digest(&hashes);
        Self {
            hashes,
            duration_ms,
            digest,
        }
    }

    /// Number of frame hashes
    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }
}

/// Hex-encode frame hashes: 8 lowercase zero-padded characters per hash.
pub fn encode_digest(hashes: &[u32]) -> String {
    hashes.iter().map(|h| format!("{:08x}", h)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_encoding() {
        let fp = Fingerprint::new(vec![0x0, 0xdeadbeef, 0x1], 1234);
        assert_eq!(fp.digest, "00000000deadbeef00000001");
        assert_eq!(fp.digest.len(), fp.hashes.len() * 8);
        assert_eq!(fp.duration_ms, 1234);
    }

    #[test]
    fn test_empty_fingerprint() {
        let fp = Fingerprint::default();
        assert!(fp.is_empty());
        assert_eq!(fp.len(), 0);
        assert_eq!(fp.digest, "");
        assert_eq!(fp.duration_ms, 0);
    }
}
