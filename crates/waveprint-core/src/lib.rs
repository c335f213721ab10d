//! Waveprint Core - Audio Fingerprinting Library
//!
//! This crate turns decoded audio into compact fingerprints: a sequence of
//! 32-bit frame hashes derived from the temporal movement of spectral band
//! energies, plus a hex digest over the whole sequence.

pub mod audio;
pub mod extractor;
pub mod fingerprint;

pub use audio::{AudioBuffer, DecodeError, Decoder, WavDecoder};
pub use extractor::{calculate_similarity, FingerprintExtractor};
pub use fingerprint::Fingerprint;

/// Generate a fingerprint from an audio file
pub fn fingerprint_file(path: &std::path::Path) -> Result<Fingerprint, DecodeError> {
    let decoder = WavDecoder;
    let buffer = decoder.decode(path)?;
    let mono = buffer.to_mono();
    Ok(FingerprintExtractor::new().extract(&mono))
}
