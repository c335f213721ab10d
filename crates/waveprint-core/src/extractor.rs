//! Fingerprint extraction
//!
//! Windowed spectral analysis over overlapping frames: each frame is Hamming
//! windowed, transformed to a magnitude spectrum, grouped into log-energy
//! bands, and hashed against the previous frame's bands. Bit `i` of a frame
//! hash records whether band `i` gained energy since the last frame.

use crate::audio::AudioBuffer;
use crate::fingerprint::Fingerprint;
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::f32::consts::PI;
use std::sync::Arc;

/// Samples per analysis frame
pub const FRAME_SIZE: usize = 4096;
/// Samples between frame starts
pub const HOP_SIZE: usize = FRAME_SIZE / 2;
/// Spectral bands per frame; the top band has no hash bit and is dropped
pub const NUM_BANDS: usize = 33;

const HASH_BITS: usize = 32;

/// Deterministic extractor turning sample buffers into fingerprints.
///
/// The FFT plan and window are reusable across calls; the temporal state of
/// the band derivative is reset on every extraction.
pub struct FingerprintExtractor {
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
}

impl FingerprintExtractor {
    pub fn new() -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(FRAME_SIZE);

        Self {
            fft,
            window: create_hamming_window(FRAME_SIZE),
        }
    }

    /// Extract a fingerprint from a mono sample buffer.
    ///
    /// Buffers shorter than one frame (or with a zero sample rate) produce
    /// an empty fingerprint.
    pub fn extract(&self, audio: &AudioBuffer) -> Fingerprint {
        if audio.samples.len() < FRAME_SIZE || audio.sample_rate == 0 {
            return Fingerprint::default();
        }

        let duration_ms = audio.samples.len() as u64 * 1000 / audio.sample_rate as u64;
        let num_frames = (audio.samples.len() - FRAME_SIZE) / HOP_SIZE + 1;

        let mut hashes = Vec::with_capacity(num_frames);
        let mut prev_features = [0.0f32; NUM_BANDS];
        let mut frame = vec![Complex::new(0.0f32, 0.0); FRAME_SIZE];

        for frame_idx in 0..num_frames {
            let start = frame_idx * HOP_SIZE;

            // Window the frame into the FFT buffer
            for (n, slot) in frame.iter_mut().enumerate() {
                *slot = Complex::new(audio.samples[start + n] * self.window[n], 0.0);
            }

            self.fft.process(&mut frame);

            let features = band_energies(&frame);
            hashes.push(derivative_hash(&features, &prev_features));
            prev_features = features;
        }

        log::trace!(
            "extracted {} frame hashes from {} samples",
            hashes.len(),
            audio.samples.len()
        );

        Fingerprint::new(hashes, duration_ms)
    }
}

impl Default for FingerprintExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Hamming window of the given length
fn create_hamming_window(size: usize) -> Vec<f32> {
    (0..size)
        .map(|n| 0.54 - 0.46 * (2.0 * PI * n as f32 / (size - 1) as f32).cos())
        .collect()
}

/// Group the magnitude spectrum into log-energy bands.
///
/// The first `FRAME_SIZE / 2` FFT bins are split into equal-width groups;
/// high bins past the last full band are discarded.
fn band_energies(spectrum: &[Complex<f32>]) -> [f32; NUM_BANDS] {
    let num_bins = FRAME_SIZE / 2;
    let bins_per_band = num_bins / NUM_BANDS;

    let mut features = [0.0f32; NUM_BANDS];
    for (band, feature) in features.iter_mut().enumerate() {
        let start_bin = band * bins_per_band;
        let end_bin = start_bin + bins_per_band;

        let energy: f32 = spectrum[start_bin..end_bin]
            .iter()
            .map(|c| c.norm_sqr())
            .sum();

        *feature = (1.0 + energy).ln();
    }

    features
}

/// Hash the sign of the band-energy movement between adjacent frames.
///
/// 33 bands are computed but the hash holds 32 bits, so the top band never
/// contributes.
fn derivative_hash(features: &[f32; NUM_BANDS], prev_features: &[f32; NUM_BANDS]) -> u32 {
    let mut hash = 0u32;
    for i in 0..HASH_BITS {
        if features[i] > prev_features[i] {
            hash |= 1 << i;
        }
    }
    hash
}

/// Pairwise similarity between two fingerprints in `[0, 1]`.
///
/// Compares the common prefix hash-by-hash and counts agreeing bits; empty
/// fingerprints compare as 0.0.
pub fn calculate_similarity(a: &Fingerprint, b: &Fingerprint) -> f64 {
    if a.hashes.is_empty() || b.hashes.is_empty() {
        return 0.0;
    }

    let min_length = a.hashes.len().min(b.hashes.len());
    let mut matching_bits = 0u64;

    for i in 0..min_length {
        let xor = a.hashes[i] ^ b.hashes[i];
        matching_bits += (32 - xor.count_ones()) as u64;
    }

    let total_bits = 32 * min_length as u64;
    matching_bits as f64 / total_bits as f64
}
