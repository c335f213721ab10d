//! Audio buffer model and decoder collaborators
//!
//! The fingerprint extractor consumes prepared mono sample buffers; decoding
//! media into those buffers is the job of a `Decoder` implementation.

mod wav;

pub use wav::WavDecoder;

use std::path::Path;
use thiserror::Error;

/// Errors raised while decoding media into sample buffers.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("audio file not found: {0}")]
    NotFound(String),
    #[error("unsupported audio format: {0}")]
    Unsupported(String),
    #[error("wav decode error: {0}")]
    Wav(#[from] hound::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Decoded audio samples with their declared rate and channel layout.
///
/// Samples are interleaved floats in `[-1, 1]`. The extractor expects a mono
/// buffer; multichannel audio is downmixed with [`AudioBuffer::to_mono`].
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl AudioBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        Self {
            samples,
            sample_rate,
            channels,
        }
    }

    /// Downmix to mono by averaging channels
    pub fn to_mono(&self) -> AudioBuffer {
        if self.channels <= 1 {
            return self.clone();
        }

        let mut mono = Vec::with_capacity(self.samples.len() / self.channels as usize);
        for chunk in self.samples.chunks(self.channels as usize) {
            let avg: f32 = chunk.iter().sum::<f32>() / chunk.len() as f32;
            mono.push(avg);
        }

        AudioBuffer {
            samples: mono,
            sample_rate: self.sample_rate,
            channels: 1,
        }
    }
}

/// Decoder collaborator: turns an on-disk media file into a sample buffer.
pub trait Decoder {
    fn decode(&self, path: &Path) -> Result<AudioBuffer, DecodeError>;
}

/// Generate a deterministic mono test tone: a mix of three sinusoids.
///
/// Stands in for decoded media in tests and fixtures.
pub fn synthetic_tone(sample_rate: u32, duration_s: f32) -> AudioBuffer {
    let num_samples = (sample_rate as f32 * duration_s) as usize;
    let mut samples = Vec::with_capacity(num_samples);

    for i in 0..num_samples {
        let t = i as f32 / sample_rate as f32;
        let sample = 0.5 * (2.0 * std::f32::consts::PI * 440.0 * t).sin()
            + 0.3 * (2.0 * std::f32::consts::PI * 880.0 * t).sin()
            + 0.2 * (2.0 * std::f32::consts::PI * 1320.0 * t).sin();
        samples.push(sample);
    }

    AudioBuffer::new(samples, sample_rate, 1)
}
