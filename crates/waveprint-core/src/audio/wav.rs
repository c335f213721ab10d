//! WAV decoding via hound

use super::{AudioBuffer, DecodeError, Decoder};
use std::path::Path;

/// Reference decoder for PCM and float WAV files.
pub struct WavDecoder;

impl Decoder for WavDecoder {
    fn decode(&self, path: &Path) -> Result<AudioBuffer, DecodeError> {
        if !path.exists() {
            return Err(DecodeError::NotFound(path.display().to_string()));
        }

        match path.extension().and_then(|e| e.to_str()) {
            Some("wav") | Some("wave") => {}
            _ => return Err(DecodeError::Unsupported(path.display().to_string())),
        }

        let mut reader = hound::WavReader::open(path)?;
        let spec = reader.spec();

        // Read samples and convert to f32 in [-1, 1]
        let samples: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => {
                reader.samples::<f32>().collect::<Result<Vec<_>, _>>()?
            }
            hound::SampleFormat::Int => {
                let max_val = (1i64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / max_val))
                    .collect::<Result<Vec<_>, _>>()?
            }
        };

        log::debug!(
            "decoded {}: {} samples, {} Hz, {} channel(s)",
            path.display(),
            samples.len(),
            spec.sample_rate,
            spec.channels
        );

        Ok(AudioBuffer::new(samples, spec.sample_rate, spec.channels))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::synthetic_tone;

    fn write_wav(path: &Path, buffer: &AudioBuffer) {
        let spec = hound::WavSpec {
            channels: buffer.channels,
            sample_rate: buffer.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for &s in &buffer.samples {
            writer.write_sample((s * i16::MAX as f32) as i16).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_decode_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        let tone = synthetic_tone(8000, 0.5);
        write_wav(&path, &tone);

        let decoded = WavDecoder.decode(&path).unwrap();
        assert_eq!(decoded.sample_rate, 8000);
        assert_eq!(decoded.channels, 1);
        assert_eq!(decoded.samples.len(), tone.samples.len());
    }

    #[test]
    fn test_decode_missing_file() {
        let err = WavDecoder.decode(Path::new("/no/such/file.wav")).unwrap_err();
        assert!(matches!(err, DecodeError::NotFound(_)));
    }

    #[test]
    fn test_decode_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.mp3");
        std::fs::write(&path, b"not audio").unwrap();

        let err = WavDecoder.decode(&path).unwrap_err();
        assert!(matches!(err, DecodeError::Unsupported(_)));
    }
}
