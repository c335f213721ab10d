//! Fingerprint file reader with validation

use crate::format::{FormatError, FpHeader, MAGIC, VERSION};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use waveprint_core::fingerprint::encode_digest;
use waveprint_core::Fingerprint;

/// Reads and validates fingerprint files.
pub struct FpReader;

impl FpReader {
    /// Read a fingerprint file
    pub fn read(path: &Path) -> Result<Fingerprint, FormatError> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);

        let header = Self::read_header(&mut reader)?;

        let mut hashes = Vec::with_capacity(header.num_hashes as usize);
        let mut buf = [0u8; 4];
        for read_count in 0..header.num_hashes {
            if let Err(e) = reader.read_exact(&mut buf) {
                if e.kind() == std::io::ErrorKind::UnexpectedEof {
                    return Err(FormatError::TruncatedPayload {
                        expected: header.num_hashes,
                        actual: read_count,
                    });
                }
                return Err(e.into());
            }
            hashes.push(u32::from_le_bytes(buf));
        }

        let computed = encode_digest(&hashes);

        if header.has_digest() {
            let mut len_buf = [0u8; 4];
            reader.read_exact(&mut len_buf)?;
            let digest_len = u32::from_le_bytes(len_buf) as usize;

            let mut digest_bytes = vec![0u8; digest_len];
            reader.read_exact(&mut digest_bytes)?;

            if digest_bytes != computed.as_bytes() {
                return Err(FormatError::DigestMismatch);
            }
        }

        log::debug!("read {} hashes from {}", hashes.len(), path.display());

        Ok(Fingerprint {
            hashes,
            duration_ms: header.duration_ms,
            digest: computed,
        })
    }

    fn read_header(reader: &mut BufReader<File>) -> Result<FpHeader, FormatError> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        if magic != MAGIC {
            return Err(FormatError::BadMagic);
        }

        let mut u16_buf = [0u8; 2];
        reader.read_exact(&mut u16_buf)?;
        let version = u16::from_le_bytes(u16_buf);
        if version != VERSION {
            return Err(FormatError::UnsupportedVersion(version));
        }

        reader.read_exact(&mut u16_buf)?;
        let flags = u16::from_le_bytes(u16_buf);

        let mut u64_buf = [0u8; 8];
        reader.read_exact(&mut u64_buf)?;
        let duration_ms = u64::from_le_bytes(u64_buf);

        let mut u32_buf = [0u8; 4];
        reader.read_exact(&mut u32_buf)?;
        let num_hashes = u32::from_le_bytes(u32_buf);

        Ok(FpHeader {
            magic,
            version,
            flags,
            duration_ms,
            num_hashes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::FpWriter;

    fn sample_fingerprint() -> Fingerprint {
        Fingerprint::new(vec![0xdeadbeef, 0x0, 0x12345678, 0xffffffff], 7500)
    }

    #[test]
    fn test_round_trip_with_digest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wfp");
        let fp = sample_fingerprint();

        FpWriter::new().write(&path, &fp).unwrap();
        let loaded = FpReader::read(&path).unwrap();

        assert_eq!(loaded, fp);
    }

    #[test]
    fn test_round_trip_without_digest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wfp");
        let fp = sample_fingerprint();

        FpWriter::without_digest().write(&path, &fp).unwrap();
        let loaded = FpReader::read(&path).unwrap();

        // Digest is recomputed from the hash payload
        assert_eq!(loaded, fp);
    }

    #[test]
    fn test_bad_magic_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bogus.wfp");
        std::fs::write(&path, b"NOPE-not-a-fingerprint-file").unwrap();

        let err = FpReader::read(&path).unwrap_err();
        assert!(matches!(err, FormatError::BadMagic));
    }

    #[test]
    fn test_truncated_payload_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.wfp");
        let fp = sample_fingerprint();

        FpWriter::without_digest().write(&path, &fp).unwrap();

        // Chop the last hash off the payload
        let bytes = std::fs::read(&path).unwrap();
        std::fs::write(&path, &bytes[..bytes.len() - 4]).unwrap();

        let err = FpReader::read(&path).unwrap_err();
        assert!(matches!(
            err,
            FormatError::TruncatedPayload {
                expected: 4,
                actual: 3
            }
        ));
    }

    #[test]
    fn test_corrupt_digest_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tampered.wfp");
        let fp = sample_fingerprint();

        FpWriter::new().write(&path, &fp).unwrap();

        // Flip one byte inside the digest section
        let mut bytes = std::fs::read(&path).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;
        std::fs::write(&path, &bytes).unwrap();

        let err = FpReader::read(&path).unwrap_err();
        assert!(matches!(err, FormatError::DigestMismatch));
    }
}
