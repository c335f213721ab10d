//! Fingerprint file writer

use crate::format::{FormatError, FpHeader};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use waveprint_core::Fingerprint;

/// Writes fingerprints as little-endian binary files.
pub struct FpWriter {
    include_digest: bool,
}

impl FpWriter {
    pub fn new() -> Self {
        Self {
            include_digest: true,
        }
    }

    /// Omit the digest section; readers recompute it from the hashes.
    pub fn without_digest() -> Self {
        Self {
            include_digest: false,
        }
    }

    /// Write a fingerprint file
    pub fn write(&self, path: &Path, fingerprint: &Fingerprint) -> Result<(), FormatError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        let header = FpHeader::new(
            fingerprint.duration_ms,
            fingerprint.hashes.len() as u32,
            self.include_digest,
        );
        self.write_header(&mut writer, &header)?;

        for hash in &fingerprint.hashes {
            writer.write_all(&hash.to_le_bytes())?;
        }

        if self.include_digest {
            let digest_bytes = fingerprint.digest.as_bytes();
            writer.write_all(&(digest_bytes.len() as u32).to_le_bytes())?;
            writer.write_all(digest_bytes)?;
        }

        writer.flush()?;

        log::debug!(
            "wrote {} hashes to {}",
            fingerprint.hashes.len(),
            path.display()
        );

        Ok(())
    }

    fn write_header(
        &self,
        writer: &mut BufWriter<File>,
        header: &FpHeader,
    ) -> Result<(), FormatError> {
        writer.write_all(&header.magic)?;
        writer.write_all(&header.version.to_le_bytes())?;
        writer.write_all(&header.flags.to_le_bytes())?;
        writer.write_all(&header.duration_ms.to_le_bytes())?;
        writer.write_all(&header.num_hashes.to_le_bytes())?;
        Ok(())
    }
}

impl Default for FpWriter {
    fn default() -> Self {
        Self::new()
    }
}
