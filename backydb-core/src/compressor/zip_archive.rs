use std::io::{Read, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::Member;
use crate::artifact::Artifact;
use crate::error::BackyError;

pub struct ZipCompressor;

impl super::Compressor for ZipCompressor {
    fn compress(&self, artifacts: &[Artifact]) -> Result<Vec<u8>, BackyError> {
        let cursor = std::io::Cursor::new(Vec::new());
        let mut writer = ZipWriter::new(cursor);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for artifact in artifacts {
            writer
                .start_file(artifact.name.as_str(), options)
                .map_err(|e| BackyError::CorruptArchive(e.to_string()))?;
            writer
                .write_all(&artifact.bytes)
                .map_err(|e| BackyError::CorruptArchive(e.to_string()))?;
        }
        let cursor = writer.finish().map_err(|e| BackyError::CorruptArchive(e.to_string()))?;
        Ok(cursor.into_inner())
    }

    fn decompress(&self, archive: &[u8]) -> Result<Vec<Member>, BackyError> {
        let cursor = std::io::Cursor::new(archive);
        let mut zip = ZipArchive::new(cursor).map_err(|e| BackyError::CorruptArchive(e.to_string()))?;

        let mut members = Vec::with_capacity(zip.len());
        for i in 0..zip.len() {
            let mut entry = zip.by_index(i).map_err(|e| BackyError::CorruptArchive(e.to_string()))?;
            let name = entry.name().to_string();
            let mut bytes = Vec::new();
            entry
                .read_to_end(&mut bytes)
                .map_err(|e| BackyError::CorruptArchive(e.to_string()))?;
            members.push(Member { name, bytes });
        }
        Ok(members)
    }
}
