use std::io::Read;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use super::Member;
use crate::artifact::Artifact;
use crate::error::BackyError;

pub struct TarCompressor;

impl super::Compressor for TarCompressor {
    fn compress(&self, artifacts: &[Artifact]) -> Result<Vec<u8>, BackyError> {
        let encoder = GzEncoder::new(Vec::new(), Compression::default());
        let mut builder = tar::Builder::new(encoder);

        for artifact in artifacts {
            let mut header = tar::Header::new_gnu();
            header.set_size(artifact.bytes.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder
                .append_data(&mut header, &artifact.name, artifact.bytes.as_slice())
                .map_err(|e| BackyError::CorruptArchive(e.to_string()))?;
        }

        let encoder = builder.into_inner().map_err(|e| BackyError::CorruptArchive(e.to_string()))?;
        encoder.finish().map_err(|e| BackyError::CorruptArchive(e.to_string()))
    }

    fn decompress(&self, archive: &[u8]) -> Result<Vec<Member>, BackyError> {
        let decoder = GzDecoder::new(archive);
        let mut tar_reader = tar::Archive::new(decoder);

        let mut members = Vec::new();
        let entries = tar_reader.entries().map_err(|e| BackyError::CorruptArchive(e.to_string()))?;
        for entry in entries {
            let mut entry = entry.map_err(|e| BackyError::CorruptArchive(e.to_string()))?;
            let name = entry
                .path()
                .map_err(|e| BackyError::CorruptArchive(e.to_string()))?
                .to_string_lossy()
                .into_owned();
            let mut bytes = Vec::new();
            entry
                .read_to_end(&mut bytes)
                .map_err(|e| BackyError::CorruptArchive(e.to_string()))?;
            members.push(Member { name, bytes });
        }
        Ok(members)
    }
}
