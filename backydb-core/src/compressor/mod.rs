//! Reversible archiving of one or many artifacts (spec §4.3).

mod tar_archive;
mod zip_archive;

pub use tar_archive::TarCompressor;
pub use zip_archive::ZipCompressor;

use crate::artifact::Artifact;
use crate::error::BackyError;

/// A named member recovered from an archive during decompression.
pub struct Member {
    pub name: String,
    pub bytes: Vec<u8>,
}

pub trait Compressor {
    /// Each artifact becomes one archive member, named `<category>.sql`
    /// for `multiple_files=true` or `dump.sql` for single-file mode — the
    /// caller decides the member names via `artifacts`' own `name` field.
    fn compress(&self, artifacts: &[Artifact]) -> Result<Vec<u8>, BackyError>;

    fn decompress(&self, archive: &[u8]) -> Result<Vec<Member>, BackyError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::ObjectCategory;

    fn sample_artifacts() -> Vec<Artifact> {
        vec![
            Artifact::new("tables.sql", [ObjectCategory::Tables], b"CREATE TABLE t (id INT);".to_vec()),
            Artifact::new("data.sql", [ObjectCategory::Data], b"INSERT INTO t VALUES (1);".to_vec()),
        ]
    }

    fn assert_round_trips(compressor: &dyn Compressor) {
        let artifacts = sample_artifacts();
        let archive = compressor.compress(&artifacts).unwrap();
        let members = compressor.decompress(&archive).unwrap();

        assert_eq!(members.len(), artifacts.len());
        for (artifact, member) in artifacts.iter().zip(members.iter()) {
            assert_eq!(artifact.name, member.name);
            assert_eq!(artifact.bytes, member.bytes);
        }
    }

    #[test]
    fn zip_round_trips() {
        assert_round_trips(&ZipCompressor);
    }

    #[test]
    fn tar_round_trips() {
        assert_round_trips(&TarCompressor);
    }

    #[test]
    fn decompressing_garbage_is_corrupt_archive() {
        let result = ZipCompressor.decompress(b"not a zip file");
        assert!(matches!(result, Err(BackyError::CorruptArchive(_))));

        let result = TarCompressor.decompress(b"not a tar file");
        assert!(matches!(result, Err(BackyError::CorruptArchive(_))));
    }
}
