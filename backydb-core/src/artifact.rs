//! `Artifact`: a named byte stream produced by the Schema Engine (spec §3).

use std::collections::BTreeSet;

use sha2::{Digest, Sha256};

use crate::job::ObjectCategory;

#[derive(Clone, Debug)]
pub struct Artifact {
    pub name: String,
    pub categories: BTreeSet<ObjectCategory>,
    pub bytes: Vec<u8>,
}

impl Artifact {
    pub fn new(name: impl Into<String>, categories: impl IntoIterator<Item = ObjectCategory>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            categories: categories.into_iter().collect(),
            bytes,
        }
    }

    pub fn raw_len(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn sha256_hex(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(&self.bytes);
        hex::encode(hasher.finalize())
    }

    /// Concatenate artifacts for single-file mode, preserving the caller's
    /// ordering (spec §3: "single concatenated artifact whose internal
    /// order equals the dependency rank").
    pub fn concat(name: impl Into<String>, artifacts: &[Artifact]) -> Artifact {
        let mut categories = BTreeSet::new();
        let mut bytes = Vec::new();
        for artifact in artifacts {
            categories.extend(artifact.categories.iter().copied());
            bytes.extend_from_slice(&artifact.bytes);
        }
        Artifact::new(name, categories, bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_is_stable_for_identical_bytes() {
        let a = Artifact::new("tables.sql", [ObjectCategory::Tables], b"CREATE TABLE t (id INT);".to_vec());
        let b = Artifact::new("tables.sql", [ObjectCategory::Tables], b"CREATE TABLE t (id INT);".to_vec());
        assert_eq!(a.sha256_hex(), b.sha256_hex());
    }

    #[test]
    fn concat_preserves_order_and_unions_categories() {
        let first = Artifact::new("tables.sql", [ObjectCategory::Tables], b"DDL;".to_vec());
        let second = Artifact::new("data.sql", [ObjectCategory::Data], b"INSERT;".to_vec());
        let merged = Artifact::concat("dump.sql", &[first, second]);
        assert_eq!(merged.bytes, b"DDL;INSERT;");
        assert!(merged.categories.contains(&ObjectCategory::Tables));
        assert!(merged.categories.contains(&ObjectCategory::Data));
    }
}
