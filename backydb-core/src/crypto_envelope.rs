//! Ties the Key Provider ([`backydb_keystore`]) and the AEAD envelope
//! ([`backydb_envelope`]) together into the hybrid scheme of spec §4.2.

use backydb_keystore::KeyProvider;

use crate::error::BackyError;

/// Seal `plaintext` under a freshly-generated data key, wrapped via
/// `provider` (spec §4.2 steps 1-4).
pub async fn seal(provider: &dyn KeyProvider, plaintext: &[u8]) -> Result<Vec<u8>, BackyError> {
    let data_key = backydb_envelope::generate_data_key()?;
    let wrapped_key = provider.wrap(data_key.as_ref()).await?;
    let bytes = backydb_envelope::seal(&data_key, &wrapped_key, plaintext)?;
    Ok(bytes)
}

/// Validate the header, unwrap the data key via `provider`, then AEAD-open
/// the ciphertext (spec §4.2 "Decryption").
pub async fn open(provider: &dyn KeyProvider, bytes: &[u8]) -> Result<Vec<u8>, BackyError> {
    let header = backydb_envelope::open_header(bytes)?;
    let data_key_bytes = provider.unwrap(header.wrapped_key).await?;
    let data_key = backydb_envelope::data_key_from_bytes(&data_key_bytes)
        .map_err(|_| BackyError::IntegrityFailure)?;
    let plaintext = backydb_envelope::finish_open(&header, &data_key)?;
    Ok(plaintext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use backydb_keystore::LocalVault;

    #[tokio::test]
    async fn seal_then_open_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let vault = LocalVault::open(dir.path(), b"pw", 2048).unwrap();

        let sealed = seal(&vault, b"CREATE TABLE t (id INT);").await.unwrap();
        let opened = open(&vault, &sealed).await.unwrap();
        assert_eq!(opened, b"CREATE TABLE t (id INT);");
    }

    #[tokio::test]
    async fn unwrapping_with_a_different_vault_fails() {
        let dir_a = tempfile::tempdir().unwrap();
        let dir_b = tempfile::tempdir().unwrap();
        let vault_a = LocalVault::open(dir_a.path(), b"pw", 2048).unwrap();
        let vault_b = LocalVault::open(dir_b.path(), b"pw", 2048).unwrap();

        let sealed = seal(&vault_a, b"secret data").await.unwrap();
        let result = open(&vault_b, &sealed).await;
        assert!(result.is_err());
    }
}
