//! # BackyDB Envelope
//!
//! The hybrid-encryption wire format used by BackyDB backups: a fresh
//! 32-byte data key encrypts the artifact with AES-256-GCM; the data key
//! itself is wrapped by whatever [`KeyProvider`]-like capability the caller
//! supplies (see `backydb-keystore`). This crate only knows about raw bytes
//! — it has no notion of RSA, KMS, or file vaults, so the wrap/unwrap step
//! stays pluggable.
//!
//! ## What's NOT provided
//!
//! - Key wrapping/unwrapping (see `backydb-keystore`)
//! - Compression (see `backydb-core::compressor`)
//! - Per-engine SQL dump syntax

mod aead;
mod error;
pub mod wire;

use zeroize::Zeroizing;

pub use error::{DecryptionError, EncodingError};
pub use wire::{ALG_AES256GCM_RSA_OAEP_SHA256, DATA_KEY_BYTES, NONCE_BYTES, TAG_BYTES};

/// A freshly generated, zeroize-on-drop 32-byte AES-256 data key.
pub type DataKey = Zeroizing<[u8; DATA_KEY_BYTES]>;

/// Generate a fresh CSPRNG data key (spec §4.2 step 1).
pub fn generate_data_key() -> Result<DataKey, EncodingError> {
    let mut key = [0u8; DATA_KEY_BYTES];
    getrandom::getrandom(&mut key).map_err(|_| EncodingError)?;
    Ok(Zeroizing::new(key))
}

/// Build a [`DataKey`] from a key provider's unwrapped bytes.
pub fn data_key_from_bytes(bytes: &[u8]) -> Result<DataKey, DecryptionError> {
    let array: [u8; DATA_KEY_BYTES] = bytes.try_into().map_err(|_| DecryptionError)?;
    Ok(Zeroizing::new(array))
}

/// Seal `plaintext` with `data_key`, embedding `wrapped_key` in the header.
///
/// `wrapped_key` is the data key already wrapped by a `KeyProvider` — this
/// function does not perform wrapping itself.
pub fn seal(data_key: &DataKey, wrapped_key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, EncodingError> {
    let nonce = aead::nonce()?;
    let header = wire::encode_header(ALG_AES256GCM_RSA_OAEP_SHA256, &nonce, wrapped_key)?;
    let ciphertext = aead::seal(data_key, &nonce, plaintext, &header)?;
    Ok([header, ciphertext].concat())
}

/// The pieces of an envelope needed to finish decryption once the wrapped
/// key has been unwrapped by a `KeyProvider`.
pub struct OpenedHeader<'a> {
    pub wrapped_key: &'a [u8],
    nonce: [u8; NONCE_BYTES],
    ciphertext: &'a [u8],
    header: &'a [u8],
}

/// Parse the envelope header without decrypting. Callers unwrap
/// `wrapped_key` via a `KeyProvider`, then call [`finish_open`].
pub fn open_header(bytes: &[u8]) -> Result<OpenedHeader<'_>, DecryptionError> {
    let parts = wire::decode(bytes)?;
    Ok(OpenedHeader {
        wrapped_key: parts.wrapped_key,
        nonce: *parts.nonce,
        ciphertext: parts.ciphertext,
        header: parts.header,
    })
}

/// Finish decryption once the data key has been unwrapped.
pub fn finish_open(header: &OpenedHeader<'_>, data_key: &DataKey) -> Result<Vec<u8>, DecryptionError> {
    aead::open(data_key, &header.nonce, header.ciphertext, header.header)
}

/// Convenience wrapper used by tests and single-shot callers that already
/// have the plain data key (i.e. wrap/unwrap was already performed).
pub fn open(bytes: &[u8], data_key: &DataKey) -> Result<Vec<u8>, DecryptionError> {
    let header = open_header(bytes)?;
    finish_open(&header, data_key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seal_open_roundtrip() {
        let data_key = generate_data_key().unwrap();
        let wrapped = b"pretend-wrapped-key".to_vec();
        let plaintext = b"CREATE TABLE departments (id INT PRIMARY KEY);";

        let envelope = seal(&data_key, &wrapped, plaintext).unwrap();
        let header = open_header(&envelope).unwrap();
        assert_eq!(header.wrapped_key, wrapped.as_slice());

        let recovered = finish_open(&header, &data_key).unwrap();
        assert_eq!(recovered, plaintext);
    }

    #[test]
    fn tampered_ciphertext_fails_closed() {
        let data_key = generate_data_key().unwrap();
        let mut envelope = seal(&data_key, b"wrapped", b"secret bytes").unwrap();
        let last = envelope.len() - 1;
        envelope[last] ^= 0xFF;

        let header = open_header(&envelope).unwrap();
        assert!(finish_open(&header, &data_key).is_err());
    }

    #[test]
    fn wrong_key_fails_closed() {
        let data_key = generate_data_key().unwrap();
        let wrong_key = generate_data_key().unwrap();
        let envelope = seal(&data_key, b"wrapped", b"secret bytes").unwrap();

        let header = open_header(&envelope).unwrap();
        assert!(finish_open(&header, &wrong_key).is_err());
    }

    #[test]
    fn flipping_any_header_byte_fails_closed() {
        let data_key = generate_data_key().unwrap();
        let envelope = seal(&data_key, b"wrapped-key-bytes", b"payload").unwrap();

        for i in 0..envelope.len().min(64) {
            let mut tampered = envelope.clone();
            tampered[i] ^= 0x01;
            let result = open_header(&tampered).and_then(|h| finish_open(&h, &data_key));
            assert!(result.is_err(), "byte {i} flip should fail closed");
        }
    }
}
