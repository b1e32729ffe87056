//! AEAD: AES-256-GCM over the data key wrapped by the envelope header.

use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Nonce,
};
use getrandom::getrandom;

use crate::error::{DecryptionError, EncodingError};
use crate::wire::NONCE_BYTES;

/// A fresh random 12-byte nonce. One per artifact, per spec §4.2 step 1.
pub fn nonce() -> Result<[u8; NONCE_BYTES], EncodingError> {
    let mut n = [0u8; NONCE_BYTES];
    getrandom(&mut n).map_err(|_| EncodingError)?;
    Ok(n)
}

/// Seal `plaintext` under `key`, returning `ciphertext || tag`. `aad` (the
/// wire header: magic/version/alg/nonce/wrapped_key) is authenticated but
/// not encrypted, so a bit flip anywhere in the header fails the tag check.
pub fn seal(key: &[u8; 32], nonce: &[u8; NONCE_BYTES], plaintext: &[u8], aad: &[u8]) -> Result<Vec<u8>, EncodingError> {
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| EncodingError)?;
    let n = Nonce::from_slice(nonce);
    cipher
        .encrypt(n, Payload { msg: plaintext, aad })
        .map_err(|_| EncodingError)
}

/// Open a ciphertext produced by [`seal`]. Any failure — wrong key, tampered
/// bytes, wrong nonce, tampered header — collapses to [`DecryptionError`].
pub fn open(key: &[u8; 32], nonce: &[u8; NONCE_BYTES], ciphertext_with_tag: &[u8], aad: &[u8]) -> Result<Vec<u8>, DecryptionError> {
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| DecryptionError)?;
    let n = Nonce::from_slice(nonce);
    cipher
        .decrypt(n, Payload { msg: ciphertext_with_tag, aad })
        .map_err(|_| DecryptionError)
}
