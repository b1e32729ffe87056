//! `LocalVault`: a password-protected private key file on local disk.
//!
//! On first use with no existing pair, generates a 4096-bit RSA key pair,
//! encrypts the private key at rest, and returns the public half. Layout:
//!
//! ```text
//! {dir}/public.pem
//! {dir}/private.enc   (salt[16] || nonce[12] || AES-256-GCM(pkcs8 DER))
//! ```

use std::path::{Path, PathBuf};

use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Nonce,
};
use argon2::{Argon2, Params};
use async_trait::async_trait;
use rand_core::{OsRng, RngCore};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey};
use rsa::traits::PublicKeyParts;
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::error::KeyProviderError;
use crate::provider::KeyProvider;
use crate::types::{Algorithm, PublicParams};

const SALT_BYTES: usize = 16;
const NONCE_BYTES: usize = 12;
const ARGON2_MEM_KIB: u32 = 19_456; // ~19 MiB, OWASP-recommended minimum for Argon2id
const ARGON2_TIME: u32 = 2;
const ARGON2_PARALLELISM: u32 = 1;

pub struct LocalVault {
    public_key: RsaPublicKey,
    private_key: Zeroizing<Vec<u8>>, // decrypted PKCS8 DER, zeroized on drop
    key_size_bits: u32,
}

impl LocalVault {
    /// Open (or create) the vault rooted at `dir`, decrypting the private
    /// key with `password`. The password is supplied by the caller — this
    /// type never reads `PRIVATE_KEY_PASSWORD` itself.
    pub fn open(dir: impl AsRef<Path>, password: &[u8], key_size_bits: u32) -> Result<Self, KeyProviderError> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir).map_err(|e| KeyProviderError::Io(e.to_string()))?;

        let public_path = dir.join("public.pem");
        let private_path = dir.join("private.enc");

        if public_path.exists() && private_path.exists() {
            Self::load(&public_path, &private_path, password)
        } else {
            Self::generate(&public_path, &private_path, password, key_size_bits)
        }
    }

    fn generate(
        public_path: &Path,
        private_path: &Path,
        password: &[u8],
        key_size_bits: u32,
    ) -> Result<Self, KeyProviderError> {
        let private_key = RsaPrivateKey::new(&mut OsRng, key_size_bits as usize)
            .map_err(|e| KeyProviderError::InvalidKeyMaterial(e.to_string()))?;
        let public_key = RsaPublicKey::from(&private_key);

        let pkcs8_der = private_key
            .to_pkcs8_der()
            .map_err(|e| KeyProviderError::InvalidKeyMaterial(e.to_string()))?;

        write_atomic(public_path, public_key.to_public_key_pem(Default::default()).unwrap().as_bytes())?;
        write_atomic(private_path, &encrypt_private_key(pkcs8_der.as_bytes(), password)?)?;

        Ok(Self {
            public_key,
            private_key: Zeroizing::new(pkcs8_der.as_bytes().to_vec()),
            key_size_bits,
        })
    }

    fn load(public_path: &Path, private_path: &Path, password: &[u8]) -> Result<Self, KeyProviderError> {
        let public_pem =
            std::fs::read_to_string(public_path).map_err(|e| KeyProviderError::Io(e.to_string()))?;
        let public_key = RsaPublicKey::from_public_key_pem(&public_pem)
            .map_err(|e| KeyProviderError::InvalidKeyMaterial(e.to_string()))?;

        let sealed = std::fs::read(private_path).map_err(|e| KeyProviderError::Io(e.to_string()))?;
        let pkcs8_der = decrypt_private_key(&sealed, password)?;
        let private_key = RsaPrivateKey::from_pkcs8_der(&pkcs8_der)
            .map_err(|e| KeyProviderError::InvalidKeyMaterial(e.to_string()))?;
        let key_size_bits = private_key.size() as u32 * 8;

        Ok(Self {
            public_key,
            private_key: Zeroizing::new(pkcs8_der),
            key_size_bits,
        })
    }

    fn private_key(&self) -> Result<RsaPrivateKey, KeyProviderError> {
        RsaPrivateKey::from_pkcs8_der(&self.private_key)
            .map_err(|e| KeyProviderError::InvalidKeyMaterial(e.to_string()))
    }
}

#[async_trait]
impl KeyProvider for LocalVault {
    async fn wrap(&self, data_key: &[u8]) -> Result<Vec<u8>, KeyProviderError> {
        let padding = Oaep::new::<Sha256>();
        self.public_key
            .encrypt(&mut OsRng, padding, data_key)
            .map_err(|e| KeyProviderError::InvalidKeyMaterial(e.to_string()))
    }

    async fn unwrap(&self, wrapped: &[u8]) -> Result<Vec<u8>, KeyProviderError> {
        let private_key = self.private_key()?;
        let padding = Oaep::new::<Sha256>();
        private_key
            .decrypt(padding, wrapped)
            .map_err(|_| KeyProviderError::InvalidKeyMaterial("RSA-OAEP unwrap failed".into()))
    }

    fn public_params(&self) -> PublicParams {
        PublicParams {
            algorithm: Algorithm::RsaOaepSha256,
            key_size_bits: self.key_size_bits,
        }
    }
}

fn derive_vault_key(password: &[u8], salt: &[u8; SALT_BYTES]) -> Result<[u8; 32], KeyProviderError> {
    let params = Params::new(ARGON2_MEM_KIB, ARGON2_TIME, ARGON2_PARALLELISM, Some(32))
        .map_err(|e| KeyProviderError::Io(e.to_string()))?;
    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);
    let mut key = [0u8; 32];
    argon2
        .hash_password_into(password, salt, &mut key)
        .map_err(|e| KeyProviderError::Io(e.to_string()))?;
    Ok(key)
}

fn encrypt_private_key(pkcs8_der: &[u8], password: &[u8]) -> Result<Vec<u8>, KeyProviderError> {
    let mut salt = [0u8; SALT_BYTES];
    OsRng.fill_bytes(&mut salt);
    let mut nonce_bytes = [0u8; NONCE_BYTES];
    OsRng.fill_bytes(&mut nonce_bytes);

    let vault_key = derive_vault_key(password, &salt)?;
    let cipher = Aes256Gcm::new_from_slice(&vault_key).expect("32-byte key");
    let nonce = Nonce::from_slice(&nonce_bytes);
    let ciphertext = cipher
        .encrypt(nonce, Payload { msg: pkcs8_der, aad: &[] })
        .map_err(|_| KeyProviderError::Io("vault encryption failed".into()))?;

    let mut out = Vec::with_capacity(SALT_BYTES + NONCE_BYTES + ciphertext.len());
    out.extend_from_slice(&salt);
    out.extend_from_slice(&nonce_bytes);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

fn decrypt_private_key(sealed: &[u8], password: &[u8]) -> Result<Vec<u8>, KeyProviderError> {
    if sealed.len() < SALT_BYTES + NONCE_BYTES {
        return Err(KeyProviderError::InvalidKeyMaterial("truncated vault file".into()));
    }
    let salt: [u8; SALT_BYTES] = sealed[..SALT_BYTES].try_into().unwrap();
    let nonce_bytes: [u8; NONCE_BYTES] = sealed[SALT_BYTES..SALT_BYTES + NONCE_BYTES].try_into().unwrap();
    let ciphertext = &sealed[SALT_BYTES + NONCE_BYTES..];

    let vault_key = derive_vault_key(password, &salt)?;
    let cipher = Aes256Gcm::new_from_slice(&vault_key).expect("32-byte key");
    let nonce = Nonce::from_slice(&nonce_bytes);
    cipher
        .decrypt(nonce, Payload { msg: ciphertext, aad: &[] })
        .map_err(|_| KeyProviderError::KeyAccessDenied(crate::types::KeyId::new("local-vault")))
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), KeyProviderError> {
    let tmp: PathBuf = path.with_extension("tmp");
    std::fs::write(&tmp, bytes).map_err(|e| KeyProviderError::Io(e.to_string()))?;
    std::fs::rename(&tmp, path).map_err(|e| KeyProviderError::Io(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn generates_then_wraps_and_unwraps() {
        let dir = tempfile::tempdir().unwrap();
        let vault = LocalVault::open(dir.path(), b"correct horse battery staple", 2048).unwrap();

        let data_key = [42u8; 32];
        let wrapped = vault.wrap(&data_key).await.unwrap();
        let recovered = vault.unwrap(&wrapped).await.unwrap();
        assert_eq!(recovered, data_key);
    }

    #[tokio::test]
    async fn reopening_loads_existing_pair() {
        let dir = tempfile::tempdir().unwrap();
        let first = LocalVault::open(dir.path(), b"hunter2", 2048).unwrap();
        let second = LocalVault::open(dir.path(), b"hunter2", 2048).unwrap();

        let data_key = [7u8; 32];
        let wrapped = first.wrap(&data_key).await.unwrap();
        let recovered = second.unwrap(&wrapped).await.unwrap();
        assert_eq!(recovered, data_key);
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        LocalVault::open(dir.path(), b"correct", 2048).unwrap();
        let result = LocalVault::open(dir.path(), b"incorrect", 2048);
        assert!(result.is_err());
    }
}
