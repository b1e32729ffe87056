//! `CloudKms`: wraps/unwraps data keys through an AWS KMS customer master
//! key. The CMK never leaves KMS — only the 32-byte data key crosses the
//! wire, and only as KMS's own ciphertext blob.

use async_trait::async_trait;
use aws_sdk_kms::primitives::Blob;

use crate::error::KeyProviderError;
use crate::provider::KeyProvider;
use crate::types::{Algorithm, PublicParams};

pub struct CloudKms {
    client: aws_sdk_kms::Client,
    key_id: String,
}

impl CloudKms {
    pub async fn new(key_id: impl Into<String>, region: Option<&str>) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(aws_config::Region::new(region.to_string()));
        }
        let sdk_config = loader.load().await;
        Self {
            client: aws_sdk_kms::Client::new(&sdk_config),
            key_id: key_id.into(),
        }
    }
}

#[async_trait]
impl KeyProvider for CloudKms {
    async fn wrap(&self, data_key: &[u8]) -> Result<Vec<u8>, KeyProviderError> {
        let resp = self
            .client
            .encrypt()
            .key_id(&self.key_id)
            .plaintext(Blob::new(data_key))
            .send()
            .await
            .map_err(|e| KeyProviderError::ProviderUnavailable(e.to_string()))?;

        resp.ciphertext_blob()
            .map(|blob| blob.as_ref().to_vec())
            .ok_or_else(|| KeyProviderError::ProviderUnavailable("KMS encrypt returned no ciphertext".into()))
    }

    async fn unwrap(&self, wrapped: &[u8]) -> Result<Vec<u8>, KeyProviderError> {
        let resp = self
            .client
            .decrypt()
            .key_id(&self.key_id)
            .ciphertext_blob(Blob::new(wrapped))
            .send()
            .await
            .map_err(|e| KeyProviderError::ProviderUnavailable(e.to_string()))?;

        resp.plaintext()
            .map(|blob| blob.as_ref().to_vec())
            .ok_or_else(|| KeyProviderError::ProviderUnavailable("KMS decrypt returned no plaintext".into()))
    }

    fn public_params(&self) -> PublicParams {
        // KMS brokers the key material itself; BackyDB still frames the
        // envelope as if an OAEP-wrapped key were present, since the wire
        // format doesn't distinguish KMS-wrapped bytes from RSA-wrapped ones.
        PublicParams {
            algorithm: Algorithm::RsaOaepSha256,
            key_size_bits: 0,
        }
    }
}
