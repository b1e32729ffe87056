//! `CloudKeystore`: a generic HTTP key-management service (Vault transit
//! engine, GCP KMS REST API, or similar) reached over `reqwest`. Unlike
//! [`crate::cloud_kms::CloudKms`] this isn't tied to one vendor SDK — it
//! speaks a minimal wrap/unwrap JSON contract any of them can be fronted
//! with.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::KeyProviderError;
use crate::provider::KeyProvider;
use crate::types::{Algorithm, PublicParams};

#[derive(Serialize)]
struct WrapRequest<'a> {
    key_id: &'a str,
    plaintext: String,
}

#[derive(Deserialize)]
struct WrapResponse {
    ciphertext: String,
}

#[derive(Serialize)]
struct UnwrapRequest<'a> {
    key_id: &'a str,
    ciphertext: &'a str,
}

#[derive(Deserialize)]
struct UnwrapResponse {
    plaintext: String,
}

pub struct CloudKeystore {
    client: reqwest::Client,
    endpoint: String,
    key_id: String,
    token: String,
}

impl CloudKeystore {
    pub fn new(endpoint: impl Into<String>, key_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            key_id: key_id.into(),
            token: token.into(),
        }
    }
}

#[async_trait]
impl KeyProvider for CloudKeystore {
    async fn wrap(&self, data_key: &[u8]) -> Result<Vec<u8>, KeyProviderError> {
        let body = WrapRequest {
            key_id: &self.key_id,
            plaintext: hex::encode(data_key),
        };
        let resp: WrapResponse = self
            .client
            .post(format!("{}/v1/keys/wrap", self.endpoint))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| KeyProviderError::ProviderUnavailable(e.to_string()))?
            .error_for_status()
            .map_err(|e| KeyProviderError::ProviderUnavailable(e.to_string()))?
            .json()
            .await
            .map_err(|e| KeyProviderError::ProviderUnavailable(e.to_string()))?;

        hex::decode(resp.ciphertext)
            .map_err(|e| KeyProviderError::InvalidKeyMaterial(e.to_string()))
    }

    async fn unwrap(&self, wrapped: &[u8]) -> Result<Vec<u8>, KeyProviderError> {
        let ciphertext = hex::encode(wrapped);
        let body = UnwrapRequest {
            key_id: &self.key_id,
            ciphertext: &ciphertext,
        };
        let resp: UnwrapResponse = self
            .client
            .post(format!("{}/v1/keys/unwrap", self.endpoint))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| KeyProviderError::ProviderUnavailable(e.to_string()))?
            .error_for_status()
            .map_err(|e| KeyProviderError::ProviderUnavailable(e.to_string()))?
            .json()
            .await
            .map_err(|e| KeyProviderError::ProviderUnavailable(e.to_string()))?;

        hex::decode(resp.plaintext)
            .map_err(|e| KeyProviderError::InvalidKeyMaterial(e.to_string()))
    }

    fn public_params(&self) -> PublicParams {
        PublicParams {
            algorithm: Algorithm::RsaOaepSha256,
            key_size_bits: 0,
        }
    }
}
