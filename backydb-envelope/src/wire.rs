//! BKY1 wire format.
//!
//! ```text
//! offset 0   : 4 bytes  magic "BKY1"
//! offset 4   : 1 byte   version (currently 1)
//! offset 5   : 1 byte   alg_id (1 = AES-256-GCM + RSA-OAEP-SHA256)
//! offset 6   : 12 bytes nonce
//! offset 18  : 4 bytes  wrapped_len (big-endian u32)
//! offset 22  : wrapped_len bytes wrapped data key
//! offset ... : ciphertext || 16-byte GCM tag
//! ```

use crate::error::{DecryptionError, EncodingError};

pub const MAGIC: &[u8; 4] = b"BKY1";
pub const VERSION: u8 = 1;

/// AES-256-GCM with an RSA-OAEP-SHA256 wrapped data key.
pub const ALG_AES256GCM_RSA_OAEP_SHA256: u8 = 1;

pub const NONCE_BYTES: usize = 12;
pub const TAG_BYTES: usize = 16;
pub const DATA_KEY_BYTES: usize = 32;

const HEADER_BYTES: usize = 4 + 1 + 1 + NONCE_BYTES + 4;

/// Borrowed view over a parsed envelope.
#[derive(Debug, Clone, Copy)]
pub struct WireComponents<'a> {
    pub version: u8,
    pub alg_id: u8,
    pub nonce: &'a [u8; NONCE_BYTES],
    pub wrapped_key: &'a [u8],
    pub ciphertext: &'a [u8],
    /// Everything before the ciphertext (magic..wrapped_key), bound into the
    /// AEAD call as associated data so a bit flip anywhere in the header —
    /// not just the ciphertext — fails closed.
    pub header: &'a [u8],
}

/// Build the header bytes (magic, version, alg_id, nonce, wrapped_len,
/// wrapped_key) that precede the ciphertext on the wire. Callers pass this
/// to the AEAD layer as associated data before appending the ciphertext.
pub fn encode_header(alg_id: u8, nonce: &[u8; NONCE_BYTES], wrapped_key: &[u8]) -> Result<Vec<u8>, EncodingError> {
    let wrapped_len = u32::try_from(wrapped_key.len()).map_err(|_| EncodingError)?;
    let mut out = Vec::with_capacity(HEADER_BYTES + wrapped_key.len());
    out.extend_from_slice(MAGIC);
    out.push(VERSION);
    out.push(alg_id);
    out.extend_from_slice(nonce);
    out.extend_from_slice(&wrapped_len.to_be_bytes());
    out.extend_from_slice(wrapped_key);
    Ok(out)
}

/// Assemble the on-disk envelope from its parts.
pub fn encode(
    alg_id: u8,
    nonce: &[u8; NONCE_BYTES],
    wrapped_key: &[u8],
    ciphertext_with_tag: &[u8],
) -> Result<Vec<u8>, EncodingError> {
    if ciphertext_with_tag.len() < TAG_BYTES {
        return Err(EncodingError);
    }
    let mut out = encode_header(alg_id, nonce, wrapped_key)?;
    out.extend_from_slice(ciphertext_with_tag);
    Ok(out)
}

/// Parse an envelope, validating magic/version/alg_id and length framing.
///
/// Does not touch the ciphertext's authenticity — that's AEAD's job.
pub fn decode(data: &[u8]) -> Result<WireComponents<'_>, DecryptionError> {
    if data.len() < HEADER_BYTES + TAG_BYTES {
        return Err(DecryptionError);
    }
    if &data[0..4] != MAGIC {
        return Err(DecryptionError);
    }
    let version = data[4];
    if version != VERSION {
        return Err(DecryptionError);
    }
    let alg_id = data[5];
    if alg_id != ALG_AES256GCM_RSA_OAEP_SHA256 {
        return Err(DecryptionError);
    }

    let nonce: &[u8; NONCE_BYTES] = data[6..6 + NONCE_BYTES]
        .try_into()
        .map_err(|_| DecryptionError)?;

    let wrapped_len_offset = 6 + NONCE_BYTES;
    let wrapped_len = u32::from_be_bytes(
        data[wrapped_len_offset..wrapped_len_offset + 4]
            .try_into()
            .map_err(|_| DecryptionError)?,
    ) as usize;

    let wrapped_start = wrapped_len_offset + 4;
    let wrapped_end = wrapped_start
        .checked_add(wrapped_len)
        .ok_or(DecryptionError)?;
    if wrapped_end > data.len() {
        return Err(DecryptionError);
    }

    let wrapped_key = &data[wrapped_start..wrapped_end];
    let ciphertext = &data[wrapped_end..];
    if ciphertext.len() < TAG_BYTES {
        return Err(DecryptionError);
    }

    Ok(WireComponents {
        version,
        alg_id,
        nonce,
        wrapped_key,
        ciphertext,
        header: &data[0..wrapped_end],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_header_framing() {
        let nonce = [7u8; NONCE_BYTES];
        let wrapped = vec![9u8; 512];
        let ciphertext = vec![1u8; 48];
        let bytes = encode(ALG_AES256GCM_RSA_OAEP_SHA256, &nonce, &wrapped, &ciphertext).unwrap();

        let parts = decode(&bytes).unwrap();
        assert_eq!(parts.version, VERSION);
        assert_eq!(parts.alg_id, ALG_AES256GCM_RSA_OAEP_SHA256);
        assert_eq!(parts.nonce, &nonce);
        assert_eq!(parts.wrapped_key, &wrapped[..]);
        assert_eq!(parts.ciphertext, &ciphertext[..]);
    }

    #[test]
    fn rejects_bad_magic() {
        let mut bytes = encode(ALG_AES256GCM_RSA_OAEP_SHA256, &[0; NONCE_BYTES], &[], &[0; 16]).unwrap();
        bytes[0] = b'X';
        assert!(decode(&bytes).is_err());
    }

    #[test]
    fn rejects_truncated_wrapped_key_length() {
        let mut bytes = encode(ALG_AES256GCM_RSA_OAEP_SHA256, &[0; NONCE_BYTES], &[1, 2, 3], &[0; 16]).unwrap();
        bytes.truncate(bytes.len() - 10);
        assert!(decode(&bytes).is_err());
    }
}
