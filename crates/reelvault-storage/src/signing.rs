//! HMAC URL signing for backends without a native presigner
//!
//! Signed URLs have the form `{base_url}/{key}?expires={unix}&signature={hex}`
//! where the signature is HMAC-SHA256 over `{key}:{expires}`. Whatever serves
//! the objects verifies them with [`UrlSigner::verify`].

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::traits::{StorageError, StorageResult};

type HmacSha256 = Hmac<Sha256>;

#[derive(Clone)]
pub struct UrlSigner {
    secret: Vec<u8>,
    base_url: String,
}

impl std::fmt::Debug for UrlSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UrlSigner")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl UrlSigner {
    pub fn new(secret: impl AsRef<[u8]>, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            secret: secret.as_ref().to_vec(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Unsigned URL for `key`.
    pub fn object_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key)
    }

    /// Signed URL for `key` that stops verifying after `expires_at`.
    pub fn sign(&self, key: &str, expires_at: DateTime<Utc>) -> StorageResult<String> {
        let expires = expires_at.timestamp();
        let signature = self.signature(key, expires)?;
        Ok(format!(
            "{}?expires={}&signature={}",
            self.object_url(key),
            expires,
            signature
        ))
    }

    /// Check a signature produced by [`UrlSigner::sign`] at time `now`.
    pub fn verify(&self, key: &str, expires: i64, signature: &str, now: DateTime<Utc>) -> bool {
        if now.timestamp() > expires {
            return false;
        }
        let Ok(expected) = hex::decode(signature) else {
            return false;
        };
        let Ok(mut mac) = HmacSha256::new_from_slice(&self.secret) else {
            return false;
        };
        mac.update(Self::message(key, expires).as_bytes());
        mac.verify_slice(&expected).is_ok()
    }

    fn signature(&self, key: &str, expires: i64) -> StorageResult<String> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| StorageError::SigningFailed(e.to_string()))?;
        mac.update(Self::message(key, expires).as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    fn message(key: &str, expires: i64) -> String {
        format!("{}:{}", key, expires)
    }
}
