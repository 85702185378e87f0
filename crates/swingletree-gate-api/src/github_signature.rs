//! Verification of GitHub webhook signatures.
//!
//! GitHub signs each delivery with the webhook secret and sends the digest in
//! `X-Hub-Signature-256` (`sha256=<hex>`). Older installations only send
//! `X-Hub-Signature` (`sha1=<hex>`), which is accepted when the SHA-256
//! header is absent.

use axum::http::HeaderMap;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::Sha256;
use tracing::{debug, instrument};

pub const SIGNATURE_256_HEADER: &str = "x-hub-signature-256";
pub const SIGNATURE_HEADER: &str = "x-hub-signature";

/// Reasons a webhook delivery fails signature verification
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    #[error("missing signature header")]
    Missing,

    #[error("invalid signature format: {message}")]
    InvalidFormat { message: String },

    #[error("signature does not match payload")]
    Mismatch,
}

/// Verifies payloads against the configured GitHub webhook secret.
#[derive(Clone)]
pub struct GithubSignatureVerifier {
    secret: String,
}

impl GithubSignatureVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Verify `payload` against the signature headers of the delivery.
    #[instrument(skip(self, payload, headers), fields(payload_len = payload.len()))]
    pub fn verify(&self, payload: &[u8], headers: &HeaderMap) -> Result<(), SignatureError> {
        if let Some(value) = header_str(headers, SIGNATURE_256_HEADER)? {
            let digest = decode_digest(value, "sha256=")?;
            return self.verify_with::<Hmac<Sha256>>(payload, &digest);
        }

        if let Some(value) = header_str(headers, SIGNATURE_HEADER)? {
            debug!("Falling back to legacy SHA-1 webhook signature");
            let digest = decode_digest(value, "sha1=")?;
            return self.verify_with::<Hmac<Sha1>>(payload, &digest);
        }

        Err(SignatureError::Missing)
    }

    fn verify_with<M: Mac + hmac::digest::KeyInit>(
        &self,
        payload: &[u8],
        digest: &[u8],
    ) -> Result<(), SignatureError> {
        let mut mac = <M as Mac>::new_from_slice(self.secret.as_bytes()).map_err(|_| {
            SignatureError::InvalidFormat {
                message: "secret cannot be used as HMAC key".to_string(),
            }
        })?;
        mac.update(payload);

        // verify_slice compares in constant time
        mac.verify_slice(digest).map_err(|_| SignatureError::Mismatch)
    }
}

impl std::fmt::Debug for GithubSignatureVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GithubSignatureVerifier")
            .field("secret", &"<REDACTED>")
            .finish()
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Result<Option<&'a str>, SignatureError> {
    headers
        .get(name)
        .map(|value| {
            value.to_str().map_err(|_| SignatureError::InvalidFormat {
                message: format!("{name} is not valid UTF-8"),
            })
        })
        .transpose()
}

fn decode_digest(value: &str, prefix: &str) -> Result<Vec<u8>, SignatureError> {
    let hex_part = value
        .strip_prefix(prefix)
        .ok_or_else(|| SignatureError::InvalidFormat {
            message: format!("expected {prefix}<hex>"),
        })?;

    hex::decode(hex_part).map_err(|_| SignatureError::InvalidFormat {
        message: "signature is not valid hex".to_string(),
    })
}

#[cfg(test)]
#[path = "github_signature_tests.rs"]
mod tests;
