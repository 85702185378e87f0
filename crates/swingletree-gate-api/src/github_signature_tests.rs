//! Tests for [`GithubSignatureVerifier`].

use super::*;
use axum::http::HeaderValue;

const SECRET: &str = "It's a Secret to Everybody";
const PAYLOAD: &[u8] = b"Hello, World!";

/// Digest published in GitHub's webhook validation guide for the pair above.
const EXPECTED_SHA256: &str =
    "757107ea0eb2509fc211221cce984b8a37570b6d7586c22c46f4379c8b043e17";

fn sign_sha256(secret: &str, payload: &[u8]) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(payload);
    format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
}

fn sign_sha1(secret: &str, payload: &[u8]) -> String {
    let mut mac = Hmac::<Sha1>::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(payload);
    format!("sha1={}", hex::encode(mac.finalize().into_bytes()))
}

fn headers_with(name: &'static str, value: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(name, HeaderValue::from_str(value).unwrap());
    headers
}

#[test]
fn test_known_sha256_vector() {
    assert_eq!(sign_sha256(SECRET, PAYLOAD), format!("sha256={EXPECTED_SHA256}"));

    let verifier = GithubSignatureVerifier::new(SECRET);
    let headers = headers_with(SIGNATURE_256_HEADER, &format!("sha256={EXPECTED_SHA256}"));

    assert_eq!(verifier.verify(PAYLOAD, &headers), Ok(()));
}

#[test]
fn test_sha256_mismatch_rejected() {
    let verifier = GithubSignatureVerifier::new("other secret");
    let headers = headers_with(SIGNATURE_256_HEADER, &sign_sha256(SECRET, PAYLOAD));

    assert_eq!(
        verifier.verify(PAYLOAD, &headers),
        Err(SignatureError::Mismatch)
    );
}

/// Verify that the legacy SHA-1 header is honoured when SHA-256 is absent.
#[test]
fn test_legacy_sha1_accepted() {
    let verifier = GithubSignatureVerifier::new(SECRET);
    let headers = headers_with(SIGNATURE_HEADER, &sign_sha1(SECRET, PAYLOAD));

    assert_eq!(verifier.verify(PAYLOAD, &headers), Ok(()));
}

/// Verify that SHA-256 takes precedence over a (wrong) SHA-1 signature.
#[test]
fn test_sha256_preferred_over_sha1() {
    let verifier = GithubSignatureVerifier::new(SECRET);
    let mut headers = headers_with(SIGNATURE_256_HEADER, &sign_sha256(SECRET, PAYLOAD));
    headers.insert(SIGNATURE_HEADER, HeaderValue::from_static("sha1=00"));

    assert_eq!(verifier.verify(PAYLOAD, &headers), Ok(()));
}

#[test]
fn test_missing_signature_rejected() {
    let verifier = GithubSignatureVerifier::new(SECRET);

    assert_eq!(
        verifier.verify(PAYLOAD, &HeaderMap::new()),
        Err(SignatureError::Missing)
    );
}

#[test]
fn test_malformed_signatures_rejected() {
    let verifier = GithubSignatureVerifier::new(SECRET);

    let no_prefix = headers_with(SIGNATURE_256_HEADER, EXPECTED_SHA256);
    assert!(matches!(
        verifier.verify(PAYLOAD, &no_prefix),
        Err(SignatureError::InvalidFormat { .. })
    ));

    let not_hex = headers_with(SIGNATURE_256_HEADER, "sha256=zz");
    assert!(matches!(
        verifier.verify(PAYLOAD, &not_hex),
        Err(SignatureError::InvalidFormat { .. })
    ));
}

#[test]
fn test_debug_redacts_secret() {
    let verifier = GithubSignatureVerifier::new("hunter2");

    assert!(!format!("{verifier:?}").contains("hunter2"));
}
