//! JOSE primitives used by the federation core.
//!
//! This module provides:
//! - JWK / JWKS parsing and key-id lookup (with RFC 7638 thumbprints)
//! - The `SignatureVerifier` boundary for JWS signature checks
//! - An Ed25519 (`EdDSA`) verifier built on `ed25519-dalek`
//! - RSA and ECDSA verifiers built on `jsonwebtoken`

pub mod jwk;
pub mod rsa_ecdsa;
pub mod signing;

pub use jwk::{Jwk, Jwks};
pub use rsa_ecdsa::RsaEcdsaVerifier;
pub use signing::{CompositeVerifier, Ed25519Verifier, SignatureVerifier};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;

/// Encode bytes as unpadded base64url.
pub fn b64url_encode(bytes: impl AsRef<[u8]>) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Decode unpadded base64url.
pub fn b64url_decode(input: &str) -> std::result::Result<Vec<u8>, base64::DecodeError> {
    URL_SAFE_NO_PAD.decode(input.as_bytes())
}
