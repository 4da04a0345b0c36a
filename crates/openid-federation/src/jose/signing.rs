//! JWS signature verification.
//!
//! The federation core never touches key algorithms directly: every check
//! goes through a [`SignatureVerifier`]. [`Ed25519Verifier`] covers `EdDSA`
//! and [`RsaEcdsaVerifier`] the RSA and ECDSA algorithms.
//! [`CompositeVerifier`] combines them and is what the verifiers use by
//! default.

use std::sync::Arc;

use ed25519_dalek::{Signature, VerifyingKey};

use crate::error::{FederationError, Result};

use super::b64url_decode;
use super::jwk::Jwk;
use super::rsa_ecdsa::RsaEcdsaVerifier;

/// Verifies a JWS signature given the signing input, algorithm and key.
pub trait SignatureVerifier: Send + Sync {
    /// Can this verifier check signatures made with `alg`?
    fn supports(&self, alg: &str) -> bool;

    /// Verify `signature` over `signing_input` (`header.payload` ASCII bytes).
    ///
    /// Returns `Ok(false)` for a signature that does not verify and
    /// `Err(InvalidKey)` only when the key material itself is unusable.
    fn verify(&self, signing_input: &[u8], signature: &[u8], alg: &str, key: &Jwk)
        -> Result<bool>;
}

/// Ed25519 verifier for `alg = EdDSA` over OKP/Ed25519 keys.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519Verifier;

impl Ed25519Verifier {
    /// Extract an Ed25519 verifying key from a JWK.
    pub fn verifying_key(key: &Jwk) -> Result<VerifyingKey> {
        if key.kty != "OKP" {
            return Err(FederationError::InvalidKey(format!(
                "expected kty OKP, got {}",
                key.kty
            )));
        }
        if key.crv.as_deref() != Some("Ed25519") {
            return Err(FederationError::InvalidKey(
                "expected crv Ed25519".into(),
            ));
        }
        let x = key
            .x
            .as_deref()
            .ok_or_else(|| FederationError::InvalidKey("missing x".into()))?;
        let bytes = b64url_decode(x)
            .map_err(|e| FederationError::InvalidKey(format!("invalid base64url x: {e}")))?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| FederationError::InvalidKey("Ed25519 key must be 32 bytes".into()))?;
        VerifyingKey::from_bytes(&bytes)
            .map_err(|e| FederationError::InvalidKey(format!("invalid verifying key: {e}")))
    }
}

impl SignatureVerifier for Ed25519Verifier {
    fn supports(&self, alg: &str) -> bool {
        matches!(alg, "EdDSA" | "Ed25519")
    }

    fn verify(
        &self,
        signing_input: &[u8],
        signature: &[u8],
        alg: &str,
        key: &Jwk,
    ) -> Result<bool> {
        if !self.supports(alg) {
            return Ok(false);
        }
        let verifying_key = Self::verifying_key(key)?;
        let Ok(signature) = Signature::from_slice(signature) else {
            return Ok(false);
        };
        Ok(verifying_key
            .verify_strict(signing_input, &signature)
            .is_ok())
    }
}

/// Dispatches each check to the first verifier that supports its `alg`.
#[derive(Clone)]
pub struct CompositeVerifier {
    verifiers: Vec<Arc<dyn SignatureVerifier>>,
}

impl CompositeVerifier {
    pub fn new(verifiers: Vec<Arc<dyn SignatureVerifier>>) -> Self {
        Self { verifiers }
    }

    /// Add a verifier, consulted after the existing ones.
    pub fn with(mut self, verifier: Arc<dyn SignatureVerifier>) -> Self {
        self.verifiers.push(verifier);
        self
    }

    fn select(&self, alg: &str) -> Option<&dyn SignatureVerifier> {
        self.verifiers
            .iter()
            .map(Arc::as_ref)
            .find(|verifier| verifier.supports(alg))
    }
}

impl Default for CompositeVerifier {
    /// `EdDSA`, `RS*`, `PS*`, `ES256` and `ES384`.
    fn default() -> Self {
        Self::new(vec![Arc::new(Ed25519Verifier), Arc::new(RsaEcdsaVerifier)])
    }
}

impl SignatureVerifier for CompositeVerifier {
    fn supports(&self, alg: &str) -> bool {
        self.select(alg).is_some()
    }

    fn verify(
        &self,
        signing_input: &[u8],
        signature: &[u8],
        alg: &str,
        key: &Jwk,
    ) -> Result<bool> {
        match self.select(alg) {
            Some(verifier) => verifier.verify(signing_input, signature, alg, key),
            None => Ok(false),
        }
    }
}
