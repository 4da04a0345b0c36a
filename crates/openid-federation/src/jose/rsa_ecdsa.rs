//! RSA and ECDSA verification over public JWKs, backed by `jsonwebtoken`.

use jsonwebtoken::crypto;
use jsonwebtoken::{Algorithm, DecodingKey};

use crate::error::{FederationError, Result};

use super::b64url_encode;
use super::jwk::Jwk;
use super::signing::SignatureVerifier;

/// Verifier for `RS256/384/512`, `PS256/384/512`, `ES256` and `ES384`.
///
/// Symmetric `HS*` algorithms are never accepted: a federation key set
/// holds public keys only.
#[derive(Debug, Clone, Copy, Default)]
pub struct RsaEcdsaVerifier;

impl RsaEcdsaVerifier {
    fn algorithm(alg: &str) -> Option<Algorithm> {
        Some(match alg {
            "RS256" => Algorithm::RS256,
            "RS384" => Algorithm::RS384,
            "RS512" => Algorithm::RS512,
            "PS256" => Algorithm::PS256,
            "PS384" => Algorithm::PS384,
            "PS512" => Algorithm::PS512,
            "ES256" => Algorithm::ES256,
            "ES384" => Algorithm::ES384,
            _ => return None,
        })
    }

    /// Build a decoding key for `algorithm` from the JWK's public members.
    fn decoding_key(key: &Jwk, algorithm: Algorithm) -> Result<DecodingKey> {
        match algorithm {
            Algorithm::ES256 | Algorithm::ES384 => {
                let curve = if algorithm == Algorithm::ES256 { "P-256" } else { "P-384" };
                if key.kty != "EC" {
                    return Err(FederationError::InvalidKey(format!(
                        "expected kty EC, got {}",
                        key.kty
                    )));
                }
                if key.crv.as_deref() != Some(curve) {
                    return Err(FederationError::InvalidKey(format!("expected crv {curve}")));
                }
                DecodingKey::from_ec_components(member(&key.x, "x")?, member(&key.y, "y")?)
                    .map_err(|e| FederationError::InvalidKey(format!("invalid EC key: {e}")))
            }
            _ => {
                if key.kty != "RSA" {
                    return Err(FederationError::InvalidKey(format!(
                        "expected kty RSA, got {}",
                        key.kty
                    )));
                }
                DecodingKey::from_rsa_components(member(&key.n, "n")?, member(&key.e, "e")?)
                    .map_err(|e| FederationError::InvalidKey(format!("invalid RSA key: {e}")))
            }
        }
    }
}

impl SignatureVerifier for RsaEcdsaVerifier {
    fn supports(&self, alg: &str) -> bool {
        Self::algorithm(alg).is_some()
    }

    fn verify(
        &self,
        signing_input: &[u8],
        signature: &[u8],
        alg: &str,
        key: &Jwk,
    ) -> Result<bool> {
        let Some(algorithm) = Self::algorithm(alg) else {
            return Ok(false);
        };
        let decoding_key = Self::decoding_key(key, algorithm)?;
        crypto::verify(&b64url_encode(signature), signing_input, &decoding_key, algorithm)
            .map_err(|e| FederationError::InvalidKey(format!("{alg} verification: {e}")))
    }
}

fn member<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str> {
    value
        .as_deref()
        .ok_or_else(|| FederationError::InvalidKey(format!("missing {name}")))
}
