//! JSON Web Keys.
//!
//! Only the members needed for public-key lookup and verification are
//! typed; everything else is kept in `extra` so a key set round-trips.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::b64url_encode;

/// A single public JWK.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Jwk {
    pub kty: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,
    #[serde(rename = "use", default, skip_serializing_if = "Option::is_none")]
    pub key_use: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crv: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub e: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Jwk {
    /// Build an Ed25519 OKP key from raw public key bytes.
    pub fn ed25519(kid: impl Into<String>, public_key: &[u8; 32]) -> Self {
        Self {
            kty: "OKP".into(),
            kid: Some(kid.into()),
            alg: Some("EdDSA".into()),
            key_use: Some("sig".into()),
            crv: Some("Ed25519".into()),
            x: Some(b64url_encode(public_key)),
            y: None,
            n: None,
            e: None,
            extra: serde_json::Map::new(),
        }
    }

    /// RFC 7638 thumbprint: SHA-256 over the required members in
    /// lexicographic order, base64url encoded.
    ///
    /// Returns `None` when a required member for the key type is absent.
    pub fn thumbprint(&self) -> Option<String> {
        let canonical = match self.kty.as_str() {
            "OKP" => format!(
                r#"{{"crv":{},"kty":"OKP","x":{}}}"#,
                json_str(self.crv.as_deref()?),
                json_str(self.x.as_deref()?)
            ),
            "EC" => format!(
                r#"{{"crv":{},"kty":"EC","x":{},"y":{}}}"#,
                json_str(self.crv.as_deref()?),
                json_str(self.x.as_deref()?),
                json_str(self.y.as_deref()?)
            ),
            "RSA" => format!(
                r#"{{"e":{},"kty":"RSA","n":{}}}"#,
                json_str(self.e.as_deref()?),
                json_str(self.n.as_deref()?)
            ),
            _ => return None,
        };
        Some(b64url_encode(Sha256::digest(canonical.as_bytes())))
    }

    /// Does this key answer to `kid`?
    ///
    /// A key with an explicit `kid` matches only that value; a key without
    /// one matches its thumbprint.
    pub fn matches_kid(&self, kid: &str) -> bool {
        match &self.kid {
            Some(own) => own == kid,
            None => self.thumbprint().as_deref() == Some(kid),
        }
    }
}

fn json_str(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

/// A JWK Set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Jwks {
    #[serde(default)]
    pub keys: Vec<Jwk>,
}

impl Jwks {
    pub fn new(keys: Vec<Jwk>) -> Self {
        Self { keys }
    }

    /// Find the key with the given key id. Exact match only.
    pub fn find(&self, kid: &str) -> Option<&Jwk> {
        self.keys.iter().find(|k| k.matches_kid(kid))
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
