//! Signed fixture statements for unit tests.

use ed25519_dalek::{Signer, SigningKey};
use jsonwebtoken::{Algorithm, EncodingKey};
use serde_json::{json, Value};

use crate::entity::EntityId;
use crate::jose::{b64url_encode, Jwk, Jwks};

const RSA_PRIVATE_PEM: &str = include_str!("../testdata/rsa_private.pem");
const RSA_N: &str = "xfQUftMkB4Lbl10DqP-fnNnuGsveVzfsJ0RGwvvpg1Dutmv6zVNu97E7IcxA6Em6bRjlS3YY2nG2p6m_B1EyTnzA-LpVQctxyZlMzewV8ioSvzBEwGloujnlvvj20LRdW7h-By_DhgReA6VQ6A33DyTgsTTpa5Cxi5fvjM7hvcyHtTixGXTZ4Gw7joRrnZfihs0Fl5norWr0OCLejsFQqAar3caTXguvII47QTUJYzgEHIvDXG_nUuLmcv0fNtkzSDO6JmhRB6Y_mR5PO9HizaZOYA97cTjnIRzB5CG9ahxDQRhlWek3yGlSxcpfeVAHWMgneQFlUjkAsjIp_fVt8Q";

const EC_P256_PRIVATE_PEM: &str = include_str!("../testdata/ec_p256_private.pem");
const EC_P256_X: &str = "4AIy5jJpinLIPhGXn8UXGAkVBeBjJlE2UDFzZwRhxys";
const EC_P256_Y: &str = "uifVxL5RIXpQfdQ5QIZupICElF8c3qV6MDRBGIFWXMM";

/// The fixed 2048-bit RSA test key.
pub fn rsa_signing_key() -> EncodingKey {
    EncodingKey::from_rsa_pem(RSA_PRIVATE_PEM.as_bytes()).unwrap()
}

pub fn rsa_jwk() -> Jwk {
    serde_json::from_value(json!({"kty": "RSA", "use": "sig", "n": RSA_N, "e": "AQAB"})).unwrap()
}

/// The fixed P-256 test key.
pub fn ec_p256_signing_key() -> EncodingKey {
    EncodingKey::from_ec_pem(EC_P256_PRIVATE_PEM.as_bytes()).unwrap()
}

pub fn ec_p256_jwk() -> Jwk {
    serde_json::from_value(json!({
        "kty": "EC",
        "use": "sig",
        "crv": "P-256",
        "x": EC_P256_X,
        "y": EC_P256_Y,
    }))
    .unwrap()
}

enum TestKey {
    Ed25519(SigningKey),
    Rsa,
    EcP256,
}

pub(crate) struct TestEntity {
    id: EntityId,
    kid: String,
    key: TestKey,
}

impl TestEntity {
    pub fn new(id: &str) -> Self {
        Self::with_key(id, TestKey::Ed25519(SigningKey::generate(&mut rand::thread_rng())))
    }

    /// An entity signing with `RS256` under the fixed RSA key.
    pub fn rsa(id: &str) -> Self {
        Self::with_key(id, TestKey::Rsa)
    }

    /// An entity signing with `ES256` under the fixed P-256 key.
    pub fn ec_p256(id: &str) -> Self {
        Self::with_key(id, TestKey::EcP256)
    }

    fn with_key(id: &str, key: TestKey) -> Self {
        Self {
            id: EntityId::new(id),
            kid: format!("{id}#sig-1"),
            key,
        }
    }

    pub fn id(&self) -> &EntityId {
        &self.id
    }

    pub fn kid(&self) -> &str {
        &self.kid
    }

    pub fn jwks(&self) -> Jwks {
        let mut jwk = match &self.key {
            TestKey::Ed25519(sk) => Jwk::ed25519(self.kid.clone(), &sk.verifying_key().to_bytes()),
            TestKey::Rsa => rsa_jwk(),
            TestKey::EcP256 => ec_p256_jwk(),
        };
        jwk.kid = Some(self.kid.clone());
        Jwks::new(vec![jwk])
    }

    pub fn sign(&self, typ: &str, claims: &Value) -> String {
        let alg = match self.key {
            TestKey::Ed25519(_) => "EdDSA",
            TestKey::Rsa => "RS256",
            TestKey::EcP256 => "ES256",
        };
        let header = json!({"alg": alg, "kid": self.kid, "typ": typ});
        let input = format!(
            "{}.{}",
            b64url_encode(header.to_string()),
            b64url_encode(claims.to_string())
        );
        let sig = match &self.key {
            TestKey::Ed25519(sk) => b64url_encode(sk.sign(input.as_bytes()).to_bytes()),
            TestKey::Rsa => {
                jsonwebtoken::crypto::sign(input.as_bytes(), &rsa_signing_key(), Algorithm::RS256)
                    .unwrap()
            }
            TestKey::EcP256 => jsonwebtoken::crypto::sign(
                input.as_bytes(),
                &ec_p256_signing_key(),
                Algorithm::ES256,
            )
            .unwrap(),
        };
        format!("{input}.{sig}")
    }

    pub fn configuration(&self, hints: &[&str], iat: u64, exp: u64) -> String {
        self.sign(
            "entity-statement+jwt",
            &json!({
                "iss": self.id,
                "sub": self.id,
                "iat": iat,
                "exp": exp,
                "jwks": self.jwks(),
                "authority_hints": hints,
            }),
        )
    }

    pub fn subordinate(&self, subject: &TestEntity, iat: u64, exp: u64) -> String {
        self.sign(
            "entity-statement+jwt",
            &json!({
                "iss": self.id,
                "sub": subject.id,
                "iat": iat,
                "exp": exp,
                "jwks": subject.jwks(),
            }),
        )
    }

    pub fn trust_mark(&self, subject: &str, mark_id: &str, iat: u64, exp: u64) -> String {
        self.sign(
            "trust-mark+jwt",
            &json!({
                "iss": self.id,
                "sub": subject,
                "id": mark_id,
                "iat": iat,
                "exp": exp,
            }),
        )
    }
}
