//! The parsed, immutable entity statement.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entity::EntityId;
use crate::error::{FailureReason, FederationError, Result};
use crate::jose::Jwks;

use super::codec::{self, numeric_date, JwsHeader};

/// Claims carried by an entity statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementClaims {
    pub iss: EntityId,
    pub sub: EntityId,
    #[serde(deserialize_with = "numeric_date")]
    pub iat: u64,
    #[serde(deserialize_with = "numeric_date")]
    pub exp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jwks: Option<Jwks>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authority_hints: Vec<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub trust_marks: Vec<Value>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// A signed entity statement, decoded but not yet verified.
///
/// Never mutated after parsing; the original compact token is retained so
/// signatures can be re-verified over the exact bytes that were signed.
#[derive(Debug, Clone)]
pub struct EntityStatement {
    header: JwsHeader,
    claims: StatementClaims,
    token: String,
    signing_input_len: usize,
    signature: Vec<u8>,
}

impl EntityStatement {
    /// Parse a compact signed token.
    ///
    /// Fails with `MalformedStatement` on a wrong segment count, invalid
    /// base64url or JSON, or a missing `iss`/`sub`/`iat`/`exp` claim.
    pub fn parse(token: &str) -> Result<Self> {
        let token = token.trim();
        let decoded = codec::decode::<StatementClaims>(token)
            .map_err(FederationError::MalformedStatement)?;
        Ok(Self {
            header: decoded.header,
            claims: decoded.claims,
            token: token.to_string(),
            signing_input_len: decoded.signing_input_len,
            signature: decoded.signature,
        })
    }

    pub fn issuer(&self) -> &EntityId {
        &self.claims.iss
    }

    pub fn subject(&self) -> &EntityId {
        &self.claims.sub
    }

    pub fn issued_at(&self) -> u64 {
        self.claims.iat
    }

    pub fn expires_at(&self) -> u64 {
        self.claims.exp
    }

    /// An entity configuration: issued by the entity about itself.
    pub fn is_self_signed(&self) -> bool {
        self.claims.iss == self.claims.sub
    }

    pub fn header(&self) -> &JwsHeader {
        &self.header
    }

    pub fn claims(&self) -> &StatementClaims {
        &self.claims
    }

    /// Key id of the issuer's key that signed this statement.
    pub fn key_id(&self) -> Option<&str> {
        self.header.kid.as_deref()
    }

    pub fn algorithm(&self) -> &str {
        &self.header.alg
    }

    pub fn jwks(&self) -> Option<&Jwks> {
        self.claims.jwks.as_ref()
    }

    pub fn authority_hints(&self) -> &[EntityId] {
        &self.claims.authority_hints
    }

    pub fn metadata(&self) -> Option<&Value> {
        self.claims.metadata.as_ref()
    }

    /// `metadata.federation_entity.federation_fetch_endpoint`, if published.
    pub fn federation_fetch_endpoint(&self) -> Option<&str> {
        self.metadata()?
            .get("federation_entity")?
            .get("federation_fetch_endpoint")?
            .as_str()
    }

    /// Compact trust mark tokens embedded in a configuration statement.
    pub fn trust_mark_tokens(&self) -> impl Iterator<Item = &str> {
        self.claims
            .trust_marks
            .iter()
            .filter_map(|m| m.get("trust_mark").and_then(Value::as_str))
    }

    /// The ASCII bytes `header.payload` covered by the signature.
    pub fn signing_input(&self) -> &[u8] {
        &self.token.as_bytes()[..self.signing_input_len]
    }

    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    /// The original compact serialisation, byte-for-byte.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Temporal check at `at` with `leeway` seconds of clock skew.
    ///
    /// Valid when `iat - leeway <= at <= exp + leeway`.
    pub fn check_validity(&self, at: u64, leeway: u64) -> Option<FailureReason> {
        check_window(self.claims.iat, Some(self.claims.exp), at, leeway)
    }
}

/// Shared `[iat, exp]` window check for statements and trust marks.
pub(crate) fn check_window(
    iat: u64,
    exp: Option<u64>,
    at: u64,
    leeway: u64,
) -> Option<FailureReason> {
    if at.saturating_add(leeway) < iat {
        return Some(FailureReason::NotYetValid);
    }
    if let Some(exp) = exp {
        if at > exp.saturating_add(leeway) {
            return Some(FailureReason::Expired);
        }
    }
    None
}

impl std::fmt::Display for EntityStatement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_self_signed() {
            write!(f, "configuration of {}", self.claims.sub)
        } else {
            write!(f, "{} about {}", self.claims.iss, self.claims.sub)
        }
    }
}
