//! Trust marks: signed assertions an issuer makes about a subject entity.
//!
//! Verification checks, in order:
//! 1. Signature, against the issuer configuration's `jwks` by `kid`
//! 2. The supplied configuration belongs to the mark's issuer
//! 3. Temporal validity
//! 4. Optional caller expectations on subject and mark id

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::entity::EntityId;
use crate::error::{FailureReason, FederationError, Result};
use crate::jose::{CompositeVerifier, SignatureVerifier};
use crate::statement::codec::{self, numeric_date, opt_numeric_date, JwsHeader};
use crate::statement::entity_statement::check_window;
use crate::statement::EntityStatement;

use super::verify::check_signature_parts;

/// Claims carried by a trust mark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrustMarkClaims {
    pub iss: EntityId,
    pub sub: EntityId,
    #[serde(alias = "trust_mark_id", alias = "trust_mark_type")]
    pub id: String,
    #[serde(deserialize_with = "numeric_date")]
    pub iat: u64,
    #[serde(default, deserialize_with = "opt_numeric_date", skip_serializing_if = "Option::is_none")]
    pub exp: Option<u64>,
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_uri: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A parsed, unverified trust mark.
#[derive(Debug, Clone)]
pub struct TrustMark {
    header: JwsHeader,
    claims: TrustMarkClaims,
    token: String,
    signing_input_len: usize,
    signature: Vec<u8>,
}

impl TrustMark {
    /// Parse a compact trust mark token.
    ///
    /// Fails with `MalformedTrustMark` when the token is not a compact JWS
    /// or lacks `iss`/`sub`/`id`/`iat`.
    pub fn parse(token: &str) -> Result<Self> {
        let token = token.trim();
        let decoded = codec::decode::<TrustMarkClaims>(token)
            .map_err(FederationError::MalformedTrustMark)?;
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

    pub fn id(&self) -> &str {
        &self.claims.id
    }

    pub fn issued_at(&self) -> u64 {
        self.claims.iat
    }

    /// `None` when the mark never expires.
    pub fn expires_at(&self) -> Option<u64> {
        self.claims.exp
    }

    pub fn header(&self) -> &JwsHeader {
        &self.header
    }

    pub fn claims(&self) -> &TrustMarkClaims {
        &self.claims
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    fn signing_input(&self) -> &[u8] {
        &self.token.as_bytes()[..self.signing_input_len]
    }
}

/// Parameters of one trust mark verification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustMarkOptions {
    /// Defaults to now.
    #[serde(default)]
    pub reference_time: Option<u64>,
    #[serde(default)]
    pub leeway_secs: u64,
    /// Require the mark to be issued to this entity.
    #[serde(default)]
    pub expected_subject: Option<EntityId>,
    /// Require this mark id.
    #[serde(default)]
    pub expected_id: Option<String>,
}

impl TrustMarkOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(mut self, reference_time: u64) -> Self {
        self.reference_time = Some(reference_time);
        self
    }

    pub fn with_leeway(mut self, secs: u64) -> Self {
        self.leeway_secs = secs;
        self
    }

    pub fn for_subject(mut self, subject: impl Into<EntityId>) -> Self {
        self.expected_subject = Some(subject.into());
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.expected_id = Some(id.into());
        self
    }
}

/// Result of verifying a trust mark.
#[derive(Debug, Clone)]
pub struct TrustMarkVerification {
    pub is_valid: bool,
    pub failure_reason: Option<FailureReason>,
    pub trust_mark: TrustMark,
    pub verified_at: u64,
}

/// Verifies trust marks against their issuer's configuration statement.
#[derive(Clone)]
pub struct TrustMarkVerifier {
    verifier: Arc<dyn SignatureVerifier>,
}

impl Default for TrustMarkVerifier {
    fn default() -> Self {
        Self::new(Arc::new(CompositeVerifier::default()))
    }
}

impl std::fmt::Debug for TrustMarkVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrustMarkVerifier").finish_non_exhaustive()
    }
}

impl TrustMarkVerifier {
    pub fn new(verifier: Arc<dyn SignatureVerifier>) -> Self {
        Self { verifier }
    }

    /// Verify `token` with detailed outcome.
    ///
    /// `Err` for a malformed token or unusable issuer keys; an invalid but
    /// well-formed mark is `Ok` with `is_valid == false`.
    pub fn verify(
        &self,
        token: &str,
        issuer_configuration: &EntityStatement,
        options: &TrustMarkOptions,
    ) -> Result<TrustMarkVerification> {
        let mark = TrustMark::parse(token)?;
        let at = options.reference_time.unwrap_or_else(crate::time::now_secs);
        let failure = self.first_failure(&mark, issuer_configuration, options, at)?;
        if let Some(reason) = failure {
            log::debug!("trust mark {} for {} invalid: {reason}", mark.id(), mark.subject());
        }
        Ok(TrustMarkVerification {
            is_valid: failure.is_none(),
            failure_reason: failure,
            trust_mark: mark,
            verified_at: at,
        })
    }

    /// Boolean form of [`verify`](Self::verify).
    pub fn is_valid(
        &self,
        token: &str,
        issuer_configuration: &EntityStatement,
        options: &TrustMarkOptions,
    ) -> Result<bool> {
        Ok(self.verify(token, issuer_configuration, options)?.is_valid)
    }

    fn first_failure(
        &self,
        mark: &TrustMark,
        issuer_configuration: &EntityStatement,
        options: &TrustMarkOptions,
        at: u64,
    ) -> Result<Option<FailureReason>> {
        // 1. Signature
        if let Some(reason) = check_signature_parts(
            self.verifier.as_ref(),
            &mark.header.alg,
            mark.header.kid.as_deref(),
            issuer_configuration.jwks(),
            mark.signing_input(),
            &mark.signature,
        )? {
            return Ok(Some(reason));
        }

        // 2. Issuer binding
        if !issuer_configuration.is_self_signed() || issuer_configuration.subject() != mark.issuer()
        {
            return Ok(Some(FailureReason::IssuerMismatch));
        }

        // 3. Temporal validity
        if let Some(reason) = check_window(mark.claims.iat, mark.claims.exp, at, options.leeway_secs)
        {
            return Ok(Some(reason));
        }

        // 4. Caller expectations
        let subject_ok = options
            .expected_subject
            .as_ref()
            .map_or(true, |s| s == mark.subject());
        let id_ok = options
            .expected_id
            .as_deref()
            .map_or(true, |id| id == mark.id());
        if !subject_ok || !id_ok {
            return Ok(Some(FailureReason::IssuerMismatch));
        }

        Ok(None)
    }
}
