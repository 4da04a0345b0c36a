//! Trust chain verification.
//!
//! Checks run in a fixed order and the first failing check decides the
//! result:
//! 1. Structure (non-empty, issuer/subject continuity)
//! 2. Temporal validity of every element
//! 3. Signatures, each against the issuer's key set
//! 4. Termination at the required anchor, or at a self-signed statement

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::entity::EntityId;
use crate::error::{FailureReason, Result};
use crate::jose::{CompositeVerifier, Jwks, SignatureVerifier};
use crate::statement::EntityStatement;

use super::chain::TrustChain;

/// Parameters of one chain verification.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VerifyOptions {
    /// Require the chain to end at this anchor. When `None`, the chain
    /// must end at a self-signed configuration statement.
    ///
    /// When set, the chain may instead end at a subordinate statement the
    /// anchor issued. Without `anchor_jwks` that last statement's signature
    /// is not checked, so the caller vouches for how the chain was obtained
    /// (for example, resolved from the anchor over TLS).
    #[serde(default)]
    pub trust_anchor: Option<EntityId>,
    /// Time (seconds since epoch) to validate `iat`/`exp` against.
    /// Defaults to now.
    #[serde(default)]
    pub reference_time: Option<u64>,
    /// Allowed clock skew in seconds.
    #[serde(default)]
    pub leeway_secs: u64,
    /// Keys of the anchor known out of band. The terminal element must
    /// verify against these when supplied. Required to check a chain that
    /// ends at a subordinate statement.
    #[serde(default)]
    pub anchor_jwks: Option<Jwks>,
}

impl VerifyOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_trust_anchor(mut self, anchor: impl Into<EntityId>) -> Self {
        self.trust_anchor = Some(anchor.into());
        self
    }

    pub fn at(mut self, reference_time: u64) -> Self {
        self.reference_time = Some(reference_time);
        self
    }

    pub fn with_leeway(mut self, secs: u64) -> Self {
        self.leeway_secs = secs;
        self
    }

    pub fn with_anchor_jwks(mut self, jwks: Jwks) -> Self {
        self.anchor_jwks = Some(jwks);
        self
    }
}

/// Result of verifying a trust chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationResult {
    /// Overall validity.
    pub is_valid: bool,
    /// First failing check, if any.
    pub failure_reason: Option<FailureReason>,
    /// Index of the chain element the failure was detected on.
    pub failed_at: Option<usize>,
    pub chain_length: usize,
    /// Reference time the chain was checked against.
    pub verified_at: u64,
}

impl VerificationResult {
    fn valid(chain_length: usize, verified_at: u64) -> Self {
        Self {
            is_valid: true,
            failure_reason: None,
            failed_at: None,
            chain_length,
            verified_at,
        }
    }

    fn invalid(
        reason: FailureReason,
        failed_at: Option<usize>,
        chain_length: usize,
        verified_at: u64,
    ) -> Self {
        log::debug!("chain invalid: {reason} at {failed_at:?}");
        Self {
            is_valid: false,
            failure_reason: Some(reason),
            failed_at,
            chain_length,
            verified_at,
        }
    }
}

/// Verifies trust chains.
#[derive(Clone)]
pub struct ChainVerifier {
    verifier: Arc<dyn SignatureVerifier>,
}

impl Default for ChainVerifier {
    fn default() -> Self {
        Self::new(Arc::new(CompositeVerifier::default()))
    }
}

impl std::fmt::Debug for ChainVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainVerifier").finish_non_exhaustive()
    }
}

impl ChainVerifier {
    pub fn new(verifier: Arc<dyn SignatureVerifier>) -> Self {
        Self { verifier }
    }

    /// Parse compact tokens and verify them as a chain.
    ///
    /// Unparsable tokens are a hard error, distinct from an invalid chain.
    pub fn verify_tokens<S: AsRef<str>>(
        &self,
        tokens: &[S],
        options: &VerifyOptions,
    ) -> Result<VerificationResult> {
        let chain = TrustChain::from_tokens(tokens)?;
        self.verify(&chain, options)
    }

    /// Verify a chain.
    ///
    /// Returns `Err` only when key material in the chain is unusable;
    /// every other defect is reported in the result.
    pub fn verify(&self, chain: &TrustChain, options: &VerifyOptions) -> Result<VerificationResult> {
        let at = options.reference_time.unwrap_or_else(crate::time::now_secs);
        let statements = chain.statements();
        let len = statements.len();

        // 1. Structure
        if statements.is_empty() {
            return Ok(VerificationResult::invalid(FailureReason::EmptyChain, None, 0, at));
        }
        if let Some(i) = linkage_break(statements) {
            return Ok(VerificationResult::invalid(
                FailureReason::BrokenLinkage,
                Some(i),
                len,
                at,
            ));
        }

        // 2. Temporal validity
        for (i, statement) in statements.iter().enumerate() {
            if let Some(reason) = statement.check_validity(at, options.leeway_secs) {
                return Ok(VerificationResult::invalid(reason, Some(i), len, at));
            }
        }

        // 3. Signatures
        for (i, statement) in statements.iter().enumerate() {
            let is_last = i + 1 == len;
            let mut key_sets: Vec<Option<&Jwks>> = Vec::with_capacity(2);
            if statement.is_self_signed() {
                key_sets.push(statement.jwks());
                // A configuration must also carry a key its superior vouches for.
                if let Some(next) = statements
                    .get(i + 1)
                    .filter(|next| !next.is_self_signed() && next.subject() == statement.subject())
                {
                    key_sets.push(next.jwks());
                }
            } else if !is_last {
                // The next element is the statement about this one's issuer.
                key_sets.push(statements[i + 1].jwks());
            }
            if is_last {
                if let Some(anchor_keys) = options.anchor_jwks.as_ref() {
                    key_sets.push(Some(anchor_keys));
                }
            }
            if key_sets.is_empty() {
                log::warn!("terminal statement ({statement}) left unverified: no anchor keys supplied");
                continue;
            }
            for keys in key_sets {
                if let Some(reason) = check_signature(self.verifier.as_ref(), statement, keys)? {
                    return Ok(VerificationResult::invalid(reason, Some(i), len, at));
                }
            }
        }

        // 4. Anchor termination
        let last = &statements[len - 1];
        let terminates = match options.trust_anchor.as_ref() {
            Some(anchor) => last.issuer() == anchor,
            None => last.is_self_signed(),
        };
        if !terminates {
            return Ok(VerificationResult::invalid(
                FailureReason::AnchorMismatch,
                Some(len - 1),
                len,
                at,
            ));
        }

        Ok(VerificationResult::valid(len, at))
    }
}

/// Index of the first element breaking issuer/subject continuity.
///
/// `chain[0]` must be a configuration; for `i > 0`, `chain[i]` must be
/// about `chain[i-1]`'s issuer, and a configuration may only appear last,
/// directly after a subordinate statement.
fn linkage_break(statements: &[EntityStatement]) -> Option<usize> {
    if !statements[0].is_self_signed() {
        return Some(0);
    }
    let last = statements.len() - 1;
    for i in 1..statements.len() {
        let (prev, cur) = (&statements[i - 1], &statements[i]);
        if cur.subject() != prev.issuer() {
            return Some(i);
        }
        if cur.is_self_signed() && (i != last || prev.is_self_signed()) {
            return Some(i);
        }
    }
    None
}

/// Verify one signed object against a key set, matching by `kid`.
///
/// `Ok(None)` means the signature verified.
pub(crate) fn check_signature_parts(
    verifier: &dyn SignatureVerifier,
    alg: &str,
    kid: Option<&str>,
    keys: Option<&Jwks>,
    signing_input: &[u8],
    signature: &[u8],
) -> Result<Option<FailureReason>> {
    let Some(key) = kid.and_then(|kid| keys.and_then(|k| k.find(kid))) else {
        return Ok(Some(FailureReason::KeyNotFound));
    };
    if !verifier.supports(alg) {
        return Ok(Some(FailureReason::SignatureInvalid));
    }
    if key.alg.as_deref().is_some_and(|key_alg| key_alg != alg) {
        return Ok(Some(FailureReason::SignatureInvalid));
    }
    if verifier.verify(signing_input, signature, alg, key)? {
        Ok(None)
    } else {
        Ok(Some(FailureReason::SignatureInvalid))
    }
}

fn check_signature(
    verifier: &dyn SignatureVerifier,
    statement: &EntityStatement,
    keys: Option<&Jwks>,
) -> Result<Option<FailureReason>> {
    check_signature_parts(
        verifier,
        statement.algorithm(),
        statement.key_id(),
        keys,
        statement.signing_input(),
        statement.signature(),
    )
}
