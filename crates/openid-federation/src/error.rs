//! Error types for OpenID Federation.
//!
//! Hard failures (malformed input, collaborator I/O faults that prevent any
//! judgment) are `FederationError`. Expected negative outcomes such as an
//! expired statement or a wrong anchor are reported as a `FailureReason`
//! inside a verification result, never as an error.

use serde::{Deserialize, Serialize};

/// Hard failures of federation operations.
#[derive(Debug, thiserror::Error)]
pub enum FederationError {
    #[error("Malformed entity statement: {0}")]
    MalformedStatement(String),

    #[error("Malformed trust mark: {0}")]
    MalformedTrustMark(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Resolution deadline exceeded after {0:?}")]
    DeadlineExceeded(std::time::Duration),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for FederationError {
    fn from(e: serde_json::Error) -> Self {
        FederationError::Serialization(e.to_string())
    }
}

/// Failures reported by a [`StatementFetcher`](crate::fetch::StatementFetcher).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("Statement not found: {0}")]
    NotFound(String),

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Fetch timed out")]
    Timeout,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Why a well-formed chain or trust mark did not verify.
///
/// The first failing check determines the reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// The chain contains no statements.
    EmptyChain,
    /// Issuer/subject continuity is broken, or a self-signed statement
    /// appears where a subordinate statement is required.
    BrokenLinkage,
    /// The reference time is after `exp`.
    Expired,
    /// The reference time is before `iat`.
    NotYetValid,
    /// No key in the issuer's key set matches the statement's `kid`.
    KeyNotFound,
    /// The signature does not verify, or its algorithm is unsupported.
    SignatureInvalid,
    /// The chain does not terminate at the required (or any valid) anchor.
    AnchorMismatch,
    /// A trust mark's issuer does not own the supplied configuration,
    /// or its subject/id differs from what the caller expected.
    IssuerMismatch,
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FailureReason::EmptyChain => "empty chain",
            FailureReason::BrokenLinkage => "broken issuer/subject linkage",
            FailureReason::Expired => "expired",
            FailureReason::NotYetValid => "not yet valid",
            FailureReason::KeyNotFound => "signing key not found",
            FailureReason::SignatureInvalid => "invalid signature",
            FailureReason::AnchorMismatch => "trust anchor mismatch",
            FailureReason::IssuerMismatch => "issuer mismatch",
        };
        f.write_str(s)
    }
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, FederationError>;
