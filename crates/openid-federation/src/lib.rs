//! OpenID Federation: trust chain resolution and verification.
//!
//! Provides discovery of signed paths of entity statements from a
//! federation entity up to an accepted trust anchor, cryptographic and
//! temporal verification of those chains, and validation of trust marks
//! issued to an entity.

pub mod client;
pub mod entity;
pub mod error;
pub mod fetch;
pub mod jose;
pub mod statement;
pub mod time;
pub mod trust;

#[cfg(test)]
pub(crate) mod testutil;

// Re-export primary types
pub use client::FederationClient;
pub use entity::{EntityId, TrustAnchorSet};
pub use error::{FailureReason, FederationError, FetchError, Result};
pub use fetch::{InMemoryFetcher, StatementFetcher};
pub use jose::{
    CompositeVerifier, Ed25519Verifier, Jwk, Jwks, RsaEcdsaVerifier, SignatureVerifier,
};
pub use statement::{EntityStatement, JwsHeader, StatementClaims};

// Re-export trust types
pub use trust::{
    BranchFailure, BranchFailureKind, ChainResolver, ChainVerifier, ResolutionError,
    ResolutionResult, ResolveOptions, TrustChain, TrustMark, TrustMarkOptions,
    TrustMarkVerification, TrustMarkVerifier, VerificationResult, VerifyOptions,
};

#[cfg(feature = "http")]
pub use fetch::HttpFetcher;
