//! Trust: chain resolution and verification, trust mark validation.
//!
//! The trust module provides:
//! - The ordered `TrustChain` of entity statements
//! - Depth-first resolution from an entity to an accepted trust anchor
//! - Structural, temporal, signature and anchor verification of chains
//! - Trust mark verification against the issuer's configuration

pub mod chain;
pub mod mark;
pub mod resolve;
pub mod verify;

pub use chain::TrustChain;
pub use mark::{TrustMark, TrustMarkOptions, TrustMarkVerification, TrustMarkVerifier};
pub use resolve::{
    BranchFailure, BranchFailureKind, ChainResolver, ResolutionError, ResolutionResult,
    ResolveOptions,
};
pub use verify::{ChainVerifier, VerificationResult, VerifyOptions};
