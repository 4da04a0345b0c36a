//! Federation client: one entry point over resolution and verification.
//!
//! Holds the fetcher and signature verifier a caller would otherwise wire
//! into [`ChainResolver`], [`ChainVerifier`] and [`TrustMarkVerifier`]
//! separately.

use std::sync::Arc;

use crate::entity::{EntityId, TrustAnchorSet};
use crate::error::Result;
use crate::fetch::StatementFetcher;
use crate::jose::{CompositeVerifier, SignatureVerifier};
use crate::statement::EntityStatement;
use crate::trust::{
    ChainResolver, ChainVerifier, ResolutionResult, ResolveOptions, TrustChain, TrustMarkOptions,
    TrustMarkVerification, TrustMarkVerifier, VerificationResult, VerifyOptions,
};

/// Client for resolving and verifying federation trust.
#[derive(Clone)]
pub struct FederationClient {
    fetcher: Arc<dyn StatementFetcher>,
    resolver: ChainResolver,
    chain_verifier: ChainVerifier,
    mark_verifier: TrustMarkVerifier,
}

impl FederationClient {
    /// Create a client verifying `EdDSA`, RSA and ECDSA signatures.
    pub fn new(fetcher: Arc<dyn StatementFetcher>) -> Self {
        let verifier: Arc<dyn SignatureVerifier> = Arc::new(CompositeVerifier::default());
        Self {
            resolver: ChainResolver::new(fetcher.clone()),
            chain_verifier: ChainVerifier::new(verifier.clone()),
            mark_verifier: TrustMarkVerifier::new(verifier),
            fetcher,
        }
    }

    /// Replace the signature verifier used for chains and trust marks.
    pub fn with_verifier(mut self, verifier: Arc<dyn SignatureVerifier>) -> Self {
        self.chain_verifier = ChainVerifier::new(verifier.clone());
        self.mark_verifier = TrustMarkVerifier::new(verifier);
        self
    }

    pub fn with_resolve_options(mut self, options: ResolveOptions) -> Self {
        self.resolver = self.resolver.with_options(options);
        self
    }

    /// Resolve a chain from `entity` to one of `anchors`. The chain is not
    /// verified.
    pub async fn resolve_trust_chain(
        &self,
        entity: &EntityId,
        anchors: &TrustAnchorSet,
    ) -> Result<ResolutionResult> {
        self.resolver.resolve(entity, anchors).await
    }

    pub fn verify_trust_chain(
        &self,
        chain: &TrustChain,
        options: &VerifyOptions,
    ) -> Result<VerificationResult> {
        self.chain_verifier.verify(chain, options)
    }

    /// Fetch and decode `entity`'s configuration statement.
    pub async fn entity_configuration_statement(&self, entity: &EntityId) -> Result<EntityStatement> {
        let token = self.fetcher.fetch_configuration_statement(entity).await?;
        EntityStatement::parse(&token)
    }

    /// Pass/fail check of a trust mark at the current time.
    pub fn verify_trust_mark(&self, token: &str, issuer_configuration: &EntityStatement) -> Result<bool> {
        self.mark_verifier
            .is_valid(token, issuer_configuration, &TrustMarkOptions::default())
    }

    pub fn verify_trust_mark_detailed(
        &self,
        token: &str,
        issuer_configuration: &EntityStatement,
        options: &TrustMarkOptions,
    ) -> Result<TrustMarkVerification> {
        self.mark_verifier.verify(token, issuer_configuration, options)
    }
}

impl std::fmt::Debug for FederationClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FederationClient")
            .field("resolver", &self.resolver)
            .finish_non_exhaustive()
    }
}
