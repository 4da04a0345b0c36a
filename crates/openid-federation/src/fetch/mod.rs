//! Statement retrieval boundary.
//!
//! The core never performs I/O itself: it asks a [`StatementFetcher`] for
//! raw compact tokens. Every call is a suspension point and may be
//! cancelled by dropping the future or bounded by a timeout.
//!
//! # Modules
//!
//! - [`memory`]: offline fetcher over pre-collected statements.
//! - [`http`]: well-known / fetch-endpoint retrieval over HTTP
//!   (feature `http`).

#[cfg(feature = "http")]
pub mod http;
pub mod memory;

use async_trait::async_trait;

use crate::entity::EntityId;
use crate::error::FetchError;

#[cfg(feature = "http")]
pub use http::HttpFetcher;
pub use memory::InMemoryFetcher;

/// Retrieves signed entity statements.
#[async_trait]
pub trait StatementFetcher: Send + Sync {
    /// Fetch the self-signed entity configuration of `entity`.
    async fn fetch_configuration_statement(&self, entity: &EntityId)
        -> Result<String, FetchError>;

    /// Fetch the statement `authority` issued about its subordinate `subject`.
    async fn fetch_subordinate_statement(
        &self,
        authority: &EntityId,
        subject: &EntityId,
    ) -> Result<String, FetchError>;
}
