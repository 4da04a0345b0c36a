//! Trust chains.
//!
//! `chain[0]` is the subject's own configuration; each following element
//! is the statement issued about the previous element's issuer, ending at
//! a trust anchor (its configuration, or a statement it issued).

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::entity::EntityId;
use crate::error::Result;
use crate::statement::EntityStatement;

/// An ordered sequence of entity statements, leaf first.
///
/// Construction does not validate the chain; use
/// [`ChainVerifier`](super::ChainVerifier) for that.
#[derive(Debug, Clone)]
pub struct TrustChain {
    statements: Vec<EntityStatement>,
}

impl TrustChain {
    pub fn new(statements: Vec<EntityStatement>) -> Self {
        Self { statements }
    }

    /// Parse a chain from compact tokens, leaf first.
    pub fn from_tokens<S: AsRef<str>>(tokens: &[S]) -> Result<Self> {
        let statements = tokens
            .iter()
            .map(|t| EntityStatement::parse(t.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { statements })
    }

    pub fn statements(&self) -> &[EntityStatement] {
        &self.statements
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, EntityStatement> {
        self.statements.iter()
    }

    /// The entity this chain establishes trust for.
    pub fn subject(&self) -> Option<&EntityId> {
        self.statements.first().map(EntityStatement::subject)
    }

    /// The entity the chain terminates at: the issuer of the last element.
    pub fn anchor(&self) -> Option<&EntityId> {
        self.statements.last().map(EntityStatement::issuer)
    }

    /// The compact tokens, in chain order.
    pub fn to_tokens(&self) -> Vec<String> {
        self.statements.iter().map(|s| s.token().to_string()).collect()
    }
}

impl<'a> IntoIterator for &'a TrustChain {
    type Item = &'a EntityStatement;
    type IntoIter = std::slice::Iter<'a, EntityStatement>;

    fn into_iter(self) -> Self::IntoIter {
        self.statements.iter()
    }
}

impl Serialize for TrustChain {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.statements.iter().map(EntityStatement::token))
    }
}

impl<'de> Deserialize<'de> for TrustChain {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let tokens = Vec::<String>::deserialize(deserializer)?;
        TrustChain::from_tokens(&tokens).map_err(serde::de::Error::custom)
    }
}
