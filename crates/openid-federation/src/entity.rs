//! Entity identifiers and trust anchor sets.
//!
//! An entity identifier is an opaque string, a URL in practice. Equality is
//! exact string match; no normalisation is applied.

use serde::{Deserialize, Serialize};

/// Globally unique identifier of a federation participant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// The entities accepted as chain roots for one resolution or verification
/// call.
///
/// Insertion order is kept for display; membership is exact match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrustAnchorSet(Vec<EntityId>);

impl TrustAnchorSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an anchor. Duplicates are ignored.
    pub fn insert(&mut self, anchor: impl Into<EntityId>) {
        let anchor = anchor.into();
        if !self.0.contains(&anchor) {
            self.0.push(anchor);
        }
    }

    pub fn contains(&self, entity: &EntityId) -> bool {
        self.0.iter().any(|a| a == entity)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EntityId> {
        self.0.iter()
    }
}

impl<T: Into<EntityId>> FromIterator<T> for TrustAnchorSet {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = TrustAnchorSet::new();
        for anchor in iter {
            set.insert(anchor);
        }
        set
    }
}
