//! Trust chain resolution: walking authority hints up to an anchor.
//!
//! Depth-first over `authority_hints`, in declared order, first complete
//! path wins. The walk is iterative with an explicit frame stack so that
//! cycle detection, depth limits and cancellation do not depend on the
//! shape of the hint graph.
//!
//! Statements are only decoded here, not verified; feed the resulting
//! chain to [`ChainVerifier`](super::ChainVerifier).

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::entity::{EntityId, TrustAnchorSet};
use crate::error::{FederationError, FetchError, Result};
use crate::fetch::StatementFetcher;
use crate::statement::EntityStatement;

use super::chain::TrustChain;

/// Parameters of one resolution call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveOptions {
    /// Longest chain (in statements, excluding an appended anchor
    /// configuration) the walk may build.
    pub max_path_length: usize,
    /// Bound on each individual fetch. A timed-out fetch is a dead branch.
    pub fetch_timeout: Option<Duration>,
    /// Bound on the whole call. Exceeding it is a hard error.
    pub deadline: Option<Duration>,
    /// Append the anchor's own configuration when the path ends at a
    /// statement the anchor issued.
    pub append_anchor_configuration: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            max_path_length: 10,
            fetch_timeout: Some(Duration::from_secs(10)),
            deadline: None,
            append_anchor_configuration: true,
        }
    }
}

impl ResolveOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_path_length(mut self, max: usize) -> Self {
        self.max_path_length = max;
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = Some(timeout);
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn append_anchor_configuration(mut self, append: bool) -> Self {
        self.append_anchor_configuration = append;
        self
    }
}

/// Why one authority-hint edge was abandoned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchFailureKind {
    Fetch(FetchError),
    Malformed(String),
    /// The fetched statement is not the one requested.
    Mismatch(String),
    /// The authority was already expanded in this call at the same or a
    /// shallower depth.
    Cycle,
    DepthExceeded,
}

/// One dead branch of the walk: the edge `subject -> authority`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchFailure {
    pub authority: EntityId,
    pub subject: EntityId,
    pub kind: BranchFailureKind,
}

impl std::fmt::Display for BranchFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}: ", self.subject, self.authority)?;
        match &self.kind {
            BranchFailureKind::Fetch(e) => write!(f, "{e}"),
            BranchFailureKind::Malformed(m) => write!(f, "malformed statement: {m}"),
            BranchFailureKind::Mismatch(m) => write!(f, "{m}"),
            BranchFailureKind::Cycle => write!(f, "already visited"),
            BranchFailureKind::DepthExceeded => write!(f, "maximum path length reached"),
        }
    }
}

/// Reportable resolution failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolutionError {
    #[error("Could not obtain entity configuration of {entity}: {reason}")]
    EntityConfigurationUnavailable { entity: EntityId, reason: String },

    #[error("No trust chain from {entity} to any accepted trust anchor")]
    NoPathFound { entity: EntityId },
}

/// Outcome of a resolution call.
///
/// Not finding a path is an expected outcome reported here, never an
/// error of the call itself.
#[derive(Debug, Clone)]
pub struct ResolutionResult {
    pub trust_chain: Option<TrustChain>,
    pub error: Option<ResolutionError>,
    /// Every abandoned branch, in the order encountered.
    pub failures: Vec<BranchFailure>,
}

impl ResolutionResult {
    fn found(chain: TrustChain, failures: Vec<BranchFailure>) -> Self {
        Self {
            trust_chain: Some(chain),
            error: None,
            failures,
        }
    }

    fn failed(error: ResolutionError, failures: Vec<BranchFailure>) -> Self {
        Self {
            trust_chain: None,
            error: Some(error),
            failures,
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Error description including the abandoned branches.
    pub fn error_message(&self) -> Option<String> {
        let error = self.error.as_ref()?;
        if self.failures.is_empty() {
            return Some(error.to_string());
        }
        let branches: Vec<String> = self.failures.iter().map(ToString::to_string).collect();
        Some(format!("{error} ({})", branches.join("; ")))
    }
}

/// A pending hint list: the authorities `subject` names, and how far the
/// walk has got through them.
struct Frame {
    subject: EntityId,
    hints: Vec<EntityId>,
    next: usize,
}

/// Resolves trust chains by walking authority hints.
#[derive(Clone)]
pub struct ChainResolver {
    fetcher: Arc<dyn StatementFetcher>,
    options: ResolveOptions,
}

impl std::fmt::Debug for ChainResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainResolver")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl ChainResolver {
    pub fn new(fetcher: Arc<dyn StatementFetcher>) -> Self {
        Self {
            fetcher,
            options: ResolveOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ResolveOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &ResolveOptions {
        &self.options
    }

    /// Resolve a chain from `entity` to one of `anchors`.
    ///
    /// `Err` only when the call's deadline expires; every other outcome,
    /// including fetch failures, is reported in the result. Dropping the
    /// returned future aborts the walk without side effects.
    pub async fn resolve(
        &self,
        entity: &EntityId,
        anchors: &TrustAnchorSet,
    ) -> Result<ResolutionResult> {
        match self.options.deadline {
            Some(deadline) => tokio::time::timeout(deadline, self.walk(entity, anchors))
                .await
                .map_err(|_| FederationError::DeadlineExceeded(deadline)),
            None => Ok(self.walk(entity, anchors).await),
        }
    }

    async fn walk(&self, entity: &EntityId, anchors: &TrustAnchorSet) -> ResolutionResult {
        let mut failures = Vec::new();
        // Configurations fetched during this call, by entity id.
        let mut configurations: HashMap<EntityId, EntityStatement> = HashMap::new();

        let leaf = match self.configuration(entity).await {
            Ok(statement) => statement,
            Err(reason) => {
                return ResolutionResult::failed(
                    ResolutionError::EntityConfigurationUnavailable {
                        entity: entity.clone(),
                        reason,
                    },
                    failures,
                );
            }
        };

        if anchors.contains(entity) {
            log::info!("{entity} is itself a trust anchor");
            return ResolutionResult::found(TrustChain::new(vec![leaf]), failures);
        }

        // Shallowest depth each entity was expanded at. An authority is
        // expanded again only when reached by a strictly shorter path, so a
        // subtree cut off by the depth limit can still be reached later.
        let mut visited: HashMap<EntityId, usize> = HashMap::new();
        visited.insert(entity.clone(), 0);
        let mut stack = vec![Frame {
            subject: entity.clone(),
            hints: leaf.authority_hints().to_vec(),
            next: 0,
        }];
        // path[i] is the statement about stack[i].subject issued by the
        // authority stack[i + 1] was opened for.
        let mut path: Vec<EntityStatement> = Vec::new();

        while let Some(frame) = stack.last_mut() {
            let Some(authority) = frame.hints.get(frame.next).cloned() else {
                stack.pop();
                path.pop();
                continue;
            };
            frame.next += 1;
            let subject = frame.subject.clone();
            let fail = |kind| BranchFailure {
                authority: authority.clone(),
                subject: subject.clone(),
                kind,
            };
            log::debug!("trying {subject} -> {authority}");

            let is_anchor = anchors.contains(&authority);
            let depth = path.len() + 1;
            if !is_anchor && visited.get(&authority).is_some_and(|&seen| seen <= depth) {
                log::warn!("{subject} -> {authority}: authority already visited");
                failures.push(fail(BranchFailureKind::Cycle));
                continue;
            }
            // leaf + path + this statement
            if path.len() + 2 > self.options.max_path_length {
                log::warn!("{subject} -> {authority}: maximum path length reached");
                failures.push(fail(BranchFailureKind::DepthExceeded));
                continue;
            }

            let statement = match self.subordinate(&authority, &subject).await {
                Ok(statement) => statement,
                Err(kind) => {
                    log::warn!("{subject} -> {authority}: {kind:?}");
                    failures.push(fail(kind));
                    continue;
                }
            };

            if is_anchor {
                let mut statements = Vec::with_capacity(path.len() + 3);
                statements.push(leaf.clone());
                statements.extend(path.iter().cloned());
                statements.push(statement);
                if self.options.append_anchor_configuration {
                    match self.cached_configuration(&authority, &mut configurations).await {
                        Ok(anchor_config) => statements.push(anchor_config),
                        Err(kind) => {
                            log::warn!("{subject} -> {authority}: anchor configuration: {kind:?}");
                            failures.push(fail(kind));
                            continue;
                        }
                    }
                }
                log::info!(
                    "resolved chain of {} statements from {entity} to {authority}",
                    statements.len()
                );
                return ResolutionResult::found(TrustChain::new(statements), failures);
            }

            visited.insert(authority.clone(), depth);
            let hints = match self.cached_configuration(&authority, &mut configurations).await {
                Ok(config) => config.authority_hints().to_vec(),
                Err(kind) => {
                    log::warn!("{subject} -> {authority}: {kind:?}");
                    failures.push(fail(kind));
                    continue;
                }
            };
            path.push(statement);
            stack.push(Frame {
                subject: authority,
                hints,
                next: 0,
            });
        }

        ResolutionResult::failed(
            ResolutionError::NoPathFound {
                entity: entity.clone(),
            },
            failures,
        )
    }

    /// Fetch and parse `entity`'s configuration, checking it is self-signed.
    async fn configuration(&self, entity: &EntityId) -> std::result::Result<EntityStatement, String> {
        self.configuration_checked(entity)
            .await
            .map_err(|kind| match kind {
                BranchFailureKind::Fetch(e) => e.to_string(),
                BranchFailureKind::Malformed(m) => format!("malformed statement: {m}"),
                BranchFailureKind::Mismatch(m) => m,
                other => format!("{other:?}"),
            })
    }

    async fn cached_configuration(
        &self,
        entity: &EntityId,
        cache: &mut HashMap<EntityId, EntityStatement>,
    ) -> std::result::Result<EntityStatement, BranchFailureKind> {
        if let Some(statement) = cache.get(entity) {
            return Ok(statement.clone());
        }
        let statement = self.configuration_checked(entity).await?;
        cache.insert(entity.clone(), statement.clone());
        Ok(statement)
    }

    async fn configuration_checked(
        &self,
        entity: &EntityId,
    ) -> std::result::Result<EntityStatement, BranchFailureKind> {
        let token = self
            .bounded(self.fetcher.fetch_configuration_statement(entity))
            .await
            .map_err(BranchFailureKind::Fetch)?;
        let statement = parse(&token)?;
        if !statement.is_self_signed() || statement.subject() != entity {
            return Err(BranchFailureKind::Mismatch(format!(
                "configuration of {entity} has iss {} and sub {}",
                statement.issuer(),
                statement.subject()
            )));
        }
        Ok(statement)
    }

    async fn subordinate(
        &self,
        authority: &EntityId,
        subject: &EntityId,
    ) -> std::result::Result<EntityStatement, BranchFailureKind> {
        let token = self
            .bounded(self.fetcher.fetch_subordinate_statement(authority, subject))
            .await
            .map_err(BranchFailureKind::Fetch)?;
        let statement = parse(&token)?;
        if statement.issuer() != authority || statement.subject() != subject {
            return Err(BranchFailureKind::Mismatch(format!(
                "expected statement by {authority} about {subject}, got iss {} sub {}",
                statement.issuer(),
                statement.subject()
            )));
        }
        Ok(statement)
    }

    async fn bounded<F>(&self, fetch: F) -> std::result::Result<String, FetchError>
    where
        F: Future<Output = std::result::Result<String, FetchError>>,
    {
        match self.options.fetch_timeout {
            Some(timeout) => tokio::time::timeout(timeout, fetch)
                .await
                .unwrap_or(Err(FetchError::Timeout)),
            None => fetch.await,
        }
    }
}

fn parse(token: &str) -> std::result::Result<EntityStatement, BranchFailureKind> {
    EntityStatement::parse(token).map_err(|e| match e {
        FederationError::MalformedStatement(m) => BranchFailureKind::Malformed(m),
        other => BranchFailureKind::Malformed(other.to_string()),
    })
}
