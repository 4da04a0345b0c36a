//! Stress test: resolution over deep, wide and cyclic authority-hint
//! graphs.

#[path = "../common/mod.rs"]
mod common;

use common::{anchors, Federation};
use openid_federation::{
    BranchFailureKind, ChainResolver, ChainVerifier, EntityId, ResolutionError, ResolveOptions,
    VerifyOptions,
};

const TA: &str = "https://ta.example.org";
const LEAF: &str = "https://leaf.example.org";

fn node(name: &str, i: usize) -> String {
    format!("https://{name}-{i}.example.org")
}

fn resolver(fed: &Federation, max_path_length: usize) -> ChainResolver {
    ChainResolver::new(fed.fetcher.clone())
        .with_options(ResolveOptions::new().with_max_path_length(max_path_length))
}

/// `leaf -> n0 -> n1 -> ... -> n{depth-1} -> ta`
fn linear(depth: usize) -> Federation {
    let ids: Vec<String> = (0..depth).map(|i| node("n", i)).collect();
    let mut fed = Federation::new();
    fed.entity(TA, &[]);
    for i in 0..depth {
        let next = ids.get(i + 1).map_or(TA, String::as_str);
        fed.entity(&ids[i], &[next]);
    }
    fed.entity(LEAF, &[ids[0].as_str()]);
    fed.edge(&ids[0], LEAF);
    for i in 0..depth {
        let next = ids.get(i + 1).map_or(TA, String::as_str);
        fed.edge(next, &ids[i]);
    }
    fed
}

#[tokio::test]
async fn stress_deep_linear_chain() {
    let depth = 30;
    let fed = linear(depth);

    let resolution = resolver(&fed, depth + 2)
        .resolve(&EntityId::new(LEAF), &anchors(&[TA]))
        .await
        .unwrap();
    let chain = resolution.trust_chain.expect("chain within the limit");
    assert_eq!(chain.len(), depth + 3);
    assert!(resolution.failures.is_empty());

    let verification = ChainVerifier::default()
        .verify(&chain, &VerifyOptions::new().with_trust_anchor(TA))
        .unwrap();
    assert!(verification.is_valid, "{:?}", verification.failure_reason);
}

#[tokio::test]
async fn stress_deep_linear_chain_over_limit() {
    let depth = 30;
    let fed = linear(depth);

    let resolution = resolver(&fed, depth + 1)
        .resolve(&EntityId::new(LEAF), &anchors(&[TA]))
        .await
        .unwrap();
    assert!(resolution.trust_chain.is_none());
    assert_eq!(resolution.failures.len(), 1);
    assert_eq!(resolution.failures[0].kind, BranchFailureKind::DepthExceeded);
}

#[tokio::test]
async fn stress_wide_fan_out_with_one_good_hint() {
    let width = 50;
    let dead: Vec<String> = (0..width).map(|i| node("dead", i)).collect();
    let good = node("good", 0);

    let mut hints: Vec<&str> = dead.iter().map(String::as_str).collect();
    hints.push(good.as_str());

    let mut fed = Federation::new();
    fed.entity(TA, &[])
        .entity(LEAF, &hints)
        .entity(&good, &[TA])
        .edge(TA, &good)
        .edge(&good, LEAF);
    for id in &dead {
        fed.entity(id, &[]).edge(id, LEAF);
    }

    let resolution = resolver(&fed, 10)
        .resolve(&EntityId::new(LEAF), &anchors(&[TA]))
        .await
        .unwrap();
    let chain = resolution.trust_chain.expect("last hint reaches the anchor");
    assert_eq!(chain.statements()[1].issuer().as_str(), good);
    assert_eq!(chain.len(), 4);
    // Dead ends without hints are not branch failures.
    assert!(resolution.failures.is_empty());
    // leaf config, then subordinate + config per dead end, then the good path.
    assert_eq!(fed.fetcher.fetch_count(), 1 + 2 * width + 2 + 2);
}

#[tokio::test]
async fn stress_cycle_before_anchor() {
    let a = node("a", 0);
    let b = node("b", 0);
    let mut fed = Federation::new();
    fed.entity(TA, &[])
        .entity(&a, &[b.as_str()])
        .entity(&b, &[a.as_str(), LEAF, b.as_str(), TA])
        .entity(LEAF, &[a.as_str()])
        .edge(&a, LEAF)
        .edge(&b, &a)
        .edge(TA, &b);

    let resolution = resolver(&fed, 10)
        .resolve(&EntityId::new(LEAF), &anchors(&[TA]))
        .await
        .unwrap();
    let chain = resolution.trust_chain.expect("cycle is skipped");
    let issuers: Vec<&str> = chain.iter().map(|s| s.issuer().as_str()).collect();
    assert_eq!(issuers, vec![LEAF, a.as_str(), b.as_str(), TA, TA]);

    let cycles = resolution
        .failures
        .iter()
        .filter(|f| f.kind == BranchFailureKind::Cycle)
        .count();
    assert_eq!(cycles, 3);
}

#[tokio::test]
async fn stress_long_detour_does_not_hide_short_path() {
    let detour: Vec<String> = (0..8).map(|i| node("detour", i)).collect();
    let short = node("short", 0);
    let hub = node("hub", 0);
    let mut fed = Federation::new();
    fed.entity(TA, &[]).entity(&hub, &[TA]).entity(&short, &[hub.as_str()]);
    for i in 0..detour.len() {
        let next = detour.get(i + 1).unwrap_or(&hub).as_str();
        fed.entity(&detour[i], &[next]);
    }
    fed.entity(LEAF, &[detour[0].as_str(), short.as_str()])
        .edge(&detour[0], LEAF)
        .edge(&short, LEAF)
        .edge(&hub, &short)
        .edge(TA, &hub);
    for i in 0..detour.len() {
        let next = detour.get(i + 1).unwrap_or(&hub).clone();
        fed.edge(&next, &detour[i]);
    }

    // The detour reaches the hub within the limit, but not the anchor.
    let resolution = resolver(&fed, detour.len() + 2)
        .resolve(&EntityId::new(LEAF), &anchors(&[TA]))
        .await
        .unwrap();
    let chain = resolution.trust_chain.expect("short path via the hub");
    let issuers: Vec<&str> = chain.iter().map(|s| s.issuer().as_str()).collect();
    assert_eq!(issuers, vec![LEAF, short.as_str(), hub.as_str(), TA, TA]);
    assert_eq!(resolution.failures.len(), 1);
    assert_eq!(resolution.failures[0].kind, BranchFailureKind::DepthExceeded);
    assert_eq!(resolution.failures[0].subject.as_str(), hub);

    let verification = ChainVerifier::default()
        .verify(&chain, &VerifyOptions::new().with_trust_anchor(TA))
        .unwrap();
    assert!(verification.is_valid, "{:?}", verification.failure_reason);
}

#[tokio::test]
async fn stress_pure_cycle_terminates() {
    let ring: Vec<String> = (0..10).map(|i| node("ring", i)).collect();
    let mut fed = Federation::new();
    fed.entity(TA, &[]);
    for i in 0..ring.len() {
        let next = ring[(i + 1) % ring.len()].as_str();
        fed.entity(&ring[i], &[next]);
    }
    fed.entity(LEAF, &[ring[0].as_str()]).edge(&ring[0], LEAF);
    for i in 0..ring.len() {
        let next = ring[(i + 1) % ring.len()].clone();
        fed.edge(&next, &ring[i]);
    }

    let resolution = resolver(&fed, 100)
        .resolve(&EntityId::new(LEAF), &anchors(&[TA]))
        .await
        .unwrap();
    assert_eq!(
        resolution.error,
        Some(ResolutionError::NoPathFound {
            entity: EntityId::new(LEAF)
        })
    );
    assert_eq!(resolution.failures.len(), 1);
    assert_eq!(resolution.failures[0].kind, BranchFailureKind::Cycle);
    assert_eq!(resolution.failures[0].authority.as_str(), ring[0]);
}

#[tokio::test]
async fn stress_layered_dag_expands_each_authority_once() {
    let layers = 5;
    let width = 5;
    let ids: Vec<Vec<String>> = (0..layers)
        .map(|l| (0..width).map(|i| node(&format!("l{l}"), i)).collect())
        .collect();

    let mut fed = Federation::new();
    fed.entity(TA, &[]);
    for l in 0..layers {
        let hints: Vec<&str> = ids
            .get(l + 1)
            .map(|next| next.iter().map(String::as_str).collect())
            .unwrap_or_default();
        for id in &ids[l] {
            fed.entity(id, &hints);
        }
    }
    let first: Vec<&str> = ids[0].iter().map(String::as_str).collect();
    fed.entity(LEAF, &first);
    for id in &ids[0] {
        fed.edge(id, LEAF);
    }
    for l in 1..layers {
        for authority in &ids[l] {
            for subject in &ids[l - 1] {
                fed.edge(authority, subject);
            }
        }
    }

    // The anchor is unreachable, so the whole graph is explored.
    let resolution = resolver(&fed, 20)
        .resolve(&EntityId::new(LEAF), &anchors(&[TA]))
        .await
        .unwrap();
    assert!(resolution.trust_chain.is_none());

    let nodes = layers * width;
    let edges = width + (layers - 1) * width * width;
    assert_eq!(fed.fetcher.fetch_count(), 1 + 2 * nodes);
    assert_eq!(resolution.failures.len(), edges - nodes);
    assert!(resolution
        .failures
        .iter()
        .all(|f| f.kind == BranchFailureKind::Cycle));
}
