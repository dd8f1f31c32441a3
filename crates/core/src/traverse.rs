/// Anchor search plus bidirectional causal-chain traversal.
///
/// Grounded on `trace_causality`'s upward/downward walk with a visited-set
/// cycle guard — the closest real-world analog to this traversal shape in
/// the retrieval pack.
use std::collections::HashSet;

use crate::candidates::cosine_similarity;
use crate::error::MemoryError;
use crate::schema::{Event, EventId};
use crate::store::EventStore;

/// The most similar event at or above `threshold`, or `None` if the store
/// is empty or nothing clears the bar. Exact linear scan by design.
pub fn find_anchor(
    store: &EventStore,
    query_embedding: &[f32],
    threshold: f32,
) -> Result<Option<Event>, MemoryError> {
    let mut best: Option<(Event, f32)> = None;
    for event in store.all_for_scan() {
        let similarity = cosine_similarity(&event.embedding, query_embedding);
        if similarity < threshold {
            continue;
        }
        match &best {
            Some((_, best_similarity)) if *best_similarity >= similarity => {}
            _ => best = Some((event, similarity)),
        }
    }
    Ok(best.map(|(event, _)| event))
}

/// Walk backward from `anchor` via `cause_id` to the root, then forward via
/// `children_of` up to `max_forward_depth` hops, picking the oldest child at
/// each step. Returns a strictly chronological, distinct-id chain.
pub fn build_chain(
    store: &EventStore,
    anchor: Event,
    max_forward_depth: usize,
) -> Result<Vec<Event>, MemoryError> {
    let mut visited: HashSet<EventId> = HashSet::new();
    visited.insert(anchor.event_id);

    let mut backward = Vec::new();
    let mut current = anchor.clone();
    while let Some(cause_id) = current.cause_id {
        if visited.contains(&cause_id) {
            tracing::error!(
                event_id = cause_id,
                severity = "critical",
                "cyclic cause_id detected during backward traversal — halting"
            );
            break;
        }
        match store.get_by_id(cause_id)? {
            None => {
                tracing::warn!(
                    event_id = cause_id,
                    "cause_id references a missing event — halting backward traversal"
                );
                break;
            }
            Some(cause_event) => {
                visited.insert(cause_event.event_id);
                backward.push(cause_event.clone());
                current = cause_event;
            }
        }
    }
    backward.reverse(); // oldest first

    let mut chain = backward;
    chain.push(anchor.clone());

    let mut current = anchor;
    for _ in 0..max_forward_depth {
        let mut children = store.children_of(current.event_id)?;
        if children.is_empty() {
            break;
        }
        let oldest_child = children.remove(0);
        if visited.contains(&oldest_child.event_id) {
            tracing::error!(
                event_id = oldest_child.event_id,
                severity = "critical",
                "cyclic child link detected during forward traversal — halting"
            );
            break;
        }
        visited.insert(oldest_child.event_id);
        chain.push(oldest_child.clone());
        current = oldest_child;
    }

    Ok(chain)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tmp_db_path() -> std::path::PathBuf {
        tempfile::Builder::new()
            .prefix("causal-memory-traverse-")
            .tempdir()
            .unwrap()
            .into_path()
            .join("store.jsonl")
    }

    #[tokio::test]
    async fn build_chain_walks_backward_to_root() {
        let store = EventStore::open(tmp_db_path()).unwrap();
        let root = store.insert("root".into(), vec![1.0], None, None).await.unwrap();
        let mid = store
            .insert("mid".into(), vec![1.0], Some(root.event_id), None)
            .await
            .unwrap();
        let anchor = store
            .insert("anchor".into(), vec![1.0], Some(mid.event_id), None)
            .await
            .unwrap();

        let chain = build_chain(&store, anchor.clone(), 0).unwrap();
        assert_eq!(
            chain.iter().map(|e| e.event_id).collect::<Vec<_>>(),
            vec![root.event_id, mid.event_id, anchor.event_id]
        );
    }

    #[tokio::test]
    async fn build_chain_stops_at_missing_cause_and_warns() {
        let store = EventStore::open(tmp_db_path()).unwrap();
        // Insert with a cause_id that was never actually persisted.
        let anchor = store
            .insert("anchor".into(), vec![1.0], Some(999), None)
            .await
            .unwrap();
        let chain = build_chain(&store, anchor.clone(), 0).unwrap();
        assert_eq!(chain, vec![anchor]);
    }

    #[tokio::test]
    async fn find_anchor_returns_none_below_threshold() {
        let store = EventStore::open(tmp_db_path()).unwrap();
        store.insert("a".into(), vec![0.0, 1.0], None, None).await.unwrap();
        let anchor = find_anchor(&store, &[1.0, 0.0], 0.5).unwrap();
        assert!(anchor.is_none());
    }
}
