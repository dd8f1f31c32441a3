/// Ranks prior events as potential direct causes of a new one.
///
/// Grounded on the cosine-similarity and score-by-reference-then-clone shape
/// used for memory retrieval elsewhere in this lineage, narrowed here to the
/// single similarity-and-recency rule the causal linker needs.
use chrono::{DateTime, Duration, Utc};

use crate::schema::Event;

#[derive(Debug, Clone)]
pub struct Candidate {
    pub event: Event,
    pub similarity: f32,
}

/// Cosine similarity `dot(a,b) / (‖a‖·‖b‖)`, clamped to `[0, 1]` and
/// zero-guarded against empty or mismatched-length vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }
    (dot / (mag_a * mag_b)).clamp(0.0, 1.0)
}

/// Up to `max_candidates` prior events that might be the direct cause of a
/// new event with the given `embedding`, inserted at `now`.
///
/// Only events within `time_decay_hours` of `now` are considered. Candidates
/// below `similarity_threshold` are dropped. Remaining candidates are sorted
/// by similarity descending, ties broken by most-recent timestamp then
/// lowest `event_id`.
pub fn find_candidates(
    prior_events: &[Event],
    embedding: &[f32],
    now: DateTime<Utc>,
    max_candidates: usize,
    similarity_threshold: f32,
    time_decay_hours: i64,
) -> Vec<Candidate> {
    let cutoff = now - Duration::hours(time_decay_hours);
    let mut scored: Vec<Candidate> = prior_events
        .iter()
        .filter(|e| e.timestamp >= cutoff)
        .filter_map(|e| {
            let similarity = cosine_similarity(&e.embedding, embedding);
            (similarity >= similarity_threshold).then(|| Candidate {
                event: e.clone(),
                similarity,
            })
        })
        .collect();

    scored.sort_by(|a, b| {
        b.similarity
            .total_cmp(&a.similarity)
            .then_with(|| b.event.timestamp.cmp(&a.event.timestamp))
            .then_with(|| a.event.event_id.cmp(&b.event.event_id))
    });
    scored.truncate(max_candidates);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    fn event(id: u64, embedding: Vec<f32>, hours_ago: i64) -> Event {
        Event {
            event_id: id,
            timestamp: Utc::now() - ChronoDuration::hours(hours_ago),
            effect_text: format!("event {id}"),
            embedding,
            cause_id: None,
            causal_relationship: None,
        }
    }

    #[test]
    fn cosine_similarity_is_one_for_identical_vectors() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_similarity_is_zero_for_orthogonal_vectors() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
    }

    #[test]
    fn events_outside_time_window_are_excluded() {
        let events = vec![event(1, vec![1.0, 0.0], 48)];
        let found = find_candidates(&events, &[1.0, 0.0], Utc::now(), 5, 0.5, 24);
        assert!(found.is_empty());
    }

    #[test]
    fn candidates_are_ranked_by_similarity_descending() {
        let events = vec![
            event(1, vec![0.6, 0.8], 1),
            event(2, vec![1.0, 0.0], 1),
        ];
        let found = find_candidates(&events, &[1.0, 0.0], Utc::now(), 5, 0.5, 24);
        assert_eq!(found[0].event.event_id, 2);
    }

    #[test]
    fn below_threshold_candidates_are_dropped() {
        let events = vec![event(1, vec![0.0, 1.0], 1)];
        let found = find_candidates(&events, &[1.0, 0.0], Utc::now(), 5, 0.5, 24);
        assert!(found.is_empty());
    }
}
