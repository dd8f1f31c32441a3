/// Decides whether a new event should be linked to one of its candidate
/// predecessors. No direct teacher counterpart; follows the same
/// collaborator-failure-absorption discipline used elsewhere in this
/// lineage — an external call going sideways degrades gracefully rather
/// than aborting the write.
use std::time::Duration;

use crate::candidates::Candidate;
use crate::collaborators::Judge;
use crate::schema::EventId;

const SOFT_LINK_PHRASE: &str = "(These events represent sequential steps in the same workflow.)";

pub struct LinkOutcome {
    pub cause_id: Option<EventId>,
    pub causal_relationship: Option<String>,
}

/// Ask the judge about each candidate in order; the first affirmative phrase
/// wins. If none affirm but the top candidate is similar enough, fall back
/// to a soft link. Otherwise the new event is a root.
pub async fn link_cause(
    judge: &dyn Judge,
    effect_text: &str,
    candidates: &[Candidate],
    soft_link_threshold: f32,
    judge_timeout: Duration,
) -> LinkOutcome {
    for candidate in candidates {
        let verdict = tokio::time::timeout(
            judge_timeout,
            judge.judge(&candidate.event.effect_text, effect_text),
        )
        .await;

        let phrase = match verdict {
            Ok(Some(phrase)) => phrase,
            Ok(None) => continue,
            Err(_) => {
                tracing::warn!(
                    event_id = candidate.event.event_id,
                    "causality judge call timed out — treating as no link"
                );
                continue;
            }
        };

        let trimmed = phrase.trim();
        if trimmed.is_empty() || trimmed.to_lowercase().starts_with("no") {
            continue;
        }

        return LinkOutcome {
            cause_id: Some(candidate.event.event_id),
            causal_relationship: Some(trimmed.to_string()),
        };
    }

    if let Some(top) = candidates.first() {
        if top.similarity >= soft_link_threshold {
            return LinkOutcome {
                cause_id: Some(top.event.event_id),
                causal_relationship: Some(SOFT_LINK_PHRASE.to_string()),
            };
        }
    }

    LinkOutcome {
        cause_id: None,
        causal_relationship: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Event;
    use crate::testing::{NullJudge, ScriptedJudge};
    use chrono::Utc;

    fn candidate(id: u64, similarity: f32) -> Candidate {
        Candidate {
            event: Event {
                event_id: id,
                timestamp: Utc::now(),
                effect_text: format!("event {id}"),
                embedding: vec![],
                cause_id: None,
                causal_relationship: None,
            },
            similarity,
        }
    }

    #[tokio::test]
    async fn affirmative_judge_response_wins() {
        let judge = ScriptedJudge::new(vec![Some("because X".to_string())]);
        let candidates = vec![candidate(1, 0.6)];
        let outcome = link_cause(&judge, "effect", &candidates, 0.85, Duration::from_secs(1)).await;
        assert_eq!(outcome.cause_id, Some(1));
        assert_eq!(outcome.causal_relationship.as_deref(), Some("because X"));
    }

    #[tokio::test]
    async fn negative_responses_fall_through_to_soft_link() {
        let judge = ScriptedJudge::new(vec![None]);
        let candidates = vec![candidate(1, 0.9)];
        let outcome = link_cause(&judge, "effect", &candidates, 0.85, Duration::from_secs(1)).await;
        assert_eq!(outcome.cause_id, Some(1));
        assert!(outcome
            .causal_relationship
            .unwrap()
            .contains("sequential steps"));
    }

    #[tokio::test]
    async fn no_candidates_and_no_similarity_yields_root() {
        let judge = NullJudge;
        let outcome = link_cause(&judge, "effect", &[], 0.85, Duration::from_secs(1)).await;
        assert!(outcome.cause_id.is_none());
    }

    #[tokio::test]
    async fn judge_failure_never_blocks_insertion() {
        let judge = NullJudge;
        let candidates = vec![candidate(1, 0.2)];
        let outcome = link_cause(&judge, "effect", &candidates, 0.85, Duration::from_secs(1)).await;
        assert!(outcome.cause_id.is_none());
    }
}
