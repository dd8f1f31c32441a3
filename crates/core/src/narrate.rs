/// Pure prose assembly over an already-ordered, already-deduplicated chain.
/// No teacher/pack counterpart for narration prose existed to ground this
/// on; built directly off the connector-alternation rule.
use crate::schema::Event;

const CONNECTORS: [&str; 2] = ["This led to", "which in turn caused"];

/// Renders a chronological chain of events as a single narrative string.
/// Returns an empty string for an empty chain — callers are expected to
/// short-circuit on "no anchor" before reaching the narrator.
pub fn narrate(chain: &[Event]) -> String {
    let mut events = chain.iter();
    let Some(first) = events.next() else {
        return String::new();
    };

    let mut narrative = format!("Initially, {}.", first.effect_text);
    for (i, event) in events.enumerate() {
        let connector = CONNECTORS[i % CONNECTORS.len()];
        let relationship = event
            .causal_relationship
            .as_ref()
            .map(|r| format!(" ({r})"))
            .unwrap_or_default();
        narrative.push_str(&format!(" {connector} {}{relationship}.", event.effect_text));
    }
    narrative
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn event(id: u64, text: &str, relationship: Option<&str>) -> Event {
        Event {
            event_id: id,
            timestamp: Utc::now(),
            effect_text: text.to_string(),
            embedding: vec![],
            cause_id: None,
            causal_relationship: relationship.map(String::from),
        }
    }

    #[test]
    fn single_event_uses_initially_sentence() {
        let chain = vec![event(1, "User opened the application", None)];
        assert_eq!(narrate(&chain), "Initially, User opened the application.");
    }

    #[test]
    fn connectors_alternate_across_a_longer_chain() {
        let chain = vec![
            event(1, "a bug report was filed", None),
            event(2, "logs were inspected", Some("revealed an NPE")),
            event(3, "code was reviewed", Some("found a missing null check")),
            event(4, "a patch was written", None),
        ];
        let narrative = narrate(&chain);
        assert_eq!(
            narrative,
            "Initially, a bug report was filed. This led to logs were inspected (revealed an NPE). which in turn caused code was reviewed (found a missing null check). This led to a patch was written."
        );
    }
}
