use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Process-assigned, monotonically increasing, dense identifier.
pub type EventId = u64;

/// A single recorded observation, linked to at most one direct cause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub event_id: EventId,
    pub timestamp: DateTime<Utc>,
    pub effect_text: String,
    pub embedding: Vec<f32>,
    /// The direct cause, if one was linked. Always refers to a strictly
    /// smaller `event_id` with a timestamp no later than this event's.
    pub cause_id: Option<EventId>,
    pub causal_relationship: Option<String>,
}
