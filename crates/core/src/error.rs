use thiserror::Error;

/// Closed error taxonomy surfaced by the facade. Transport adapters map each
/// variant onto a status code or protocol error payload of their own.
#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("{0}")]
    Validation(String),

    #[error("embedder unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("event store failure: {0}")]
    Storage(String),

    #[error("event {0} not found")]
    NotFound(u64),

    #[error("internal error: {0}")]
    Internal(String),
}
