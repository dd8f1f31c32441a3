pub mod cache;
pub mod candidates;
pub mod collaborators;
pub mod error;
pub mod event_log;
pub mod facade;
pub mod linker;
pub mod narrate;
pub mod schema;
pub mod store;
pub mod testing;
pub mod traverse;

pub use cache::EmbeddingCache;
pub use candidates::{cosine_similarity, find_candidates, Candidate};
pub use collaborators::{Embedder, Judge};
pub use error::MemoryError;
pub use facade::{BatchOutcome, CausalMemory, CausalMemoryConfig, MemoryStats, NO_CONTEXT_SENTINEL};
pub use linker::link_cause;
pub use narrate::narrate;
pub use schema::{Event, EventId};
pub use store::EventStore;
pub use traverse::{build_chain, find_anchor};
