/// Capability traits for the two external collaborators the engine depends
/// on. Concrete HTTP-backed implementations live in `causal-memory-llm`;
/// deterministic stand-ins for tests live in `testing.rs`.
use async_trait::async_trait;

#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>>;
    fn dimension(&self) -> usize;
}

#[async_trait]
pub trait Judge: Send + Sync {
    /// Returns `Some(phrase)` describing why `cause_text` causes
    /// `effect_text`, or `None` if the judge sees no relationship (or
    /// failed — judge failures are absorbed by the caller, never an error).
    async fn judge(&self, cause_text: &str, effect_text: &str) -> Option<String>;
}
