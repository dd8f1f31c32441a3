/// Public facade wiring the store, cache, candidate finder, linker, chain
/// traverser and narrator behind the two operations the rest of the system
/// calls: `add_event`/`add_events_batch` and `query`/`get_context`.
///
/// Grounded on `MemoryManager`'s shape: one struct owning the store and
/// cache plus collaborator handles, a constructor that replays durable
/// state at startup, `Result`-returning async methods, and tests living
/// beside the code using `tempfile`-style isolated paths.
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use crate::cache::EmbeddingCache;
use crate::candidates::find_candidates;
use crate::collaborators::{Embedder, Judge};
use crate::error::MemoryError;
use crate::linker::link_cause;
use crate::narrate::narrate;
use crate::schema::EventId;
use crate::store::EventStore;
use crate::traverse::{build_chain, find_anchor};

pub const NO_CONTEXT_SENTINEL: &str = "No relevant context found in memory.";
const MAX_EFFECT_TEXT_LEN: usize = 10_000;
const MAX_QUERY_TEXT_LEN: usize = 1_000;

#[derive(Debug, Clone)]
pub struct CausalMemoryConfig {
    pub similarity_threshold: f32,
    pub soft_link_threshold: f32,
    pub max_potential_causes: usize,
    pub time_decay_hours: i64,
    pub max_consequence_depth: usize,
    pub embedding_cache_size: usize,
    pub embedder_timeout: Duration,
    pub judge_timeout: Duration,
}

impl Default for CausalMemoryConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.5,
            soft_link_threshold: 0.85,
            max_potential_causes: 5,
            time_decay_hours: 24,
            max_consequence_depth: 2,
            embedding_cache_size: 1_000,
            embedder_timeout: Duration::from_secs(10),
            judge_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStats {
    pub total_events: usize,
    pub linked_events: usize,
    pub orphan_events: usize,
    pub chain_coverage: f32,
}

#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub errors: Vec<String>,
}

pub struct CausalMemory {
    store: Mutex<EventStore>,
    cache: Mutex<EmbeddingCache>,
    embedder: Arc<dyn Embedder>,
    judge: Arc<dyn Judge>,
    config: CausalMemoryConfig,
}

impl CausalMemory {
    pub fn open(
        db_path: impl AsRef<Path>,
        embedder: Arc<dyn Embedder>,
        judge: Arc<dyn Judge>,
        config: CausalMemoryConfig,
    ) -> Result<Self, MemoryError> {
        let store = EventStore::open(db_path).map_err(|e| MemoryError::Storage(e.to_string()))?;
        let cache = EmbeddingCache::new(config.embedding_cache_size);
        Ok(Self {
            store: Mutex::new(store),
            cache: Mutex::new(cache),
            embedder,
            judge,
            config,
        })
    }

    /// Validates, embeds, finds candidates, links a cause, and persists a
    /// new event. The store lock is held for the whole call so that a
    /// caller's later `add_event` always observes this one as a candidate —
    /// the ordering guarantee is a direct consequence of single-writer
    /// serialization, not a separate mechanism.
    pub async fn add_event(&self, effect_text: impl Into<String>) -> Result<EventId, MemoryError> {
        let effect_text = effect_text.into();
        validate_effect_text(&effect_text)?;

        let embedding = self.embed(&effect_text).await?;
        let store = self.store.lock().await;

        let now = chrono::Utc::now();
        let prior_events = store
            .recent_within(self.config.time_decay_hours, 10_000)
            .map_err(|e| MemoryError::Storage(e.to_string()))?;
        let candidates = find_candidates(
            &prior_events,
            &embedding,
            now,
            self.config.max_potential_causes,
            self.config.similarity_threshold,
            self.config.time_decay_hours,
        );
        let outcome = link_cause(
            self.judge.as_ref(),
            &effect_text,
            &candidates,
            self.config.soft_link_threshold,
            self.config.judge_timeout,
        )
        .await;

        let event = store
            .insert(
                effect_text,
                embedding,
                outcome.cause_id,
                outcome.causal_relationship,
            )
            .await
            .map_err(|e| MemoryError::Storage(e.to_string()))?;
        Ok(event.event_id)
    }

    /// Iterates `add_event` over `texts`, never aborting on a per-item
    /// failure. Logs progress every 100 items.
    pub async fn add_events_batch(&self, texts: Vec<String>) -> BatchOutcome {
        let total = texts.len();
        let mut successful = 0;
        let mut errors = Vec::new();

        for (i, text) in texts.into_iter().enumerate() {
            if i > 0 && i % 100 == 0 {
                tracing::info!(processed = i, total, "batch ingest progress");
            }
            match self.add_event(text).await {
                Ok(_) => successful += 1,
                Err(err) => errors.push(err.to_string()),
            }
        }

        BatchOutcome {
            total,
            successful,
            failed: total - successful,
            errors,
        }
    }

    /// Anchor search, backward then forward traversal, narration. Returns
    /// the canonical sentinel when no anchor clears the similarity bar.
    pub async fn query(&self, query_text: &str) -> Result<String, MemoryError> {
        validate_query_text(query_text)?;

        let embedding = self.embed(query_text).await?;
        let store = self.store.lock().await;

        let anchor = find_anchor(&store, &embedding, self.config.similarity_threshold)
            .map_err(|e| MemoryError::Storage(e.to_string()))?;
        let Some(anchor) = anchor else {
            return Ok(NO_CONTEXT_SENTINEL.to_string());
        };

        let chain = build_chain(&store, anchor, self.config.max_consequence_depth)
            .map_err(|e| MemoryError::Storage(e.to_string()))?;
        Ok(narrate(&chain))
    }

    /// Exact delegate to `query`, kept for interface compatibility.
    pub async fn get_context(&self, query_text: &str) -> Result<String, MemoryError> {
        self.query(query_text).await
    }

    pub async fn stats(&self) -> Result<MemoryStats, MemoryError> {
        let store = self.store.lock().await;
        let (total_events, linked_events) = store.all_for_scan().fold((0usize, 0usize), |(total, linked), e| {
            (total + 1, linked + e.cause_id.is_some() as usize)
        });
        let orphan_events = total_events - linked_events;
        let chain_coverage = if total_events == 0 {
            0.0
        } else {
            linked_events as f32 / total_events as f32
        };
        Ok(MemoryStats {
            total_events,
            linked_events,
            orphan_events,
            chain_coverage,
        })
    }

    /// No-op beyond the store's own fsync-on-write discipline; present for
    /// symmetry with the rest of this lineage's explicit-lifecycle facades
    /// and as the place a future buffered writer would flush from.
    pub async fn shutdown(&self) -> Result<(), MemoryError> {
        Ok(())
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, MemoryError> {
        if let Some(cached) = self.cache.lock().await.get(text) {
            return Ok(cached);
        }

        let embedding = tokio::time::timeout(self.config.embedder_timeout, self.embedder.embed(text))
            .await
            .map_err(|_| {
                MemoryError::ServiceUnavailable(format!(
                    "embedder timed out after {:?}",
                    self.config.embedder_timeout
                ))
            })?
            .map_err(|e| MemoryError::ServiceUnavailable(e.to_string()))?;

        self.cache.lock().await.put(text.to_string(), embedding.clone());
        Ok(embedding)
    }
}

fn validate_effect_text(text: &str) -> Result<(), MemoryError> {
    if text.trim().is_empty() {
        return Err(MemoryError::Validation(
            "effect_text must not be empty or whitespace".to_string(),
        ));
    }
    if text.len() > MAX_EFFECT_TEXT_LEN {
        return Err(MemoryError::Validation(format!(
            "effect_text must be at most {MAX_EFFECT_TEXT_LEN} characters"
        )));
    }
    Ok(())
}

fn validate_query_text(text: &str) -> Result<(), MemoryError> {
    if text.trim().is_empty() {
        return Err(MemoryError::Validation(
            "query must not be empty or whitespace".to_string(),
        ));
    }
    if text.len() > MAX_QUERY_TEXT_LEN {
        return Err(MemoryError::Validation(format!(
            "query must be at most {MAX_QUERY_TEXT_LEN} characters"
        )));
    }
    Ok(())
}
