/// Deterministic collaborator stand-ins for tests, in this crate and in
/// downstream crates (transport integration tests in particular).
use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::collaborators::{Embedder, Judge};

/// Hash-derived embedding: identical text always maps to the same vector,
/// without depending on a real model.
pub struct NullEmbedder {
    pub dimension: usize,
}

impl NullEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

#[async_trait]
impl Embedder for NullEmbedder {
    async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        Ok(deterministic_embedding(text, self.dimension))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

fn deterministic_embedding(text: &str, dimension: usize) -> Vec<f32> {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    (0..dimension)
        .map(|i| {
            let byte = digest[i % digest.len()];
            (byte as f32 / 255.0) * 2.0 - 1.0
        })
        .collect()
}

/// Always answers "no link" — used where the Judge is absent or unreachable.
pub struct NullJudge;

#[async_trait]
impl Judge for NullJudge {
    async fn judge(&self, _cause_text: &str, _effect_text: &str) -> Option<String> {
        None
    }
}

/// Returns a pre-scripted sequence of responses, one per call, in order.
pub struct ScriptedJudge {
    responses: Mutex<VecDeque<Option<String>>>,
}

impl ScriptedJudge {
    pub fn new(responses: Vec<Option<String>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
        }
    }
}

#[async_trait]
impl Judge for ScriptedJudge {
    async fn judge(&self, _cause_text: &str, _effect_text: &str) -> Option<String> {
        self.responses.lock().unwrap().pop_front().flatten()
    }
}
