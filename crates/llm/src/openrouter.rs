/// OpenRouter-backed `Judge`, grounded on the teacher's `OpenRouterClient`
/// chat-completion shape.
use std::time::Duration;

use async_trait::async_trait;
use causal_memory_core::Judge;
use serde_json::json;

use crate::prompt::build_judge_prompt;

const ENDPOINT: &str = "https://openrouter.ai/api/v1/chat/completions";

pub struct OpenRouterJudge {
    client: reqwest::Client,
    model: String,
    temperature: f32,
    api_key: String,
    timeout: Duration,
}

impl OpenRouterJudge {
    /// `timeout` should be `AppConfig::judge_timeout()` — see the matching
    /// note on `OllamaJudge::new`.
    pub fn new(
        model: impl Into<String>,
        temperature: f32,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            model: model.into(),
            temperature,
            api_key: api_key.into(),
            timeout,
        }
    }
}

#[async_trait]
impl Judge for OpenRouterJudge {
    async fn judge(&self, cause_text: &str, effect_text: &str) -> Option<String> {
        let payload = json!({
            "model": self.model,
            "temperature": self.temperature,
            "messages": [
                { "role": "user", "content": build_judge_prompt(cause_text, effect_text) }
            ],
        });

        let response = self
            .client
            .post(ENDPOINT)
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .json(&payload)
            .send()
            .await
            .ok()?;
        if !response.status().is_success() {
            return None;
        }
        let body: serde_json::Value = response.json().await.ok()?;
        body.get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|v| v.as_str())
            .map(str::to_string)
    }
}
