use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: "causal_memory.db".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollaboratorConfig {
    pub embedding_model: String,
    pub llm_model: String,
    pub llm_temperature: f32,
    pub embedder_timeout_secs: u64,
    pub judge_timeout_secs: u64,
    pub openrouter_api_key: Option<String>,
}

impl Default for CollaboratorConfig {
    fn default() -> Self {
        Self {
            embedding_model: "all-MiniLM-L6-v2".to_string(),
            llm_model: "gpt-3.5-turbo".to_string(),
            llm_temperature: 0.1,
            embedder_timeout_secs: 10,
            judge_timeout_secs: 10,
            openrouter_api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub similarity_threshold: f32,
    pub soft_link_threshold: f32,
    pub max_potential_causes: usize,
    pub time_decay_hours: i64,
    pub max_consequence_depth: usize,
    pub embedding_cache_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.5,
            soft_link_threshold: 0.85,
            max_potential_causes: 5,
            time_decay_hours: 24,
            max_consequence_depth: 2,
            embedding_cache_size: 1_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub api_key: Option<String>,
    pub port: Option<u16>,
    pub cors_origins: String,
    pub rate_limit_events_per_min: u32,
    pub rate_limit_query_per_min: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            port: None,
            cors_origins: "*".to_string(),
            rate_limit_events_per_min: 60,
            rate_limit_query_per_min: 120,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub collaborators: CollaboratorConfig,
    pub engine: EngineConfig,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
}

fn env_value<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.parse().ok())
}

impl AppConfig {
    /// Loads defaults, layers a TOML file over them if present, then layers
    /// environment variables over the result — the recognized-options table
    /// this service documents is expressed primarily as env vars.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let mut config = Self::default();
        if let Ok(raw) = fs::read_to_string(path) {
            config = toml::from_str(&raw)?;
        }
        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = env::var("DB_PATH") {
            self.storage.db_path = v;
        }
        if let Ok(v) = env::var("EMBEDDING_MODEL") {
            self.collaborators.embedding_model = v;
        }
        if let Ok(v) = env::var("LLM_MODEL") {
            self.collaborators.llm_model = v;
        }
        if let Some(v) = env_value("LLM_TEMPERATURE") {
            self.collaborators.llm_temperature = v;
        }
        if let Some(v) = env_value("EMBEDDER_TIMEOUT_SECS") {
            self.collaborators.embedder_timeout_secs = v;
        }
        if let Some(v) = env_value("JUDGE_TIMEOUT_SECS") {
            self.collaborators.judge_timeout_secs = v;
        }
        if let Ok(v) = env::var("OPENROUTER_API_KEY") {
            self.collaborators.openrouter_api_key = Some(v);
        }
        if let Some(v) = env_value("SIMILARITY_THRESHOLD") {
            self.engine.similarity_threshold = v;
        }
        if let Some(v) = env_value("SOFT_LINK_THRESHOLD") {
            self.engine.soft_link_threshold = v;
        }
        if let Some(v) = env_value("MAX_POTENTIAL_CAUSES") {
            self.engine.max_potential_causes = v;
        }
        if let Some(v) = env_value("TIME_DECAY_HOURS") {
            self.engine.time_decay_hours = v;
        }
        if let Some(v) = env_value("MAX_CONSEQUENCE_DEPTH") {
            self.engine.max_consequence_depth = v;
        }
        if let Some(v) = env_value("EMBEDDING_CACHE_SIZE") {
            self.engine.embedding_cache_size = v;
        }
        if let Ok(v) = env::var("API_KEY") {
            self.server.api_key = Some(v);
        }
        if let Some(v) = env_value("PORT") {
            self.server.port = Some(v);
        }
        if let Ok(v) = env::var("CORS_ORIGINS") {
            self.server.cors_origins = v;
        }
        if let Some(v) = env_value("RATE_LIMIT_EVENTS_PER_MIN") {
            self.server.rate_limit_events_per_min = v;
        }
        if let Some(v) = env_value("RATE_LIMIT_QUERY_PER_MIN") {
            self.server.rate_limit_query_per_min = v;
        }
        if let Ok(v) = env::var("RUST_LOG") {
            self.telemetry.log_level = v;
        }
    }

    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }
        let rendered = toml::to_string_pretty(self)?;
        fs::write(path, rendered)?;
        Ok(())
    }

    pub fn embedder_timeout(&self) -> Duration {
        Duration::from_secs(self.collaborators.embedder_timeout_secs)
    }

    pub fn judge_timeout(&self) -> Duration {
        Duration::from_secs(self.collaborators.judge_timeout_secs)
    }

    pub fn cors_origins_list(&self) -> Vec<String> {
        self.server
            .cors_origins
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = AppConfig::default();
        assert_eq!(config.storage.db_path, "causal_memory.db");
        assert_eq!(config.engine.similarity_threshold, 0.5);
        assert_eq!(config.engine.soft_link_threshold, 0.85);
        assert_eq!(config.engine.max_potential_causes, 5);
        assert_eq!(config.engine.time_decay_hours, 24);
        assert_eq!(config.engine.max_consequence_depth, 2);
        assert_eq!(config.server.cors_origins, "*");
        assert_eq!(config.server.rate_limit_events_per_min, 60);
        assert_eq!(config.server.rate_limit_query_per_min, 120);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = AppConfig::load_from("/nonexistent/path/config.toml").unwrap();
        assert_eq!(config.storage.db_path, "causal_memory.db");
    }

    #[test]
    fn cors_origins_list_splits_and_trims() {
        let mut config = AppConfig::default();
        config.server.cors_origins = "https://a.example, https://b.example".to_string();
        assert_eq!(
            config.cors_origins_list(),
            vec!["https://a.example", "https://b.example"]
        );
    }

    #[test]
    fn save_then_load_round_trips_through_a_real_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = AppConfig::default();
        config.storage.db_path = "custom.db".to_string();
        config.engine.similarity_threshold = 0.7;
        config.save_to(&path).unwrap();

        let loaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(loaded.storage.db_path, "custom.db");
        assert_eq!(loaded.engine.similarity_threshold, 0.7);
    }
}
