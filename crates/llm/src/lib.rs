pub mod ollama;
pub mod openrouter;
pub mod prompt;

pub use ollama::{OllamaEmbedder, OllamaJudge};
pub use openrouter::OpenRouterJudge;
pub use prompt::build_judge_prompt;
