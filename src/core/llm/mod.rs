pub mod providers;

use anyhow::Result;
use async_trait::async_trait;

/// Quality/latency tradeoff for a generation call. `Standard` covers plain
/// reformatting; `Thorough` is used when expanding a selected idea into a
/// full article.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationEffort {
    Standard,
    Thorough,
}

/// A pluggable text-generation backend. Implementations must return plain
/// text or an explicit error; provider-internal representations never cross
/// this boundary.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// The model identifier the backend bills against, recorded in message metadata.
    fn model_id(&self) -> &str;

    /// Execute one generation call: system-level `instructions` plus a
    /// pre-assembled `input` payload.
    async fn generate(
        &self,
        instructions: &str,
        input: &str,
        effort: GenerationEffort,
    ) -> Result<String>;
}
