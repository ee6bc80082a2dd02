use anyhow::Result;
use async_trait::async_trait;

pub type CompletionBox = Box<dyn Completion + Send + Sync>;

/// Single-shot request/response generation collaborator. No streaming.
#[async_trait]
pub trait Completion {
    /// Used at startup to verify the collaborator is reachable before
    /// accepting prompts.
    async fn health_check(&self) -> Result<()>;

    /// Sends free text and returns the generated response.
    async fn generate(&self, text: &str) -> Result<String>;
}
