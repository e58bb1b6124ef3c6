pub mod anthropic;

use crate::domain::error::Result;
use async_trait::async_trait;

pub use anthropic::AnthropicClient;

/// Seam between the pipeline and the language-model provider. The pipeline
/// only ever sees opaque text back; trust is established later by the
/// statement policy, never here.
#[async_trait]
pub trait LlmClient {
    async fn generate(&self, system: &str, user: &str) -> Result<String>;
}
