//! Generation provider trait for producing answers from chat turns.

use async_trait::async_trait;

use crate::error::Result;
use crate::message::ChatMessage;

/// A hosted language model that turns a conversation into a reply.
///
/// Implementations report backend failures (including non-2xx responses) as
/// [`RagError::Generation`](crate::RagError::Generation). Retry policy, if
/// any, belongs to the implementation's own client.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Generate the next assistant reply for `messages`.
    async fn generate(&self, messages: &[ChatMessage]) -> Result<String>;

    /// Short name used in logs and error messages.
    fn name(&self) -> &str {
        "generation"
    }
}
