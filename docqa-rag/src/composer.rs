//! Grounded prompt assembly and answer generation.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info};

use crate::document::{Answer, RetrievalResult, Source};
use crate::error::Result;
use crate::generation::GenerationProvider;
use crate::message::{ChatMessage, normalize_turns};
use crate::upstream::with_deadline;

/// Fixed reply used when there is no retrieved context to ground an answer.
pub const NO_DOCUMENT_ANSWER: &str =
    "No document has been indexed yet. Please upload a document and try again.";

const GROUNDING_INSTRUCTION: &str = "Answer the question using only the context above. \
If the context does not contain the answer, say that you do not know.";

/// Build the grounded prompt for `query`.
///
/// Segment texts appear in retrieval order separated by blank lines, followed
/// by the grounding instruction and the question.
pub fn build_prompt(query: &str, hits: &RetrievalResult) -> String {
    let context: Vec<&str> = hits.iter().map(|hit| hit.segment.text.as_str()).collect();
    format!("{}\n\n{GROUNDING_INSTRUCTION}\n\nQuestion: {query}", context.join("\n\n"))
}

/// Turns retrieved segments into an answer via a [`GenerationProvider`].
pub struct AnswerComposer {
    generator: Arc<dyn GenerationProvider>,
    system_prompt: Option<String>,
    timeout: Option<Duration>,
}

impl AnswerComposer {
    /// Create a composer that delegates to `generator`.
    pub fn new(generator: Arc<dyn GenerationProvider>) -> Self {
        Self { generator, system_prompt: None, timeout: None }
    }

    /// Send `prompt` as a system turn ahead of every grounded prompt.
    pub fn with_system_prompt(mut self, prompt: Option<String>) -> Self {
        self.system_prompt = prompt;
        self
    }

    /// Bound each generation call.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Answer `query` from `hits`.
    ///
    /// The model's text is returned unmodified. With no hits the model is not
    /// called and [`NO_DOCUMENT_ANSWER`] is returned instead.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Generation`](crate::RagError::Generation) or
    /// [`RagError::UpstreamTimeout`](crate::RagError::UpstreamTimeout).
    pub async fn compose(&self, query: &str, hits: &RetrievalResult) -> Result<Answer> {
        if hits.is_empty() {
            info!("no context retrieved, returning fixed answer");
            return Ok(Answer { answer: NO_DOCUMENT_ANSWER.to_string(), sources: Vec::new() });
        }

        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &self.system_prompt {
            messages.push(ChatMessage::System(system.clone()));
        }
        messages.push(ChatMessage::User(build_prompt(query, hits)));
        let messages = normalize_turns(&messages);

        debug!(
            provider = self.generator.name(),
            context_segments = hits.len(),
            "generating answer"
        );
        let answer =
            with_deadline("generation", self.timeout, self.generator.generate(&messages))
                .await
                .inspect_err(|e| error!(error = %e, "generation failed"))?;

        Ok(Answer { answer, sources: hits.iter().map(Source::from).collect() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{RetrievedSegment, Segment};

    fn hit(text: &str, distance: f32) -> RetrievedSegment {
        RetrievedSegment {
            segment: Segment {
                document_id: "doc".into(),
                sequence: 0,
                start: 0,
                end: text.chars().count(),
                text: text.into(),
                source: None,
            },
            distance,
        }
    }

    #[test]
    fn prompt_keeps_retrieval_order_and_blank_line_separators() {
        let hits = vec![hit("closest", 0.1), hit("runner up", 0.4)];
        let prompt = build_prompt("what?", &hits);
        assert!(prompt.starts_with("closest\n\nrunner up\n\n"));
        assert!(prompt.contains("using only the context above"));
        assert!(prompt.ends_with("Question: what?"));
    }
}
