//! Answer synthesis: bounded context assembly and generation orchestration.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::document::QueryResult;
use crate::error::Result;
use crate::generation::Generator;
use crate::retrieval::RetrievedContext;

/// Marker placed in the prompt when retrieval found nothing, so an empty
/// corpus produces a flagged "don't know" rather than an unflagged
/// question-only hallucination.
pub const NO_CONTEXT_MARKER: &str = "No relevant context was found for this question.";

/// Render the final prompt from a question and assembled context text.
///
/// Follows the classic retrieval-QA template: the model is told to say it
/// doesn't know rather than invent an answer.
pub fn render_prompt(question: &str, context_text: &str) -> String {
    format!(
        "Use the following pieces of context to answer the question at the end. \
         If you don't know the answer, just say that you don't know. \
         Don't try to make up an answer.\n\n\
         Context: {context_text}\n\n\
         Question: {question}\n\n\
         Answer:"
    )
}

/// The synthesized answer plus the sources that actually informed it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerResult {
    /// The generated answer text.
    pub answer_text: String,
    /// Source ids of exactly the chunks included in the prompt after
    /// truncation — never the full pre-truncation set.
    pub used_sources: Vec<String>,
}

/// The assembled context text plus the chunks that made the cut.
struct AssembledContext {
    text: String,
    used_sources: Vec<String>,
    included: usize,
    dropped: usize,
}

/// Orchestrates answer generation from retrieved context.
///
/// Concatenates context chunks in similarity order, each tagged with its
/// source, bounded by a maximum total length. When the bound would be
/// exceeded, the lowest-similarity chunks drop first — the context is
/// already similarity-ordered, so this is truncation from the tail.
pub struct AnswerSynthesizer {
    generator: Arc<dyn Generator>,
    max_context_chars: usize,
}

impl AnswerSynthesizer {
    /// Create a synthesizer with the given generator and context bound.
    pub fn new(generator: Arc<dyn Generator>, max_context_chars: usize) -> Self {
        Self { generator, max_context_chars }
    }

    /// Produce an answer for the question from the retrieved context.
    ///
    /// An empty context still calls the generator, with
    /// [`NO_CONTEXT_MARKER`] in place of context text, so the model is
    /// explicitly told nothing relevant was retrieved.
    pub async fn answer(
        &self,
        question: &str,
        context: &RetrievedContext,
    ) -> Result<AnswerResult> {
        let assembled = self.assemble(context.results());

        if assembled.included == 0 {
            warn!("answering with no retrieved context");
        } else {
            info!(
                included = assembled.included,
                dropped = assembled.dropped,
                context_chars = assembled.text.chars().count(),
                "assembled answer context"
            );
        }

        let answer_text = self.generator.generate(question, &assembled.text).await?;
        Ok(AnswerResult { answer_text, used_sources: assembled.used_sources })
    }

    /// Concatenate similarity-ordered chunks into bounded context text.
    ///
    /// Each chunk is tagged with its source metadata. Chunks that would push
    /// the text past `max_context_chars` are dropped, along with everything
    /// after them.
    fn assemble(&self, results: &[QueryResult]) -> AssembledContext {
        if results.is_empty() {
            return AssembledContext {
                text: NO_CONTEXT_MARKER.to_string(),
                used_sources: Vec::new(),
                included: 0,
                dropped: 0,
            };
        }

        let mut text = String::new();
        let mut used_sources = Vec::new();
        let mut included = 0;

        for result in results {
            let source_id = result.record.source_id().unwrap_or(&result.record.id);
            let title = result.record.metadata.get("title").map(String::as_str).unwrap_or("");
            let entry = format!("[source: {source_id} {title}]\n{}\n\n", result.record.content);

            if text.chars().count() + entry.chars().count() > self.max_context_chars {
                break;
            }

            text.push_str(&entry);
            included += 1;
            let source_id = source_id.to_string();
            if !used_sources.contains(&source_id) {
                used_sources.push(source_id);
            }
        }

        if included == 0 {
            // Even the best chunk alone exceeds the bound: include it
            // truncated rather than answering with nothing.
            let best = &results[0];
            let source_id = best.record.source_id().unwrap_or(&best.record.id).to_string();
            text = best.record.content.chars().take(self.max_context_chars).collect();
            used_sources.push(source_id);
            included = 1;
        }

        let dropped = results.len() - included;
        AssembledContext { text, used_sources, included, dropped }
    }
}
