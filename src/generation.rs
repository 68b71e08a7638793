//! Generator trait for producing answers from question + context.

use async_trait::async_trait;

use crate::error::Result;

/// A generation model that produces a final answer from a question and the
/// assembled context text.
///
/// The context is already selected, ordered, and bounded by the
/// [`AnswerSynthesizer`](crate::AnswerSynthesizer); implementations only
/// render it into a completion.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generate an answer for the question given the assembled context text.
    async fn generate(&self, question: &str, context_text: &str) -> Result<String>;
}
