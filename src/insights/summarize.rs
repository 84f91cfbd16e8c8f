use std::sync::Arc;
use tracing::{info, instrument};

use crate::insights::provider::{GenerationError, TextGenerator};
use crate::insights::retry::{RetryPolicy, with_retry};

/// Input budget for the provider, in characters.
pub const PROMPT_BUDGET_CHARS: usize = 4000;

/// Cut `text` to at most `budget` characters.
///
/// When a sentence end falls within the last 20% of the budget the cut is
/// made just after it instead of mid-sentence.
pub fn truncate_for_prompt(text: &str, budget: usize) -> &str {
    let Some((cut, _)) = text.char_indices().nth(budget) else {
        return text;
    };
    let head = &text[..cut];

    if let Some(end) = head.rfind(['.', '!', '?']) {
        let chars_before = head[..end].chars().count();
        if chars_before * 5 > budget * 4 {
            return &head[..=end];
        }
    }
    head
}

pub fn summary_prompt(text: &str) -> String {
    format!(
        "Please provide a concise summary of the following text in 3-4 sentences:\n\n{}",
        text
    )
}

/// Produces summaries through a retried provider call.
#[derive(Clone)]
pub struct Summarizer {
    generator: Arc<dyn TextGenerator>,
    policy: RetryPolicy,
}

impl Summarizer {
    pub fn new(generator: Arc<dyn TextGenerator>, policy: RetryPolicy) -> Self {
        Self { generator, policy }
    }

    #[instrument(skip_all, fields(chars = text.len()))]
    pub async fn summarize(&self, text: &str) -> Result<String, GenerationError> {
        let prompt = summary_prompt(truncate_for_prompt(text, PROMPT_BUDGET_CHARS));
        let prompt = prompt.as_str();
        let generator = &self.generator;

        let summary = with_retry(&self.policy, move || generator.generate(prompt))
            .await
            .map_err(|exhausted| GenerationError::Exhausted {
                attempts: exhausted.attempts,
                last: Box::new(exhausted.last),
            })?;

        info!(summary_chars = summary.len(), "summary generated");
        Ok(summary)
    }
}
