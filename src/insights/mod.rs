pub mod keywords;
pub mod provider;
pub mod retry;
pub mod summarize;

pub use keywords::{MAX_KEYWORDS, extract_keywords};
pub use provider::{GeminiClient, GenerationError, TextGenerator};
pub use retry::{RetriesExhausted, RetryPolicy, backoff_delay, with_retry};
pub use summarize::{PROMPT_BUDGET_CHARS, Summarizer, truncate_for_prompt};

use std::sync::Arc;
use tracing::{instrument, warn};

use crate::entities::Insights;

/// Produces the summary and keywords for a piece of text.
#[derive(Clone)]
pub struct InsightGenerator {
    summarizer: Summarizer,
}

impl InsightGenerator {
    pub fn new(generator: Arc<dyn TextGenerator>, policy: RetryPolicy) -> Self {
        Self {
            summarizer: Summarizer::new(generator, policy),
        }
    }

    /// Both halves run concurrently. A summary failure fails the whole call
    /// and the keywords are discarded.
    #[instrument(skip_all, fields(chars = text.len()))]
    pub async fn generate(&self, text: &str) -> Result<Insights, GenerationError> {
        let (summary, keywords) = tokio::join!(self.summarizer.summarize(text), async {
            extract_keywords(text)
        });

        match summary {
            Ok(summary) => Ok(Insights { summary, keywords }),
            Err(err) => {
                warn!(error = %err, discarded_keywords = keywords.len(), "summary failed");
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::time::Duration;

    struct Fixed(Result<&'static str, &'static str>);

    #[async_trait]
    impl TextGenerator for Fixed {
        async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
            self.0
                .map(str::to_string)
                .map_err(|e| GenerationError::Request(e.to_string()))
        }
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 2,
            backoff_unit: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn combines_summary_and_keywords() {
        let generator = InsightGenerator::new(Arc::new(Fixed(Ok("Lighthouses."))), fast_policy());
        let insights = generator
            .generate("Lighthouse keepers kept lighthouse lamps burning.")
            .await
            .unwrap();
        assert_eq!(insights.summary, "Lighthouses.");
        assert_eq!(insights.keywords[0], "lighthouse");
    }

    #[tokio::test]
    async fn summary_failure_fails_the_whole_call() {
        let generator = InsightGenerator::new(Arc::new(Fixed(Err("quota"))), fast_policy());
        let err = generator
            .generate("Plenty of keywords available in this sentence.")
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::Exhausted { attempts: 2, .. }));
    }
}
