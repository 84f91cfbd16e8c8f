use async_trait::async_trait;
use distill::insights::{GenerationError, TextGenerator};
use distill::pipeline::{ContentResult, Orchestrator};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

/// Answers prompts from a script; once the script runs out every call succeeds
/// with `fallback`.
#[derive(Clone)]
pub struct ScriptedGenerator {
    script: Arc<Mutex<VecDeque<Result<String, String>>>>,
    prompts: Arc<Mutex<Vec<String>>>,
    fallback: String,
}

impl ScriptedGenerator {
    pub fn succeeding(summary: &str) -> Self {
        Self {
            script: Arc::default(),
            prompts: Arc::default(),
            fallback: summary.to_string(),
        }
    }

    pub fn failing_first(self, failures: usize) -> Self {
        {
            let mut script = self.script.lock().unwrap();
            for n in 0..failures {
                script.push_back(Err(format!("scripted failure {}", n + 1)));
            }
        }
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Err(message)) => Err(GenerationError::Request(message)),
            Some(Ok(text)) => Ok(text),
            None => Ok(self.fallback.clone()),
        }
    }
}

pub async fn wait_terminal(orchestrator: &Orchestrator, id: Uuid) -> ContentResult {
    for _ in 0..1000 {
        let result = orchestrator.get_result(id).await.unwrap();
        if result.status.is_terminal() {
            return result;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("item {id} never reached a terminal state");
}
