//! Completion Gateway — one completion call per target review.

use tracing::{info, warn};

use crate::generation::prompts::build_prompt;
use crate::llm_client::{Completion, LlmError};
use crate::models::review::{Draft, ExamplePair};

/// Drafts a response for `target_review`. Never fails: an error from the
/// completion backend is returned as display text so it shows inline.
pub async fn generate(
    completion: &dyn Completion,
    examples: &[ExamplePair],
    target_review: &str,
) -> String {
    draft_response(completion, examples, target_review)
        .await
        .unwrap_or_else(|e| failure_placeholder(&e))
}

/// Fills every draft in order, one call at a time. Returns how many calls failed.
pub async fn generate_batch(
    completion: &dyn Completion,
    examples: &[ExamplePair],
    drafts: &mut [Draft],
) -> usize {
    let mut failures = 0;
    for draft in drafts.iter_mut() {
        let response = match draft_response(completion, examples, &draft.review.text).await {
            Ok(text) => text,
            Err(e) => {
                failures += 1;
                failure_placeholder(&e)
            }
        };
        draft.response = Some(response);
    }

    info!(
        "Generated {} drafts ({} failed) with {} examples",
        drafts.len(),
        failures,
        examples.len()
    );
    failures
}

pub fn failure_placeholder(error: &LlmError) -> String {
    format!("An error occurred: {error}")
}

async fn draft_response(
    completion: &dyn Completion,
    examples: &[ExamplePair],
    target_review: &str,
) -> Result<String, LlmError> {
    let prompt = build_prompt(examples, target_review);
    completion.complete(&prompt).await.map_err(|e| {
        warn!("Completion failed: {e}");
        e
    })
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::llm_client::{Completion, LlmError};

    /// Records prompts and answers from a script; `Err` entries fail that call.
    /// Once the script is exhausted every call answers "reply N".
    #[derive(Default)]
    pub struct ScriptedCompletion {
        script: Mutex<Vec<Result<String, u16>>>,
        pub prompts: Mutex<Vec<String>>,
    }

    impl ScriptedCompletion {
        pub fn new(script: Vec<Result<&str, u16>>) -> Self {
            let mut script: Vec<_> = script.into_iter().map(|r| r.map(str::to_string)).collect();
            script.reverse();
            Self {
                script: Mutex::new(script),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Completion for ScriptedCompletion {
        async fn complete(&self, system: &str) -> Result<String, LlmError> {
            let call = {
                let mut prompts = self.prompts.lock().unwrap();
                prompts.push(system.to_string());
                prompts.len()
            };
            match self.script.lock().unwrap().pop() {
                Some(Ok(text)) => Ok(text),
                Some(Err(status)) => Err(LlmError::Api {
                    status,
                    message: "Incorrect API key provided".to_string(),
                }),
                None => Ok(format!("reply {call}")),
            }
        }
    }

    /// Answers "slow reply" after `delay`; used to interrupt a batch midway.
    pub struct SlowCompletion {
        delay: Duration,
    }

    impl SlowCompletion {
        pub fn new(delay: Duration) -> Self {
            Self { delay }
        }
    }

    #[async_trait]
    impl Completion for SlowCompletion {
        async fn complete(&self, _system: &str) -> Result<String, LlmError> {
            tokio::time::sleep(self.delay).await;
            Ok("slow reply".to_string())
        }
    }
}
