//! The text-generation oracle as consumed by the core.
//!
//! Everything above this layer sees a single capability:
//! `(persona_prompt, user_text, max_output_tokens) -> text`.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::LlmError;
use crate::llm::provider::{ChatMessage, CompletionRequest, LlmProvider};

/// Reply used whenever a non-mutating oracle call fails.
pub const FALLBACK_APOLOGY: &str = "죄송합니다. 다시 말씀해 주세요.";

/// Sampling temperature for every oracle call.
const ORACLE_TEMPERATURE: f32 = 0.7;

/// Opaque text-generation capability.
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Generate text for `user_text` under `persona_prompt`.
    async fn generate(
        &self,
        persona_prompt: &str,
        user_text: &str,
        max_output_tokens: u32,
    ) -> Result<String, LlmError>;

    /// Like [`Oracle::generate`], but degrades to [`FALLBACK_APOLOGY`] on
    /// failure or empty output. Only for paths that write nothing based on
    /// the answer.
    async fn generate_or_fallback(
        &self,
        persona_prompt: &str,
        user_text: &str,
        max_output_tokens: u32,
    ) -> String {
        match self
            .generate(persona_prompt, user_text, max_output_tokens)
            .await
        {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => {
                warn!("Oracle returned empty output, using fallback apology");
                FALLBACK_APOLOGY.to_string()
            }
            Err(e) => {
                warn!(error = %e, "Oracle call failed, using fallback apology");
                FALLBACK_APOLOGY.to_string()
            }
        }
    }
}

/// [`Oracle`] backed by a chat completion provider.
pub struct LlmOracle {
    llm: Arc<dyn LlmProvider>,
}

impl LlmOracle {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl Oracle for LlmOracle {
    async fn generate(
        &self,
        persona_prompt: &str,
        user_text: &str,
        max_output_tokens: u32,
    ) -> Result<String, LlmError> {
        let request = CompletionRequest::new(vec![
            ChatMessage::system(persona_prompt),
            ChatMessage::user(user_text),
        ])
        .with_temperature(ORACLE_TEMPERATURE)
        .with_max_tokens(max_output_tokens);

        let response = self.llm.complete(request).await?;
        debug!(
            model = self.llm.model_name(),
            input_tokens = response.input_tokens,
            output_tokens = response.output_tokens,
            finish_reason = ?response.finish_reason,
            "Oracle call complete"
        );
        Ok(response.content.trim().to_string())
    }
}

/// Find the first balanced `{...}` in `text` that parses as a JSON object.
///
/// Brace matching is string-aware, so braces inside quoted values do not
/// end the object early. Candidates that balance but fail to parse are
/// skipped and the scan resumes at the next `{`.
pub fn extract_json_object(text: &str) -> Option<Map<String, Value>> {
    let bytes = text.as_bytes();
    let mut start = 0;
    while let Some(offset) = text[start..].find('{') {
        let open = start + offset;
        if let Some(close) = balanced_end(bytes, open)
            && let Ok(Value::Object(map)) = serde_json::from_str(&text[open..=close])
        {
            return Some(map);
        }
        start = open + 1;
    }
    None
}

/// Index of the `}` closing the brace at `open`, if any.
fn balanced_end(bytes: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, &b) in bytes.iter().enumerate().skip(open) {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted oracle shared by unit tests.

    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;

    /// One recorded oracle invocation.
    #[derive(Debug, Clone)]
    pub struct OracleCall {
        pub persona_prompt: String,
        pub user_text: String,
        pub max_output_tokens: u32,
    }

    /// Replays queued answers in order and records every call.
    ///
    /// An exhausted script answers with `RequestFailed`.
    #[derive(Default)]
    pub struct ScriptedOracle {
        script: Mutex<VecDeque<Result<String, LlmError>>>,
        calls: Mutex<Vec<OracleCall>>,
    }

    impl ScriptedOracle {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn answering<I, S>(answers: I) -> Self
        where
            I: IntoIterator<Item = S>,
            S: Into<String>,
        {
            let oracle = Self::new();
            for answer in answers {
                oracle.push_ok(answer);
            }
            oracle
        }

        pub fn push_ok(&self, answer: impl Into<String>) {
            self.script.lock().unwrap().push_back(Ok(answer.into()));
        }

        pub fn push_err(&self) {
            self.script.lock().unwrap().push_back(Err(failure()));
        }

        pub fn calls(&self) -> Vec<OracleCall> {
            self.calls.lock().unwrap().clone()
        }
    }

    fn failure() -> LlmError {
        LlmError::RequestFailed {
            provider: "scripted".into(),
            reason: "scripted failure".into(),
        }
    }

    #[async_trait]
    impl Oracle for ScriptedOracle {
        async fn generate(
            &self,
            persona_prompt: &str,
            user_text: &str,
            max_output_tokens: u32,
        ) -> Result<String, LlmError> {
            self.calls.lock().unwrap().push(OracleCall {
                persona_prompt: persona_prompt.to_string(),
                user_text: user_text.to_string(),
                max_output_tokens,
            });
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(failure()))
        }
    }
}
