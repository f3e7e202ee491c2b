//! Message classification and program-name extraction.
//!
//! Both are narrow interfaces; the oracle-backed implementations never fail
//! outward, an oracle error degrades to the conservative answer.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::prompts::{CLASSIFY_INTENT_PERSONA, EXTRACT_PROGRAM_PERSONA};
use crate::llm::{CLASSIFICATION_MAX_TOKENS, EXTRACTION_MAX_TOKENS, Oracle};

/// What a message without a program name is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Companion,
    Recommend,
}

#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, text: &str) -> Intent;
}

#[async_trait]
pub trait Extractor: Send + Sync {
    /// A short program name mentioned in `text`, if any.
    async fn extract(&self, text: &str) -> Option<String>;
}

/// Classifier asking the oracle for a one-word verdict.
pub struct OracleClassifier {
    oracle: Arc<dyn Oracle>,
}

impl OracleClassifier {
    pub fn new(oracle: Arc<dyn Oracle>) -> Self {
        Self { oracle }
    }
}

#[async_trait]
impl Classifier for OracleClassifier {
    async fn classify(&self, text: &str) -> Intent {
        match self
            .oracle
            .generate(CLASSIFY_INTENT_PERSONA, text, CLASSIFICATION_MAX_TOKENS)
            .await
        {
            Ok(answer) => parse_intent(&answer),
            Err(e) => {
                warn!(error = %e, "Intent classification failed, treating as companion");
                Intent::Companion
            }
        }
    }
}

/// Extractor asking the oracle for a one or two word name, or `None`.
pub struct OracleExtractor {
    oracle: Arc<dyn Oracle>,
}

impl OracleExtractor {
    pub fn new(oracle: Arc<dyn Oracle>) -> Self {
        Self { oracle }
    }
}

#[async_trait]
impl Extractor for OracleExtractor {
    async fn extract(&self, text: &str) -> Option<String> {
        match self
            .oracle
            .generate(EXTRACT_PROGRAM_PERSONA, text, EXTRACTION_MAX_TOKENS)
            .await
        {
            Ok(answer) => {
                let name = parse_program_name(&answer);
                debug!(raw = %answer, name = ?name, "Program name extracted");
                name
            }
            Err(e) => {
                warn!(error = %e, "Program name extraction failed, treating as none");
                None
            }
        }
    }
}

pub fn parse_intent(answer: &str) -> Intent {
    let answer = answer.to_lowercase();
    if answer.contains("말벗") || answer.contains("companion") {
        Intent::Companion
    } else {
        Intent::Recommend
    }
}

pub fn parse_program_name(answer: &str) -> Option<String> {
    if answer.to_lowercase().contains("none") {
        return None;
    }
    let name = answer
        .trim()
        .trim_end_matches(['.', '!', '?', ',', '。'])
        .trim_matches(|c: char| matches!(c, '\'' | '"' | '‘' | '’' | '“' | '”' | '`'))
        .trim();
    (!name.is_empty()).then(|| name.to_string())
}
