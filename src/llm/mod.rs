//! LLM integration for the care companion.
//!
//! `provider` holds the backend-agnostic chat completion types,
//! `openai` talks to any OpenAI-compatible endpoint, and `oracle` narrows
//! all of that down to the single text-generation capability the core uses.

pub mod openai;
pub mod oracle;
pub mod provider;

pub use openai::{OpenAiConfig, OpenAiProvider};
pub use oracle::{FALLBACK_APOLOGY, LlmOracle, Oracle, extract_json_object};
pub use provider::*;

use std::sync::Arc;

use crate::config::ServiceConfig;
use crate::error::LlmError;

/// Output budget for program-name extraction.
pub const EXTRACTION_MAX_TOKENS: u32 = 20;
/// Output budget for intent classification.
pub const CLASSIFICATION_MAX_TOKENS: u32 = 10;
/// Output budget for drift analysis.
pub const DRIFT_MAX_TOKENS: u32 = 200;
/// Output budget for program classification.
pub const TAGGING_MAX_TOKENS: u32 = 200;
/// Output budget for every free-text reply.
pub const REPLY_MAX_TOKENS: u32 = 200;

/// Create the oracle described by the service configuration.
pub fn create_oracle(config: &ServiceConfig) -> Result<Arc<dyn Oracle>, LlmError> {
    let provider = OpenAiProvider::new(OpenAiConfig {
        api_key: config.api_key.clone(),
        base_url: config.base_url.clone(),
        model: config.model.clone(),
        timeout: config.oracle_timeout,
    })?;
    tracing::info!("Using OpenAI-compatible oracle (model: {})", config.model);
    Ok(Arc::new(LlmOracle::new(Arc::new(provider))))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::Duration;

    use super::*;

    #[test]
    fn create_oracle_from_config() {
        let config = ServiceConfig {
            api_key: secrecy::SecretString::from("sk-test"),
            model: "gpt-4o".to_string(),
            base_url: "https://api.openai.com".to_string(),
            db_path: PathBuf::from(":memory:"),
            port: 0,
            reanalysis_days: 30,
            oracle_timeout: Duration::from_secs(5),
            catalog_seed: None,
            rng_seed: None,
            log_dir: None,
        };
        assert!(create_oracle(&config).is_ok());
    }
}
