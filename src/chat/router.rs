//! Per-message conversation dispatch.
//!
//! Every message ends in exactly one terminal branch and one log entry:
//! schedule confirmation, companionship, profile-based recommendation or a
//! lookup of a named program. Only the confirmation branch can fail before a
//! reply exists, and it logs nothing when it does.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::intent::{Classifier, Extractor, Intent, OracleClassifier, OracleExtractor};
use super::model::{ChatReply, ConversationLogEntry};
use super::prompts;
use crate::catalog::model::Program;
use crate::catalog::schedule::register_schedule;
use crate::error::{Error, Result};
use crate::llm::{REPLY_MAX_TOKENS, Oracle};
use crate::recommend::Recommender;
use crate::store::Database;

/// Messages that confirm the last recommendation.
pub const AFFIRMATIVES: [&str; 6] = ["예", "네", "등록", "등록할래요", "yes", "register"];

pub fn is_affirmative(message: &str) -> bool {
    let message = message.trim().to_lowercase();
    AFFIRMATIVES.contains(&message.as_str())
}

pub struct ConversationRouter {
    db: Arc<dyn Database>,
    oracle: Arc<dyn Oracle>,
    recommender: Arc<Recommender>,
    classifier: Arc<dyn Classifier>,
    extractor: Arc<dyn Extractor>,
}

impl ConversationRouter {
    /// Router with oracle-backed classification and extraction.
    pub fn new(
        db: Arc<dyn Database>,
        oracle: Arc<dyn Oracle>,
        recommender: Arc<Recommender>,
    ) -> Self {
        Self {
            classifier: Arc::new(OracleClassifier::new(oracle.clone())),
            extractor: Arc::new(OracleExtractor::new(oracle.clone())),
            db,
            oracle,
            recommender,
        }
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn Classifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn Extractor>) -> Self {
        self.extractor = extractor;
        self
    }

    /// Handle one inbound message and log the turn.
    pub async fn handle(&self, owner_id: &str, message: &str) -> Result<ChatReply> {
        let reply = if is_affirmative(message) {
            self.confirm_schedule(owner_id).await?
        } else {
            self.converse(owner_id, message).await?
        };

        let entry = ConversationLogEntry::new(
            owner_id,
            message,
            reply.text(),
            reply.recommended_program().map(str::to_string),
        );
        self.db.append_log(&entry).await?;
        info!(owner_id, branch = reply.kind(), "Chat turn handled");
        Ok(reply)
    }

    async fn confirm_schedule(&self, owner_id: &str) -> Result<ChatReply> {
        let name = self
            .db
            .last_recommended_program(owner_id)
            .await?
            .ok_or_else(|| Error::not_found("Recommended program", owner_id))?;

        let program = self
            .db
            .get_program_by_name(&name)
            .await?
            .ok_or_else(|| Error::not_found("Program", name.clone()))?;

        register_schedule(self.db.as_ref(), owner_id, &program).await?;
        Ok(ChatReply::ScheduleConfirmation {
            text: prompts::schedule_confirmation(&program.name),
            program: program.name,
        })
    }

    async fn converse(&self, owner_id: &str, message: &str) -> Result<ChatReply> {
        if let Some(name) = self.extractor.extract(message).await {
            debug!(owner_id, name = %name, "Program named in message");
            return self.lookup(&name).await;
        }

        match self.classifier.classify(message).await {
            Intent::Companion => {
                let text = self
                    .oracle
                    .generate_or_fallback(prompts::COMPANION_PERSONA, message, REPLY_MAX_TOKENS)
                    .await;
                Ok(ChatReply::AssistantAnswer { text })
            }
            Intent::Recommend => self.recommend(owner_id).await,
        }
    }

    async fn recommend(&self, owner_id: &str) -> Result<ChatReply> {
        let Some(profile) = self.db.latest_profile(owner_id).await? else {
            info!(owner_id, "Recommendation requested without a profile");
            return Ok(apology(prompts::NO_PROFILE_APOLOGY));
        };

        let catalog = self.db.list_programs().await?;
        match self.recommender.pick(&profile.tags, &catalog) {
            Some(program) => self.pitch(program, prompts::RECOMMEND_PITCH_PERSONA).await,
            None => {
                info!(owner_id, code = %profile.code, "No candidate program");
                Ok(apology(prompts::NO_MATCH_APOLOGY))
            }
        }
    }

    async fn lookup(&self, name: &str) -> Result<ChatReply> {
        let catalog = self.db.list_programs().await?;
        let matches = matching_programs(name, &catalog);

        match self.recommender.choose(&matches) {
            Some(program) => self.pitch(program, prompts::REQUESTED_PITCH_PERSONA).await,
            None => {
                debug!(name, "Requested program is not in the catalog");
                let text = self
                    .oracle
                    .generate_or_fallback(
                        prompts::NOT_OFFERED_PERSONA,
                        &prompts::not_offered_request(name),
                        REPLY_MAX_TOKENS,
                    )
                    .await;
                Ok(ChatReply::AssistantAnswer { text })
            }
        }
    }

    /// Pitch a catalog program. If the oracle fails the reply is the fallback
    /// apology and no program is recorded, so a later "예" cannot register
    /// something the user never saw.
    async fn pitch(&self, program: &Program, persona: &str) -> Result<ChatReply> {
        let center = self.db.get_center(program.center_id).await?;
        let brief = prompts::program_brief(program, center.as_ref());

        match self.oracle.generate(persona, &brief, REPLY_MAX_TOKENS).await {
            Ok(text) if !text.is_empty() => Ok(ChatReply::Recommendation {
                text,
                program: program.name.clone(),
            }),
            Ok(_) => {
                warn!(program = %program.name, "Empty pitch, using fallback");
                Ok(apology(crate::llm::FALLBACK_APOLOGY))
            }
            Err(e) => {
                warn!(program = %program.name, error = %e, "Pitch generation failed, using fallback");
                Ok(apology(crate::llm::FALLBACK_APOLOGY))
            }
        }
    }
}

fn apology(text: &str) -> ChatReply {
    ChatReply::AssistantAnswer {
        text: text.to_string(),
    }
}

/// Programs whose name contains `keyword` or is contained in it, ignoring
/// case. Blank names and keywords never match.
fn matching_programs<'a>(keyword: &str, catalog: &'a [Program]) -> Vec<&'a Program> {
    let keyword = keyword.trim().to_lowercase();
    if keyword.is_empty() {
        return Vec::new();
    }
    catalog
        .iter()
        .filter(|program| {
            let name = program.name.trim().to_lowercase();
            !name.is_empty() && (name.contains(&keyword) || keyword.contains(&name))
        })
        .collect()
}
