//! Personality profiling — questionnaire scoring, stored profiles and
//! conversation-driven drift reanalysis.
//!
//! The four-letter code and the tag set derived from it are what the
//! recommender matches against program tags.

pub mod axes;
pub mod drift;
pub mod profile;
pub mod questionnaire;
pub mod scorer;
pub mod tags;

pub use axes::{Answer, Axis, Letter, PersonalityCode};
pub use drift::{DriftOutcome, DriftReanalyzer};
pub use profile::PersonalityProfile;
pub use questionnaire::{QUESTION_COUNT, QUESTIONS, Question};
pub use scorer::{ScoredProfile, score};
pub use tags::{TAG_VOCABULARY, TagSet, base_tags, is_known_tag, join_tags, parse_tag_list};

use tracing::info;

use crate::error::Result;
use crate::store::Database;

/// Score a questionnaire and store the result as the owner's current profile.
pub async fn onboard(
    db: &dyn Database,
    owner_id: &str,
    answers: &[Answer],
) -> Result<PersonalityProfile> {
    let scored = score(answers)?;
    let profile = PersonalityProfile::from_scored(owner_id, scored);
    db.insert_profile(&profile).await?;
    info!(owner_id, code = %profile.code, tags = profile.tags.len(), "Onboarding profile stored");
    Ok(profile)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::store::LibSqlBackend;

    #[tokio::test]
    async fn onboard_persists_current_profile() {
        let db = LibSqlBackend::new_memory().await.unwrap();
        let answers = [Answer::B; 13];
        let profile = onboard(&db, "u1", &answers).await.unwrap();

        let stored = db.latest_profile("u1").await.unwrap().unwrap();
        assert_eq!(stored.code, profile.code);
        assert_eq!(stored.tags, profile.tags);
    }

    #[tokio::test]
    async fn onboard_rejects_short_input_without_writing() {
        let db = LibSqlBackend::new_memory().await.unwrap();
        let err = onboard(&db, "u1", &[Answer::A; 10]).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(db.latest_profile("u1").await.unwrap().is_none());
    }
}
