//! Persisted personality profile.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::axes::{Axis, PersonalityCode};
use super::scorer::ScoredProfile;
use super::tags::{TagSet, base_tags};

/// One profile row. The newest row per owner is the current profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersonalityProfile {
    pub id: Uuid,
    pub owner_id: String,
    pub code: PersonalityCode,
    /// Base ∪ onboarding tags.
    pub tags: TagSet,
    /// Tags from questions 11–13. `None` for rows written before they were
    /// stored separately.
    #[serde(skip)]
    pub onboarding_tags: Option<TagSet>,
    pub created_at: DateTime<Utc>,
}

impl PersonalityProfile {
    /// Profile for a freshly scored questionnaire.
    pub fn from_scored(owner_id: impl Into<String>, scored: ScoredProfile) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id: owner_id.into(),
            code: scored.code,
            tags: scored.tags,
            onboarding_tags: Some(scored.onboarding_tags),
            created_at: Utc::now(),
        }
    }

    /// Successor profile with a new code. Base tags are recomputed from
    /// `code`; onboarding tags carry over unchanged.
    pub fn successor(&self, code: PersonalityCode) -> Self {
        let onboarding = self.onboarding_tags();
        let mut tags = base_tags(&code);
        tags.extend(onboarding.iter().cloned());
        Self {
            id: Uuid::new_v4(),
            owner_id: self.owner_id.clone(),
            code,
            tags,
            onboarding_tags: Some(onboarding),
            created_at: Utc::now(),
        }
    }

    /// Onboarding-only tags, reconstructed as `tags − base_tags(code)` for
    /// older rows.
    pub fn onboarding_tags(&self) -> TagSet {
        match &self.onboarding_tags {
            Some(tags) => tags.clone(),
            None => {
                let base = base_tags(&self.code);
                self.tags.difference(&base).cloned().collect()
            }
        }
    }

    /// JSON view served by the profile endpoint.
    pub fn to_json(&self) -> serde_json::Value {
        let mut value = serde_json::json!({
            "owner_id": self.owner_id,
            "code": self.code,
            "tags": self.tags,
            "created_at": self.created_at.to_rfc3339(),
        });
        for axis in Axis::ALL {
            value[axis.key()] = serde_json::json!(self.code.get(axis));
        }
        value
    }
}
