//! Program catalog: data model, seed import, oracle tagging and schedule
//! registration.

pub mod model;
pub mod schedule;
pub mod tagger;

pub use model::{Center, Program, ProgramClassification, ScheduleDetail, ScheduleRegistration, User};
pub use schedule::{register_schedule, register_schedule_by_id};
pub use tagger::{ProgramTagger, TaggingReport};

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ConfigError, Error, Result};
use crate::store::Database;

/// At most this many weekday labels per program.
pub const MAX_PROGRAM_DAYS: usize = 5;

static TIME_OF_DAY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([01][0-9]|2[0-3]):[0-5][0-9]$").unwrap());

/// A catalog document as imported at start-up.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogSeed {
    #[serde(default)]
    pub centers: Vec<Center>,
    #[serde(default)]
    pub programs: Vec<Program>,
    #[serde(default)]
    pub users: Vec<User>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeedSummary {
    pub centers: usize,
    pub programs: usize,
    pub users: usize,
}

impl CatalogSeed {
    pub fn from_json(raw: &str) -> std::result::Result<Self, ConfigError> {
        serde_json::from_str(raw).map_err(|e| ConfigError::ParseError(format!("catalog seed: {e}")))
    }

    pub fn load(path: &Path) -> std::result::Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// Reject programs with a blank name, malformed times, too many days, or
    /// a center that is neither in the seed nor already stored.
    pub async fn validate(&self, db: &dyn Database) -> Result<()> {
        for program in &self.programs {
            if program.name.trim().is_empty() {
                return Err(Error::Validation(format!("program {} has a blank name", program.id)));
            }
            for time in [&program.start_time, &program.end_time].into_iter().flatten() {
                if !TIME_OF_DAY.is_match(time) {
                    return Err(Error::Validation(format!(
                        "program {} has malformed time {time:?}, expected HH:MM",
                        program.id
                    )));
                }
            }
            if program.days.len() > MAX_PROGRAM_DAYS {
                return Err(Error::Validation(format!(
                    "program {} lists {} days, at most {MAX_PROGRAM_DAYS} allowed",
                    program.id,
                    program.days.len()
                )));
            }
            let seeded = self.centers.iter().any(|c| c.id == program.center_id);
            if !seeded && db.get_center(program.center_id).await?.is_none() {
                return Err(Error::not_found("Center", program.center_id.to_string()));
            }
        }
        Ok(())
    }

    /// Validate, then upsert everything by id. Centers go first so programs
    /// can reference them.
    pub async fn import(&self, db: &dyn Database) -> Result<SeedSummary> {
        self.validate(db).await?;
        for center in &self.centers {
            db.upsert_center(center).await?;
        }
        for program in &self.programs {
            db.upsert_program(program).await?;
        }
        for user in &self.users {
            db.upsert_user(user).await?;
        }

        let summary = SeedSummary {
            centers: self.centers.len(),
            programs: self.programs.len(),
            users: self.users.len(),
        };
        info!(
            centers = summary.centers,
            programs = summary.programs,
            users = summary.users,
            "Catalog seed imported"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::LibSqlBackend;

    const SEED: &str = r#"{
        "centers": [{"id": 1, "name": "청솔복지관", "address": "서울", "tel": "02-1"}],
        "programs": [
            {"id": 1, "name": "요가교실", "days": ["월", "수"], "start_time": "10:00",
             "end_time": "11:00", "price": 3000, "tags": ["활동적", "사회적"], "center_id": 1},
            {"id": 2, "name": "서예", "center_id": 1}
        ],
        "users": [{"owner_id": "u1", "name": "김영희"}]
    }"#;

    #[tokio::test]
    async fn import_is_idempotent() {
        let db = LibSqlBackend::new_memory().await.unwrap();
        let seed = CatalogSeed::from_json(SEED).unwrap();

        let first = seed.import(&db).await.unwrap();
        let second = seed.import(&db).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.programs, 2);
        let programs = db.list_programs().await.unwrap();
        assert_eq!(programs.len(), 2);
        assert_eq!(programs[0].days, vec!["월".to_string(), "수".to_string()]);
        assert!(db.get_user("u1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn invalid_programs_are_rejected_before_writing() {
        let db = LibSqlBackend::new_memory().await.unwrap();

        let bad_time = CatalogSeed::from_json(
            r#"{"centers": [{"id": 1, "name": "c"}],
                "programs": [{"id": 1, "name": "p", "start_time": "9시", "center_id": 1}]}"#,
        )
        .unwrap();
        let err = bad_time.import(&db).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        let blank_name = CatalogSeed::from_json(
            r#"{"centers": [{"id": 1, "name": "c"}],
                "programs": [{"id": 1, "name": "  ", "center_id": 1}]}"#,
        )
        .unwrap();
        let err = blank_name.import(&db).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        let orphan = CatalogSeed::from_json(
            r#"{"programs": [{"id": 1, "name": "p", "center_id": 9}]}"#,
        )
        .unwrap();
        let err = orphan.import(&db).await.unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));

        assert!(db.list_programs().await.unwrap().is_empty());
        assert!(db.get_center(1).await.unwrap().is_none());
    }

    #[test]
    fn time_pattern() {
        assert!(TIME_OF_DAY.is_match("09:30"));
        assert!(TIME_OF_DAY.is_match("23:59"));
        assert!(!TIME_OF_DAY.is_match("24:00"));
        assert!(!TIME_OF_DAY.is_match("9:30"));
    }

    #[test]
    fn malformed_seed_is_parse_error() {
        let err = CatalogSeed::from_json("{\"programs\": 3}").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = CatalogSeed::load(Path::new("/nonexistent/catalog.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
