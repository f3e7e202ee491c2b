//! Catalog data model: centers, programs, users and schedule registrations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::personality::TagSet;

pub const DEFAULT_MAIN_CATEGORY: &str = "교양";
pub const DEFAULT_SUB_CATEGORY: &str = "실내";
pub const DEFAULT_HEADCOUNT: &str = "개인";

/// A welfare center that hosts programs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Center {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub tel: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

/// An activity program offered by a center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub id: i64,
    /// Unique within the catalog.
    pub name: String,
    /// Weekday labels, at most five.
    #[serde(default)]
    pub days: Vec<String>,
    /// `HH:MM`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    /// `HH:MM`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    /// Won.
    #[serde(default)]
    pub price: i64,
    #[serde(default = "default_main_category")]
    pub main_category: String,
    #[serde(default = "default_sub_category")]
    pub sub_category: String,
    #[serde(default = "default_headcount")]
    pub headcount: String,
    #[serde(default)]
    pub tags: TagSet,
    pub center_id: i64,
}

fn default_main_category() -> String {
    DEFAULT_MAIN_CATEGORY.to_string()
}

fn default_sub_category() -> String {
    DEFAULT_SUB_CATEGORY.to_string()
}

fn default_headcount() -> String {
    DEFAULT_HEADCOUNT.to_string()
}

/// Category labels and tags assigned to a program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgramClassification {
    pub main_category: String,
    pub sub_category: String,
    pub headcount: String,
    pub tags: TagSet,
}

/// A registered service user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub owner_id: String,
    #[serde(default)]
    pub name: String,
}

/// One owner's registration for one program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleRegistration {
    pub id: Uuid,
    pub owner_id: String,
    pub program_id: i64,
    pub center_id: i64,
    pub created_at: DateTime<Utc>,
}

impl ScheduleRegistration {
    pub fn new(owner_id: impl Into<String>, program: &Program) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id: owner_id.into(),
            program_id: program.id,
            center_id: program.center_id,
            created_at: Utc::now(),
        }
    }
}

/// A registration joined with its program and center.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleDetail {
    #[serde(flatten)]
    pub registration: ScheduleRegistration,
    pub program: Program,
    pub center: Center,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn program_defaults_fill_missing_categories() {
        let program: Program =
            serde_json::from_str(r#"{"id": 1, "name": "요가교실", "center_id": 3}"#).unwrap();
        assert_eq!(program.main_category, "교양");
        assert_eq!(program.sub_category, "실내");
        assert_eq!(program.headcount, "개인");
        assert!(program.tags.is_empty());
        assert!(program.days.is_empty());
    }

    #[test]
    fn registration_takes_center_from_program() {
        let program: Program =
            serde_json::from_str(r#"{"id": 7, "name": "서예", "center_id": 2}"#).unwrap();
        let reg = ScheduleRegistration::new("owner-1", &program);
        assert_eq!(reg.program_id, 7);
        assert_eq!(reg.center_id, 2);
    }
}
