//! Unified `Database` trait — single async interface for all persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::catalog::model::{
    Center, Program, ProgramClassification, ScheduleDetail, ScheduleRegistration, User,
};
use crate::chat::model::ConversationLogEntry;
use crate::error::DatabaseError;
use crate::personality::PersonalityProfile;

/// Backend-agnostic database trait covering users, the catalog, profiles,
/// the conversation log and schedules.
///
/// Every write is visible to the next read on the same backend.
#[async_trait]
pub trait Database: Send + Sync {
    /// Run all pending schema migrations.
    async fn run_migrations(&self) -> Result<(), DatabaseError>;

    // ── Users ───────────────────────────────────────────────────────

    /// Insert or rename a user.
    async fn upsert_user(&self, user: &User) -> Result<(), DatabaseError>;

    async fn get_user(&self, owner_id: &str) -> Result<Option<User>, DatabaseError>;

    // ── Catalog ─────────────────────────────────────────────────────

    async fn upsert_center(&self, center: &Center) -> Result<(), DatabaseError>;

    async fn get_center(&self, id: i64) -> Result<Option<Center>, DatabaseError>;

    async fn upsert_program(&self, program: &Program) -> Result<(), DatabaseError>;

    async fn get_program(&self, id: i64) -> Result<Option<Program>, DatabaseError>;

    /// Exact name match.
    async fn get_program_by_name(&self, name: &str) -> Result<Option<Program>, DatabaseError>;

    /// Every program, in catalog (id) order.
    async fn list_programs(&self) -> Result<Vec<Program>, DatabaseError>;

    /// Overwrite a program's categories and tags.
    async fn update_program_classification(
        &self,
        id: i64,
        classification: &ProgramClassification,
    ) -> Result<(), DatabaseError>;

    // ── Personality profiles ────────────────────────────────────────

    async fn insert_profile(&self, profile: &PersonalityProfile) -> Result<(), DatabaseError>;

    /// The owner's current (newest) profile.
    async fn latest_profile(
        &self,
        owner_id: &str,
    ) -> Result<Option<PersonalityProfile>, DatabaseError>;

    // ── Conversation log ────────────────────────────────────────────

    async fn append_log(&self, entry: &ConversationLogEntry) -> Result<(), DatabaseError>;

    /// Program name of the newest entry that recommended one.
    async fn last_recommended_program(
        &self,
        owner_id: &str,
    ) -> Result<Option<String>, DatabaseError>;

    /// User-authored messages at or after `since`, newest first.
    async fn user_messages_since(
        &self,
        owner_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<String>, DatabaseError>;

    /// Newest entries first, up to `limit`.
    async fn list_log(
        &self,
        owner_id: &str,
        limit: usize,
    ) -> Result<Vec<ConversationLogEntry>, DatabaseError>;

    // ── Schedules ───────────────────────────────────────────────────

    async fn schedule_exists(&self, owner_id: &str, program_id: i64)
    -> Result<bool, DatabaseError>;

    /// Insert a registration. A duplicate (owner, program) pair fails with
    /// `DatabaseError::Constraint`.
    async fn insert_schedule(&self, schedule: &ScheduleRegistration) -> Result<(), DatabaseError>;

    /// Registrations with program and center joined, newest first.
    async fn list_schedules(&self, owner_id: &str) -> Result<Vec<ScheduleDetail>, DatabaseError>;
}
