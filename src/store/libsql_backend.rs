//! libSQL backend — async `Database` trait implementation.
//!
//! Supports local file and in-memory databases over a single reused
//! connection, so every awaited write is visible to the next read.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::{debug, info};
use uuid::Uuid;

use crate::catalog::model::{
    Center, Program, ProgramClassification, ScheduleDetail, ScheduleRegistration, User,
};
use crate::chat::model::ConversationLogEntry;
use crate::error::DatabaseError;
use crate::personality::{PersonalityCode, PersonalityProfile, join_tags, parse_tag_list};
use crate::store::migrations;
use crate::store::traits::Database;

/// libSQL database backend.
///
/// Stores a single connection that is reused for all operations.
/// `libsql::Connection` is `Send + Sync` and safe for concurrent async use.
pub struct LibSqlBackend {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlBackend {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Pool(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Pool(format!("Failed to open libSQL database: {e}")))?;

        let backend = Self::from_database(db)?;
        backend.run_migrations().await?;
        info!(path = %path.display(), "Database opened");
        Ok(backend)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                DatabaseError::Pool(format!("Failed to create in-memory database: {e}"))
            })?;

        let backend = Self::from_database(db)?;
        backend.run_migrations().await?;
        Ok(backend)
    }

    fn from_database(db: LibSqlDatabase) -> Result<Self, DatabaseError> {
        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;
        Ok(Self {
            db: Arc::new(db),
            conn,
        })
    }

    /// Get the connection.
    fn conn(&self) -> &Connection {
        &self.conn
    }
}

// ── Helper functions ────────────────────────────────────────────────

/// Canonical write format. Fixed width, so text order is time order.
fn fmt_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse an RFC 3339 or SQLite datetime string into DateTime<Utc>.
fn parse_datetime(s: &str) -> DateTime<Utc> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return ndt.and_utc();
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return ndt.and_utc();
    }
    DateTime::<Utc>::MIN_UTC
}

fn parse_uuid(s: &str, field: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(s).map_err(|e| DatabaseError::Query(format!("{field} parse: {e}")))
}

/// Convert `Option<&str>` to libsql Value.
fn opt_text(s: Option<&str>) -> libsql::Value {
    match s {
        Some(s) => libsql::Value::Text(s.to_string()),
        None => libsql::Value::Null,
    }
}

/// Convert `Option<f64>` to libsql Value.
fn opt_real(v: Option<f64>) -> libsql::Value {
    match v {
        Some(v) => libsql::Value::Real(v),
        None => libsql::Value::Null,
    }
}

fn is_unique_violation(e: &libsql::Error) -> bool {
    e.to_string().contains("UNIQUE constraint failed")
}

/// Read a required text column, naming it in the error.
fn text(row: &libsql::Row, idx: i32, field: &str) -> Result<String, DatabaseError> {
    row.get::<String>(idx)
        .map_err(|e| DatabaseError::Query(format!("{field}: {e}")))
}

/// Read a required integer column, naming it in the error.
fn int(row: &libsql::Row, idx: i32, field: &str) -> Result<i64, DatabaseError> {
    row.get::<i64>(idx)
        .map_err(|e| DatabaseError::Query(format!("{field}: {e}")))
}

const CENTER_COLUMNS: &str = "id, name, address, tel, latitude, longitude";

const PROGRAM_COLUMNS: &str = "id, name, days, start_time, end_time, price, main_category, sub_category, headcount, tags, center_id";

const PROFILE_COLUMNS: &str = "id, owner_id, ei, sn, tf, jp, tags, onboarding_tags, created_at";

const LOG_COLUMNS: &str = "id, owner_id, user_message, assistant_response, recommended_program, created_at";

/// Map columns `offset..offset+6` (CENTER_COLUMNS order) to a Center.
fn row_to_center(row: &libsql::Row, offset: i32) -> Result<Center, DatabaseError> {
    Ok(Center {
        id: int(row, offset, "center.id")?,
        name: text(row, offset + 1, "center.name")?,
        address: row.get(offset + 2).unwrap_or_default(),
        tel: row.get(offset + 3).unwrap_or_default(),
        latitude: row.get(offset + 4).ok(),
        longitude: row.get(offset + 5).ok(),
    })
}

/// Map columns `offset..offset+11` (PROGRAM_COLUMNS order) to a Program.
fn row_to_program(row: &libsql::Row, offset: i32) -> Result<Program, DatabaseError> {
    let days_json: String = row.get(offset + 2).unwrap_or_default();
    let days: Vec<String> = if days_json.is_empty() {
        Vec::new()
    } else {
        serde_json::from_str(&days_json)
            .map_err(|e| DatabaseError::Serialization(format!("program.days: {e}")))?
    };
    let tags: String = row.get(offset + 9).unwrap_or_default();

    Ok(Program {
        id: int(row, offset, "program.id")?,
        name: text(row, offset + 1, "program.name")?,
        days,
        start_time: row.get(offset + 3).ok(),
        end_time: row.get(offset + 4).ok(),
        price: row.get(offset + 5).unwrap_or(0),
        main_category: text(row, offset + 6, "program.main_category")?,
        sub_category: text(row, offset + 7, "program.sub_category")?,
        headcount: text(row, offset + 8, "program.headcount")?,
        tags: parse_tag_list(&tags),
        center_id: int(row, offset + 10, "program.center_id")?,
    })
}

/// Map a row (PROFILE_COLUMNS order) to a PersonalityProfile.
fn row_to_profile(row: &libsql::Row) -> Result<PersonalityProfile, DatabaseError> {
    let id: String = text(row, 0, "profile.id")?;
    let letters: Vec<String> = (2..6)
        .map(|i| text(row, i, "profile.axis"))
        .collect::<Result<_, _>>()?;
    let code: PersonalityCode = letters
        .concat()
        .parse()
        .map_err(|e| DatabaseError::Serialization(format!("profile.code: {e}")))?;
    let tags: String = row.get(6).unwrap_or_default();
    let onboarding: Option<String> = row.get(7).ok();
    let created: String = text(row, 8, "profile.created_at")?;

    Ok(PersonalityProfile {
        id: parse_uuid(&id, "profile.id")?,
        owner_id: text(row, 1, "profile.owner_id")?,
        code,
        tags: parse_tag_list(&tags),
        onboarding_tags: onboarding.as_deref().map(parse_tag_list),
        created_at: parse_datetime(&created),
    })
}

/// Map a row (LOG_COLUMNS order) to a ConversationLogEntry.
fn row_to_log_entry(row: &libsql::Row) -> Result<ConversationLogEntry, DatabaseError> {
    let id: String = text(row, 0, "log.id")?;
    let created: String = text(row, 5, "log.created_at")?;
    Ok(ConversationLogEntry {
        id: parse_uuid(&id, "log.id")?,
        owner_id: text(row, 1, "log.owner_id")?,
        user_message: text(row, 2, "log.user_message")?,
        assistant_response: row.get(3).unwrap_or_default(),
        recommended_program: row.get(4).ok(),
        created_at: parse_datetime(&created),
    })
}

// ── Trait implementation ────────────────────────────────────────────

#[async_trait]
impl Database for LibSqlBackend {
    async fn run_migrations(&self) -> Result<(), DatabaseError> {
        migrations::run_migrations(self.conn()).await
    }

    // ── Users ───────────────────────────────────────────────────────

    async fn upsert_user(&self, user: &User) -> Result<(), DatabaseError> {
        self.conn()
            .execute(
                "INSERT INTO users (owner_id, name, created_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(owner_id) DO UPDATE SET name = excluded.name",
                params![
                    user.owner_id.as_str(),
                    user.name.as_str(),
                    fmt_datetime(&Utc::now())
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("upsert_user: {e}")))?;
        debug!(owner_id = %user.owner_id, "User upserted");
        Ok(())
    }

    async fn get_user(&self, owner_id: &str) -> Result<Option<User>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT owner_id, name FROM users WHERE owner_id = ?1",
                params![owner_id],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get_user: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(User {
                owner_id: text(&row, 0, "user.owner_id")?,
                name: row.get(1).unwrap_or_default(),
            })),
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("get_user: {e}"))),
        }
    }

    // ── Catalog ─────────────────────────────────────────────────────

    async fn upsert_center(&self, center: &Center) -> Result<(), DatabaseError> {
        self.conn()
            .execute(
                "INSERT INTO centers (id, name, address, tel, latitude, longitude)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(id) DO UPDATE SET
                    name = excluded.name,
                    address = excluded.address,
                    tel = excluded.tel,
                    latitude = excluded.latitude,
                    longitude = excluded.longitude",
                params![
                    center.id,
                    center.name.as_str(),
                    center.address.as_str(),
                    center.tel.as_str(),
                    opt_real(center.latitude),
                    opt_real(center.longitude),
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("upsert_center: {e}")))?;
        debug!(center_id = center.id, "Center upserted");
        Ok(())
    }

    async fn get_center(&self, id: i64) -> Result<Option<Center>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {CENTER_COLUMNS} FROM centers WHERE id = ?1"),
                params![id],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get_center: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_center(&row, 0)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("get_center: {e}"))),
        }
    }

    async fn upsert_program(&self, program: &Program) -> Result<(), DatabaseError> {
        let days = serde_json::to_string(&program.days)
            .map_err(|e| DatabaseError::Serialization(e.to_string()))?;
        self.conn()
            .execute(
                "INSERT INTO programs (id, name, days, start_time, end_time, price, main_category, sub_category, headcount, tags, center_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                 ON CONFLICT(id) DO UPDATE SET
                    name = excluded.name,
                    days = excluded.days,
                    start_time = excluded.start_time,
                    end_time = excluded.end_time,
                    price = excluded.price,
                    main_category = excluded.main_category,
                    sub_category = excluded.sub_category,
                    headcount = excluded.headcount,
                    tags = excluded.tags,
                    center_id = excluded.center_id",
                params![
                    program.id,
                    program.name.as_str(),
                    days,
                    opt_text(program.start_time.as_deref()),
                    opt_text(program.end_time.as_deref()),
                    program.price,
                    program.main_category.as_str(),
                    program.sub_category.as_str(),
                    program.headcount.as_str(),
                    join_tags(&program.tags),
                    program.center_id,
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("upsert_program: {e}")))?;
        debug!(program_id = program.id, name = %program.name, "Program upserted");
        Ok(())
    }

    async fn get_program(&self, id: i64) -> Result<Option<Program>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {PROGRAM_COLUMNS} FROM programs WHERE id = ?1"),
                params![id],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get_program: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_program(&row, 0)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("get_program: {e}"))),
        }
    }

    async fn get_program_by_name(&self, name: &str) -> Result<Option<Program>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {PROGRAM_COLUMNS} FROM programs WHERE name = ?1"),
                params![name],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get_program_by_name: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_program(&row, 0)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("get_program_by_name: {e}"))),
        }
    }

    async fn list_programs(&self) -> Result<Vec<Program>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {PROGRAM_COLUMNS} FROM programs ORDER BY id ASC"),
                (),
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("list_programs: {e}")))?;

        let mut programs = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(format!("list_programs row: {e}")))?
        {
            programs.push(row_to_program(&row, 0)?);
        }
        Ok(programs)
    }

    async fn update_program_classification(
        &self,
        id: i64,
        classification: &ProgramClassification,
    ) -> Result<(), DatabaseError> {
        self.conn()
            .execute(
                "UPDATE programs SET main_category = ?1, sub_category = ?2, headcount = ?3, tags = ?4 WHERE id = ?5",
                params![
                    classification.main_category.as_str(),
                    classification.sub_category.as_str(),
                    classification.headcount.as_str(),
                    join_tags(&classification.tags),
                    id,
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("update_program_classification: {e}")))?;
        debug!(program_id = id, "Program classification updated");
        Ok(())
    }

    // ── Personality profiles ────────────────────────────────────────

    async fn insert_profile(&self, profile: &PersonalityProfile) -> Result<(), DatabaseError> {
        let [ei, sn, tf, jp] = profile.code.letters().map(|l| l.to_string());
        self.conn()
            .execute(
                &format!("INSERT INTO personality_profiles ({PROFILE_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"),
                params![
                    profile.id.to_string(),
                    profile.owner_id.as_str(),
                    ei,
                    sn,
                    tf,
                    jp,
                    join_tags(&profile.tags),
                    opt_text(profile.onboarding_tags.as_ref().map(join_tags).as_deref()),
                    fmt_datetime(&profile.created_at),
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("insert_profile: {e}")))?;
        debug!(owner_id = %profile.owner_id, code = %profile.code, "Profile inserted");
        Ok(())
    }

    async fn latest_profile(
        &self,
        owner_id: &str,
    ) -> Result<Option<PersonalityProfile>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!(
                    "SELECT {PROFILE_COLUMNS} FROM personality_profiles WHERE owner_id = ?1
                     ORDER BY created_at DESC, rowid DESC LIMIT 1"
                ),
                params![owner_id],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("latest_profile: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_profile(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("latest_profile: {e}"))),
        }
    }

    // ── Conversation log ────────────────────────────────────────────

    async fn append_log(&self, entry: &ConversationLogEntry) -> Result<(), DatabaseError> {
        self.conn()
            .execute(
                &format!("INSERT INTO conversation_log ({LOG_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)"),
                params![
                    entry.id.to_string(),
                    entry.owner_id.as_str(),
                    entry.user_message.as_str(),
                    entry.assistant_response.as_str(),
                    opt_text(entry.recommended_program.as_deref()),
                    fmt_datetime(&entry.created_at),
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("append_log: {e}")))?;
        debug!(
            owner_id = %entry.owner_id,
            recommended = entry.recommended_program.as_deref().unwrap_or(""),
            "Conversation logged"
        );
        Ok(())
    }

    async fn last_recommended_program(
        &self,
        owner_id: &str,
    ) -> Result<Option<String>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT recommended_program FROM conversation_log
                 WHERE owner_id = ?1 AND recommended_program IS NOT NULL
                 ORDER BY created_at DESC, rowid DESC LIMIT 1",
                params![owner_id],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("last_recommended_program: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(text(&row, 0, "log.recommended_program")?)),
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("last_recommended_program: {e}"))),
        }
    }

    async fn user_messages_since(
        &self,
        owner_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<String>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT user_message FROM conversation_log
                 WHERE owner_id = ?1 AND created_at >= ?2
                 ORDER BY created_at DESC, rowid DESC",
                params![owner_id, fmt_datetime(&since)],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("user_messages_since: {e}")))?;

        let mut messages = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(format!("user_messages_since row: {e}")))?
        {
            messages.push(text(&row, 0, "log.user_message")?);
        }
        Ok(messages)
    }

    async fn list_log(
        &self,
        owner_id: &str,
        limit: usize,
    ) -> Result<Vec<ConversationLogEntry>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!(
                    "SELECT {LOG_COLUMNS} FROM conversation_log WHERE owner_id = ?1
                     ORDER BY created_at DESC, rowid DESC LIMIT ?2"
                ),
                params![owner_id, limit as i64],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("list_log: {e}")))?;

        let mut entries = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(format!("list_log row: {e}")))?
        {
            entries.push(row_to_log_entry(&row)?);
        }
        Ok(entries)
    }

    // ── Schedules ───────────────────────────────────────────────────

    async fn schedule_exists(
        &self,
        owner_id: &str,
        program_id: i64,
    ) -> Result<bool, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT 1 FROM schedules WHERE owner_id = ?1 AND program_id = ?2 LIMIT 1",
                params![owner_id, program_id],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("schedule_exists: {e}")))?;

        match rows.next().await {
            Ok(row) => Ok(row.is_some()),
            Err(e) => Err(DatabaseError::Query(format!("schedule_exists: {e}"))),
        }
    }

    async fn insert_schedule(&self, schedule: &ScheduleRegistration) -> Result<(), DatabaseError> {
        self.conn()
            .execute(
                "INSERT INTO schedules (id, owner_id, program_id, center_id, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    schedule.id.to_string(),
                    schedule.owner_id.as_str(),
                    schedule.program_id,
                    schedule.center_id,
                    fmt_datetime(&schedule.created_at),
                ],
            )
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    DatabaseError::Constraint(format!(
                        "schedule already exists for {} / program {}",
                        schedule.owner_id, schedule.program_id
                    ))
                } else {
                    DatabaseError::Query(format!("insert_schedule: {e}"))
                }
            })?;
        debug!(
            owner_id = %schedule.owner_id,
            program_id = schedule.program_id,
            "Schedule inserted"
        );
        Ok(())
    }

    async fn list_schedules(&self, owner_id: &str) -> Result<Vec<ScheduleDetail>, DatabaseError> {
        let program_cols = PROGRAM_COLUMNS
            .split(", ")
            .map(|c| format!("p.{c}"))
            .collect::<Vec<_>>()
            .join(", ");
        let center_cols = CENTER_COLUMNS
            .split(", ")
            .map(|c| format!("c.{c}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT s.id, s.owner_id, s.program_id, s.center_id, s.created_at, {program_cols}, {center_cols}
             FROM schedules s
             JOIN programs p ON p.id = s.program_id
             JOIN centers c ON c.id = s.center_id
             WHERE s.owner_id = ?1
             ORDER BY s.created_at DESC, s.rowid DESC"
        );
        let mut rows = self
            .conn()
            .query(&sql, params![owner_id])
            .await
            .map_err(|e| DatabaseError::Query(format!("list_schedules: {e}")))?;

        let mut schedules = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(format!("list_schedules row: {e}")))?
        {
            let id: String = text(&row, 0, "schedule.id")?;
            let created: String = text(&row, 4, "schedule.created_at")?;
            schedules.push(ScheduleDetail {
                registration: ScheduleRegistration {
                    id: parse_uuid(&id, "schedule.id")?,
                    owner_id: text(&row, 1, "schedule.owner_id")?,
                    program_id: int(&row, 2, "schedule.program_id")?,
                    center_id: int(&row, 3, "schedule.center_id")?,
                    created_at: parse_datetime(&created),
                },
                program: row_to_program(&row, 5)?,
                center: row_to_center(&row, 16)?,
            });
        }
        Ok(schedules)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::personality::{Answer, TagSet, score};
    use chrono::Duration;

    async fn test_db() -> LibSqlBackend {
        LibSqlBackend::new_memory().await.unwrap()
    }

    fn tag_set(tags: &[&str]) -> TagSet {
        tags.iter().map(|t| t.to_string()).collect()
    }

    fn make_center(id: i64) -> Center {
        Center {
            id,
            name: format!("센터{id}"),
            address: "서울시 중구".into(),
            tel: "02-000-0000".into(),
            latitude: Some(37.56),
            longitude: None,
        }
    }

    fn make_program(id: i64, name: &str, tags: &[&str]) -> Program {
        Program {
            id,
            name: name.into(),
            days: vec!["월".into(), "수".into()],
            start_time: Some("10:00".into()),
            end_time: Some("11:30".into()),
            price: 30000,
            main_category: "운동".into(),
            sub_category: "실내".into(),
            headcount: "단체".into(),
            tags: tag_set(tags),
            center_id: 1,
        }
    }

    async fn seeded_db() -> LibSqlBackend {
        let db = test_db().await;
        db.upsert_center(&make_center(1)).await.unwrap();
        db.upsert_program(&make_program(1, "요가교실", &["외향적", "사회적"]))
            .await
            .unwrap();
        db.upsert_program(&make_program(2, "서예교실", &["정적인"]))
            .await
            .unwrap();
        db.upsert_user(&User {
            owner_id: "u1".into(),
            name: "김영희".into(),
        })
        .await
        .unwrap();
        db
    }

    // ── Users ───────────────────────────────────────────────────────

    #[tokio::test]
    async fn user_upsert_renames() {
        let db = seeded_db().await;
        db.upsert_user(&User {
            owner_id: "u1".into(),
            name: "김철수".into(),
        })
        .await
        .unwrap();
        let user = db.get_user("u1").await.unwrap().unwrap();
        assert_eq!(user.name, "김철수");
        assert!(db.get_user("nobody").await.unwrap().is_none());
    }

    // ── Catalog ─────────────────────────────────────────────────────

    #[tokio::test]
    async fn program_roundtrip() {
        let db = seeded_db().await;
        let program = db.get_program(1).await.unwrap().unwrap();
        assert_eq!(program, make_program(1, "요가교실", &["외향적", "사회적"]));

        let by_name = db.get_program_by_name("서예교실").await.unwrap().unwrap();
        assert_eq!(by_name.id, 2);
        assert!(db.get_program_by_name("서예").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn center_roundtrip_keeps_null_coordinates() {
        let db = seeded_db().await;
        let center = db.get_center(1).await.unwrap().unwrap();
        assert_eq!(center.latitude, Some(37.56));
        assert_eq!(center.longitude, None);
        assert!(db.get_center(99).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_programs_in_id_order() {
        let db = seeded_db().await;
        db.upsert_program(&make_program(0, "바둑", &[])).await.unwrap();
        let names: Vec<String> = db
            .list_programs()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["바둑", "요가교실", "서예교실"]);
    }

    #[tokio::test]
    async fn update_classification() {
        let db = seeded_db().await;
        db.update_program_classification(
            2,
            &ProgramClassification {
                main_category: "예술".into(),
                sub_category: "실내".into(),
                headcount: "개인".into(),
                tags: tag_set(&["정적인", "예술적"]),
            },
        )
        .await
        .unwrap();
        let program = db.get_program(2).await.unwrap().unwrap();
        assert_eq!(program.main_category, "예술");
        assert_eq!(program.tags, tag_set(&["정적인", "예술적"]));
    }

    // ── Profiles ────────────────────────────────────────────────────

    #[tokio::test]
    async fn latest_profile_is_newest_row() {
        let db = test_db().await;
        let first = PersonalityProfile::from_scored("u1", score(&[Answer::A; 13]).unwrap());
        db.insert_profile(&first).await.unwrap();
        let second = first.successor("INFP".parse().unwrap());
        db.insert_profile(&second).await.unwrap();

        let latest = db.latest_profile("u1").await.unwrap().unwrap();
        assert_eq!(latest.id, second.id);
        assert_eq!(latest.code.to_string(), "INFP");
        assert_eq!(latest.tags, second.tags);
        assert_eq!(latest.onboarding_tags, second.onboarding_tags);
        assert!(db.latest_profile("u2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn profile_without_onboarding_column_reads_as_none() {
        let db = test_db().await;
        db.conn()
            .execute(
                "INSERT INTO personality_profiles (id, owner_id, ei, sn, tf, jp, tags, created_at)
                 VALUES (?1, 'u9', 'I', 'S', 'F', 'P', '내향적,정적인,활동적', '2026-01-01T00:00:00Z')",
                params![Uuid::new_v4().to_string()],
            )
            .await
            .unwrap();
        let profile = db.latest_profile("u9").await.unwrap().unwrap();
        assert!(profile.onboarding_tags.is_none());
        assert_eq!(profile.onboarding_tags(), tag_set(&["활동적"]));
    }

    // ── Conversation log ────────────────────────────────────────────

    #[tokio::test]
    async fn last_recommended_skips_entries_without_program() {
        let db = test_db().await;
        db.append_log(&ConversationLogEntry::new("u1", "요가?", "요가 어떠세요", Some("요가교실".into())))
            .await
            .unwrap();
        db.append_log(&ConversationLogEntry::new("u1", "안녕", "안녕하세요", None))
            .await
            .unwrap();
        db.append_log(&ConversationLogEntry::new("u2", "서예?", "서예 어떠세요", Some("서예교실".into())))
            .await
            .unwrap();

        let last = db.last_recommended_program("u1").await.unwrap();
        assert_eq!(last.as_deref(), Some("요가교실"));
        assert!(db.last_recommended_program("u3").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn last_recommended_prefers_newest() {
        let db = test_db().await;
        for name in ["요가교실", "서예교실"] {
            db.append_log(&ConversationLogEntry::new("u1", "추천", "추천", Some(name.into())))
                .await
                .unwrap();
        }
        let last = db.last_recommended_program("u1").await.unwrap();
        assert_eq!(last.as_deref(), Some("서예교실"));
    }

    #[tokio::test]
    async fn user_messages_respect_window() {
        let db = test_db().await;
        let mut old = ConversationLogEntry::new("u1", "오래된 말", "응답", None);
        old.created_at = Utc::now() - Duration::days(40);
        db.append_log(&old).await.unwrap();
        db.append_log(&ConversationLogEntry::new("u1", "최근 말", "응답", None))
            .await
            .unwrap();

        let messages = db
            .user_messages_since("u1", Utc::now() - Duration::days(30))
            .await
            .unwrap();
        assert_eq!(messages, vec!["최근 말".to_string()]);
    }

    #[tokio::test]
    async fn list_log_newest_first_with_limit() {
        let db = test_db().await;
        for i in 0..5 {
            db.append_log(&ConversationLogEntry::new("u1", format!("m{i}"), "r", None))
                .await
                .unwrap();
        }
        let entries = db.list_log("u1", 3).await.unwrap();
        let messages: Vec<&str> = entries.iter().map(|e| e.user_message.as_str()).collect();
        assert_eq!(messages, vec!["m4", "m3", "m2"]);
    }

    // ── Schedules ───────────────────────────────────────────────────

    #[tokio::test]
    async fn duplicate_schedule_is_constraint_error() {
        let db = seeded_db().await;
        let program = db.get_program(1).await.unwrap().unwrap();

        assert!(!db.schedule_exists("u1", 1).await.unwrap());
        db.insert_schedule(&ScheduleRegistration::new("u1", &program))
            .await
            .unwrap();
        assert!(db.schedule_exists("u1", 1).await.unwrap());

        let err = db
            .insert_schedule(&ScheduleRegistration::new("u1", &program))
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Constraint(_)));
    }

    #[tokio::test]
    async fn list_schedules_joins_program_and_center() {
        let db = seeded_db().await;
        let program = db.get_program(1).await.unwrap().unwrap();
        db.insert_schedule(&ScheduleRegistration::new("u1", &program))
            .await
            .unwrap();

        let schedules = db.list_schedules("u1").await.unwrap();
        assert_eq!(schedules.len(), 1);
        assert_eq!(schedules[0].program.name, "요가교실");
        assert_eq!(schedules[0].center.name, "센터1");
        assert_eq!(schedules[0].registration.owner_id, "u1");
        assert!(db.list_schedules("u2").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn local_file_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("care.db");
        {
            let db = LibSqlBackend::new_local(&path).await.unwrap();
            db.upsert_center(&make_center(1)).await.unwrap();
        }
        let db = LibSqlBackend::new_local(&path).await.unwrap();
        assert!(db.get_center(1).await.unwrap().is_some());
    }
}
