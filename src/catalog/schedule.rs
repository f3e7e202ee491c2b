//! Schedule registration, shared by the chat confirmation branch and the
//! schedule endpoint.

use tracing::{debug, info};

use super::model::{Program, ScheduleRegistration};
use crate::error::{DatabaseError, Error, Result};
use crate::store::Database;

/// Register `owner_id` for `program`.
///
/// The owner must exist. A registration for the same (owner, program) pair
/// is a `Conflict`, whether caught by the pre-check or by the unique index.
pub async fn register_schedule(
    db: &dyn Database,
    owner_id: &str,
    program: &Program,
) -> Result<ScheduleRegistration> {
    if db.get_user(owner_id).await?.is_none() {
        return Err(Error::not_found("User", owner_id));
    }

    if db.schedule_exists(owner_id, program.id).await? {
        debug!(owner_id, program_id = program.id, "Schedule already registered");
        return Err(already_registered(owner_id, program));
    }

    let registration = ScheduleRegistration::new(owner_id, program);
    match db.insert_schedule(&registration).await {
        Ok(()) => {}
        Err(DatabaseError::Constraint(_)) => return Err(already_registered(owner_id, program)),
        Err(e) => return Err(e.into()),
    }

    info!(owner_id, program = %program.name, "Schedule registered");
    Ok(registration)
}

/// Register by program id.
pub async fn register_schedule_by_id(
    db: &dyn Database,
    owner_id: &str,
    program_id: i64,
) -> Result<ScheduleRegistration> {
    let program = db
        .get_program(program_id)
        .await?
        .ok_or_else(|| Error::not_found("Program", program_id.to_string()))?;
    register_schedule(db, owner_id, &program).await
}

fn already_registered(owner_id: &str, program: &Program) -> Error {
    Error::Conflict(format!(
        "{owner_id} is already registered for '{}'",
        program.name
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::model::{Center, User};
    use crate::store::LibSqlBackend;

    async fn seeded() -> LibSqlBackend {
        let db = LibSqlBackend::new_memory().await.unwrap();
        db.upsert_center(&Center {
            id: 1,
            name: "청솔복지관".into(),
            address: "서울".into(),
            tel: "02".into(),
            latitude: None,
            longitude: None,
        })
        .await
        .unwrap();
        let program: Program =
            serde_json::from_str(r#"{"id": 10, "name": "요가교실", "center_id": 1}"#).unwrap();
        db.upsert_program(&program).await.unwrap();
        db.upsert_user(&User {
            owner_id: "u1".into(),
            name: "김영희".into(),
        })
        .await
        .unwrap();
        db
    }

    #[tokio::test]
    async fn second_registration_conflicts() {
        let db = seeded().await;
        let reg = register_schedule_by_id(&db, "u1", 10).await.unwrap();
        assert_eq!(reg.center_id, 1);

        let err = register_schedule_by_id(&db, "u1", 10).await.unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
        assert_eq!(db.list_schedules("u1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unknown_owner_or_program_is_not_found() {
        let db = seeded().await;
        let err = register_schedule_by_id(&db, "ghost", 10).await.unwrap_err();
        assert!(matches!(err, Error::NotFound { ref entity, .. } if entity == "User"));

        let err = register_schedule_by_id(&db, "u1", 99).await.unwrap_err();
        assert!(matches!(err, Error::NotFound { ref entity, .. } if entity == "Program"));
        assert!(db.list_schedules("u1").await.unwrap().is_empty());
    }
}
