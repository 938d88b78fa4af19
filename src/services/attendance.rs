use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use super::{find_class, find_course};
use crate::authz::{policy, Action, Actor, Denied, Resource};
use crate::errors::AppError;
use crate::models::attendance::Attendance;
use crate::models::class::Class;
use crate::models::course::Course;
use crate::services::enrollments::is_actively_enrolled;
use crate::utils::unique_violation;

const ATTENDANCE_COLUMNS: &str = "id, learner_id, class_id, course_id, attended, attended_at";

#[derive(thiserror::Error, Debug)]
pub enum AttendError {
    #[error(transparent)]
    Forbidden(#[from] Denied),
    #[error("learner_id is required when marking attendance for a learner")]
    MissingLearner,
    #[error("course {0} not found")]
    CourseNotFound(i64),
    #[error("class {class_id} not found in course {course_id}")]
    ClassNotFound { course_id: i64, class_id: i64 },
    #[error("attendance {0} not found")]
    NotFound(i64),
    #[error("learner {learner_id} is not actively enrolled in course {course_id}")]
    NotEnrolled { learner_id: i64, course_id: i64 },
    #[error("learner {learner_id} is already marked present for class {class_id}")]
    AlreadyMarked { learner_id: i64, class_id: i64 },
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl From<AttendError> for AppError {
    fn from(err: AttendError) -> Self {
        match err {
            AttendError::Forbidden(denied) => denied.into(),
            AttendError::MissingLearner => AppError::validation("learner_id", err.to_string()),
            AttendError::CourseNotFound(_) | AttendError::ClassNotFound { .. } | AttendError::NotFound(_) => {
                AppError::not_found(err.to_string())
            }
            AttendError::NotEnrolled { .. } => AppError::forbidden(err.to_string()),
            AttendError::AlreadyMarked { .. } => AppError::conflict(err.to_string()),
            AttendError::Database(db) => AppError::Database(db),
        }
    }
}

async fn resolve_path(pool: &SqlitePool, course_id: i64, class_id: i64) -> Result<(Course, Class), AttendError> {
    let course = find_course(pool, course_id)
        .await?
        .ok_or(AttendError::CourseNotFound(course_id))?;
    let class = find_class(pool, course_id, class_id)
        .await?
        .ok_or(AttendError::ClassNotFound { course_id, class_id })?;
    Ok((course, class))
}

/// Marks a learner present. Only an `enrolled` learner passes; pending and
/// finished enrollments are refused alike.
pub async fn mark_attendance(
    pool: &SqlitePool,
    actor: &Actor,
    course_id: i64,
    class_id: i64,
    learner_id: Option<i64>,
    now: DateTime<Utc>,
) -> Result<Attendance, AttendError> {
    let grant = policy::authorize(actor, Resource::Attendance, Action::Create)?;
    resolve_path(pool, course_id, class_id).await?;
    let learner_id = grant.subject(actor, learner_id).ok_or(AttendError::MissingLearner)?;

    if !is_actively_enrolled(pool, learner_id, course_id).await? {
        tracing::debug!(learner_id, course_id, class_id, "attendance refused, learner not enrolled");
        return Err(AttendError::NotEnrolled { learner_id, course_id });
    }

    let inserted = sqlx::query_as::<_, Attendance>(&format!(
        "INSERT INTO attendances (learner_id, class_id, course_id, attended, attended_at) \
         VALUES (?, ?, ?, 1, ?) RETURNING {ATTENDANCE_COLUMNS}"
    ))
    .bind(learner_id)
    .bind(class_id)
    .bind(course_id)
    .bind(now)
    .fetch_one(pool)
    .await;

    let attendance = unique_violation(inserted)?.ok_or(AttendError::AlreadyMarked { learner_id, class_id })?;

    tracing::info!(
        attendance_id = attendance.id,
        learner_id,
        class_id,
        course_id,
        actor_id = actor.id,
        "attendance recorded"
    );
    Ok(attendance)
}

pub async fn list_class_attendances(
    pool: &SqlitePool,
    actor: &Actor,
    course_id: i64,
    class_id: i64,
) -> Result<Vec<Attendance>, AttendError> {
    let grant = policy::authorize(actor, Resource::Attendance, Action::List)?;
    let (course, _) = resolve_path(pool, course_id, class_id).await?;
    grant.enforce_on(actor, &course)?;

    let rows = sqlx::query_as::<_, Attendance>(&format!(
        "SELECT {ATTENDANCE_COLUMNS} FROM attendances WHERE class_id = ? ORDER BY attended_at, id"
    ))
    .bind(class_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn delete_attendance(
    pool: &SqlitePool,
    actor: &Actor,
    course_id: i64,
    class_id: i64,
    attendance_id: i64,
) -> Result<Attendance, AttendError> {
    let grant = policy::authorize(actor, Resource::Attendance, Action::Delete)?;
    let (course, _) = resolve_path(pool, course_id, class_id).await?;
    let attendance = sqlx::query_as::<_, Attendance>(&format!(
        "SELECT {ATTENDANCE_COLUMNS} FROM attendances WHERE id = ? AND class_id = ?"
    ))
    .bind(attendance_id)
    .bind(class_id)
    .fetch_optional(pool)
    .await?
    .ok_or(AttendError::NotFound(attendance_id))?;
    grant.enforce_on(actor, &course)?;

    sqlx::query("DELETE FROM attendances WHERE id = ?")
        .bind(attendance_id)
        .execute(pool)
        .await?;

    tracing::info!(attendance_id, class_id, course_id, actor_id = actor.id, "attendance removed");
    Ok(attendance)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_enrolled_is_forbidden_and_duplicates_conflict() {
        let err = AppError::from(AttendError::NotEnrolled { learner_id: 5, course_id: 2 });
        assert_eq!(err.kind(), "forbidden");

        let err = AppError::from(AttendError::AlreadyMarked { learner_id: 5, class_id: 9 });
        assert_eq!(err.kind(), "conflict");
    }
}
