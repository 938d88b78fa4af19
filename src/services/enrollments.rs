use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use super::{find_course, find_user_role};
use crate::authz::{policy, Action, Actor, Denied, Resource};
use crate::errors::AppError;
use crate::models::enrollment::{Enrollment, EnrollmentStatus};
use crate::utils::unique_violation;

const ENROLLMENT_COLUMNS: &str = "id, learner_id, course_id, status, enrollment_date, created_at, updated_at";

#[derive(thiserror::Error, Debug)]
pub enum EnrollError {
    #[error(transparent)]
    Forbidden(#[from] Denied),
    #[error("learner_id is required when enrolling on a learner's behalf")]
    MissingLearner,
    #[error("course {0} not found")]
    CourseNotFound(i64),
    #[error("learner {0} not found")]
    LearnerNotFound(i64),
    #[error("learner {learner_id} already has an enrollment in course {course_id}")]
    AlreadyEnrolled { learner_id: i64, course_id: i64 },
    #[error("learner {learner_id} has no enrollment in course {course_id}")]
    NotFound { learner_id: i64, course_id: i64 },
    #[error("an enrollment cannot move from {from} to {to}")]
    InvalidTransition { from: EnrollmentStatus, to: EnrollmentStatus },
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl From<EnrollError> for AppError {
    fn from(err: EnrollError) -> Self {
        match err {
            EnrollError::Forbidden(denied) => denied.into(),
            EnrollError::MissingLearner => AppError::validation("learner_id", err.to_string()),
            EnrollError::CourseNotFound(_) | EnrollError::LearnerNotFound(_) | EnrollError::NotFound { .. } => {
                AppError::not_found(err.to_string())
            }
            EnrollError::AlreadyEnrolled { .. } => AppError::conflict(err.to_string()),
            EnrollError::InvalidTransition { .. } => AppError::invalid_state(err.to_string()),
            EnrollError::Database(db) => AppError::Database(db),
        }
    }
}

async fn find_enrollment(
    pool: &SqlitePool,
    learner_id: i64,
    course_id: i64,
) -> Result<Option<Enrollment>, sqlx::Error> {
    sqlx::query_as::<_, Enrollment>(&format!(
        "SELECT {ENROLLMENT_COLUMNS} FROM enrollments WHERE learner_id = ? AND course_id = ?"
    ))
    .bind(learner_id)
    .bind(course_id)
    .fetch_optional(pool)
    .await
}

/// Whether `learner_id` is currently `enrolled` in `course_id`.
pub async fn is_actively_enrolled(pool: &SqlitePool, learner_id: i64, course_id: i64) -> Result<bool, sqlx::Error> {
    Ok(find_enrollment(pool, learner_id, course_id)
        .await?
        .is_some_and(|enrollment| enrollment.is_active()))
}

/// Creates a `pending` enrollment. Students always enroll themselves; an admin
/// must name the learner.
///
/// Any existing enrollment for the pair blocks a new one, whatever its status.
/// The `(learner_id, course_id)` unique index settles concurrent requests.
pub async fn enroll(
    pool: &SqlitePool,
    actor: &Actor,
    course_id: i64,
    learner_id: Option<i64>,
    now: DateTime<Utc>,
) -> Result<Enrollment, EnrollError> {
    let grant = policy::authorize(actor, Resource::Enrollment, Action::Create)?;
    let learner_id = grant.subject(actor, learner_id).ok_or(EnrollError::MissingLearner)?;

    if find_course(pool, course_id).await?.is_none() {
        return Err(EnrollError::CourseNotFound(course_id));
    }
    if find_user_role(pool, learner_id).await?.is_none() {
        return Err(EnrollError::LearnerNotFound(learner_id));
    }
    if find_enrollment(pool, learner_id, course_id).await?.is_some() {
        return Err(EnrollError::AlreadyEnrolled { learner_id, course_id });
    }

    let inserted = sqlx::query_as::<_, Enrollment>(&format!(
        "INSERT INTO enrollments (learner_id, course_id, status, enrollment_date, created_at, updated_at) \
         VALUES (?, ?, ?, NULL, ?, ?) RETURNING {ENROLLMENT_COLUMNS}"
    ))
    .bind(learner_id)
    .bind(course_id)
    .bind(EnrollmentStatus::Pending)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await;

    let enrollment =
        unique_violation(inserted)?.ok_or(EnrollError::AlreadyEnrolled { learner_id, course_id })?;

    tracing::info!(
        enrollment_id = enrollment.id,
        learner_id,
        course_id,
        actor_id = actor.id,
        "enrollment requested"
    );
    Ok(enrollment)
}

/// Moves an enrollment along the status graph. Entering `enrolled` stamps
/// `enrollment_date`. Returns `(before, after)`.
pub async fn transition_status(
    pool: &SqlitePool,
    actor: &Actor,
    course_id: i64,
    learner_id: i64,
    next: EnrollmentStatus,
    now: DateTime<Utc>,
) -> Result<(Enrollment, Enrollment), EnrollError> {
    policy::authorize(actor, Resource::Enrollment, Action::Transition)?;

    if find_course(pool, course_id).await?.is_none() {
        return Err(EnrollError::CourseNotFound(course_id));
    }
    let current = find_enrollment(pool, learner_id, course_id)
        .await?
        .ok_or(EnrollError::NotFound { learner_id, course_id })?;

    if !current.status.can_transition_to(next) {
        return Err(EnrollError::InvalidTransition {
            from: current.status,
            to: next,
        });
    }

    let enrollment_date = if next == EnrollmentStatus::Enrolled {
        Some(now)
    } else {
        current.enrollment_date
    };

    // Guarded on the status we validated against so a concurrent transition cannot be overwritten.
    let updated = sqlx::query_as::<_, Enrollment>(&format!(
        "UPDATE enrollments SET status = ?, enrollment_date = ?, updated_at = ? \
         WHERE id = ? AND status = ? RETURNING {ENROLLMENT_COLUMNS}"
    ))
    .bind(next)
    .bind(enrollment_date)
    .bind(now)
    .bind(current.id)
    .bind(current.status)
    .fetch_optional(pool)
    .await?
    .ok_or(EnrollError::InvalidTransition {
        from: current.status,
        to: next,
    })?;

    tracing::info!(
        enrollment_id = updated.id,
        learner_id,
        course_id,
        from = %current.status,
        to = %next,
        actor_id = actor.id,
        "enrollment status changed"
    );
    Ok((current, updated))
}

pub async fn list_course_enrollments(
    pool: &SqlitePool,
    actor: &Actor,
    course_id: i64,
) -> Result<Vec<Enrollment>, EnrollError> {
    let grant = policy::authorize(actor, Resource::Enrollment, Action::List)?;
    let course = find_course(pool, course_id)
        .await?
        .ok_or(EnrollError::CourseNotFound(course_id))?;
    grant.enforce_on(actor, &course)?;

    let enrollments = sqlx::query_as::<_, Enrollment>(&format!(
        "SELECT {ENROLLMENT_COLUMNS} FROM enrollments WHERE course_id = ? ORDER BY id"
    ))
    .bind(course_id)
    .fetch_all(pool)
    .await?;
    Ok(enrollments)
}
