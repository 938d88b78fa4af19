use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use super::{find_course, find_project};
use crate::authz::{policy, Action, Actor, Denied, Resource};
use crate::errors::AppError;
use crate::models::submission::{Submission, MAX_SCORE, MIN_SCORE};
use crate::validation::{format_timestamp, validate_name, ValidationError};

const SUBMISSION_COLUMNS: &str =
    "id, project_id, learner_id, submitted_at, file_reference, score, grading_note, created_at, updated_at";

#[derive(thiserror::Error, Debug)]
pub enum SubmitError {
    #[error(transparent)]
    Forbidden(#[from] Denied),
    #[error("course {0} not found")]
    CourseNotFound(i64),
    #[error("project {project_id} not found in course {course_id}")]
    ProjectNotFound { course_id: i64, project_id: i64 },
    #[error("submissions open at {}", format_timestamp(.opens_at))]
    TooEarly { opens_at: DateTime<Utc> },
    #[error("submissions closed at {}", format_timestamp(.closed_at))]
    TooLate { closed_at: DateTime<Utc> },
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl From<SubmitError> for AppError {
    fn from(err: SubmitError) -> Self {
        match err {
            SubmitError::Forbidden(denied) => denied.into(),
            SubmitError::CourseNotFound(_) | SubmitError::ProjectNotFound { .. } => AppError::not_found(err.to_string()),
            SubmitError::TooEarly { .. } | SubmitError::TooLate { .. } => AppError::forbidden(err.to_string()),
            SubmitError::Invalid(invalid) => invalid.into(),
            SubmitError::Database(db) => AppError::Database(db),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum GradeError {
    #[error(transparent)]
    Forbidden(#[from] Denied),
    #[error("submission {0} not found")]
    NotFound(i64),
    #[error("score {0} must be between 0 and 100")]
    ScoreOutOfRange(i64),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl From<GradeError> for AppError {
    fn from(err: GradeError) -> Self {
        match err {
            GradeError::Forbidden(denied) => denied.into(),
            GradeError::NotFound(_) => AppError::not_found(err.to_string()),
            GradeError::ScoreOutOfRange(_) => AppError::validation("score", err.to_string()),
            GradeError::Database(db) => AppError::Database(db),
        }
    }
}

/// Accepts a submission only while `now` lies in `[course.start_date, course.end_date]`.
pub async fn submit_project(
    pool: &SqlitePool,
    actor: &Actor,
    course_id: i64,
    project_id: i64,
    file_reference: &str,
    now: DateTime<Utc>,
) -> Result<Submission, SubmitError> {
    policy::authorize(actor, Resource::Submission, Action::Create)?;
    let course = find_course(pool, course_id)
        .await?
        .ok_or(SubmitError::CourseNotFound(course_id))?;
    find_project(pool, course_id, project_id)
        .await?
        .ok_or(SubmitError::ProjectNotFound { course_id, project_id })?;

    if !course.is_open_at(now) {
        return Err(if now < course.start_date {
            SubmitError::TooEarly {
                opens_at: course.start_date,
            }
        } else {
            SubmitError::TooLate {
                closed_at: course.end_date,
            }
        });
    }
    validate_name("file_reference", file_reference)?;

    // No on-behalf submissions.
    let learner_id = actor.id;

    let submission = sqlx::query_as::<_, Submission>(&format!(
        "INSERT INTO project_submissions \
         (project_id, learner_id, submitted_at, file_reference, score, grading_note, created_at, updated_at) \
         VALUES (?, ?, ?, ?, 0, NULL, ?, ?) RETURNING {SUBMISSION_COLUMNS}"
    ))
    .bind(project_id)
    .bind(learner_id)
    .bind(now)
    .bind(file_reference.trim())
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await?;

    tracing::info!(
        submission_id = submission.id,
        project_id,
        course_id,
        learner_id,
        "project submitted"
    );
    Ok(submission)
}

/// Sets the score and, when given, the note. Returns `(before, after)`.
pub async fn grade_submission(
    pool: &SqlitePool,
    actor: &Actor,
    submission_id: i64,
    score: i64,
    note: Option<String>,
    now: DateTime<Utc>,
) -> Result<(Submission, Submission), GradeError> {
    policy::authorize(actor, Resource::Submission, Action::Grade)?;
    let existing = sqlx::query_as::<_, Submission>(&format!(
        "SELECT {SUBMISSION_COLUMNS} FROM project_submissions WHERE id = ?"
    ))
    .bind(submission_id)
    .fetch_optional(pool)
    .await?
    .ok_or(GradeError::NotFound(submission_id))?;

    if !(MIN_SCORE..=MAX_SCORE).contains(&score) {
        return Err(GradeError::ScoreOutOfRange(score));
    }

    let graded = sqlx::query_as::<_, Submission>(&format!(
        "UPDATE project_submissions SET score = ?, grading_note = COALESCE(?, grading_note), updated_at = ? \
         WHERE id = ? RETURNING {SUBMISSION_COLUMNS}"
    ))
    .bind(score)
    .bind(note)
    .bind(now)
    .bind(submission_id)
    .fetch_one(pool)
    .await?;

    tracing::info!(submission_id, score, actor_id = actor.id, "submission graded");
    Ok((existing, graded))
}

pub async fn list_submissions(
    pool: &SqlitePool,
    actor: &Actor,
    course_id: i64,
    project_id: i64,
) -> Result<Vec<Submission>, SubmitError> {
    policy::authorize(actor, Resource::Submission, Action::List)?;
    find_course(pool, course_id)
        .await?
        .ok_or(SubmitError::CourseNotFound(course_id))?;
    find_project(pool, course_id, project_id)
        .await?
        .ok_or(SubmitError::ProjectNotFound { course_id, project_id })?;

    let rows = sqlx::query_as::<_, Submission>(&format!(
        "SELECT {SUBMISSION_COLUMNS} FROM project_submissions WHERE project_id = ? ORDER BY submitted_at, id"
    ))
    .bind(project_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_failures_are_forbidden() {
        let now = Utc::now();
        assert_eq!(AppError::from(SubmitError::TooEarly { opens_at: now }).kind(), "forbidden");
        assert_eq!(AppError::from(SubmitError::TooLate { closed_at: now }).kind(), "forbidden");
    }

    #[test]
    fn score_range_reports_the_score_field() {
        match AppError::from(GradeError::ScoreOutOfRange(150)) {
            AppError::Validation { field, message } => {
                assert_eq!(field, "score");
                assert!(message.contains("150"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
