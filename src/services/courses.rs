use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use super::{course_or_404, find_user_role, COURSE_COLUMNS};
use crate::authz::{policy, Action, Actor, Resource, Role};
use crate::errors::{AppError, AppResult};
use crate::models::course::{Course, CourseCreateRequest, CourseUpdateRequest};
use crate::utils::utc_now;
use crate::validation::{format_timestamp, parse_timestamp, validate_deadline, validate_name, validate_window};

async fn require_mentor(pool: &SqlitePool, mentor_id: i64) -> AppResult<()> {
    match find_user_role(pool, mentor_id).await? {
        Some(Role::Mentor) => Ok(()),
        Some(role) => Err(AppError::validation(
            "mentor_id",
            format!("user {mentor_id} is a {role}, not a mentor"),
        )),
        None => Err(AppError::not_found(format!("mentor {mentor_id} not found"))),
    }
}

/// A course may not end before the latest deadline among its projects.
async fn require_end_covers_projects(pool: &SqlitePool, course_id: i64, end: DateTime<Utc>) -> AppResult<()> {
    let latest: Option<DateTime<Utc>> =
        sqlx::query_scalar("SELECT deadline FROM projects WHERE course_id = ? ORDER BY deadline DESC LIMIT 1")
            .bind(course_id)
            .fetch_optional(pool)
            .await?;

    match latest {
        Some(deadline) if validate_deadline(deadline, end).is_err() => Err(AppError::validation(
            "end_date",
            format!(
                "end date must not be earlier than the latest project deadline ({})",
                format_timestamp(&deadline)
            ),
        )),
        _ => Ok(()),
    }
}

pub async fn create_course(pool: &SqlitePool, actor: &Actor, req: CourseCreateRequest) -> AppResult<Course> {
    let grant = policy::authorize(actor, Resource::Course, Action::Create)?;

    let mentor_id = grant
        .subject(actor, req.mentor_id)
        .ok_or_else(|| AppError::validation("mentor_id", "mentor_id is required when an admin creates a course"))?;
    require_mentor(pool, mentor_id).await?;

    validate_name("name", &req.name)?;
    let start = parse_timestamp("start_date", &req.start_date)?;
    let end = parse_timestamp("end_date", &req.end_date)?;
    validate_window(start, end)?;

    let now = utc_now();
    let course = sqlx::query_as::<_, Course>(&format!(
        "INSERT INTO courses (name, description, mentor_id, start_date, end_date, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING {COURSE_COLUMNS}"
    ))
    .bind(req.name.trim())
    .bind(&req.description)
    .bind(mentor_id)
    .bind(start)
    .bind(end)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await?;

    tracing::info!(course_id = course.id, mentor_id, actor_id = actor.id, "course created");
    Ok(course)
}

pub async fn list_courses(pool: &SqlitePool, actor: &Actor) -> AppResult<Vec<Course>> {
    policy::authorize(actor, Resource::Course, Action::List)?;

    let courses = sqlx::query_as::<_, Course>(&format!("SELECT {COURSE_COLUMNS} FROM courses ORDER BY id"))
        .fetch_all(pool)
        .await?;
    Ok(courses)
}

pub async fn get_course(pool: &SqlitePool, actor: &Actor, course_id: i64) -> AppResult<Course> {
    policy::authorize(actor, Resource::Course, Action::Read)?;

    course_or_404(pool, course_id).await
}

/// Partial update. The merged window is re-validated and may not end before any
/// project deadline; only an admin may reassign the mentor.
/// Returns `(before, after)`.
pub async fn update_course(
    pool: &SqlitePool,
    actor: &Actor,
    course_id: i64,
    req: CourseUpdateRequest,
) -> AppResult<(Course, Course)> {
    let grant = policy::authorize(actor, Resource::Course, Action::Update)?;
    let existing = course_or_404(pool, course_id).await?;
    grant.enforce_on(actor, &existing)?;

    let mentor_id = match req.mentor_id {
        Some(id) if id != existing.mentor_id => {
            if !actor.has_role(Role::Admin) {
                return Err(AppError::forbidden("only an admin may reassign a course"));
            }
            require_mentor(pool, id).await?;
            id
        }
        _ => existing.mentor_id,
    };

    let name = match req.name {
        Some(name) => {
            validate_name("name", &name)?;
            name.trim().to_string()
        }
        None => existing.name.clone(),
    };
    let start = match req.start_date.as_deref() {
        Some(raw) => parse_timestamp("start_date", raw)?,
        None => existing.start_date,
    };
    let end = match req.end_date.as_deref() {
        Some(raw) => parse_timestamp("end_date", raw)?,
        None => existing.end_date,
    };
    validate_window(start, end)?;
    if end < existing.end_date {
        require_end_covers_projects(pool, course_id, end).await?;
    }
    let description = req.description.or_else(|| existing.description.clone());

    let updated = sqlx::query_as::<_, Course>(&format!(
        "UPDATE courses SET name = ?, description = ?, mentor_id = ?, start_date = ?, end_date = ?, updated_at = ? \
         WHERE id = ? RETURNING {COURSE_COLUMNS}"
    ))
    .bind(&name)
    .bind(&description)
    .bind(mentor_id)
    .bind(start)
    .bind(end)
    .bind(utc_now())
    .bind(course_id)
    .fetch_one(pool)
    .await?;

    tracing::info!(course_id, actor_id = actor.id, "course updated");
    Ok((existing, updated))
}

/// Removes the course together with its classes, projects, enrollments and attendance.
pub async fn delete_course(pool: &SqlitePool, actor: &Actor, course_id: i64) -> AppResult<Course> {
    let grant = policy::authorize(actor, Resource::Course, Action::Delete)?;
    let course = course_or_404(pool, course_id).await?;
    grant.enforce_on(actor, &course)?;

    sqlx::query("DELETE FROM courses WHERE id = ?")
        .bind(course_id)
        .execute(pool)
        .await?;

    tracing::info!(course_id, actor_id = actor.id, "course deleted");
    Ok(course)
}
