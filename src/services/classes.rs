use sqlx::SqlitePool;

use super::{course_or_404, find_class, CLASS_COLUMNS};
use crate::authz::{policy, Action, Actor, Resource};
use crate::errors::{AppError, AppResult};
use crate::models::class::{Class, ClassCreateRequest, ClassUpdateRequest};
use crate::utils::utc_now;
use crate::validation::{parse_timestamp, validate_date_range, validate_name, validate_window};

async fn class_or_404(pool: &SqlitePool, course_id: i64, class_id: i64) -> AppResult<Class> {
    find_class(pool, course_id, class_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("class {class_id} not found in course {course_id}")))
}

pub async fn create_class(
    pool: &SqlitePool,
    actor: &Actor,
    course_id: i64,
    req: ClassCreateRequest,
) -> AppResult<Class> {
    let grant = policy::authorize(actor, Resource::Class, Action::Create)?;
    let course = course_or_404(pool, course_id).await?;
    grant.enforce_on(actor, &course)?;

    validate_name("name", &req.name)?;
    let (start, end) = validate_date_range(&req.start_date, &req.end_date)?;

    let now = utc_now();
    let class = sqlx::query_as::<_, Class>(&format!(
        "INSERT INTO classes (course_id, name, description, start_date, end_date, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING {CLASS_COLUMNS}"
    ))
    .bind(course_id)
    .bind(req.name.trim())
    .bind(&req.description)
    .bind(start)
    .bind(end)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await?;

    tracing::info!(course_id, class_id = class.id, actor_id = actor.id, "class created");
    Ok(class)
}

pub async fn list_classes(pool: &SqlitePool, actor: &Actor, course_id: i64) -> AppResult<Vec<Class>> {
    policy::authorize(actor, Resource::Class, Action::List)?;
    course_or_404(pool, course_id).await?;

    let classes = sqlx::query_as::<_, Class>(&format!(
        "SELECT {CLASS_COLUMNS} FROM classes WHERE course_id = ? ORDER BY start_date, id"
    ))
    .bind(course_id)
    .fetch_all(pool)
    .await?;
    Ok(classes)
}

pub async fn get_class(pool: &SqlitePool, actor: &Actor, course_id: i64, class_id: i64) -> AppResult<Class> {
    policy::authorize(actor, Resource::Class, Action::Read)?;
    course_or_404(pool, course_id).await?;
    class_or_404(pool, course_id, class_id).await
}

/// Returns `(before, after)`.
pub async fn update_class(
    pool: &SqlitePool,
    actor: &Actor,
    course_id: i64,
    class_id: i64,
    req: ClassUpdateRequest,
) -> AppResult<(Class, Class)> {
    let grant = policy::authorize(actor, Resource::Class, Action::Update)?;
    let course = course_or_404(pool, course_id).await?;
    let existing = class_or_404(pool, course_id, class_id).await?;
    grant.enforce_on(actor, &course)?;

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
    let description = req.description.or_else(|| existing.description.clone());

    let updated = sqlx::query_as::<_, Class>(&format!(
        "UPDATE classes SET name = ?, description = ?, start_date = ?, end_date = ?, updated_at = ? \
         WHERE id = ? RETURNING {CLASS_COLUMNS}"
    ))
    .bind(&name)
    .bind(&description)
    .bind(start)
    .bind(end)
    .bind(utc_now())
    .bind(class_id)
    .fetch_one(pool)
    .await?;

    tracing::info!(course_id, class_id, actor_id = actor.id, "class updated");
    Ok((existing, updated))
}

pub async fn delete_class(pool: &SqlitePool, actor: &Actor, course_id: i64, class_id: i64) -> AppResult<Class> {
    let grant = policy::authorize(actor, Resource::Class, Action::Delete)?;
    let course = course_or_404(pool, course_id).await?;
    let class = class_or_404(pool, course_id, class_id).await?;
    grant.enforce_on(actor, &course)?;

    sqlx::query("DELETE FROM classes WHERE id = ?")
        .bind(class_id)
        .execute(pool)
        .await?;

    tracing::info!(course_id, class_id, actor_id = actor.id, "class deleted");
    Ok(class)
}
