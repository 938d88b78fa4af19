use sqlx::SqlitePool;

use super::{course_or_404, find_project, PROJECT_COLUMNS};
use crate::authz::{policy, Action, Actor, Resource};
use crate::errors::{AppError, AppResult};
use crate::models::project::{Project, ProjectCreateRequest, ProjectUpdateRequest};
use crate::utils::utc_now;
use crate::validation::{parse_timestamp, validate_deadline, validate_name};

async fn project_or_404(pool: &SqlitePool, course_id: i64, project_id: i64) -> AppResult<Project> {
    find_project(pool, course_id, project_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("project {project_id} not found in course {course_id}")))
}

pub async fn create_project(
    pool: &SqlitePool,
    actor: &Actor,
    course_id: i64,
    req: ProjectCreateRequest,
) -> AppResult<Project> {
    let grant = policy::authorize(actor, Resource::Project, Action::Create)?;
    let course = course_or_404(pool, course_id).await?;
    grant.enforce_on(actor, &course)?;

    validate_name("name", &req.name)?;
    let deadline = parse_timestamp("deadline", &req.deadline)?;
    validate_deadline(deadline, course.end_date)?;

    let now = utc_now();
    let project = sqlx::query_as::<_, Project>(&format!(
        "INSERT INTO projects (course_id, name, description, deadline, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?) RETURNING {PROJECT_COLUMNS}"
    ))
    .bind(course_id)
    .bind(req.name.trim())
    .bind(&req.description)
    .bind(deadline)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await?;

    tracing::info!(course_id, project_id = project.id, actor_id = actor.id, "project created");
    Ok(project)
}

pub async fn list_projects(pool: &SqlitePool, actor: &Actor, course_id: i64) -> AppResult<Vec<Project>> {
    policy::authorize(actor, Resource::Project, Action::List)?;
    course_or_404(pool, course_id).await?;

    let projects = sqlx::query_as::<_, Project>(&format!(
        "SELECT {PROJECT_COLUMNS} FROM projects WHERE course_id = ? ORDER BY deadline, id"
    ))
    .bind(course_id)
    .fetch_all(pool)
    .await?;
    Ok(projects)
}

pub async fn get_project(pool: &SqlitePool, actor: &Actor, course_id: i64, project_id: i64) -> AppResult<Project> {
    policy::authorize(actor, Resource::Project, Action::Read)?;
    course_or_404(pool, course_id).await?;
    project_or_404(pool, course_id, project_id).await
}

/// Returns `(before, after)`.
pub async fn update_project(
    pool: &SqlitePool,
    actor: &Actor,
    course_id: i64,
    project_id: i64,
    req: ProjectUpdateRequest,
) -> AppResult<(Project, Project)> {
    let grant = policy::authorize(actor, Resource::Project, Action::Update)?;
    let course = course_or_404(pool, course_id).await?;
    let existing = project_or_404(pool, course_id, project_id).await?;
    grant.enforce_on(actor, &course)?;

    let name = match req.name {
        Some(name) => {
            validate_name("name", &name)?;
            name.trim().to_string()
        }
        None => existing.name.clone(),
    };
    let deadline = match req.deadline.as_deref() {
        Some(raw) => {
            let deadline = parse_timestamp("deadline", raw)?;
            validate_deadline(deadline, course.end_date)?;
            deadline
        }
        None => existing.deadline,
    };
    let description = req.description.or_else(|| existing.description.clone());

    let updated = sqlx::query_as::<_, Project>(&format!(
        "UPDATE projects SET name = ?, description = ?, deadline = ?, updated_at = ? \
         WHERE id = ? RETURNING {PROJECT_COLUMNS}"
    ))
    .bind(&name)
    .bind(&description)
    .bind(deadline)
    .bind(utc_now())
    .bind(project_id)
    .fetch_one(pool)
    .await?;

    tracing::info!(course_id, project_id, actor_id = actor.id, "project updated");
    Ok((existing, updated))
}

pub async fn delete_project(pool: &SqlitePool, actor: &Actor, course_id: i64, project_id: i64) -> AppResult<Project> {
    let grant = policy::authorize(actor, Resource::Project, Action::Delete)?;
    let course = course_or_404(pool, course_id).await?;
    let project = project_or_404(pool, course_id, project_id).await?;
    grant.enforce_on(actor, &course)?;

    sqlx::query("DELETE FROM projects WHERE id = ?")
        .bind(project_id)
        .execute(pool)
        .await?;

    tracing::info!(course_id, project_id, actor_id = actor.id, "project deleted");
    Ok(project)
}
