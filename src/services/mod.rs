//! Workflow operations. Each takes the acting [`Actor`](crate::authz::Actor)
//! explicitly and runs the authorization checks before touching storage.

pub mod attendance;
pub mod classes;
pub mod courses;
pub mod enrollments;
pub mod projects;
pub mod submissions;
pub mod users;

use sqlx::SqlitePool;

use crate::authz::Role;
use crate::errors::{AppError, AppResult};
use crate::models::class::Class;
use crate::models::course::Course;
use crate::models::project::Project;

pub(crate) const COURSE_COLUMNS: &str =
    "id, name, description, mentor_id, start_date, end_date, created_at, updated_at";
pub(crate) const CLASS_COLUMNS: &str =
    "id, course_id, name, description, start_date, end_date, created_at, updated_at";
pub(crate) const PROJECT_COLUMNS: &str = "id, course_id, name, description, deadline, created_at, updated_at";

pub(crate) async fn find_course(pool: &SqlitePool, course_id: i64) -> Result<Option<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!("SELECT {COURSE_COLUMNS} FROM courses WHERE id = ?"))
        .bind(course_id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn course_or_404(pool: &SqlitePool, course_id: i64) -> AppResult<Course> {
    find_course(pool, course_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("course {course_id} not found")))
}

/// A class only resolves through the course it belongs to.
pub(crate) async fn find_class(pool: &SqlitePool, course_id: i64, class_id: i64) -> Result<Option<Class>, sqlx::Error> {
    sqlx::query_as::<_, Class>(&format!(
        "SELECT {CLASS_COLUMNS} FROM classes WHERE id = ? AND course_id = ?"
    ))
    .bind(class_id)
    .bind(course_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn find_project(
    pool: &SqlitePool,
    course_id: i64,
    project_id: i64,
) -> Result<Option<Project>, sqlx::Error> {
    sqlx::query_as::<_, Project>(&format!(
        "SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ? AND course_id = ?"
    ))
    .bind(project_id)
    .bind(course_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn find_user_role(pool: &SqlitePool, user_id: i64) -> Result<Option<Role>, sqlx::Error> {
    sqlx::query_scalar::<_, Role>("SELECT role FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await
}
