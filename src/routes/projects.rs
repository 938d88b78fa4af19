use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;

use crate::app::AppState;
use crate::authz::Actor;
use crate::errors::AppResult;
use crate::events::{log_activity_with_context, RequestContext};
use crate::models::project::{Project, ProjectCreateRequest, ProjectUpdateRequest};
use crate::services::projects;

#[utoipa::path(
    get,
    path = "/api/courses/{course_id}/projects",
    tag = "Projects",
    security(("bearer_auth" = [])),
    params(("course_id" = i64, Path, description = "Course id")),
    responses((status = 200, description = "Projects of the course", body = [Project]))
)]
pub async fn list_projects(
    State(state): State<AppState>,
    actor: Actor,
    Path(course_id): Path<i64>,
) -> AppResult<Json<Vec<Project>>> {
    Ok(Json(projects::list_projects(&state.pool, &actor, course_id).await?))
}

#[utoipa::path(
    post,
    path = "/api/courses/{course_id}/projects",
    tag = "Projects",
    security(("bearer_auth" = [])),
    params(("course_id" = i64, Path, description = "Course id")),
    request_body = ProjectCreateRequest,
    responses(
        (status = 201, description = "Project created", body = Project),
        (status = 400, description = "Deadline unparsable or after the course end"),
        (status = 403, description = "Not an admin or the owning mentor")
    )
)]
pub async fn create_project(
    State(state): State<AppState>,
    actor: Actor,
    headers: HeaderMap,
    Path(course_id): Path<i64>,
    Json(payload): Json<ProjectCreateRequest>,
) -> AppResult<(StatusCode, Json<Project>)> {
    let project = projects::create_project(&state.pool, &actor, course_id, payload).await?;

    log_activity_with_context(
        &state.event_bus,
        "created",
        Some(actor.id),
        &project,
        None,
        Some(RequestContext::from_headers(&headers)),
    );

    Ok((StatusCode::CREATED, Json(project)))
}

#[utoipa::path(
    get,
    path = "/api/courses/{course_id}/projects/{project_id}",
    tag = "Projects",
    security(("bearer_auth" = [])),
    params(
        ("course_id" = i64, Path, description = "Course id"),
        ("project_id" = i64, Path, description = "Project id")
    ),
    responses((status = 200, description = "Project detail", body = Project))
)]
pub async fn get_project(
    State(state): State<AppState>,
    actor: Actor,
    Path((course_id, project_id)): Path<(i64, i64)>,
) -> AppResult<Json<Project>> {
    Ok(Json(projects::get_project(&state.pool, &actor, course_id, project_id).await?))
}

#[utoipa::path(
    put,
    path = "/api/courses/{course_id}/projects/{project_id}",
    tag = "Projects",
    security(("bearer_auth" = [])),
    params(
        ("course_id" = i64, Path, description = "Course id"),
        ("project_id" = i64, Path, description = "Project id")
    ),
    request_body = ProjectUpdateRequest,
    responses(
        (status = 200, description = "Project updated", body = Project),
        (status = 403, description = "Not an admin or the owning mentor")
    )
)]
pub async fn update_project(
    State(state): State<AppState>,
    actor: Actor,
    headers: HeaderMap,
    Path((course_id, project_id)): Path<(i64, i64)>,
    Json(payload): Json<ProjectUpdateRequest>,
) -> AppResult<Json<Project>> {
    let (before, after) = projects::update_project(&state.pool, &actor, course_id, project_id, payload).await?;

    log_activity_with_context(
        &state.event_bus,
        "updated",
        Some(actor.id),
        &after,
        Some(&before),
        Some(RequestContext::from_headers(&headers)),
    );

    Ok(Json(after))
}

#[utoipa::path(
    delete,
    path = "/api/courses/{course_id}/projects/{project_id}",
    tag = "Projects",
    security(("bearer_auth" = [])),
    params(
        ("course_id" = i64, Path, description = "Course id"),
        ("project_id" = i64, Path, description = "Project id")
    ),
    responses((status = 204, description = "Project and its submissions removed"))
)]
pub async fn delete_project(
    State(state): State<AppState>,
    actor: Actor,
    headers: HeaderMap,
    Path((course_id, project_id)): Path<(i64, i64)>,
) -> AppResult<StatusCode> {
    let removed = projects::delete_project(&state.pool, &actor, course_id, project_id).await?;

    log_activity_with_context(
        &state.event_bus,
        "deleted",
        Some(actor.id),
        &removed,
        None,
        Some(RequestContext::from_headers(&headers)),
    );

    Ok(StatusCode::NO_CONTENT)
}
