use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;

use crate::app::AppState;
use crate::authz::Actor;
use crate::errors::AppResult;
use crate::events::{log_activity_with_context, RequestContext};
use crate::models::course::{Course, CourseCreateRequest, CourseUpdateRequest};
use crate::services::courses;

#[utoipa::path(
    get,
    path = "/api/courses",
    tag = "Courses",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "All courses", body = [Course]))
)]
pub async fn list_courses(State(state): State<AppState>, actor: Actor) -> AppResult<Json<Vec<Course>>> {
    Ok(Json(courses::list_courses(&state.pool, &actor).await?))
}

#[utoipa::path(
    post,
    path = "/api/courses",
    tag = "Courses",
    security(("bearer_auth" = [])),
    request_body = CourseCreateRequest,
    responses(
        (status = 201, description = "Course created", body = Course),
        (status = 400, description = "Invalid name, dates or mentor"),
        (status = 403, description = "Students may not create courses")
    )
)]
pub async fn create_course(
    State(state): State<AppState>,
    actor: Actor,
    headers: HeaderMap,
    Json(payload): Json<CourseCreateRequest>,
) -> AppResult<(StatusCode, Json<Course>)> {
    let course = courses::create_course(&state.pool, &actor, payload).await?;

    log_activity_with_context(
        &state.event_bus,
        "created",
        Some(actor.id),
        &course,
        None,
        Some(RequestContext::from_headers(&headers)),
    );

    Ok((StatusCode::CREATED, Json(course)))
}

#[utoipa::path(
    get,
    path = "/api/courses/{course_id}",
    tag = "Courses",
    security(("bearer_auth" = [])),
    params(("course_id" = i64, Path, description = "Course id")),
    responses(
        (status = 200, description = "Course detail", body = Course),
        (status = 404, description = "No such course")
    )
)]
pub async fn get_course(
    State(state): State<AppState>,
    actor: Actor,
    Path(course_id): Path<i64>,
) -> AppResult<Json<Course>> {
    Ok(Json(courses::get_course(&state.pool, &actor, course_id).await?))
}

#[utoipa::path(
    put,
    path = "/api/courses/{course_id}",
    tag = "Courses",
    security(("bearer_auth" = [])),
    params(("course_id" = i64, Path, description = "Course id")),
    request_body = CourseUpdateRequest,
    responses(
        (status = 200, description = "Course updated", body = Course),
        (status = 403, description = "Not an admin or the owning mentor")
    )
)]
pub async fn update_course(
    State(state): State<AppState>,
    actor: Actor,
    headers: HeaderMap,
    Path(course_id): Path<i64>,
    Json(payload): Json<CourseUpdateRequest>,
) -> AppResult<Json<Course>> {
    let (before, after) = courses::update_course(&state.pool, &actor, course_id, payload).await?;

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
    path = "/api/courses/{course_id}",
    tag = "Courses",
    security(("bearer_auth" = [])),
    params(("course_id" = i64, Path, description = "Course id")),
    responses(
        (status = 204, description = "Course and everything under it removed"),
        (status = 403, description = "Admin only")
    )
)]
pub async fn delete_course(
    State(state): State<AppState>,
    actor: Actor,
    headers: HeaderMap,
    Path(course_id): Path<i64>,
) -> AppResult<StatusCode> {
    let removed = courses::delete_course(&state.pool, &actor, course_id).await?;

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
