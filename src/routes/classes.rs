use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;

use crate::app::AppState;
use crate::authz::Actor;
use crate::errors::AppResult;
use crate::events::{log_activity_with_context, RequestContext};
use crate::models::class::{Class, ClassCreateRequest, ClassUpdateRequest};
use crate::services::classes;

#[utoipa::path(
    get,
    path = "/api/courses/{course_id}/classes",
    tag = "Classes",
    security(("bearer_auth" = [])),
    params(("course_id" = i64, Path, description = "Course id")),
    responses((status = 200, description = "Classes of the course", body = [Class]))
)]
pub async fn list_classes(
    State(state): State<AppState>,
    actor: Actor,
    Path(course_id): Path<i64>,
) -> AppResult<Json<Vec<Class>>> {
    Ok(Json(classes::list_classes(&state.pool, &actor, course_id).await?))
}

#[utoipa::path(
    post,
    path = "/api/courses/{course_id}/classes",
    tag = "Classes",
    security(("bearer_auth" = [])),
    params(("course_id" = i64, Path, description = "Course id")),
    request_body = ClassCreateRequest,
    responses(
        (status = 201, description = "Class scheduled", body = Class),
        (status = 403, description = "Not an admin or the owning mentor")
    )
)]
pub async fn create_class(
    State(state): State<AppState>,
    actor: Actor,
    headers: HeaderMap,
    Path(course_id): Path<i64>,
    Json(payload): Json<ClassCreateRequest>,
) -> AppResult<(StatusCode, Json<Class>)> {
    let class = classes::create_class(&state.pool, &actor, course_id, payload).await?;

    log_activity_with_context(
        &state.event_bus,
        "created",
        Some(actor.id),
        &class,
        None,
        Some(RequestContext::from_headers(&headers)),
    );

    Ok((StatusCode::CREATED, Json(class)))
}

#[utoipa::path(
    get,
    path = "/api/courses/{course_id}/classes/{class_id}",
    tag = "Classes",
    security(("bearer_auth" = [])),
    params(
        ("course_id" = i64, Path, description = "Course id"),
        ("class_id" = i64, Path, description = "Class id")
    ),
    responses((status = 200, description = "Class detail", body = Class))
)]
pub async fn get_class(
    State(state): State<AppState>,
    actor: Actor,
    Path((course_id, class_id)): Path<(i64, i64)>,
) -> AppResult<Json<Class>> {
    Ok(Json(classes::get_class(&state.pool, &actor, course_id, class_id).await?))
}

#[utoipa::path(
    put,
    path = "/api/courses/{course_id}/classes/{class_id}",
    tag = "Classes",
    security(("bearer_auth" = [])),
    params(
        ("course_id" = i64, Path, description = "Course id"),
        ("class_id" = i64, Path, description = "Class id")
    ),
    request_body = ClassUpdateRequest,
    responses(
        (status = 200, description = "Class updated", body = Class),
        (status = 403, description = "Not an admin or the owning mentor")
    )
)]
pub async fn update_class(
    State(state): State<AppState>,
    actor: Actor,
    headers: HeaderMap,
    Path((course_id, class_id)): Path<(i64, i64)>,
    Json(payload): Json<ClassUpdateRequest>,
) -> AppResult<Json<Class>> {
    let (before, after) = classes::update_class(&state.pool, &actor, course_id, class_id, payload).await?;

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
    path = "/api/courses/{course_id}/classes/{class_id}",
    tag = "Classes",
    security(("bearer_auth" = [])),
    params(
        ("course_id" = i64, Path, description = "Course id"),
        ("class_id" = i64, Path, description = "Class id")
    ),
    responses((status = 204, description = "Class removed"))
)]
pub async fn delete_class(
    State(state): State<AppState>,
    actor: Actor,
    headers: HeaderMap,
    Path((course_id, class_id)): Path<(i64, i64)>,
) -> AppResult<StatusCode> {
    let removed = classes::delete_class(&state.pool, &actor, course_id, class_id).await?;

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
