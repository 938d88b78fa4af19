use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;

use crate::app::AppState;
use crate::authz::Actor;
use crate::errors::AppResult;
use crate::events::{log_activity_with_context, RequestContext};
use crate::routes::optional_body;
use crate::models::attendance::{Attendance, AttendanceCreateRequest};
use crate::services::attendance;
use crate::utils::utc_now;

#[utoipa::path(
    post,
    path = "/api/courses/{course_id}/classes/{class_id}/attendances",
    tag = "Attendance",
    security(("bearer_auth" = [])),
    params(
        ("course_id" = i64, Path, description = "Course id"),
        ("class_id" = i64, Path, description = "Class id")
    ),
    request_body = AttendanceCreateRequest,
    responses(
        (status = 201, description = "Learner marked present", body = Attendance),
        (status = 403, description = "Role not allowed or learner not enrolled"),
        (status = 409, description = "Already marked present for this class")
    )
)]
pub async fn mark_attendance(
    State(state): State<AppState>,
    actor: Actor,
    headers: HeaderMap,
    Path((course_id, class_id)): Path<(i64, i64)>,
    payload: Result<Json<AttendanceCreateRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Attendance>)> {
    let learner_id = optional_body(payload)?.and_then(|body| body.learner_id);
    let record =
        attendance::mark_attendance(&state.pool, &actor, course_id, class_id, learner_id, utc_now()).await?;

    log_activity_with_context(
        &state.event_bus,
        "created",
        Some(actor.id),
        &record,
        None,
        Some(RequestContext::from_headers(&headers)),
    );

    Ok((StatusCode::CREATED, Json(record)))
}

#[utoipa::path(
    get,
    path = "/api/courses/{course_id}/classes/{class_id}/attendances",
    tag = "Attendance",
    security(("bearer_auth" = [])),
    params(
        ("course_id" = i64, Path, description = "Course id"),
        ("class_id" = i64, Path, description = "Class id")
    ),
    responses(
        (status = 200, description = "Attendance of the class", body = [Attendance]),
        (status = 403, description = "Not an admin or the owning mentor")
    )
)]
pub async fn list_attendances(
    State(state): State<AppState>,
    actor: Actor,
    Path((course_id, class_id)): Path<(i64, i64)>,
) -> AppResult<Json<Vec<Attendance>>> {
    Ok(Json(
        attendance::list_class_attendances(&state.pool, &actor, course_id, class_id).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/courses/{course_id}/classes/{class_id}/attendances/{attendance_id}",
    tag = "Attendance",
    security(("bearer_auth" = [])),
    params(
        ("course_id" = i64, Path, description = "Course id"),
        ("class_id" = i64, Path, description = "Class id"),
        ("attendance_id" = i64, Path, description = "Attendance id")
    ),
    responses(
        (status = 204, description = "Attendance removed"),
        (status = 403, description = "Admin only")
    )
)]
pub async fn delete_attendance(
    State(state): State<AppState>,
    actor: Actor,
    headers: HeaderMap,
    Path((course_id, class_id, attendance_id)): Path<(i64, i64, i64)>,
) -> AppResult<StatusCode> {
    let removed = attendance::delete_attendance(&state.pool, &actor, course_id, class_id, attendance_id).await?;

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
