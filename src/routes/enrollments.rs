use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;

use crate::app::AppState;
use crate::authz::Actor;
use crate::errors::AppResult;
use crate::events::{log_activity_with_context, RequestContext};
use crate::routes::optional_body;
use crate::models::enrollment::{EnrollRequest, Enrollment, StatusUpdateRequest};
use crate::services::enrollments;
use crate::utils::utc_now;

#[utoipa::path(
    post,
    path = "/api/courses/{course_id}/enrollments",
    tag = "Enrollments",
    security(("bearer_auth" = [])),
    params(("course_id" = i64, Path, description = "Course id")),
    request_body = EnrollRequest,
    responses(
        (status = 201, description = "Pending enrollment created", body = Enrollment),
        (status = 400, description = "Admin omitted learner_id"),
        (status = 403, description = "Mentors cannot enroll"),
        (status = 404, description = "Course or learner not found"),
        (status = 409, description = "Learner already has an enrollment in this course")
    )
)]
pub async fn enroll(
    State(state): State<AppState>,
    actor: Actor,
    headers: HeaderMap,
    Path(course_id): Path<i64>,
    payload: Result<Json<EnrollRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Enrollment>)> {
    let learner_id = optional_body(payload)?.and_then(|body| body.learner_id);
    let enrollment = enrollments::enroll(&state.pool, &actor, course_id, learner_id, utc_now()).await?;

    log_activity_with_context(
        &state.event_bus,
        "created",
        Some(actor.id),
        &enrollment,
        None,
        Some(RequestContext::from_headers(&headers)),
    );

    Ok((StatusCode::CREATED, Json(enrollment)))
}

#[utoipa::path(
    get,
    path = "/api/courses/{course_id}/enrollments",
    tag = "Enrollments",
    security(("bearer_auth" = [])),
    params(("course_id" = i64, Path, description = "Course id")),
    responses(
        (status = 200, description = "Enrollments of the course", body = [Enrollment]),
        (status = 403, description = "Not an admin or the owning mentor")
    )
)]
pub async fn list_enrollments(
    State(state): State<AppState>,
    actor: Actor,
    Path(course_id): Path<i64>,
) -> AppResult<Json<Vec<Enrollment>>> {
    Ok(Json(enrollments::list_course_enrollments(&state.pool, &actor, course_id).await?))
}

#[utoipa::path(
    put,
    path = "/api/courses/{course_id}/enrollments/{learner_id}",
    tag = "Enrollments",
    security(("bearer_auth" = [])),
    params(
        ("course_id" = i64, Path, description = "Course id"),
        ("learner_id" = i64, Path, description = "Learner id")
    ),
    request_body = StatusUpdateRequest,
    responses(
        (status = 200, description = "Status changed", body = Enrollment),
        (status = 403, description = "Admin only"),
        (status = 404, description = "No enrollment for this learner and course"),
        (status = 422, description = "Transition not allowed from the current status")
    )
)]
pub async fn transition_status(
    State(state): State<AppState>,
    actor: Actor,
    headers: HeaderMap,
    Path((course_id, learner_id)): Path<(i64, i64)>,
    Json(payload): Json<StatusUpdateRequest>,
) -> AppResult<Json<Enrollment>> {
    let (before, after) =
        enrollments::transition_status(&state.pool, &actor, course_id, learner_id, payload.status, utc_now()).await?;

    log_activity_with_context(
        &state.event_bus,
        "status_changed",
        Some(actor.id),
        &after,
        Some(&before),
        Some(RequestContext::from_headers(&headers)),
    );

    Ok(Json(after))
}
