use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;

use crate::app::AppState;
use crate::authz::Actor;
use crate::errors::AppResult;
use crate::events::{log_activity_with_context, RequestContext};
use crate::models::submission::{GradeRequest, Submission, SubmissionCreateRequest};
use crate::services::submissions;
use crate::utils::utc_now;

#[utoipa::path(
    post,
    path = "/api/courses/{course_id}/projects/{project_id}/submissions",
    tag = "Submissions",
    security(("bearer_auth" = [])),
    params(
        ("course_id" = i64, Path, description = "Course id"),
        ("project_id" = i64, Path, description = "Project id")
    ),
    request_body = SubmissionCreateRequest,
    responses(
        (status = 201, description = "Submission accepted", body = Submission),
        (status = 403, description = "Not a student, or the course window is closed")
    )
)]
pub async fn submit_project(
    State(state): State<AppState>,
    actor: Actor,
    headers: HeaderMap,
    Path((course_id, project_id)): Path<(i64, i64)>,
    Json(payload): Json<SubmissionCreateRequest>,
) -> AppResult<(StatusCode, Json<Submission>)> {
    let submission = submissions::submit_project(
        &state.pool,
        &actor,
        course_id,
        project_id,
        &payload.file_reference,
        utc_now(),
    )
    .await?;

    log_activity_with_context(
        &state.event_bus,
        "created",
        Some(actor.id),
        &submission,
        None,
        Some(RequestContext::from_headers(&headers)),
    );

    Ok((StatusCode::CREATED, Json(submission)))
}

#[utoipa::path(
    get,
    path = "/api/courses/{course_id}/projects/{project_id}/submissions",
    tag = "Submissions",
    security(("bearer_auth" = [])),
    params(
        ("course_id" = i64, Path, description = "Course id"),
        ("project_id" = i64, Path, description = "Project id")
    ),
    responses((status = 200, description = "Submissions for the project", body = [Submission]))
)]
pub async fn list_submissions(
    State(state): State<AppState>,
    actor: Actor,
    Path((course_id, project_id)): Path<(i64, i64)>,
) -> AppResult<Json<Vec<Submission>>> {
    Ok(Json(
        submissions::list_submissions(&state.pool, &actor, course_id, project_id).await?,
    ))
}

#[utoipa::path(
    put,
    path = "/api/submissions/{submission_id}/grade",
    tag = "Submissions",
    security(("bearer_auth" = [])),
    params(("submission_id" = i64, Path, description = "Submission id")),
    request_body = GradeRequest,
    responses(
        (status = 200, description = "Score recorded", body = Submission),
        (status = 400, description = "Score outside 0..=100"),
        (status = 403, description = "Mentor or admin only")
    )
)]
pub async fn grade_submission(
    State(state): State<AppState>,
    actor: Actor,
    headers: HeaderMap,
    Path(submission_id): Path<i64>,
    Json(payload): Json<GradeRequest>,
) -> AppResult<Json<Submission>> {
    let (before, after) =
        submissions::grade_submission(&state.pool, &actor, submission_id, payload.score, payload.note, utc_now())
            .await?;

    log_activity_with_context(
        &state.event_bus,
        "graded",
        Some(actor.id),
        &after,
        Some(&before),
        Some(RequestContext::from_headers(&headers)),
    );

    Ok(Json(after))
}
