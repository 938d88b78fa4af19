use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;

use crate::app::AppState;
use crate::authz::Actor;
use crate::errors::AppResult;
use crate::events::{log_activity_with_context, RequestContext};
use crate::models::user::{RoleUpdateRequest, User};
use crate::services::users;

#[utoipa::path(
    get,
    path = "/api/users",
    tag = "Users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All accounts", body = [User]),
        (status = 403, description = "Students may not list users")
    )
)]
pub async fn list_users(State(state): State<AppState>, actor: Actor) -> AppResult<Json<Vec<User>>> {
    Ok(Json(users::list_users(&state.pool, &actor).await?))
}

#[utoipa::path(
    get,
    path = "/api/users/{user_id}",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(("user_id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "Account detail", body = User),
        (status = 404, description = "No such user")
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    actor: Actor,
    Path(user_id): Path<i64>,
) -> AppResult<Json<User>> {
    Ok(Json(users::get_user(&state.pool, &actor, user_id).await?))
}

#[utoipa::path(
    put,
    path = "/api/users/{user_id}/role",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(("user_id" = i64, Path, description = "User id")),
    request_body = RoleUpdateRequest,
    responses(
        (status = 200, description = "Role changed", body = User),
        (status = 400, description = "Target role must be student or mentor"),
        (status = 403, description = "Admin only")
    )
)]
pub async fn update_role(
    State(state): State<AppState>,
    actor: Actor,
    headers: HeaderMap,
    Path(user_id): Path<i64>,
    Json(payload): Json<RoleUpdateRequest>,
) -> AppResult<Json<User>> {
    let (before, after) = users::update_role(&state.pool, &actor, user_id, payload.role).await?;

    log_activity_with_context(
        &state.event_bus,
        "role_changed",
        Some(actor.id),
        &after,
        Some(&before),
        Some(RequestContext::from_headers(&headers)),
    );

    Ok(Json(after))
}

#[utoipa::path(
    delete,
    path = "/api/users/{user_id}",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(("user_id" = i64, Path, description = "User id")),
    responses(
        (status = 204, description = "Account removed"),
        (status = 409, description = "User still owns courses")
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    actor: Actor,
    headers: HeaderMap,
    Path(user_id): Path<i64>,
) -> AppResult<StatusCode> {
    let removed = users::delete_user(&state.pool, &actor, user_id).await?;

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
