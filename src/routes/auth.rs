use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;

use crate::app::AppState;
use crate::authz::Actor;
use crate::errors::AppResult;
use crate::events::{log_activity_with_context, RequestContext};
use crate::models::user::{AuthResponse, LoginRequest, RegisterRequest, User};
use crate::services::users;

#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Student account created", body = AuthResponse),
        (status = 400, description = "Invalid username, email or password"),
        (status = 409, description = "Username or email already in use")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let user = users::register(&state.pool, &payload).await?;
    let token = state.jwt.encode(user.id, user.role)?;

    log_activity_with_context(
        &state.event_bus,
        "registered",
        Some(user.id),
        &user,
        None,
        Some(RequestContext::from_headers(&headers)),
    );

    Ok((StatusCode::CREATED, Json(AuthResponse { token, user })))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let user = users::login(&state.pool, &payload).await?;
    let token = state.jwt.encode(user.id, user.role)?;

    log_activity_with_context(
        &state.event_bus,
        "login",
        Some(user.id),
        &user,
        None,
        Some(RequestContext::from_headers(&headers)),
    );

    Ok(Json(AuthResponse { token, user }))
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user", body = User),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn me(State(state): State<AppState>, actor: Actor) -> AppResult<Json<User>> {
    Ok(Json(users::me(&state.pool, &actor).await?))
}
