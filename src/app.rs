use std::sync::Arc;

use axum::http::Method;
use axum::routing::{get, post, put};
use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::errors::AppError;
use crate::events::{init_event_bus, start_activity_listener, EventBus};
use crate::jwt::JwtConfig;
use crate::routes::{attendance, auth, classes, courses, enrollments, health, projects, submissions, users};

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub jwt: Arc<JwtConfig>,
    pub event_bus: EventBus,
}

impl AppState {
    pub fn new(pool: SqlitePool, jwt: JwtConfig, event_bus: EventBus) -> Self {
        Self {
            pool,
            jwt: Arc::new(jwt),
            event_bus,
        }
    }
}

/// Builds the API router and spawns the audit listener. Reads `JWT_SECRET` from the environment.
pub async fn create_app(pool: SqlitePool) -> Result<Router, AppError> {
    let jwt_config = JwtConfig::from_env()?;
    let (event_bus, rx) = init_event_bus();
    tokio::spawn(start_activity_listener(rx, pool.clone()));

    Ok(router(AppState::new(pool, jwt_config, event_bus)))
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_origin(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health::health))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/me", get(auth::me))
        .route("/api/users", get(users::list_users))
        .route("/api/users/:user_id", get(users::get_user).delete(users::delete_user))
        .route("/api/users/:user_id/role", put(users::update_role))
        .route("/api/courses", get(courses::list_courses).post(courses::create_course))
        .route(
            "/api/courses/:course_id",
            get(courses::get_course)
                .put(courses::update_course)
                .delete(courses::delete_course),
        )
        .route(
            "/api/courses/:course_id/classes",
            get(classes::list_classes).post(classes::create_class),
        )
        .route(
            "/api/courses/:course_id/classes/:class_id",
            get(classes::get_class)
                .put(classes::update_class)
                .delete(classes::delete_class),
        )
        .route(
            "/api/courses/:course_id/classes/:class_id/attendances",
            get(attendance::list_attendances).post(attendance::mark_attendance),
        )
        .route(
            "/api/courses/:course_id/classes/:class_id/attendances/:attendance_id",
            axum::routing::delete(attendance::delete_attendance),
        )
        .route(
            "/api/courses/:course_id/projects",
            get(projects::list_projects).post(projects::create_project),
        )
        .route(
            "/api/courses/:course_id/projects/:project_id",
            get(projects::get_project)
                .put(projects::update_project)
                .delete(projects::delete_project),
        )
        .route(
            "/api/courses/:course_id/projects/:project_id/submissions",
            get(submissions::list_submissions).post(submissions::submit_project),
        )
        .route("/api/submissions/:submission_id/grade", put(submissions::grade_submission))
        .route(
            "/api/courses/:course_id/enrollments",
            get(enrollments::list_enrollments).post(enrollments::enroll),
        )
        .route(
            "/api/courses/:course_id/enrollments/:learner_id",
            put(enrollments::transition_status),
        )
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
