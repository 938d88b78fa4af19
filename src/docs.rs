use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::openapi::server::Server;
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::authz::Role;
use crate::models;
use crate::routes;

#[derive(OpenApi)]
#[openapi(
    paths(
        routes::health::health,
        routes::auth::register,
        routes::auth::login,
        routes::auth::me,
        routes::users::list_users,
        routes::users::get_user,
        routes::users::update_role,
        routes::users::delete_user,
        routes::courses::list_courses,
        routes::courses::create_course,
        routes::courses::get_course,
        routes::courses::update_course,
        routes::courses::delete_course,
        routes::classes::list_classes,
        routes::classes::create_class,
        routes::classes::get_class,
        routes::classes::update_class,
        routes::classes::delete_class,
        routes::projects::list_projects,
        routes::projects::create_project,
        routes::projects::get_project,
        routes::projects::update_project,
        routes::projects::delete_project,
        routes::enrollments::enroll,
        routes::enrollments::list_enrollments,
        routes::enrollments::transition_status,
        routes::attendance::mark_attendance,
        routes::attendance::list_attendances,
        routes::attendance::delete_attendance,
        routes::submissions::submit_project,
        routes::submissions::list_submissions,
        routes::submissions::grade_submission
    ),
    components(
        schemas(
            Role,
            routes::health::HealthResponse,
            models::user::User,
            models::user::AuthResponse,
            models::user::LoginRequest,
            models::user::RegisterRequest,
            models::user::RoleUpdateRequest,
            models::course::Course,
            models::course::CourseCreateRequest,
            models::course::CourseUpdateRequest,
            models::class::Class,
            models::class::ClassCreateRequest,
            models::class::ClassUpdateRequest,
            models::project::Project,
            models::project::ProjectCreateRequest,
            models::project::ProjectUpdateRequest,
            models::enrollment::Enrollment,
            models::enrollment::EnrollmentStatus,
            models::enrollment::EnrollRequest,
            models::enrollment::StatusUpdateRequest,
            models::attendance::Attendance,
            models::attendance::AttendanceCreateRequest,
            models::submission::Submission,
            models::submission::SubmissionCreateRequest,
            models::submission::GradeRequest
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "Health", description = "Liveness"),
        (name = "Auth", description = "Registration and login"),
        (name = "Users", description = "Account administration"),
        (name = "Courses", description = "Courses and their owning mentors"),
        (name = "Classes", description = "Scheduled class sessions"),
        (name = "Projects", description = "Course projects"),
        (name = "Enrollments", description = "Enrollment requests and status changes"),
        (name = "Attendance", description = "Class attendance"),
        (name = "Submissions", description = "Project submissions and grading")
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// The generated document with a local `servers` entry for Swagger UI.
pub fn build_openapi(port: u16) -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    doc.servers = Some(vec![Server::new(format!("http://localhost:{port}"))]);
    doc
}

/// Serves the document at `/api-docs/openapi.json` and Swagger UI at `/docs`.
pub fn swagger_routes(doc: utoipa::openapi::OpenApi) -> SwaggerUi {
    SwaggerUi::new("/docs").url("/api-docs/openapi.json", doc)
}
