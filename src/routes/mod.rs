pub mod attendance;
pub mod auth;
pub mod classes;
pub mod courses;
pub mod enrollments;
pub mod health;
pub mod projects;
pub mod submissions;
pub mod users;

use axum::extract::rejection::JsonRejection;
use axum::Json;

use crate::errors::AppResult;

/// A body that may be omitted entirely. A request without a JSON content type
/// reads as `None`; a JSON body that fails to parse is still rejected.
pub(crate) fn optional_body<T>(payload: Result<Json<T>, JsonRejection>) -> AppResult<Option<T>> {
    match payload {
        Ok(Json(body)) => Ok(Some(body)),
        Err(JsonRejection::MissingJsonContentType(_)) => Ok(None),
        Err(rejection) => Err(rejection.into()),
    }
}
