use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::events::Loggable;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Course {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    /// The owning mentor.
    pub mentor_id: i64,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Course {
    /// Whether `at` falls inside `[start_date, end_date]`.
    pub fn is_open_at(&self, at: DateTime<Utc>) -> bool {
        self.start_date <= at && at <= self.end_date
    }
}

impl Loggable for Course {
    fn entity_type() -> &'static str { "course" }
    fn subject_id(&self) -> i64 { self.id }
}

/// Dates use the `DD-MM-YYYY HH:MM` layout.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CourseCreateRequest {
    #[schema(example = "Rust for Backend Engineers")]
    pub name: String,
    #[schema(example = "Twelve weeks of async services in Rust.")]
    pub description: Option<String>,
    /// Required when an admin creates the course; ignored for mentors.
    pub mentor_id: Option<i64>,
    #[schema(example = "01-02-2025 09:00")]
    pub start_date: String,
    #[schema(example = "30-04-2025 17:00")]
    pub end_date: String,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CourseUpdateRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    /// Admin only.
    pub mentor_id: Option<i64>,
    #[schema(example = "01-02-2025 09:00")]
    pub start_date: Option<String>,
    #[schema(example = "30-05-2025 17:00")]
    pub end_date: Option<String>,
}
