use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::events::Loggable;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Project {
    pub id: i64,
    pub course_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub deadline: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Loggable for Project {
    fn entity_type() -> &'static str { "project" }
    fn subject_id(&self) -> i64 { self.id }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ProjectCreateRequest {
    #[schema(example = "Build a key-value store")]
    pub name: String,
    pub description: Option<String>,
    #[schema(example = "15-04-2025 23:59")]
    pub deadline: String,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ProjectUpdateRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub deadline: Option<String>,
}
