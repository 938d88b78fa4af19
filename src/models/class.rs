use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::events::Loggable;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Class {
    pub id: i64,
    pub course_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Loggable for Class {
    fn entity_type() -> &'static str { "class" }
    fn subject_id(&self) -> i64 { self.id }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ClassCreateRequest {
    #[schema(example = "Ownership and borrowing")]
    pub name: String,
    pub description: Option<String>,
    #[schema(example = "03-02-2025 09:00")]
    pub start_date: String,
    #[schema(example = "03-02-2025 11:00")]
    pub end_date: String,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ClassUpdateRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}
