use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::events::Loggable;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Attendance {
    pub id: i64,
    pub learner_id: i64,
    pub class_id: i64,
    pub course_id: i64,
    pub attended: bool,
    pub attended_at: DateTime<Utc>,
}

impl Loggable for Attendance {
    fn entity_type() -> &'static str { "attendance" }
    fn subject_id(&self) -> i64 { self.id }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct AttendanceCreateRequest {
    /// Required when an admin marks attendance; students always mark themselves.
    pub learner_id: Option<i64>,
}
