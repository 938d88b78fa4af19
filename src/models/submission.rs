use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::events::{Loggable, Severity};

pub const MIN_SCORE: i64 = 0;
pub const MAX_SCORE: i64 = 100;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Submission {
    pub id: i64,
    pub project_id: i64,
    pub learner_id: i64,
    pub submitted_at: DateTime<Utc>,
    /// Opaque handle to the uploaded artefact.
    pub file_reference: String,
    pub score: i64,
    pub grading_note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Loggable for Submission {
    fn entity_type() -> &'static str { "submission" }
    fn subject_id(&self) -> i64 { self.id }
    fn severity_for_action(&self, action: &str) -> Severity {
        match action {
            "graded" | "deleted" => Severity::Critical,
            _ => Severity::Important,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SubmissionCreateRequest {
    #[schema(example = "uploads/kv-store-ada-1718000000.zip")]
    pub file_reference: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct GradeRequest {
    #[schema(example = 87)]
    pub score: i64,
    #[schema(example = "Solid compaction strategy, missing fsync on rename.")]
    pub note: Option<String>,
}
