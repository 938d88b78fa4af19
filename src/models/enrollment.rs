use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::events::{Loggable, Severity};

/// Lifecycle of a learner's membership in a course.
///
/// ```text
/// pending  -> enrolled | failed | cancelled
/// enrolled -> completed | failed | cancelled
/// ```
///
/// `completed`, `failed` and `cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum EnrollmentStatus {
    Pending,
    Enrolled,
    Completed,
    Failed,
    Cancelled,
}

impl EnrollmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnrollmentStatus::Pending => "pending",
            EnrollmentStatus::Enrolled => "enrolled",
            EnrollmentStatus::Completed => "completed",
            EnrollmentStatus::Failed => "failed",
            EnrollmentStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            EnrollmentStatus::Completed | EnrollmentStatus::Failed | EnrollmentStatus::Cancelled
        )
    }

    /// Self-transitions are never allowed.
    pub fn can_transition_to(&self, next: EnrollmentStatus) -> bool {
        use EnrollmentStatus::*;
        matches!(
            (self, next),
            (Pending, Enrolled)
                | (Pending, Failed)
                | (Pending, Cancelled)
                | (Enrolled, Completed)
                | (Enrolled, Failed)
                | (Enrolled, Cancelled)
        )
    }
}

impl fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Enrollment {
    pub id: i64,
    pub learner_id: i64,
    pub course_id: i64,
    pub status: EnrollmentStatus,
    /// Set when the enrollment first becomes `enrolled`.
    pub enrollment_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Enrollment {
    /// Only an `enrolled` learner may attend classes.
    pub fn is_active(&self) -> bool {
        self.status == EnrollmentStatus::Enrolled
    }
}

impl Loggable for Enrollment {
    fn entity_type() -> &'static str { "enrollment" }
    fn subject_id(&self) -> i64 { self.id }
    fn severity_for_action(&self, action: &str) -> Severity {
        match action {
            "status_changed" => Severity::Critical,
            _ => Severity::Important,
        }
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct EnrollRequest {
    /// Required when an admin enrolls someone; students always enroll themselves.
    pub learner_id: Option<i64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct StatusUpdateRequest {
    #[schema(example = "enrolled")]
    pub status: EnrollmentStatus,
}
