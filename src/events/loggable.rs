use serde::{Deserialize, Serialize};

/// Retention class of an audit entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Grades, role changes, deletions and terminal enrollment outcomes.
    Critical,
    #[default]
    Important,
    /// Logins and similar high-volume events.
    Noise,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::Important => "important",
            Severity::Noise => "noise",
        }
    }
}

/// Entities that can appear in the audit trail as `<entity_type>.<action>`.
pub trait Loggable: Serialize + Send + Sync {
    fn entity_type() -> &'static str;

    fn subject_id(&self) -> i64;

    fn severity(&self) -> Severity {
        Severity::Important
    }

    fn severity_for_action(&self, action: &str) -> Severity {
        match action {
            "deleted" => Severity::Critical,
            _ => self.severity(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Note {
        id: i64,
    }

    impl Loggable for Note {
        fn entity_type() -> &'static str {
            "note"
        }

        fn subject_id(&self) -> i64 {
            self.id
        }
    }

    #[test]
    fn deletions_are_critical_by_default() {
        let note = Note { id: 1 };
        assert_eq!(note.severity_for_action("deleted"), Severity::Critical);
        assert_eq!(note.severity_for_action("created"), Severity::Important);
        assert_eq!(Severity::Noise.as_str(), "noise");
    }
}
