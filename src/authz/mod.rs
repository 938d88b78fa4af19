//! Authorization: role model, per-resource policy table and course ownership.
//!
//! Every workflow operation checks, in order:
//! 1. role membership against [`policy::RULES`]
//! 2. existence of each path segment, outermost first
//! 3. course ownership where the rule grants [`Grant::OwningMentor`]
//! 4. resource-specific validation

mod actor;
pub mod ownership;
pub mod policy;

pub use actor::{Actor, Role};
pub use ownership::{is_owner, AccessLevel};
pub use policy::{authorize, Action, Grant, Resource};

/// An action refused for role or ownership reasons.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{reason}")]
pub struct Denied {
    pub reason: String,
}

impl Denied {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }

    pub fn role(actor: &Actor, resource: Resource, action: Action) -> Self {
        Self::new(format!("role {} may not {} {}", actor.role, action, resource))
    }

    pub fn not_owner(actor: &Actor, course_id: i64) -> Self {
        Self::new(format!("user {} has no authority over course {}", actor.id, course_id))
    }
}
