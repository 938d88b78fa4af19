use std::fmt;

use super::actor::{Actor, Role};
use super::ownership::{self, AccessLevel};
use super::Denied;
use crate::models::course::Course;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Course,
    Class,
    Project,
    Submission,
    Attendance,
    Enrollment,
    User,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Resource::Course => "course",
            Resource::Class => "class",
            Resource::Project => "project",
            Resource::Submission => "project submission",
            Resource::Attendance => "attendance",
            Resource::Enrollment => "enrollment",
            Resource::User => "user",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Create,
    Read,
    List,
    Update,
    Delete,
    Grade,
    Transition,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Action::Create => "create",
            Action::Read => "read",
            Action::List => "list",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::Grade => "grade",
            Action::Transition => "change the status of",
        })
    }
}

/// How far a role's permission reaches once the role itself is allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grant {
    /// No further scoping.
    Unrestricted,
    /// Only on courses the acting mentor owns.
    OwningMentor,
    /// Only on the actor's own records; any other target id is ignored.
    SelfOnly,
}

impl Grant {
    /// Applies the ownership half of the grant. Call after the course is known to exist.
    pub fn enforce_on(self, actor: &Actor, course: &Course) -> Result<(), Denied> {
        match self {
            Grant::OwningMentor => ownership::authorize(actor, course, AccessLevel::Write),
            Grant::Unrestricted | Grant::SelfOnly => Ok(()),
        }
    }

    /// Resolves whose record the action targets.
    pub fn subject(self, actor: &Actor, requested: Option<i64>) -> Option<i64> {
        match self {
            Grant::SelfOnly => Some(actor.id),
            Grant::Unrestricted | Grant::OwningMentor => requested,
        }
    }
}

pub struct Rule {
    pub resource: Resource,
    pub action: Action,
    pub grants: &'static [(Role, Grant)],
}

const ANY_AUTHENTICATED: &[(Role, Grant)] = &[
    (Role::Admin, Grant::Unrestricted),
    (Role::Mentor, Grant::Unrestricted),
    (Role::Student, Grant::Unrestricted),
];
const ADMIN_ONLY: &[(Role, Grant)] = &[(Role::Admin, Grant::Unrestricted)];
const ADMIN_OR_OWNER: &[(Role, Grant)] = &[(Role::Admin, Grant::Unrestricted), (Role::Mentor, Grant::OwningMentor)];
const ADMIN_OR_LEARNER: &[(Role, Grant)] = &[(Role::Admin, Grant::Unrestricted), (Role::Student, Grant::SelfOnly)];

macro_rules! rule {
    ($resource:ident, $action:ident, $grants:expr) => {
        Rule {
            resource: Resource::$resource,
            action: Action::$action,
            grants: $grants,
        }
    };
}

/// Who may invoke which action. A `(resource, action)` pair missing here is denied to everyone.
pub const RULES: &[Rule] = &[
    // A mentor creating a course always becomes its owner.
    rule!(Course, Create, &[(Role::Admin, Grant::Unrestricted), (Role::Mentor, Grant::SelfOnly)]),
    rule!(Course, Read, ANY_AUTHENTICATED),
    rule!(Course, List, ANY_AUTHENTICATED),
    rule!(Course, Update, ADMIN_OR_OWNER),
    rule!(Course, Delete, ADMIN_ONLY),
    rule!(Class, Create, ADMIN_OR_OWNER),
    rule!(Class, Read, ANY_AUTHENTICATED),
    rule!(Class, List, ANY_AUTHENTICATED),
    rule!(Class, Update, ADMIN_OR_OWNER),
    rule!(Class, Delete, ADMIN_OR_OWNER),
    rule!(Project, Create, ADMIN_OR_OWNER),
    rule!(Project, Read, ANY_AUTHENTICATED),
    rule!(Project, List, ANY_AUTHENTICATED),
    rule!(Project, Update, ADMIN_OR_OWNER),
    rule!(Project, Delete, ADMIN_OR_OWNER),
    rule!(Submission, Create, &[(Role::Student, Grant::SelfOnly)]),
    rule!(Submission, List, ANY_AUTHENTICATED),
    rule!(Submission, Grade, &[(Role::Mentor, Grant::Unrestricted), (Role::Admin, Grant::Unrestricted)]),
    rule!(Attendance, Create, ADMIN_OR_LEARNER),
    rule!(Attendance, List, ADMIN_OR_OWNER),
    rule!(Attendance, Delete, ADMIN_ONLY),
    rule!(Enrollment, Create, ADMIN_OR_LEARNER),
    rule!(Enrollment, List, ADMIN_OR_OWNER),
    rule!(Enrollment, Transition, ADMIN_ONLY),
    rule!(User, Read, &[(Role::Admin, Grant::Unrestricted), (Role::Mentor, Grant::Unrestricted)]),
    rule!(User, List, &[(Role::Admin, Grant::Unrestricted), (Role::Mentor, Grant::Unrestricted)]),
    rule!(User, Update, ADMIN_ONLY),
    rule!(User, Delete, ADMIN_ONLY),
];

pub fn rule_for(resource: Resource, action: Action) -> Option<&'static Rule> {
    RULES
        .iter()
        .find(|rule| rule.resource == resource && rule.action == action)
}

/// Role-membership check: the first and cheapest rejection for every action.
pub fn authorize(actor: &Actor, resource: Resource, action: Action) -> Result<Grant, Denied> {
    let grant = rule_for(resource, action).and_then(|rule| {
        rule.grants
            .iter()
            .find(|(role, _)| *role == actor.role)
            .map(|(_, grant)| *grant)
    });

    match grant {
        Some(grant) => {
            tracing::debug!(
                actor_id = actor.id,
                role = %actor.role,
                resource = %resource,
                action = %action,
                grant = ?grant,
                "role allowed"
            );
            Ok(grant)
        }
        None => {
            tracing::debug!(
                actor_id = actor.id,
                role = %actor.role,
                resource = %resource,
                action = %action,
                "role denied"
            );
            Err(Denied::role(actor, resource, action))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STUDENT: Actor = Actor { id: 1, role: Role::Student };
    const MENTOR: Actor = Actor { id: 2, role: Role::Mentor };
    const ADMIN: Actor = Actor { id: 3, role: Role::Admin };

    fn grant(actor: Actor, resource: Resource, action: Action) -> Option<Grant> {
        authorize(&actor, resource, action).ok()
    }

    #[test]
    fn every_pair_appears_at_most_once() {
        for (i, a) in RULES.iter().enumerate() {
            for b in &RULES[i + 1..] {
                assert!(
                    !(a.resource == b.resource && a.action == b.action),
                    "duplicate rule for {} {}",
                    a.action,
                    a.resource
                );
            }
        }
    }

    #[test]
    fn course_rules() {
        assert_eq!(grant(STUDENT, Resource::Course, Action::Create), None);
        assert_eq!(grant(MENTOR, Resource::Course, Action::Create), Some(Grant::SelfOnly));
        assert_eq!(grant(ADMIN, Resource::Course, Action::Create), Some(Grant::Unrestricted));
        assert_eq!(grant(STUDENT, Resource::Course, Action::Read), Some(Grant::Unrestricted));
        assert_eq!(grant(MENTOR, Resource::Course, Action::Update), Some(Grant::OwningMentor));
        assert_eq!(grant(MENTOR, Resource::Course, Action::Delete), None);
        assert_eq!(grant(ADMIN, Resource::Course, Action::Delete), Some(Grant::Unrestricted));
    }

    #[test]
    fn class_and_project_writes_are_scoped_to_owners() {
        for resource in [Resource::Class, Resource::Project] {
            for action in [Action::Create, Action::Update, Action::Delete] {
                assert_eq!(grant(STUDENT, resource, action), None);
                assert_eq!(grant(MENTOR, resource, action), Some(Grant::OwningMentor));
                assert_eq!(grant(ADMIN, resource, action), Some(Grant::Unrestricted));
            }
            assert_eq!(grant(STUDENT, resource, Action::Read), Some(Grant::Unrestricted));
        }
    }

    #[test]
    fn submissions_are_created_by_students_and_graded_by_staff() {
        assert_eq!(grant(STUDENT, Resource::Submission, Action::Create), Some(Grant::SelfOnly));
        assert_eq!(grant(MENTOR, Resource::Submission, Action::Create), None);
        assert_eq!(grant(ADMIN, Resource::Submission, Action::Create), None);
        assert_eq!(grant(STUDENT, Resource::Submission, Action::Grade), None);
        assert!(grant(MENTOR, Resource::Submission, Action::Grade).is_some());
        assert!(grant(ADMIN, Resource::Submission, Action::Grade).is_some());
    }

    #[test]
    fn attendance_and_enrollment_rules() {
        assert_eq!(grant(STUDENT, Resource::Attendance, Action::Create), Some(Grant::SelfOnly));
        assert_eq!(grant(MENTOR, Resource::Attendance, Action::Create), None);
        assert_eq!(grant(STUDENT, Resource::Attendance, Action::List), None);
        assert_eq!(grant(MENTOR, Resource::Attendance, Action::List), Some(Grant::OwningMentor));
        assert_eq!(grant(MENTOR, Resource::Attendance, Action::Delete), None);

        assert_eq!(grant(STUDENT, Resource::Enrollment, Action::Create), Some(Grant::SelfOnly));
        assert_eq!(grant(MENTOR, Resource::Enrollment, Action::Create), None);
        assert_eq!(grant(STUDENT, Resource::Enrollment, Action::Transition), None);
        assert_eq!(grant(MENTOR, Resource::Enrollment, Action::Transition), None);
        assert_eq!(grant(ADMIN, Resource::Enrollment, Action::Transition), Some(Grant::Unrestricted));
    }

    #[test]
    fn user_administration_rules() {
        assert_eq!(grant(STUDENT, Resource::User, Action::Read), None);
        assert!(grant(MENTOR, Resource::User, Action::Read).is_some());
        assert_eq!(grant(MENTOR, Resource::User, Action::Update), None);
        assert!(grant(ADMIN, Resource::User, Action::Update).is_some());
        assert_eq!(grant(MENTOR, Resource::User, Action::Delete), None);
    }

    #[test]
    fn unlisted_pairs_are_denied() {
        assert!(authorize(&ADMIN, Resource::Submission, Action::Delete).is_err());
        assert!(authorize(&ADMIN, Resource::Enrollment, Action::Delete).is_err());
        // Submissions are only listed per project, never fetched one at a time.
        assert!(authorize(&STUDENT, Resource::Submission, Action::Read).is_err());
    }

    #[test]
    fn self_only_grants_ignore_the_requested_subject() {
        assert_eq!(Grant::SelfOnly.subject(&STUDENT, Some(42)), Some(STUDENT.id));
        assert_eq!(Grant::Unrestricted.subject(&ADMIN, Some(42)), Some(42));
        assert_eq!(Grant::Unrestricted.subject(&ADMIN, None), None);
    }
}
