use super::actor::{Actor, Role};
use super::Denied;
use crate::models::course::Course;

/// Authority an action needs over a course and everything nested under it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessLevel {
    Read,
    Write,
    Delete,
}

/// Admin owns everything; a mentor owns the courses assigned to them.
pub fn is_owner(actor: &Actor, course: &Course) -> bool {
    match actor.role {
        Role::Admin => true,
        Role::Mentor => actor.id == course.mentor_id,
        Role::Student => false,
    }
}

pub fn authorize(actor: &Actor, course: &Course, level: AccessLevel) -> Result<(), Denied> {
    let allowed = match level {
        AccessLevel::Read => true,
        AccessLevel::Write => is_owner(actor, course),
        AccessLevel::Delete => actor.has_role(Role::Admin),
    };

    if allowed {
        Ok(())
    } else {
        tracing::debug!(
            actor_id = actor.id,
            role = %actor.role,
            course_id = course.id,
            level = ?level,
            "course ownership check failed"
        );
        Err(Denied::not_owner(actor, course.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn course_owned_by(mentor_id: i64) -> Course {
        let now = Utc::now();
        Course {
            id: 1,
            name: "Systems Programming".to_string(),
            description: None,
            mentor_id,
            start_date: now,
            end_date: now + chrono::Duration::days(30),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn only_the_assigned_mentor_owns_a_course() {
        let course = course_owned_by(7);
        assert!(is_owner(&Actor::mentor(7), &course));
        assert!(!is_owner(&Actor::mentor(8), &course));
        assert!(!is_owner(&Actor::student(7), &course));
        assert!(is_owner(&Actor::admin(99), &course));
    }

    #[test]
    fn read_is_open_to_everyone() {
        let course = course_owned_by(7);
        for actor in [Actor::student(1), Actor::mentor(2), Actor::admin(3)] {
            assert!(authorize(&actor, &course, AccessLevel::Read).is_ok());
        }
    }

    #[test]
    fn write_needs_ownership_and_delete_needs_admin() {
        let course = course_owned_by(7);
        assert!(authorize(&Actor::mentor(7), &course, AccessLevel::Write).is_ok());
        assert!(authorize(&Actor::mentor(8), &course, AccessLevel::Write).is_err());
        assert!(authorize(&Actor::mentor(7), &course, AccessLevel::Delete).is_err());
        assert!(authorize(&Actor::admin(1), &course, AccessLevel::Delete).is_ok());
    }
}
