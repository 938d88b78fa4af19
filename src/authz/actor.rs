use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The three platform roles. The set is flat: no role implies another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Role {
    Student,
    Mentor,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Mentor => "mentor",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authenticated identity performing one action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: i64,
    pub role: Role,
}

impl Actor {
    pub fn new(id: i64, role: Role) -> Self {
        Self { id, role }
    }

    pub fn admin(id: i64) -> Self {
        Self::new(id, Role::Admin)
    }

    pub fn mentor(id: i64) -> Self {
        Self::new(id, Role::Mentor)
    }

    pub fn student(id: i64) -> Self {
        Self::new(id, Role::Student)
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.role == role
    }

    pub fn is_any_of(&self, roles: &[Role]) -> bool {
        roles.contains(&self.role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_is_not_implicitly_a_mentor() {
        let admin = Actor::admin(1);
        assert!(admin.has_role(Role::Admin));
        assert!(!admin.has_role(Role::Mentor));
        assert!(admin.is_any_of(&[Role::Mentor, Role::Admin]));
        assert!(!admin.is_any_of(&[Role::Mentor, Role::Student]));
    }

    #[test]
    fn roles_serialize_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Mentor).unwrap(), "\"mentor\"");
        let parsed: Role = serde_json::from_str("\"student\"").unwrap();
        assert_eq!(parsed, Role::Student);
    }
}
