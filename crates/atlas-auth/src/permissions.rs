//! Roles and the authenticated caller.

use atlas_core::traits::CallerContext;
use atlas_core::Id;
use serde::{Deserialize, Serialize};

/// User roles. Editors and admins may mutate content; members are
/// read-only apart from their own profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Editor,
    Member,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Editor => "editor",
            Self::Member => "member",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Self::Admin),
            "editor" => Some(Self::Editor),
            "member" => Some(Self::Member),
            _ => None,
        }
    }

    pub fn can_edit_content(&self) -> bool {
        matches!(self, Self::Admin | Self::Editor)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The authenticated caller as seen by handlers.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Id,
    pub role: Role,
    pub email: Option<String>,
}

impl CurrentUser {
    pub fn new(id: Id, role: Role) -> Self {
        Self {
            id,
            role,
            email: None,
        }
    }
}

impl CallerContext for CurrentUser {
    fn user_id(&self) -> Id {
        self.id
    }

    fn can_edit_content(&self) -> bool {
        self.role.can_edit_content()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse_roundtrip() {
        for role in [Role::Admin, Role::Editor, Role::Member] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("root"), None);
    }

    #[test]
    fn test_edit_rights() {
        assert!(CurrentUser::new(1, Role::Admin).can_edit_content());
        assert!(CurrentUser::new(1, Role::Editor).can_edit_content());
        assert!(!CurrentUser::new(1, Role::Member).can_edit_content());
    }
}
