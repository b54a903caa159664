//! The authority snapshot embedded in every token.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use portal_entity::{Permission, User};

/// Identity of the session holder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    /// User ID.
    pub id: Uuid,
    /// Login identity.
    pub email: String,
    /// Display name.
    pub name: String,
}

impl From<&User> for SessionUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
        }
    }
}

/// Who the caller is and what they may do, computed once at login or refresh.
///
/// Never mutated: a change of roles or grants only takes effect when a new
/// token is issued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionPayload {
    /// The authenticated user.
    pub user: SessionUser,
    /// Codes of every assigned role.
    pub roles: Vec<String>,
    /// Effective permissions across all roles.
    pub permissions: BTreeSet<Permission>,
    /// Whether the user or any of their roles is super.
    pub is_super: bool,
}

impl SessionPayload {
    /// Whether the session holds the given role code.
    pub fn has_role(&self, code: &str) -> bool {
        self.roles.iter().any(|role| role == code)
    }

    /// Whether the session holds any of the given role codes.
    pub fn has_any_role<S: AsRef<str>>(&self, codes: &[S]) -> bool {
        codes.iter().any(|code| self.has_role(code.as_ref()))
    }
}
