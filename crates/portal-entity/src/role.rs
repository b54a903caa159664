//! Role entity model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A named bundle of module grants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Role {
    /// Unique role identifier.
    pub id: Uuid,
    /// Stable code, e.g. `"admin"` or `"editor"`.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Members of a super role bypass every permission check.
    pub is_super: bool,
}
