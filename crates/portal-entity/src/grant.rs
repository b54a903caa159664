//! Module grant entity model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::permission::Action;

/// Capabilities a role holds on one functional module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ModuleGrant {
    /// The role this grant belongs to.
    pub role_id: Uuid,
    /// Code of the module, e.g. `"articles"`.
    pub module_code: String,
    /// May read.
    pub can_view: bool,
    /// May create.
    pub can_create: bool,
    /// May update.
    pub can_update: bool,
    /// May delete.
    pub can_delete: bool,
}

impl ModuleGrant {
    /// Actions whose flag is set, in canonical order.
    pub fn granted_actions(&self) -> Vec<Action> {
        [
            (self.can_view, Action::View),
            (self.can_create, Action::Create),
            (self.can_update, Action::Update),
            (self.can_delete, Action::Delete),
        ]
        .into_iter()
        .filter_map(|(granted, action)| granted.then_some(action))
        .collect()
    }
}
