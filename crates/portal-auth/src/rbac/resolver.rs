//! Effective-permission resolution.
//!
//! Permissions are never stored per user: they are the union of the grants
//! of every role the user holds, computed at login and embedded in the
//! session.

use std::collections::{BTreeSet, HashSet};

use tracing::warn;
use uuid::Uuid;

use portal_entity::{Module, ModuleGrant, Permission, Role, User};

use crate::session::SessionPayload;

/// Stateless resolver from roles and grants to effective permissions.
#[derive(Debug, Clone, Copy, Default)]
pub struct PermissionResolver;

impl PermissionResolver {
    /// Union of `module:ACTION` for every set flag of every grant held by `roles`.
    ///
    /// Grants belonging to roles outside `roles` are ignored. Grants naming an
    /// unknown module are skipped, so they never widen access.
    pub fn compute_effective_permissions(
        roles: &[Role],
        grants: &[ModuleGrant],
    ) -> BTreeSet<Permission> {
        let role_ids: HashSet<Uuid> = roles.iter().map(|role| role.id).collect();

        grants
            .iter()
            .filter(|grant| role_ids.contains(&grant.role_id))
            .filter_map(|grant| match grant.module_code.parse::<Module>() {
                Ok(module) => Some((module, grant)),
                Err(e) => {
                    warn!(
                        role_id = %grant.role_id,
                        module = %grant.module_code,
                        error = %e,
                        "Skipping grant for unknown module"
                    );
                    None
                }
            })
            .flat_map(|(module, grant)| {
                grant
                    .granted_actions()
                    .into_iter()
                    .map(move |action| module.can(action))
            })
            .collect()
    }

    /// True when the user's own flag is set or any assigned role is super.
    pub fn is_super_admin(user: &User, roles: &[Role]) -> bool {
        user.is_super || roles.iter().any(|role| role.is_super)
    }

    /// True when the session is super or holds `permission`.
    pub fn has_permission(session: &SessionPayload, permission: Permission) -> bool {
        session.is_super || session.permissions.contains(&permission)
    }
}
