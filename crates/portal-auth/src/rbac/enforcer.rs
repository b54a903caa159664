//! RBAC enforcement: role gates, permission gates, and the admin short-circuit.

use tracing::debug;

use portal_core::config::AuthConfig;
use portal_core::error::AppError;
use portal_entity::Permission;

use super::resolver::PermissionResolver;
use crate::session::SessionPayload;

/// What a protected route demands of its caller.
///
/// Empty lists impose no constraint beyond authentication.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthRequirements {
    /// The caller must hold at least one of these role codes.
    pub allowed_roles: Vec<String>,
    /// The caller must hold every one of these permissions.
    pub required_permissions: Vec<Permission>,
}

impl AuthRequirements {
    /// Authentication only.
    pub fn authenticated() -> Self {
        Self::default()
    }

    /// Requires one of the given role codes.
    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_roles = roles.into_iter().map(Into::into).collect();
        self
    }

    /// Requires all of the given permissions.
    pub fn with_permissions<I>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = Permission>,
    {
        self.required_permissions = permissions.into_iter().collect();
        self
    }
}

/// Enforces role-based access control against a verified session.
#[derive(Debug, Clone)]
pub struct RbacEnforcer {
    admin_roles: Vec<String>,
    editor_roles: Vec<String>,
}

impl RbacEnforcer {
    /// Creates an enforcer with the role tiers from configuration.
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            admin_roles: config.admin_roles.clone(),
            editor_roles: config.editor_roles.clone(),
        }
    }

    /// Super sessions and holders of an admin-tier role.
    pub fn is_admin(&self, session: &SessionPayload) -> bool {
        session.is_super || session.has_any_role(&self.admin_roles)
    }

    /// Admins and holders of an editor-tier role.
    pub fn is_editor(&self, session: &SessionPayload) -> bool {
        self.is_admin(session) || session.has_any_role(&self.editor_roles)
    }

    /// Admin-tier role codes.
    pub fn admin_roles(&self) -> &[String] {
        &self.admin_roles
    }

    /// Requires an admin.
    pub fn require_admin(&self, session: &SessionPayload) -> Result<(), AppError> {
        if self.is_admin(session) {
            Ok(())
        } else {
            debug!(user_id = %session.user.id, "Admin role required");
            Err(AppError::missing_roles(&self.admin_roles))
        }
    }

    /// Requires an editor or admin.
    pub fn require_editor(&self, session: &SessionPayload) -> Result<(), AppError> {
        if self.is_editor(session) {
            Ok(())
        } else {
            debug!(user_id = %session.user.id, "Editor role required");
            Err(AppError::missing_roles(
                self.editor_roles.iter().chain(self.admin_roles.iter()),
            ))
        }
    }

    /// Requires at least one of `allowed` among the session's roles. An empty
    /// `allowed` list admits nobody.
    pub fn require_role<S: AsRef<str>>(
        &self,
        session: &SessionPayload,
        allowed: &[S],
    ) -> Result<(), AppError> {
        if session.has_any_role(allowed) {
            Ok(())
        } else {
            debug!(user_id = %session.user.id, roles = ?session.roles, "No allowed role");
            Err(AppError::missing_roles(
                allowed.iter().map(|role| AsRef::<str>::as_ref(role)),
            ))
        }
    }

    /// Requires a single permission. Super sessions always pass.
    pub fn require_permission(
        &self,
        session: &SessionPayload,
        permission: Permission,
    ) -> Result<(), AppError> {
        if PermissionResolver::has_permission(session, permission) {
            Ok(())
        } else {
            debug!(user_id = %session.user.id, %permission, "Missing permission");
            Err(AppError::missing_permissions([permission]))
        }
    }

    /// Required permissions the session does not hold.
    pub fn missing_permissions(
        &self,
        session: &SessionPayload,
        required: &[Permission],
    ) -> Vec<Permission> {
        required
            .iter()
            .copied()
            .filter(|permission| !PermissionResolver::has_permission(session, *permission))
            .collect()
    }

    /// Applies every requirement, unless the caller is an admin.
    pub fn authorize(
        &self,
        session: &SessionPayload,
        requirements: &AuthRequirements,
    ) -> Result<(), AppError> {
        if self.is_admin(session) {
            return Ok(());
        }

        if !requirements.allowed_roles.is_empty() {
            self.require_role(session, &requirements.allowed_roles)?;
        }

        let missing = self.missing_permissions(session, &requirements.required_permissions);
        if missing.is_empty() {
            Ok(())
        } else {
            debug!(user_id = %session.user.id, missing = ?missing, "Missing permissions");
            Err(AppError::missing_permissions(missing))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use portal_core::error::ErrorKind;
    use portal_entity::{Action, Module};
    use uuid::Uuid;

    use super::*;
    use crate::session::SessionUser;

    fn enforcer() -> RbacEnforcer {
        RbacEnforcer::new(&AuthConfig::default())
    }

    fn session(roles: &[&str], permissions: &[Permission], is_super: bool) -> SessionPayload {
        SessionPayload {
            user: SessionUser {
                id: Uuid::new_v4(),
                email: "user@example.com".to_string(),
                name: "User".to_string(),
            },
            roles: roles.iter().map(|r| r.to_string()).collect(),
            permissions: permissions.iter().copied().collect::<BTreeSet<_>>(),
            is_super,
        }
    }

    #[test]
    fn test_editor_missing_permission_is_forbidden() {
        let editor = session(&["editor"], &[Module::Articles.can(Action::View)], false);
        let requirements = AuthRequirements::authenticated().with_permissions([
            Module::Articles.can(Action::View),
            Module::Articles.can(Action::Delete),
        ]);

        let err = enforcer()
            .authorize(&editor, &requirements)
            .expect_err("should be forbidden");
        assert_eq!(err.kind, ErrorKind::Forbidden);
        assert_eq!(
            err.message,
            "Forbidden - Required permission(s): articles:DELETE"
        );
    }

    #[test]
    fn test_admins_short_circuit_every_requirement() {
        let requirements = AuthRequirements::authenticated()
            .with_roles(["hr"])
            .with_permissions([Module::Jobs.can(Action::Delete)]);

        let root = session(&[], &[], true);
        assert!(enforcer().authorize(&root, &requirements).is_ok());

        let admin = session(&["admin"], &[], false);
        assert!(enforcer().authorize(&admin, &requirements).is_ok());
    }

    #[test]
    fn test_role_gate_needs_intersection() {
        let editor = session(&["editor"], &[], false);
        assert!(enforcer().require_role(&editor, &["editor", "hr"]).is_ok());

        let err = enforcer()
            .require_role(&editor, &["hr"])
            .expect_err("should be forbidden");
        assert_eq!(err.message, "Forbidden - Required role(s): hr");
    }

    #[test]
    fn test_empty_role_gate_admits_nobody() {
        let editor = session(&["editor"], &[], false);
        let err = enforcer()
            .require_role::<&str>(&editor, &[])
            .expect_err("empty role list should be forbidden");
        assert_eq!(err.kind, ErrorKind::Forbidden);
    }

    #[test]
    fn test_authorize_treats_empty_roles_as_unset() {
        let editor = session(&["editor"], &[], false);
        assert!(enforcer()
            .authorize(&editor, &AuthRequirements::default())
            .is_ok());
    }

    #[test]
    fn test_tiers() {
        let enforcer = enforcer();
        let viewer = session(&["viewer"], &[], false);
        let editor = session(&["editor"], &[], false);
        let admin = session(&["admin"], &[], false);

        assert!(enforcer.require_editor(&viewer).is_err());
        assert!(enforcer.require_editor(&editor).is_ok());
        assert!(enforcer.require_editor(&admin).is_ok());
        assert!(enforcer.require_admin(&editor).is_err());
        assert!(enforcer.require_admin(&admin).is_ok());
    }

    #[test]
    fn test_require_permission_honours_super() {
        let enforcer = enforcer();
        let permission = Module::Settings.can(Action::Update);
        assert!(enforcer.require_permission(&session(&[], &[], true), permission).is_ok());
        assert!(enforcer.require_permission(&session(&["admin"], &[], false), permission).is_err());
    }
}
