//! In-memory directory for single-node development and tests.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use portal_core::result::AppResult;
use portal_entity::{ModuleGrant, Role, User};

use super::DirectoryRepository;

#[derive(Debug, Default)]
struct InnerState {
    users: HashMap<Uuid, User>,
    roles: HashMap<Uuid, Role>,
    assignments: HashMap<Uuid, HashSet<Uuid>>,
    grants: Vec<ModuleGrant>,
}

/// Directory held entirely in memory behind a Tokio `RwLock`.
#[derive(Debug, Clone, Default)]
pub struct MemoryDirectory {
    state: Arc<RwLock<InnerState>>,
}

impl MemoryDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a user.
    pub async fn insert_user(&self, user: User) {
        self.state.write().await.users.insert(user.id, user);
    }

    /// Inserts or replaces a role.
    pub async fn insert_role(&self, role: Role) {
        self.state.write().await.roles.insert(role.id, role);
    }

    /// Assigns a role to a user.
    pub async fn assign_role(&self, user_id: Uuid, role_id: Uuid) {
        self.state
            .write()
            .await
            .assignments
            .entry(user_id)
            .or_default()
            .insert(role_id);
    }

    /// Removes a role from a user. Returns whether it was assigned.
    pub async fn revoke_role(&self, user_id: Uuid, role_id: Uuid) -> bool {
        self.state
            .write()
            .await
            .assignments
            .get_mut(&user_id)
            .is_some_and(|roles| roles.remove(&role_id))
    }

    /// Adds a module grant.
    pub async fn insert_grant(&self, grant: ModuleGrant) {
        self.state.write().await.grants.push(grant);
    }

    /// Flips a user's active flag.
    pub async fn set_active(&self, user_id: Uuid, active: bool) {
        if let Some(user) = self.state.write().await.users.get_mut(&user_id) {
            user.is_active = active;
        }
    }
}

#[async_trait]
impl DirectoryRepository for MemoryDirectory {
    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state
            .users
            .values()
            .find(|user| user.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_user_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn roles_for_user(&self, user_id: Uuid) -> AppResult<Vec<Role>> {
        let state = self.state.read().await;
        let mut roles: Vec<Role> = state
            .assignments
            .get(&user_id)
            .into_iter()
            .flatten()
            .filter_map(|role_id| state.roles.get(role_id).cloned())
            .collect();
        roles.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(roles)
    }

    async fn grants_for_roles(&self, role_ids: &[Uuid]) -> AppResult<Vec<ModuleGrant>> {
        let state = self.state.read().await;
        Ok(state
            .grants
            .iter()
            .filter(|grant| role_ids.contains(&grant.role_id))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn user(email: &str) -> User {
        User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            name: "Test".to_string(),
            password_hash: String::new(),
            is_super: false,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    fn role(code: &str) -> Role {
        Role {
            id: Uuid::new_v4(),
            code: code.to_string(),
            name: code.to_string(),
            is_super: false,
        }
    }

    #[tokio::test]
    async fn test_email_lookup_ignores_case() {
        let directory = MemoryDirectory::new();
        directory.insert_user(user("Editor@Example.com")).await;

        let found = directory
            .find_user_by_email("editor@example.com")
            .await
            .expect("lookup");
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn test_roles_and_grants_follow_assignments() {
        let directory = MemoryDirectory::new();
        let member = user("a@example.com");
        let editor = role("editor");
        let viewer = role("viewer");
        directory.insert_user(member.clone()).await;
        directory.insert_role(editor.clone()).await;
        directory.insert_role(viewer.clone()).await;
        directory.assign_role(member.id, editor.id).await;
        directory
            .insert_grant(ModuleGrant {
                role_id: viewer.id,
                module_code: "articles".to_string(),
                can_view: true,
                can_create: false,
                can_update: false,
                can_delete: false,
            })
            .await;

        let roles = directory.roles_for_user(member.id).await.expect("roles");
        assert_eq!(roles, vec![editor.clone()]);

        let grants = directory.grants_for_roles(&[editor.id]).await.expect("grants");
        assert!(grants.is_empty());

        assert!(directory.revoke_role(member.id, editor.id).await);
        assert!(directory.roles_for_user(member.id).await.expect("roles").is_empty());
    }
}
