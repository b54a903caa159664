//! The user/role/grant directory consulted when a session is issued or refreshed.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use portal_core::result::AppResult;
use portal_entity::{ModuleGrant, Role, User};

pub use memory::MemoryDirectory;
pub use postgres::PgDirectoryRepository;

/// Read-only access to identities and their authority.
///
/// Queried only at login and refresh, never per protected request.
#[async_trait]
pub trait DirectoryRepository: Send + Sync + 'static {
    /// Find a user by login identity (case-insensitive).
    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Find a user by primary key.
    async fn find_user_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    /// Roles currently assigned to a user.
    async fn roles_for_user(&self, user_id: Uuid) -> AppResult<Vec<Role>>;

    /// Module grants held by any of the given roles.
    async fn grants_for_roles(&self, role_ids: &[Uuid]) -> AppResult<Vec<ModuleGrant>>;
}
