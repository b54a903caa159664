//! # portal-auth
//!
//! Authentication and authorization for the portal edge.
//!
//! ## Modules
//!
//! - `jwt`: signing and verifying compact session tokens
//! - `rbac`: effective-permission resolution and role/permission enforcement
//! - `session`: the session payload and the login/refresh/logout flows
//! - `password`: Argon2id password hashing

pub mod jwt;
pub mod password;
pub mod rbac;
pub mod session;

pub use jwt::{Claims, TokenCodec, TokenType};
pub use password::PasswordHasher;
pub use rbac::{AuthRequirements, PermissionResolver, RbacEnforcer};
pub use session::{
    LoginResult, RefreshResult, SessionManager, SessionPayload, SessionTokens, SessionUser,
};
