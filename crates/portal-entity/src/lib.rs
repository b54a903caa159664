//! # portal-entity
//!
//! Row models for users, roles, and module grants, plus the closed
//! `Module`/`Action` vocabulary that permissions are built from.

pub mod grant;
pub mod permission;
pub mod role;
pub mod user;

pub use grant::ModuleGrant;
pub use permission::{Action, Module, Permission, PermissionParseError};
pub use role::Role;
pub use user::User;
