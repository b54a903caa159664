//! Permission resolution and role-based access control enforcement.

pub mod enforcer;
pub mod resolver;

pub use enforcer::{AuthRequirements, RbacEnforcer};
pub use resolver::PermissionResolver;
