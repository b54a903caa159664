//! Extractors for the authority established by the auth middleware.

pub mod session;

pub use session::{AuthSession, HybridAccess};
