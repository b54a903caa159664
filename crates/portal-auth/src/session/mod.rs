//! Session payloads and the login/refresh/logout lifecycle.

pub mod manager;
pub mod payload;

pub use manager::{LoginResult, RefreshResult, SessionManager, SessionTokens};
pub use payload::{SessionPayload, SessionUser};
