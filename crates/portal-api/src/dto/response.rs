//! Response DTOs.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use portal_auth::{SessionPayload, SessionUser};
use portal_entity::Permission;

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// The caller's identity and authority.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    /// The signed-in user.
    pub user: SessionUser,
    /// Assigned role codes.
    pub roles: Vec<String>,
    /// Effective permissions.
    pub permissions: BTreeSet<Permission>,
    /// Super-admin flag.
    pub is_super: bool,
}

impl From<SessionPayload> for SessionResponse {
    fn from(session: SessionPayload) -> Self {
        Self {
            user: session.user,
            roles: session.roles,
            permissions: session.permissions,
            is_super: session.is_super,
        }
    }
}

/// Login and refresh response. The session and refresh tokens travel only
/// in HttpOnly cookies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Access token, for non-browser clients to send as a bearer token.
    pub access_token: String,
    /// Access token expiration.
    pub access_expires_at: DateTime<Utc>,
    /// Session expiration.
    pub session_expires_at: DateTime<Utc>,
    /// The authority embedded in the tokens.
    pub session: SessionResponse,
}

/// Simple message response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Message.
    pub message: String,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Server version.
    pub version: String,
}
