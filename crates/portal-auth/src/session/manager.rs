//! Session lifecycle manager: login, refresh, and logout flows.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use portal_core::config::AuthConfig;
use portal_core::error::{AppError, ErrorKind};
use portal_database::DirectoryRepository;
use portal_entity::User;

use super::payload::{SessionPayload, SessionUser};
use crate::jwt::{TokenCodec, TokenType};
use crate::password::PasswordHasher;
use crate::rbac::PermissionResolver;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Ten years; keeps `now + ttl` inside chrono's range.
const MAX_TTL_MINUTES: i64 = 10 * 365 * 24 * 60;

/// The session and access tokens, re-issued on every login and refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionTokens {
    /// Server-only session token; the source of authorization truth.
    pub session_token: String,
    /// Session token expiration.
    pub session_expires_at: DateTime<Utc>,
    /// Client-readable access token for UI state.
    pub access_token: String,
    /// Access token expiration.
    pub access_expires_at: DateTime<Utc>,
}

/// Result of a successful login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResult {
    /// Session and access tokens.
    pub tokens: SessionTokens,
    /// Long-lived refresh token.
    pub refresh_token: String,
    /// Refresh token expiration.
    pub refresh_expires_at: DateTime<Utc>,
    /// The authority that was embedded in the tokens.
    pub session: SessionPayload,
}

/// Result of a successful refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshResult {
    /// Fresh session and access tokens.
    pub tokens: SessionTokens,
    /// The re-read authority.
    pub session: SessionPayload,
}

/// Issues and renews sessions from the directory's current state.
#[derive(Clone)]
pub struct SessionManager {
    directory: Arc<dyn DirectoryRepository>,
    codec: Arc<TokenCodec>,
    password_hasher: PasswordHasher,
    access_ttl: Duration,
    session_ttl: Duration,
    refresh_ttl: Duration,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("access_ttl", &self.access_ttl)
            .field("session_ttl", &self.session_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish()
    }
}

impl SessionManager {
    /// Creates a session manager.
    pub fn new(
        directory: Arc<dyn DirectoryRepository>,
        codec: Arc<TokenCodec>,
        password_hasher: PasswordHasher,
        config: &AuthConfig,
    ) -> Self {
        Self {
            directory,
            codec,
            password_hasher,
            access_ttl: minutes(config.access_ttl_minutes),
            session_ttl: minutes(config.session_ttl_minutes),
            refresh_ttl: minutes(config.refresh_ttl_hours.saturating_mul(60)),
        }
    }

    /// Verifies credentials, reads the user's current roles and grants, and
    /// signs a full token set.
    ///
    /// Unknown identities, inactive accounts, and wrong passwords are
    /// indistinguishable to the caller.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResult, AppError> {
        let Some(user) = self.directory.find_user_by_email(email).await? else {
            debug!("Login for unknown identity");
            return Err(invalid_credentials());
        };

        if !user.can_login() {
            debug!(user_id = %user.id, "Login for inactive user");
            return Err(invalid_credentials());
        }

        let hasher = self.password_hasher;
        let candidate = password.to_string();
        let stored = user.password_hash.clone();
        let valid = tokio::task::spawn_blocking(move || hasher.verify_password(&candidate, &stored))
            .await
            .map_err(|e| AppError::internal(format!("Password verification task failed: {e}")))??;

        if !valid {
            debug!(user_id = %user.id, "Login with wrong password");
            return Err(invalid_credentials());
        }

        let session = self.build_payload(&user).await?;
        let tokens = self.issue_tokens(&session)?;
        let refresh_expires_at = Utc::now() + self.refresh_ttl;
        let refresh_token = self
            .codec
            .encode(&session, TokenType::Refresh, self.refresh_ttl)?;

        info!(
            user_id = %user.id,
            roles = ?session.roles,
            permissions = session.permissions.len(),
            is_super = session.is_super,
            "Login successful"
        );

        Ok(LoginResult {
            tokens,
            refresh_token,
            refresh_expires_at,
            session,
        })
    }

    /// Re-issues the session and access tokens from a refresh token.
    ///
    /// Authority is re-read from the directory, so role and grant changes
    /// take effect here. Users that were removed or deactivated since login
    /// are rejected.
    pub async fn refresh(&self, refresh_token: &str) -> Result<RefreshResult, AppError> {
        let previous = self
            .codec
            .decode(refresh_token, TokenType::Refresh)
            .ok_or_else(AppError::unauthorized)?;

        let user = self
            .directory
            .find_user_by_id(previous.user.id)
            .await?
            .filter(User::can_login)
            .ok_or_else(|| {
                debug!(user_id = %previous.user.id, "Refresh for missing or inactive user");
                AppError::unauthorized()
            })?;

        let session = self.build_payload(&user).await?;
        let tokens = self.issue_tokens(&session)?;

        info!(user_id = %user.id, "Session refreshed");

        Ok(RefreshResult { tokens, session })
    }

    /// Records a logout. Tokens already issued stay valid until they expire.
    pub fn logout(&self, session: Option<&SessionPayload>) {
        match session {
            Some(session) => info!(user_id = %session.user.id, "Logout"),
            None => debug!("Logout without a session"),
        }
    }

    /// Verifies a session or access token.
    pub fn verify(&self, token: &str) -> Option<SessionPayload> {
        self.codec.decode(token, TokenType::Access)
    }

    /// Reads the user's roles and grants and derives their session.
    async fn build_payload(&self, user: &User) -> Result<SessionPayload, AppError> {
        let roles = self.directory.roles_for_user(user.id).await?;
        let role_ids: Vec<_> = roles.iter().map(|role| role.id).collect();
        let grants = self.directory.grants_for_roles(&role_ids).await?;

        Ok(SessionPayload {
            user: SessionUser::from(user),
            roles: roles.iter().map(|role| role.code.clone()).collect(),
            permissions: PermissionResolver::compute_effective_permissions(&roles, &grants),
            is_super: PermissionResolver::is_super_admin(user, &roles),
        })
    }

    fn issue_tokens(&self, session: &SessionPayload) -> Result<SessionTokens, AppError> {
        let now = Utc::now();
        Ok(SessionTokens {
            session_token: self
                .codec
                .encode(session, TokenType::Access, self.session_ttl)?,
            session_expires_at: now + self.session_ttl,
            access_token: self
                .codec
                .encode(session, TokenType::Access, self.access_ttl)?,
            access_expires_at: now + self.access_ttl,
        })
    }
}

fn minutes(value: u64) -> Duration {
    Duration::minutes(i64::try_from(value).unwrap_or(i64::MAX).min(MAX_TTL_MINUTES))
}

fn invalid_credentials() -> AppError {
    AppError::new(ErrorKind::Unauthorized, INVALID_CREDENTIALS)
}
