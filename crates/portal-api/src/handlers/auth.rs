//! Auth handlers: login, refresh, logout, session.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::HeaderMap;
use axum_extra::extract::cookie::CookieJar;
use tracing::debug;
use validator::Validate;

use portal_core::error::AppError;

use crate::dto::request::{LoginRequest, RefreshRequest};
use crate::dto::response::{ApiResponse, LoginResponse, MessageResponse, SessionResponse};
use crate::error::ApiError;
use crate::extractors::AuthSession;
use crate::middleware::auth::current_session;
use crate::state::AppState;

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<(CookieJar, Json<ApiResponse<LoginResponse>>), ApiError> {
    let Json(req) = payload.map_err(|rejection| {
        debug!(error = %rejection.body_text(), "Rejected login body");
        AppError::validation("Invalid login request")
    })?;
    req.validate()
        .map_err(|e| AppError::validation(format!("Invalid login request: {e}")))?;

    let result = state.session_manager.login(&req.email, &req.password).await?;
    let jar = state.cookies.issue_login(jar, &result);

    Ok((
        jar,
        Json(ApiResponse::ok(LoginResponse {
            access_token: result.tokens.access_token,
            access_expires_at: result.tokens.access_expires_at,
            session_expires_at: result.tokens.session_expires_at,
            session: result.session.into(),
        })),
    ))
}

/// POST /api/auth/refresh
///
/// Takes the refresh token from its cookie, or from a JSON body.
pub async fn refresh(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Bytes,
) -> Result<(CookieJar, Json<ApiResponse<LoginResponse>>), ApiError> {
    let token = match state.cookies.refresh_token(&jar) {
        Some(token) => token,
        None if !body.is_empty() => {
            serde_json::from_slice::<RefreshRequest>(&body)
                .map_err(|e| {
                    debug!(error = %e, "Rejected refresh body");
                    AppError::validation("Invalid refresh request")
                })?
                .refresh_token
        }
        None => return Err(AppError::unauthorized().into()),
    };

    let result = state.session_manager.refresh(&token).await?;
    let jar = state.cookies.issue_refresh(jar, &result.tokens);

    Ok((
        jar,
        Json(ApiResponse::ok(LoginResponse {
            access_token: result.tokens.access_token,
            access_expires_at: result.tokens.access_expires_at,
            session_expires_at: result.tokens.session_expires_at,
            session: result.session.into(),
        })),
    ))
}

/// POST /api/auth/logout
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
) -> (CookieJar, Json<ApiResponse<MessageResponse>>) {
    let session = current_session(&state, &headers);
    state.session_manager.logout(session.as_ref());

    (
        state.cookies.clear(jar),
        Json(ApiResponse::ok(MessageResponse {
            message: "Logged out successfully".to_string(),
        })),
    )
}

/// GET /api/auth/session
pub async fn session(AuthSession(session): AuthSession) -> Json<ApiResponse<SessionResponse>> {
    Json(ApiResponse::ok(session.into()))
}
