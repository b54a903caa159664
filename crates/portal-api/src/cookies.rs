//! Session cookie policy: which tokens travel in which cookies, and with
//! which attributes.

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{DateTime, Utc};

use portal_auth::{LoginResult, SessionTokens};
use portal_core::config::SessionConfig;

/// Issues, clears, and reads the session, access, and refresh cookies.
///
/// The session and refresh cookies are HttpOnly. The access cookie is
/// readable by client scripts for UI state and is never consulted by the
/// server for authorization.
#[derive(Debug, Clone)]
pub struct SessionCookies {
    config: SessionConfig,
}

impl SessionCookies {
    /// Creates the cookie policy from configuration.
    pub fn new(config: SessionConfig) -> Self {
        Self { config }
    }

    /// Adds all three cookies after a successful login.
    pub fn issue_login(&self, jar: CookieJar, login: &LoginResult) -> CookieJar {
        let jar = self.issue_refresh(jar, &login.tokens);
        jar.add(self.build(
            &self.config.refresh_cookie,
            login.refresh_token.clone(),
            login.refresh_expires_at,
            true,
        ))
    }

    /// Replaces the session and access cookies. The refresh cookie is left as is.
    pub fn issue_refresh(&self, jar: CookieJar, tokens: &SessionTokens) -> CookieJar {
        jar.add(self.build(
            &self.config.session_cookie,
            tokens.session_token.clone(),
            tokens.session_expires_at,
            true,
        ))
        .add(self.build(
            &self.config.access_cookie,
            tokens.access_token.clone(),
            tokens.access_expires_at,
            false,
        ))
    }

    /// Removes all three cookies.
    pub fn clear(&self, jar: CookieJar) -> CookieJar {
        [
            &self.config.session_cookie,
            &self.config.access_cookie,
            &self.config.refresh_cookie,
        ]
        .into_iter()
        .fold(jar, |jar, name| {
            jar.remove(Cookie::build(name.clone()).path(self.config.path.clone()))
        })
    }

    /// The token the server authorizes with: the session cookie, falling back
    /// to an `Authorization: Bearer` header for non-browser clients.
    pub fn session_token(&self, headers: &HeaderMap) -> Option<String> {
        let jar = CookieJar::from_headers(headers);
        jar.get(&self.config.session_cookie)
            .map(|cookie| cookie.value().to_string())
            .filter(|value| !value.is_empty())
            .or_else(|| bearer_token(headers))
    }

    /// The refresh token, if the client sent one.
    pub fn refresh_token(&self, jar: &CookieJar) -> Option<String> {
        jar.get(&self.config.refresh_cookie)
            .map(|cookie| cookie.value().to_string())
            .filter(|value| !value.is_empty())
    }

    fn build(
        &self,
        name: &str,
        value: String,
        expires_at: DateTime<Utc>,
        http_only: bool,
    ) -> Cookie<'static> {
        let max_age = (expires_at - Utc::now()).num_seconds().max(0);
        Cookie::build((name.to_string(), value))
            .path(self.config.path.clone())
            .http_only(http_only)
            .secure(self.config.secure)
            .same_site(same_site(&self.config.same_site))
            .max_age(time::Duration::seconds(max_age))
            .build()
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

fn same_site(value: &str) -> SameSite {
    match value.to_ascii_lowercase().as_str() {
        "strict" => SameSite::Strict,
        "none" => SameSite::None,
        _ => SameSite::Lax,
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;
    use axum::http::header::COOKIE;

    use super::*;

    fn cookies() -> SessionCookies {
        SessionCookies::new(SessionConfig::default())
    }

    #[test]
    fn test_session_cookie_wins_over_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("portal_session=from-cookie"));
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));
        assert_eq!(cookies().session_token(&headers).as_deref(), Some("from-cookie"));
    }

    #[test]
    fn test_bearer_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(cookies().session_token(&headers).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn test_access_cookie_is_not_an_authorization_source() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("portal_access=readable"));
        assert!(cookies().session_token(&headers).is_none());
    }

    #[test]
    fn test_issued_cookie_attributes() {
        let tokens = SessionTokens {
            session_token: "s".to_string(),
            session_expires_at: Utc::now() + chrono::Duration::minutes(60),
            access_token: "a".to_string(),
            access_expires_at: Utc::now() + chrono::Duration::minutes(15),
        };
        let jar = cookies().issue_refresh(CookieJar::new(), &tokens);

        let session = jar.get("portal_session").expect("session cookie");
        assert_eq!(session.http_only(), Some(true));
        assert_eq!(session.secure(), Some(true));
        assert_eq!(session.same_site(), Some(SameSite::Lax));

        let access = jar.get("portal_access").expect("access cookie");
        assert_eq!(access.http_only(), Some(false));
        assert!(jar.get("portal_refresh").is_none());
    }
}
