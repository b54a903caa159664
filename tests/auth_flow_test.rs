//! Integration tests for the login, session, refresh, and logout flow.

mod helpers;

use axum::http::{Method, StatusCode};
use serde_json::json;

use portal_auth::TokenType;

#[tokio::test]
async fn test_login_embeds_current_authority() {
    let app = helpers::TestApp::new().await;
    app.create_user("editor@example.com", &["editor"], false).await;

    let response = app.login("editor@example.com").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["success"], true);
    assert_eq!(response.body["data"]["session"]["roles"], json!(["editor"]));
    assert_eq!(
        response.body["data"]["session"]["permissions"],
        json!(["articles:VIEW", "articles:CREATE", "media:VIEW", "media:CREATE", "media:UPDATE"])
    );

    let cookie = response.cookie("portal_session").expect("session cookie");
    let token = cookie.trim_start_matches("portal_session=");
    let payload = app
        .state
        .codec
        .decode(token, TokenType::Access)
        .expect("session token decodes");
    assert_eq!(payload.roles, vec!["editor".to_string()]);
    assert!(!payload.is_super);
}

#[tokio::test]
async fn test_login_sets_cookie_attributes() {
    let app = helpers::TestApp::new().await;
    app.create_user("viewer@example.com", &["viewer"], false).await;

    let response = app.login("viewer@example.com").await;
    assert_eq!(response.status, StatusCode::OK);

    let session = response.set_cookie_line("portal_session").expect("session");
    assert!(session.contains("HttpOnly"));
    assert!(session.contains("SameSite=Lax"));
    assert!(session.contains("Path=/"));

    let refresh = response.set_cookie_line("portal_refresh").expect("refresh");
    assert!(refresh.contains("HttpOnly"));

    let access = response.set_cookie_line("portal_access").expect("access");
    assert!(!access.contains("HttpOnly"));
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let app = helpers::TestApp::new().await;
    let inactive = app.create_user("gone@example.com", &["editor"], false).await;
    app.directory.set_active(inactive, false).await;
    app.create_user("present@example.com", &["editor"], false).await;

    let unknown = app.login("nobody@example.com").await;
    let wrong_password = app
        .login_with("present@example.com", "not the password")
        .await;
    let deactivated = app.login("gone@example.com").await;

    for response in [&unknown, &wrong_password, &deactivated] {
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
        assert_eq!(response.body, unknown.body);
        assert!(response.cookie("portal_session").is_none());
    }
}

#[tokio::test]
async fn test_login_rejects_malformed_email() {
    let app = helpers::TestApp::new().await;

    let response = app.login_with("not-an-email", "whatever").await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["success"], false);
}

#[tokio::test]
async fn test_login_rejects_mistyped_body_with_json_error() {
    let app = helpers::TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/auth/login",
            Some(json!({ "email": 1 })),
            &[],
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response.body,
        json!({ "success": false, "error": "Invalid login request" })
    );
}

#[tokio::test]
async fn test_session_endpoint_reads_cookie_or_bearer() {
    let app = helpers::TestApp::new().await;
    app.create_user("editor@example.com", &["editor"], false).await;
    let login = app.login("editor@example.com").await;

    let cookie = login.cookie("portal_session").expect("session cookie");
    let response = app
        .request_as(&cookie, Method::GET, "/api/auth/session", None)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["user"]["email"], "editor@example.com");

    let access_token = login.body["data"]["access_token"]
        .as_str()
        .expect("access token in body")
        .to_string();
    let bearer = format!("Bearer {access_token}");
    let response = app
        .request(
            Method::GET,
            "/api/auth/session",
            None,
            &[("authorization", bearer.as_str())],
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_access_cookie_is_not_trusted() {
    let app = helpers::TestApp::new().await;
    app.create_user("editor@example.com", &["editor"], false).await;
    let login = app.login("editor@example.com").await;

    let access = login.cookie("portal_access").expect("access cookie");
    let response = app
        .request_as(&access, Method::GET, "/api/auth/session", None)
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.body,
        json!({ "success": false, "error": "Unauthorized - Authentication required" })
    );
}

#[tokio::test]
async fn test_refresh_rereads_roles() {
    let app = helpers::TestApp::new().await;
    let id = app.create_user("viewer@example.com", &["viewer"], false).await;
    let login = app.login("viewer@example.com").await;
    let refresh_cookie = login.cookie("portal_refresh").expect("refresh cookie");

    app.directory.assign_role(id, app.role_id("editor")).await;

    let response = app
        .request_as(&refresh_cookie, Method::POST, "/api/auth/refresh", None)
        .await;

    assert_eq!(response.status, StatusCode::OK);
    let roles = response.body["data"]["session"]["roles"]
        .as_array()
        .expect("roles");
    assert!(roles.contains(&json!("editor")));
    assert!(response.cookie("portal_session").is_some());
    assert!(response.cookie("portal_refresh").is_none());
}

#[tokio::test]
async fn test_refresh_rejects_session_token() {
    let app = helpers::TestApp::new().await;
    app.create_user("viewer@example.com", &["viewer"], false).await;
    let session = app.session_cookie("viewer@example.com").await;
    let token = session.trim_start_matches("portal_session=");

    let response = app
        .request(
            Method::POST,
            "/api/auth/refresh",
            Some(json!({ "refresh_token": token })),
            &[],
        )
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_clears_cookies() {
    let app = helpers::TestApp::new().await;
    app.create_user("viewer@example.com", &["viewer"], false).await;
    let login = app.login("viewer@example.com").await;
    let cookies = ["portal_session", "portal_access", "portal_refresh"]
        .iter()
        .map(|name| login.cookie(name).expect("issued cookie"))
        .collect::<Vec<_>>()
        .join("; ");

    let response = app
        .request_as(&cookies, Method::POST, "/api/auth/logout", None)
        .await;

    assert_eq!(response.status, StatusCode::OK);
    for name in ["portal_session", "portal_access", "portal_refresh"] {
        let line = response.set_cookie_line(name).expect("removal cookie");
        assert!(line.contains("Max-Age=0"), "{line}");
    }
}
