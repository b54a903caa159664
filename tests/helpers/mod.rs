//! Shared test helpers for integration tests.
//!
//! Builds the full router over an in-memory directory with three seeded
//! roles and a small content surface, so tests exercise the same edge and
//! middleware stack as the server.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::extract::Path;
use axum::http::{HeaderMap, Method, Request, StatusCode};
use axum::Json;
use axum::routing::{delete, get, post, put};
use chrono::Utc;
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use portal_api::{
    AppState, AuthSession, DataScope, HybridAccess, HybridOptions, build_app, with_auth,
    with_hybrid_auth,
};
use portal_auth::{AuthRequirements, PasswordHasher};
use portal_core::config::AppConfig;
use portal_database::MemoryDirectory;
use portal_entity::{Action, Module, ModuleGrant, Role, User};

/// Password shared by every seeded user.
pub const PASSWORD: &str = "correct horse battery staple";

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Directory backing the app
    pub directory: MemoryDirectory,
    /// Shared application state
    pub state: AppState,
    admin_role: Uuid,
    editor_role: Uuid,
    viewer_role: Uuid,
}

/// A captured response.
pub struct TestResponse {
    /// Status code
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// JSON body, or `Null` when the body is not JSON
    pub body: Value,
}

impl TestResponse {
    /// The `name=value` pair of a cookie set by this response.
    pub fn cookie(&self, name: &str) -> Option<String> {
        self.headers
            .get_all("set-cookie")
            .iter()
            .filter_map(|v| v.to_str().ok())
            .filter_map(|v| v.split(';').next())
            .find(|pair| pair.starts_with(&format!("{name}=")))
            .map(str::to_string)
    }

    /// The full `Set-Cookie` line for a cookie.
    pub fn set_cookie_line(&self, name: &str) -> Option<String> {
        self.headers
            .get_all("set-cookie")
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find(|v| v.starts_with(&format!("{name}=")))
            .map(str::to_string)
    }
}

impl TestApp {
    /// Create a new test application
    pub async fn new() -> Self {
        Self::with_config(test_config()).await
    }

    /// Create a test application with a custom configuration
    pub async fn with_config(config: AppConfig) -> Self {
        let directory = MemoryDirectory::new();

        let admin_role = seed_role(&directory, "admin", &[]).await;
        let editor_role = seed_role(
            &directory,
            "editor",
            &[
                (Module::Articles, [true, true, false, false]),
                (Module::Media, [true, true, true, false]),
            ],
        )
        .await;
        let viewer_role =
            seed_role(&directory, "viewer", &[(Module::Dashboard, [true, false, false, false])])
                .await;

        let state = AppState::new(config, Arc::new(directory.clone()));
        let router = build_app(state.clone(), content_routes(&state));

        Self {
            router,
            directory,
            state,
            admin_role,
            editor_role,
            viewer_role,
        }
    }

    /// Creates an active user with the given seeded role codes.
    pub async fn create_user(&self, email: &str, roles: &[&str], is_super: bool) -> Uuid {
        let hash = PasswordHasher::new()
            .hash_password(PASSWORD)
            .expect("hash password");
        let id = Uuid::new_v4();
        self.directory
            .insert_user(User {
                id,
                email: email.to_string(),
                name: email.split('@').next().unwrap_or(email).to_string(),
                password_hash: hash,
                is_super,
                is_active: true,
                created_at: Utc::now(),
            })
            .await;

        for role in roles {
            self.directory.assign_role(id, self.role_id(role)).await;
        }
        id
    }

    /// ID of a seeded role.
    pub fn role_id(&self, code: &str) -> Uuid {
        match code {
            "admin" => self.admin_role,
            "editor" => self.editor_role,
            "viewer" => self.viewer_role,
            other => panic!("unknown seeded role {other}"),
        }
    }

    /// Logs in with the shared password.
    pub async fn login(&self, email: &str) -> TestResponse {
        self.login_with(email, PASSWORD).await
    }

    /// Logs in with explicit credentials.
    pub async fn login_with(&self, email: &str, password: &str) -> TestResponse {
        self.request(
            Method::POST,
            "/api/auth/login",
            Some(json!({ "email": email, "password": password })),
            &[],
        )
        .await
    }

    /// Logs in and returns the session cookie pair for later requests.
    pub async fn session_cookie(&self, email: &str) -> String {
        let response = self.login(email).await;
        assert_eq!(response.status, StatusCode::OK, "login failed: {}", response.body);
        response.cookie("portal_session").expect("session cookie")
    }

    /// Sends a request through the full router.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(path);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }

        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("build request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// Sends a request carrying a session cookie.
    pub async fn request_as(
        &self,
        cookie: &str,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> TestResponse {
        self.request(method, path, body, &[("cookie", cookie)]).await
    }
}

/// Configuration with a fixed secret and cookies usable over plain HTTP.
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.auth.jwt_secret = "integration-test-secret-0123456789".to_string();
    config.session.secure = false;
    config
}

async fn seed_role(
    directory: &MemoryDirectory,
    code: &str,
    grants: &[(Module, [bool; 4])],
) -> Uuid {
    let id = Uuid::new_v4();
    directory
        .insert_role(Role {
            id,
            code: code.to_string(),
            name: code.to_string(),
            is_super: false,
        })
        .await;

    for (module, [view, create, update, remove]) in grants {
        directory
            .insert_grant(ModuleGrant {
                role_id: id,
                module_code: module.code().to_string(),
                can_view: *view,
                can_create: *create,
                can_update: *update,
                can_delete: *remove,
            })
            .await;
    }
    id
}

/// A small content surface standing in for the portal's CRUD handlers.
fn content_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/api/articles",
            with_hybrid_auth(
                state,
                get(list_articles),
                HybridOptions::new([Module::Articles.can(Action::View)]),
            )
            .merge(with_auth(
                state,
                post(write_article),
                AuthRequirements::authenticated()
                    .with_permissions([Module::Articles.can(Action::Create)]),
            )),
        )
        .route(
            "/api/articles/{id}",
            with_auth(
                state,
                put(write_article),
                AuthRequirements::authenticated()
                    .with_permissions([Module::Articles.can(Action::Update)]),
            )
            .merge(with_auth(
                state,
                delete(delete_article),
                AuthRequirements::authenticated()
                    .with_permissions([Module::Articles.can(Action::Delete)]),
            )),
        )
        .route(
            "/api/reports",
            with_auth(
                state,
                get(reports),
                AuthRequirements::authenticated()
                    .with_roles(["analyst"])
                    .with_permissions([Module::Dashboard.can(Action::View)]),
            ),
        )
        .route("/api/contact", post(contact))
        .route(
            "/admin/articles",
            with_auth(state, get(admin_page), AuthRequirements::authenticated()),
        )
}

async fn list_articles(access: HybridAccess) -> Json<Value> {
    match access.scope {
        DataScope::Full => Json(json!({ "scope": "full" })),
        DataScope::Public { statuses } => Json(json!({ "scope": "public", "statuses": statuses })),
    }
}

async fn write_article(AuthSession(session): AuthSession) -> Json<Value> {
    Json(json!({ "ok": true, "by": session.user.email }))
}

async fn delete_article(AuthSession(session): AuthSession, Path(id): Path<String>) -> Json<Value> {
    Json(json!({ "deleted": id, "by": session.user.email }))
}

async fn reports(AuthSession(session): AuthSession) -> Json<Value> {
    Json(json!({ "for": session.user.email }))
}

async fn contact() -> Json<Value> {
    Json(json!({ "received": true }))
}

async fn admin_page(AuthSession(session): AuthSession) -> Json<Value> {
    Json(json!({ "page": "articles", "user": session.user.email }))
}
