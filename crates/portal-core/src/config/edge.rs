//! Edge routing configuration: which paths are public, administrative, or special.

use serde::{Deserialize, Serialize};

/// A method + path pair, e.g. `POST /api/contact`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteSpec {
    /// HTTP method, upper case.
    pub method: String,
    /// Path or path prefix.
    pub path: String,
}

impl RouteSpec {
    /// Creates a route spec.
    pub fn new(method: &str, path: &str) -> Self {
        Self {
            method: method.to_uppercase(),
            path: path.to_string(),
        }
    }
}

/// Path layout used by the edge dispatcher.
///
/// Every path entry matches itself and anything below it
/// (`/api/auth` matches `/api/auth/login` but not `/api/authors`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeConfig {
    /// The login screen.
    #[serde(default = "default_login_path")]
    pub login_path: String,
    /// Where an already-authenticated visitor of the login screen is sent.
    #[serde(default = "default_home_path")]
    pub home_path: String,
    /// Prefix of the administrative UI.
    #[serde(default = "default_admin_prefix")]
    pub admin_prefix: String,
    /// Prefix of the JSON API.
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,
    /// Paths allowed unconditionally.
    #[serde(default = "default_public_paths")]
    pub public_paths: Vec<String>,
    /// Session-issuing paths, rate limited with the strict auth profile.
    #[serde(default = "default_auth_paths")]
    pub auth_paths: Vec<String>,
    /// Mutating endpoints open to anonymous callers.
    #[serde(default = "default_public_mutations")]
    pub public_mutations: Vec<RouteSpec>,
    /// Contact-form endpoints, rate limited with the contact profile.
    #[serde(default = "default_contact_paths")]
    pub contact_paths: Vec<String>,
    /// Upload endpoints, rate limited with the upload profile.
    #[serde(default = "default_upload_paths")]
    pub upload_paths: Vec<String>,
    /// User-management areas, admin only.
    #[serde(default = "default_user_management_paths")]
    pub user_management_paths: Vec<String>,
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self {
            login_path: default_login_path(),
            home_path: default_home_path(),
            admin_prefix: default_admin_prefix(),
            api_prefix: default_api_prefix(),
            public_paths: default_public_paths(),
            auth_paths: default_auth_paths(),
            public_mutations: default_public_mutations(),
            contact_paths: default_contact_paths(),
            upload_paths: default_upload_paths(),
            user_management_paths: default_user_management_paths(),
        }
    }
}

fn default_login_path() -> String {
    "/login".to_string()
}

fn default_home_path() -> String {
    "/admin".to_string()
}

fn default_admin_prefix() -> String {
    "/admin".to_string()
}

fn default_api_prefix() -> String {
    "/api".to_string()
}

fn default_public_paths() -> Vec<String> {
    vec!["/login".to_string(), "/api/auth".to_string()]
}

fn default_auth_paths() -> Vec<String> {
    ["/login", "/api/auth/login", "/api/auth/refresh"]
        .iter()
        .map(|p| p.to_string())
        .collect()
}

fn default_public_mutations() -> Vec<RouteSpec> {
    vec![
        RouteSpec::new("POST", "/api/contact"),
        RouteSpec::new("POST", "/api/chat"),
    ]
}

fn default_contact_paths() -> Vec<String> {
    vec!["/api/contact".to_string()]
}

fn default_upload_paths() -> Vec<String> {
    vec!["/api/upload".to_string()]
}

fn default_user_management_paths() -> Vec<String> {
    vec!["/admin/users".to_string(), "/api/users".to_string()]
}
