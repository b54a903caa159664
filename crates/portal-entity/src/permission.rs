//! Typed permissions.
//!
//! A permission is a `(Module, Action)` pair whose canonical string form is
//! `"<module_code>:<ACTION>"`, e.g. `"articles:VIEW"`. Tokens and API
//! messages use the string form; everything inside the process compares the
//! typed pair.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A functional area of the back office.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Module {
    /// Dashboard and statistics.
    Dashboard,
    /// Blog articles.
    Articles,
    /// Product catalogue.
    Products,
    /// Portfolio projects.
    Projects,
    /// Job postings.
    Jobs,
    /// Job applications.
    Applications,
    /// Contact-form submissions.
    Contacts,
    /// Uploaded media.
    Media,
    /// Back-office users.
    Users,
    /// Roles and their grants.
    Roles,
    /// Site settings.
    Settings,
}

impl Module {
    /// Every module, in declaration order.
    pub const ALL: [Module; 11] = [
        Self::Dashboard,
        Self::Articles,
        Self::Products,
        Self::Projects,
        Self::Jobs,
        Self::Applications,
        Self::Contacts,
        Self::Media,
        Self::Users,
        Self::Roles,
        Self::Settings,
    ];

    /// Stable code stored in grant rows.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::Articles => "articles",
            Self::Products => "products",
            Self::Projects => "projects",
            Self::Jobs => "jobs",
            Self::Applications => "applications",
            Self::Contacts => "contacts",
            Self::Media => "media",
            Self::Users => "users",
            Self::Roles => "roles",
            Self::Settings => "settings",
        }
    }

    /// Shorthand for `Permission::new(self, action)`.
    pub fn can(self, action: Action) -> Permission {
        Permission::new(self, action)
    }
}

impl FromStr for Module {
    type Err = PermissionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|module| module.code() == s)
            .ok_or_else(|| PermissionParseError::UnknownModule(s.to_string()))
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// One of the four capabilities a grant can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Action {
    /// Read.
    View,
    /// Create.
    Create,
    /// Update.
    Update,
    /// Delete.
    Delete,
}

impl Action {
    /// Every action.
    pub const ALL: [Action; 4] = [Self::View, Self::Create, Self::Update, Self::Delete];

    /// Upper-case name used in the canonical string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::View => "VIEW",
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        }
    }
}

impl FromStr for Action {
    type Err = PermissionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| PermissionParseError::UnknownAction(s.to_string()))
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a permission string was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PermissionParseError {
    /// No `:` separator.
    #[error("permission '{0}' is not of the form module:ACTION")]
    Malformed(String),
    /// Module code not in [`Module::ALL`].
    #[error("unknown module '{0}'")]
    UnknownModule(String),
    /// Action not in [`Action::ALL`].
    #[error("unknown action '{0}'")]
    UnknownAction(String),
}

/// A capability on a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Permission {
    /// The functional area.
    pub module: Module,
    /// The capability.
    pub action: Action,
}

impl Permission {
    /// Creates a permission.
    pub const fn new(module: Module, action: Action) -> Self {
        Self { module, action }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.module, self.action)
    }
}

impl FromStr for Permission {
    type Err = PermissionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (module, action) = s
            .split_once(':')
            .ok_or_else(|| PermissionParseError::Malformed(s.to_string()))?;
        Ok(Self::new(module.parse()?, action.parse()?))
    }
}

impl TryFrom<String> for Permission {
    type Error = PermissionParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Permission> for String {
    fn from(permission: Permission) -> Self {
        permission.to_string()
    }
}
