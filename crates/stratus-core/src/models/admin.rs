//! Platform admin domain model.
//!
//! Platform admins are global accounts, not tenant-scoped. They curate
//! the catalog and manage tenant lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminRole {
    Admin,
    SuperAdmin,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformAdmin {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    /// `None` for SSO-only admins; they cannot password-login.
    pub password_hash: Option<String>,
    pub role: AdminRole,
    pub is_active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePlatformAdmin {
    pub email: String,
    pub name: String,
    /// Raw password; `None` creates an SSO-only admin.
    pub password: Option<String>,
    pub role: AdminRole,
}
