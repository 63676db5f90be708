//! Tenant user domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    Inactive,
}

/// A user belonging to exactly one tenant. Email is unique within the
/// tenant. Deletion is a status transition, never a row removal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantUser {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub email: String,
    /// Argon2id PHC-format hash.
    pub password_hash: String,
    pub status: UserStatus,
    pub email_verified: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTenantUser {
    pub tenant_id: Uuid,
    pub email: String,
    /// Raw password; hashed with Argon2id before storage.
    pub password: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTenantUser {
    pub email: Option<String>,
    pub status: Option<UserStatus>,
    pub email_verified: Option<bool>,
    /// Raw replacement password; hashed before storage.
    pub password: Option<String>,
}
