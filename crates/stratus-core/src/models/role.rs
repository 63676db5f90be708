//! Role domain model.
//!
//! A role is a named bundle of flat permission strings, scoped to a
//! tenant. Roles never reference other roles, so there is no inheritance
//! and no cycles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub description: String,
    /// Exact-match permission tokens, e.g. `user.read`. No wildcard
    /// expansion is performed anywhere.
    pub permissions: Vec<String>,
    /// Seeded from the platform catalog rather than created by a tenant
    /// admin.
    pub is_default: bool,
    /// Catalog default-role id this role was seeded from. A role whose
    /// source id has left the catalog stops contributing permissions.
    pub catalog_role: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRole {
    pub tenant_id: Uuid,
    pub name: String,
    pub description: String,
    pub permissions: Vec<String>,
    pub is_default: bool,
    pub catalog_role: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateRole {
    pub name: Option<String>,
    pub description: Option<String>,
    pub permissions: Option<Vec<String>>,
}
