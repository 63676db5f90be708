//! Platform catalog domain models.
//!
//! The catalog is platform-admin-curated and read-shared by every
//! tenant. Entries are identified by stable string ids; a tenant's
//! stored reference becomes revoked when the catalog no longer contains
//! that id. Removal is detected by set difference, not push.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogKind {
    PermissionTemplates,
    BusinessTypes,
    DefaultRoles,
    SsoProviders,
}

/// A curated bundle of permissions a tenant can adopt wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionTemplate {
    pub id: String,
    pub name: String,
    pub permissions: Vec<String>,
}

/// Seeds a new tenant's role set with the referenced default roles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessType {
    pub id: String,
    pub name: String,
    /// Catalog default-role ids materialized for tenants of this type.
    pub default_roles: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultRole {
    pub id: String,
    pub name: String,
    pub description: String,
    pub permissions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SsoProvider {
    pub id: String,
    pub name: String,
    /// Provider protocol, e.g. `oidc` or `saml`.
    pub kind: String,
}
