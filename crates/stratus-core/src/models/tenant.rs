//! Tenant domain model.
//!
//! A tenant is an isolated customer organization. Every other domain
//! entity except platform admins and the catalog is scoped to a tenant.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A platform module that can be independently enabled per tenant.
///
/// Each enabled module gets its own opaque API key, prefixed with the
/// module's key prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Module {
    Auth,
    Rbac,
    Logging,
    Notifications,
    Email,
}

impl Module {
    pub const ALL: [Module; 5] = [
        Module::Auth,
        Module::Rbac,
        Module::Logging,
        Module::Notifications,
        Module::Email,
    ];

    /// Stable string form, as stored in `enabled_modules`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Module::Auth => "auth",
            Module::Rbac => "rbac",
            Module::Logging => "logging",
            Module::Notifications => "notifications",
            Module::Email => "email",
        }
    }

    /// Prefix carried by this module's raw API keys.
    pub fn key_prefix(&self) -> &'static str {
        match self {
            Module::Auth => "auth_",
            Module::Rbac => "rbac_",
            Module::Logging => "logging_",
            Module::Notifications => "notif_",
            Module::Email => "email_",
        }
    }

    pub fn parse(s: &str) -> Option<Module> {
        match s {
            "auth" => Some(Module::Auth),
            "rbac" => Some(Module::Rbac),
            "logging" => Some(Module::Logging),
            "notifications" => Some(Module::Notifications),
            "email" => Some(Module::Email),
            _ => None,
        }
    }

    /// Resolve the module a raw API key claims to belong to, from its
    /// prefix. The claim is informational until checked against the
    /// resolved tenant's enabled-module set.
    pub fn from_key_prefix(raw_key: &str) -> Option<Module> {
        Module::ALL
            .into_iter()
            .find(|m| raw_key.starts_with(m.key_prefix()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TenantStatus {
    Pending,
    Active,
    Suspended,
}

/// One module's API key at rest.
///
/// The raw key is never stored: `key_hash` (SHA-256, hex) is the lookup
/// column, `key_cipher` is the recoverable `enc:v1:` envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKeyRecord {
    pub key_hash: String,
    pub key_cipher: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    pub id: Uuid,
    /// URL-safe unique organization slug.
    pub org_id: String,
    pub name: String,
    pub admin_email: String,
    /// Catalog business-type id this tenant was onboarded with.
    pub business_type: Option<String>,
    pub status: TenantStatus,
    pub enabled_modules: Vec<Module>,
    /// One key record per enabled module.
    pub api_keys: BTreeMap<Module, ApiKeyRecord>,
    /// Catalog permission-template id; grants its permissions tenant-wide
    /// while the template exists in the catalog.
    pub permission_template: Option<String>,
    /// Tenant-wide permission grants, appended unconditionally at
    /// resolution. Not role-scoped.
    pub custom_permissions: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tenant {
    pub fn module_enabled(&self, module: Module) -> bool {
        self.enabled_modules.contains(&module)
    }
}

/// Fields required to create a new tenant. Key records are issued by the
/// onboarding service before the row is written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTenant {
    pub org_id: String,
    pub name: String,
    pub admin_email: String,
    pub business_type: Option<String>,
    pub enabled_modules: Vec<Module>,
    pub api_keys: BTreeMap<Module, ApiKeyRecord>,
    pub permission_template: Option<String>,
    pub custom_permissions: Vec<String>,
}

/// Fields that can be updated on an existing tenant.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTenant {
    pub name: Option<String>,
    pub admin_email: Option<String>,
    pub business_type: Option<String>,
    pub status: Option<TenantStatus>,
    pub enabled_modules: Option<Vec<Module>>,
    pub permission_template: Option<Option<String>>,
    pub custom_permissions: Option<Vec<String>>,
}
