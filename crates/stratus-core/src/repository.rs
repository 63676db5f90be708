//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Tenant-scoped repositories
//! require a `tenant_id` parameter to enforce data isolation.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::StratusResult;
use crate::models::{
    admin::{CreatePlatformAdmin, PlatformAdmin},
    catalog::{BusinessType, DefaultRole, PermissionTemplate, SsoProvider},
    role::{CreateRole, Role, UpdateRole},
    tenant::{ApiKeyRecord, CreateTenant, Module, Tenant, TenantStatus, UpdateTenant},
    user::{CreateTenantUser, TenantUser, UpdateTenantUser},
};

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

// ---------------------------------------------------------------------------
// Tenants (global scope)
// ---------------------------------------------------------------------------

pub trait TenantRepository: Send + Sync {
    /// Write a tenant row and its seed roles in one atomic unit, so a
    /// failure cannot leave a half-provisioned tenant behind.
    fn provision(
        &self,
        tenant: CreateTenant,
        seed_roles: Vec<CreateRole>,
    ) -> impl Future<Output = StratusResult<Tenant>> + Send;

    fn get_by_id(&self, id: Uuid) -> impl Future<Output = StratusResult<Tenant>> + Send;

    fn get_by_org_id(&self, org_id: &str) -> impl Future<Output = StratusResult<Tenant>> + Send;

    /// Look up the tenant owning an API key by the key's SHA-256 lookup
    /// hash. Returns the row regardless of tenant status or module
    /// enablement; the credential store applies those gates.
    fn get_by_api_key_hash(
        &self,
        key_hash: &str,
    ) -> impl Future<Output = StratusResult<Tenant>> + Send;

    fn update(
        &self,
        id: Uuid,
        input: UpdateTenant,
    ) -> impl Future<Output = StratusResult<Tenant>> + Send;

    fn set_status(
        &self,
        id: Uuid,
        status: TenantStatus,
    ) -> impl Future<Output = StratusResult<()>> + Send;

    /// Replace one module's key record. Atomic per key, last write wins.
    fn set_module_key(
        &self,
        id: Uuid,
        module: Module,
        record: ApiKeyRecord,
    ) -> impl Future<Output = StratusResult<()>> + Send;

    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = StratusResult<PaginatedResult<Tenant>>> + Send;
}

// ---------------------------------------------------------------------------
// Tenant-scoped repositories
// ---------------------------------------------------------------------------

pub trait UserRepository: Send + Sync {
    fn create(
        &self,
        input: CreateTenantUser,
    ) -> impl Future<Output = StratusResult<TenantUser>> + Send;

    fn get_by_id(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> impl Future<Output = StratusResult<TenantUser>> + Send;

    fn get_by_email(
        &self,
        tenant_id: Uuid,
        email: &str,
    ) -> impl Future<Output = StratusResult<TenantUser>> + Send;

    fn update(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        input: UpdateTenantUser,
    ) -> impl Future<Output = StratusResult<TenantUser>> + Send;

    /// Stamp a successful login.
    fn record_login(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        at: DateTime<Utc>,
    ) -> impl Future<Output = StratusResult<()>> + Send;

    /// Soft-delete: sets status to Inactive.
    fn delete(&self, tenant_id: Uuid, id: Uuid) -> impl Future<Output = StratusResult<()>> + Send;

    fn list(
        &self,
        tenant_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = StratusResult<PaginatedResult<TenantUser>>> + Send;
}

pub trait RoleRepository: Send + Sync {
    fn create(&self, input: CreateRole) -> impl Future<Output = StratusResult<Role>> + Send;

    fn get_by_id(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> impl Future<Output = StratusResult<Role>> + Send;

    fn update(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        input: UpdateRole,
    ) -> impl Future<Output = StratusResult<Role>> + Send;

    fn delete(&self, tenant_id: Uuid, id: Uuid) -> impl Future<Output = StratusResult<()>> + Send;

    fn list(
        &self,
        tenant_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = StratusResult<PaginatedResult<Role>>> + Send;

    /// Assign a role to a user.
    fn assign_to_user(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        role_id: Uuid,
    ) -> impl Future<Output = StratusResult<()>> + Send;

    /// Remove a role assignment from a user.
    fn unassign_from_user(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        role_id: Uuid,
    ) -> impl Future<Output = StratusResult<()>> + Send;

    /// Get all roles assigned to a user.
    fn get_user_roles(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
    ) -> impl Future<Output = StratusResult<Vec<Role>>> + Send;
}

// ---------------------------------------------------------------------------
// Platform admins (global scope)
// ---------------------------------------------------------------------------

pub trait PlatformAdminRepository: Send + Sync {
    fn create(
        &self,
        input: CreatePlatformAdmin,
    ) -> impl Future<Output = StratusResult<PlatformAdmin>> + Send;

    fn get_by_id(&self, id: Uuid) -> impl Future<Output = StratusResult<PlatformAdmin>> + Send;

    fn get_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = StratusResult<PlatformAdmin>> + Send;

    fn record_login(
        &self,
        id: Uuid,
        at: DateTime<Utc>,
    ) -> impl Future<Output = StratusResult<()>> + Send;

    fn set_active(
        &self,
        id: Uuid,
        is_active: bool,
    ) -> impl Future<Output = StratusResult<()>> + Send;
}

// ---------------------------------------------------------------------------
// Platform catalog (global scope, read-shared by all tenants)
// ---------------------------------------------------------------------------

pub trait CatalogRepository: Send + Sync {
    fn list_permission_templates(
        &self,
    ) -> impl Future<Output = StratusResult<Vec<PermissionTemplate>>> + Send;

    fn get_permission_template(
        &self,
        id: &str,
    ) -> impl Future<Output = StratusResult<PermissionTemplate>> + Send;

    fn upsert_permission_template(
        &self,
        template: PermissionTemplate,
    ) -> impl Future<Output = StratusResult<()>> + Send;

    fn remove_permission_template(
        &self,
        id: &str,
    ) -> impl Future<Output = StratusResult<()>> + Send;

    fn list_business_types(&self) -> impl Future<Output = StratusResult<Vec<BusinessType>>> + Send;

    fn get_business_type(
        &self,
        id: &str,
    ) -> impl Future<Output = StratusResult<BusinessType>> + Send;

    fn upsert_business_type(
        &self,
        business_type: BusinessType,
    ) -> impl Future<Output = StratusResult<()>> + Send;

    fn remove_business_type(&self, id: &str) -> impl Future<Output = StratusResult<()>> + Send;

    fn list_default_roles(&self) -> impl Future<Output = StratusResult<Vec<DefaultRole>>> + Send;

    fn get_default_role(&self, id: &str)
    -> impl Future<Output = StratusResult<DefaultRole>> + Send;

    fn upsert_default_role(
        &self,
        role: DefaultRole,
    ) -> impl Future<Output = StratusResult<()>> + Send;

    fn remove_default_role(&self, id: &str) -> impl Future<Output = StratusResult<()>> + Send;

    fn list_sso_providers(&self) -> impl Future<Output = StratusResult<Vec<SsoProvider>>> + Send;

    fn upsert_sso_provider(
        &self,
        provider: SsoProvider,
    ) -> impl Future<Output = StratusResult<()>> + Send;

    fn remove_sso_provider(&self, id: &str) -> impl Future<Output = StratusResult<()>> + Send;
}

// ---------------------------------------------------------------------------
// Token revocation registry
// ---------------------------------------------------------------------------

/// Denylist of invalidated-but-not-yet-expired token ids. In a
/// multi-process deployment this must be a shared store, keyed by jti
/// with a lifetime bounded by the token's own expiry.
pub trait RevocationRepository: Send + Sync {
    fn revoke(
        &self,
        jti: &str,
        expires_at: DateTime<Utc>,
    ) -> impl Future<Output = StratusResult<()>> + Send;

    fn is_revoked(&self, jti: &str) -> impl Future<Output = StratusResult<bool>> + Send;

    /// Remove entries whose tokens have passed their natural expiry.
    fn cleanup_expired(&self) -> impl Future<Output = StratusResult<u64>> + Send;
}
