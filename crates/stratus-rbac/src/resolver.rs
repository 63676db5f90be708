//! Permission resolution.
//!
//! Answers "can user U do action A" by unioning the user's role
//! permissions with the tenant's template and custom grants.
//! Permission strings are flat, exact-match tokens; there is no
//! wildcard or hierarchy expansion.

use std::collections::HashSet;

use stratus_core::error::StratusError;
use stratus_core::models::tenant::{Module, TenantStatus};
use stratus_core::models::user::UserStatus;
use stratus_core::repository::{
    CatalogRepository, RoleRepository, TenantRepository, UserRepository,
};
use tracing::debug;
use uuid::Uuid;

use crate::error::RbacError;

/// Resolves effective permissions for tenant users.
///
/// Catalog references are consulted live on every resolution: a role
/// seeded from a default role that has since left the catalog, or a
/// permission template that was removed, stops contributing at the
/// next call — with no retroactive token invalidation.
pub struct PermissionResolver<T, U, R, C>
where
    T: TenantRepository,
    U: UserRepository,
    R: RoleRepository,
    C: CatalogRepository,
{
    tenants: T,
    users: U,
    roles: R,
    catalog: C,
}

impl<T, U, R, C> PermissionResolver<T, U, R, C>
where
    T: TenantRepository,
    U: UserRepository,
    R: RoleRepository,
    C: CatalogRepository,
{
    pub fn new(tenants: T, users: U, roles: R, catalog: C) -> Self {
        Self {
            tenants,
            users,
            roles,
            catalog,
        }
    }

    /// Exact-match membership test against the user's effective
    /// permission set.
    ///
    /// Returns `Ok(false)` — not an error — for an unknown user, an
    /// unknown permission, or a tenant without the RBAC module.
    /// `RbacError::Resolution` is reserved for store faults.
    pub async fn has_permission(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        permission: &str,
    ) -> Result<bool, RbacError> {
        let effective = match self.effective_permissions(tenant_id, user_id).await? {
            Some(set) => set,
            None => return Ok(false),
        };
        Ok(effective.contains(permission))
    }

    /// Compute the user's full effective permission set, or `None` when
    /// the question does not apply (unknown tenant/user, inactive
    /// account, RBAC module disabled).
    pub async fn effective_permissions(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<HashSet<String>>, RbacError> {
        let tenant = match self.tenants.get_by_id(tenant_id).await {
            Ok(t) => t,
            Err(StratusError::NotFound { .. }) => return Ok(None),
            Err(e) => return Err(infra(e)),
        };
        if tenant.status != TenantStatus::Active || !tenant.module_enabled(Module::Rbac) {
            return Ok(None);
        }

        match self.users.get_by_id(tenant_id, user_id).await {
            Ok(u) if u.status == UserStatus::Active => {}
            Ok(_) => return Ok(None),
            Err(StratusError::NotFound { .. }) => return Ok(None),
            Err(e) => return Err(infra(e)),
        }

        let roles = self
            .roles
            .get_user_roles(tenant_id, user_id)
            .await
            .map_err(infra)?;

        // Catalog default-role ids, fetched only when some role was
        // seeded from the catalog and may have been revoked.
        let catalog_roles: Option<HashSet<String>> =
            if roles.iter().any(|r| r.catalog_role.is_some()) {
                let ids = self
                    .catalog
                    .list_default_roles()
                    .await
                    .map_err(infra)?
                    .into_iter()
                    .map(|r| r.id)
                    .collect();
                Some(ids)
            } else {
                None
            };

        let mut effective: HashSet<String> = HashSet::new();
        for role in &roles {
            if let Some(src) = &role.catalog_role {
                let still_listed = catalog_roles
                    .as_ref()
                    .map(|ids| ids.contains(src))
                    .unwrap_or(false);
                if !still_listed {
                    debug!(
                        tenant_id = %tenant_id,
                        role = %role.name,
                        catalog_role = %src,
                        "skipping role with revoked catalog source"
                    );
                    continue;
                }
            }
            effective.extend(role.permissions.iter().cloned());
        }

        // Template grants apply tenant-wide while the template exists.
        if let Some(tpl) = &tenant.permission_template {
            match self.catalog.get_permission_template(tpl).await {
                Ok(template) => effective.extend(template.permissions),
                Err(StratusError::NotFound { .. }) => {
                    debug!(tenant_id = %tenant_id, template = %tpl, "permission template revoked");
                }
                Err(e) => return Err(infra(e)),
            }
        }

        // Custom permissions are tenant-wide grants, appended
        // unconditionally. They are not role-scoped.
        effective.extend(tenant.custom_permissions.iter().cloned());

        Ok(Some(effective))
    }

    /// Revoked catalog references in a tenant's stored configuration,
    /// for the tenant admin surface.
    pub async fn config_status(
        &self,
        tenant_id: Uuid,
    ) -> Result<Vec<crate::catalog::RevokedReference>, RbacError> {
        let tenant = self.tenants.get_by_id(tenant_id).await.map_err(infra)?;
        let roles = self
            .roles
            .list(tenant_id, Default::default())
            .await
            .map_err(infra)?
            .items;
        let snapshot = load_snapshot(&self.catalog).await?;
        Ok(crate::catalog::revoked_references(&tenant, &roles, &snapshot))
    }
}

/// Read the current id set of every catalog.
pub async fn load_snapshot<C: CatalogRepository>(
    catalog: &C,
) -> Result<crate::catalog::CatalogSnapshot, RbacError> {
    Ok(crate::catalog::CatalogSnapshot {
        permission_templates: catalog
            .list_permission_templates()
            .await
            .map_err(infra)?
            .into_iter()
            .map(|t| t.id)
            .collect(),
        business_types: catalog
            .list_business_types()
            .await
            .map_err(infra)?
            .into_iter()
            .map(|b| b.id)
            .collect(),
        default_roles: catalog
            .list_default_roles()
            .await
            .map_err(infra)?
            .into_iter()
            .map(|r| r.id)
            .collect(),
        sso_providers: catalog
            .list_sso_providers()
            .await
            .map_err(infra)?
            .into_iter()
            .map(|p| p.id)
            .collect(),
    })
}

fn infra(err: StratusError) -> RbacError {
    RbacError::Resolution(err.to_string())
}
