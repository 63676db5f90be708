//! Tenant onboarding.
//!
//! Creating a tenant issues one API key per enabled module and
//! materializes the business type's default roles from the catalog.
//! The tenant row and its seed roles are written as one atomic unit so
//! a failure cannot leave a half-provisioned tenant.

use std::collections::BTreeMap;

use stratus_auth::secret::SecretCodec;
use stratus_core::error::{StratusError, StratusResult};
use stratus_core::models::role::CreateRole;
use stratus_core::models::tenant::{CreateTenant, Module, Tenant};
use stratus_core::repository::{CatalogRepository, TenantRepository};
use tracing::info;
use uuid::Uuid;

/// Input for onboarding a new tenant.
#[derive(Debug, Clone)]
pub struct NewTenant {
    /// URL-safe unique organization slug.
    pub org_id: String,
    pub name: String,
    pub admin_email: String,
    /// Catalog business-type id; its default roles seed the tenant.
    pub business_type: Option<String>,
    pub enabled_modules: Vec<Module>,
    /// Catalog permission-template id adopted tenant-wide.
    pub permission_template: Option<String>,
}

/// A freshly issued raw key. Shown to the caller exactly once; only the
/// hash and the envelope persist.
#[derive(Debug, Clone)]
pub struct IssuedKey {
    pub module: Module,
    pub raw_key: String,
}

pub struct OnboardingService<T: TenantRepository, C: CatalogRepository> {
    tenants: T,
    catalog: C,
    codec: SecretCodec,
}

impl<T: TenantRepository, C: CatalogRepository> OnboardingService<T, C> {
    pub fn new(tenants: T, catalog: C, codec: SecretCodec) -> Self {
        Self {
            tenants,
            catalog,
            codec,
        }
    }

    /// Create a tenant in `pending` status with issued module keys and
    /// catalog-seeded roles.
    pub async fn onboard(&self, input: NewTenant) -> StratusResult<(Tenant, Vec<IssuedKey>)> {
        validate_org_id(&input.org_id)?;
        if input.enabled_modules.is_empty() {
            return Err(StratusError::Validation {
                message: "at least one module must be enabled".into(),
            });
        }

        match self.tenants.get_by_org_id(&input.org_id).await {
            Ok(_) => {
                return Err(StratusError::AlreadyExists {
                    entity: format!("tenant {}", input.org_id),
                });
            }
            Err(StratusError::NotFound { .. }) => {}
            Err(e) => return Err(e),
        }

        // Referencing a catalog entry that does not exist is a caller
        // mistake, caught before anything is written.
        if let Some(tpl) = &input.permission_template {
            self.catalog
                .get_permission_template(tpl)
                .await
                .map_err(|e| unknown_ref(e, "permission template", tpl))?;
        }

        let mut api_keys = BTreeMap::new();
        let mut issued = Vec::new();
        for module in &input.enabled_modules {
            let (raw, record) = stratus_auth::apikey::issue_key(&self.codec, *module)?;
            api_keys.insert(*module, record);
            issued.push(IssuedKey {
                module: *module,
                raw_key: raw,
            });
        }

        let seed_roles = self.seed_roles(&input).await?;
        let seeded = seed_roles.len();

        let tenant = self
            .tenants
            .provision(
                CreateTenant {
                    org_id: input.org_id.clone(),
                    name: input.name,
                    admin_email: input.admin_email,
                    business_type: input.business_type,
                    enabled_modules: input.enabled_modules,
                    api_keys,
                    permission_template: input.permission_template,
                    custom_permissions: Vec::new(),
                },
                seed_roles,
            )
            .await?;

        info!(
            tenant_id = %tenant.id,
            org_id = %tenant.org_id,
            modules = tenant.enabled_modules.len(),
            seed_roles = seeded,
            "tenant onboarded"
        );

        Ok((tenant, issued))
    }

    /// Materialize the business type's catalog default roles; fall back
    /// to the built-in Admin/User pair when the catalog offers nothing.
    async fn seed_roles(&self, input: &NewTenant) -> StratusResult<Vec<CreateRole>> {
        // Roles get the tenant id at provision time.
        let tenant_id = Uuid::nil();
        let mut seeds = Vec::new();

        if let Some(bt_id) = &input.business_type {
            let business_type = self
                .catalog
                .get_business_type(bt_id)
                .await
                .map_err(|e| unknown_ref(e, "business type", bt_id))?;

            for role_id in &business_type.default_roles {
                match self.catalog.get_default_role(role_id).await {
                    Ok(role) => seeds.push(CreateRole {
                        tenant_id,
                        name: role.name,
                        description: role.description,
                        permissions: role.permissions,
                        is_default: true,
                        catalog_role: Some(role.id),
                    }),
                    // A dangling reference inside the catalog itself is
                    // skipped, not fatal.
                    Err(StratusError::NotFound { .. }) => continue,
                    Err(e) => return Err(e),
                }
            }
        }

        if seeds.is_empty() {
            seeds.push(CreateRole {
                tenant_id,
                name: "Admin".into(),
                description: "Full administrative access".into(),
                permissions: vec![
                    "user.create".into(),
                    "user.read".into(),
                    "user.update".into(),
                    "user.delete".into(),
                    "role.manage".into(),
                ],
                is_default: true,
                catalog_role: None,
            });
            seeds.push(CreateRole {
                tenant_id,
                name: "User".into(),
                description: "Standard user access".into(),
                permissions: vec!["user.read".into()],
                is_default: true,
                catalog_role: None,
            });
        }

        Ok(seeds)
    }
}

fn validate_org_id(org_id: &str) -> StratusResult<()> {
    let ok = !org_id.is_empty()
        && org_id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if ok {
        Ok(())
    } else {
        Err(StratusError::Validation {
            message: "org id must be a lowercase slug".into(),
        })
    }
}

fn unknown_ref(err: StratusError, what: &str, id: &str) -> StratusError {
    match err {
        StratusError::NotFound { .. } => StratusError::Validation {
            message: format!("unknown {what}: {id}"),
        },
        other => other,
    }
}
