//! SurrealDB implementation of [`TenantRepository`].
//!
//! API keys live on the tenant row as one (hash, cipher) column pair
//! per module; the hash columns are indexed for credential lookup.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use stratus_core::error::StratusResult;
use stratus_core::models::role::CreateRole;
use stratus_core::models::tenant::{
    ApiKeyRecord, CreateTenant, Module, Tenant, TenantStatus, UpdateTenant,
};
use stratus_core::repository::{PaginatedResult, Pagination, TenantRepository};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct TenantRow {
    record_id: String,
    org_id: String,
    name: String,
    admin_email: String,
    business_type: Option<String>,
    status: String,
    enabled_modules: Vec<String>,
    auth_key_hash: Option<String>,
    auth_key_cipher: Option<String>,
    rbac_key_hash: Option<String>,
    rbac_key_cipher: Option<String>,
    logging_key_hash: Option<String>,
    logging_key_cipher: Option<String>,
    notifications_key_hash: Option<String>,
    notifications_key_cipher: Option<String>,
    email_key_hash: Option<String>,
    email_key_cipher: Option<String>,
    permission_template: Option<String>,
    custom_permissions: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Projection selecting the record id alongside every column.
const SELECT_TENANT: &str = "SELECT meta::id(id) AS record_id, * FROM";

fn parse_status(s: &str) -> Result<TenantStatus, DbError> {
    match s {
        "Pending" => Ok(TenantStatus::Pending),
        "Active" => Ok(TenantStatus::Active),
        "Suspended" => Ok(TenantStatus::Suspended),
        other => Err(DbError::Decode(format!("unknown tenant status: {other}"))),
    }
}

fn status_to_string(s: &TenantStatus) -> &'static str {
    match s {
        TenantStatus::Pending => "Pending",
        TenantStatus::Active => "Active",
        TenantStatus::Suspended => "Suspended",
    }
}

/// The (hash, cipher) column pair holding one module's key.
fn key_columns(module: Module) -> (&'static str, &'static str) {
    match module {
        Module::Auth => ("auth_key_hash", "auth_key_cipher"),
        Module::Rbac => ("rbac_key_hash", "rbac_key_cipher"),
        Module::Logging => ("logging_key_hash", "logging_key_cipher"),
        Module::Notifications => ("notifications_key_hash", "notifications_key_cipher"),
        Module::Email => ("email_key_hash", "email_key_cipher"),
    }
}

impl TenantRow {
    fn try_into_tenant(self) -> Result<Tenant, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Decode(format!("invalid UUID: {e}")))?;

        let enabled_modules = self
            .enabled_modules
            .iter()
            .map(|m| {
                Module::parse(m).ok_or_else(|| DbError::Decode(format!("unknown module: {m}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut api_keys = BTreeMap::new();
        let pairs = [
            (Module::Auth, &self.auth_key_hash, &self.auth_key_cipher),
            (Module::Rbac, &self.rbac_key_hash, &self.rbac_key_cipher),
            (
                Module::Logging,
                &self.logging_key_hash,
                &self.logging_key_cipher,
            ),
            (
                Module::Notifications,
                &self.notifications_key_hash,
                &self.notifications_key_cipher,
            ),
            (Module::Email, &self.email_key_hash, &self.email_key_cipher),
        ];
        for (module, hash, cipher) in pairs {
            if let (Some(hash), Some(cipher)) = (hash, cipher) {
                api_keys.insert(
                    module,
                    ApiKeyRecord {
                        key_hash: hash.clone(),
                        key_cipher: cipher.clone(),
                    },
                );
            }
        }

        Ok(Tenant {
            id,
            org_id: self.org_id,
            name: self.name,
            admin_email: self.admin_email,
            business_type: self.business_type,
            status: parse_status(&self.status)?,
            enabled_modules,
            api_keys,
            permission_template: self.permission_template,
            custom_permissions: self.custom_permissions,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// Seed-role parameters bound into the provisioning transaction.
#[derive(Debug, SurrealValue)]
struct SeedRoleParam {
    record_id: String,
    name: String,
    description: String,
    permissions: Vec<String>,
    is_default: bool,
    catalog_role: Option<String>,
}

/// SurrealDB implementation of the Tenant repository.
#[derive(Clone)]
pub struct SurrealTenantRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealTenantRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn fetch_by_id(&self, id: Uuid) -> Result<Tenant, DbError> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(format!("{SELECT_TENANT} type::record('tenant', $id)"))
            .bind(("id", id_str.clone()))
            .await?;

        let rows: Vec<TenantRow> = result.take(0)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "tenant".into(),
            id: id_str,
        })?;

        row.try_into_tenant()
    }
}

impl<C: Connection> TenantRepository for SurrealTenantRepository<C> {
    async fn provision(
        &self,
        tenant: CreateTenant,
        seed_roles: Vec<CreateRole>,
    ) -> StratusResult<Tenant> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let enabled_modules: Vec<String> = tenant
            .enabled_modules
            .iter()
            .map(|m| m.as_str().to_string())
            .collect();

        let mut key_sets = String::new();
        let mut key_binds: Vec<(&'static str, String)> = Vec::new();
        for (module, record) in &tenant.api_keys {
            let (hash_col, cipher_col) = key_columns(*module);
            key_sets.push_str(&format!(", {hash_col} = ${hash_col}, {cipher_col} = ${cipher_col}"));
            key_binds.push((hash_col, record.key_hash.clone()));
            key_binds.push((cipher_col, record.key_cipher.clone()));
        }

        let roles: Vec<SeedRoleParam> = seed_roles
            .into_iter()
            .map(|r| SeedRoleParam {
                record_id: Uuid::new_v4().to_string(),
                name: r.name,
                description: r.description,
                permissions: r.permissions,
                is_default: r.is_default,
                catalog_role: r.catalog_role,
            })
            .collect();

        // Tenant row and seed roles commit or roll back together.
        let query = format!(
            "BEGIN TRANSACTION; \
             CREATE type::record('tenant', $id) SET \
             org_id = $org_id, name = $name, admin_email = $admin_email, \
             business_type = $business_type, status = 'Pending', \
             enabled_modules = $enabled_modules, \
             permission_template = $permission_template, \
             custom_permissions = $custom_permissions{key_sets}; \
             FOR $r IN $roles {{ \
                 CREATE type::record('role', $r.record_id) SET \
                 tenant_id = $id, name = $r.name, \
                 description = $r.description, \
                 permissions = $r.permissions, \
                 is_default = $r.is_default, \
                 catalog_role = $r.catalog_role; \
             }}; \
             COMMIT TRANSACTION;"
        );

        let mut builder = self
            .db
            .query(query)
            .bind(("id", id_str))
            .bind(("org_id", tenant.org_id))
            .bind(("name", tenant.name))
            .bind(("admin_email", tenant.admin_email))
            .bind(("business_type", tenant.business_type))
            .bind(("enabled_modules", enabled_modules))
            .bind(("permission_template", tenant.permission_template))
            .bind(("custom_permissions", tenant.custom_permissions))
            .bind(("roles", roles));
        for (col, value) in key_binds {
            builder = builder.bind((col, value));
        }

        let result = builder.await.map_err(DbError::from)?;
        result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        Ok(self.fetch_by_id(id).await?)
    }

    async fn get_by_id(&self, id: Uuid) -> StratusResult<Tenant> {
        Ok(self.fetch_by_id(id).await?)
    }

    async fn get_by_org_id(&self, org_id: &str) -> StratusResult<Tenant> {
        let mut result = self
            .db
            .query(format!("{SELECT_TENANT} tenant WHERE org_id = $org_id"))
            .bind(("org_id", org_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TenantRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "tenant".into(),
            id: format!("org_id={org_id}"),
        })?;

        Ok(row.try_into_tenant()?)
    }

    async fn get_by_api_key_hash(&self, key_hash: &str) -> StratusResult<Tenant> {
        let mut result = self
            .db
            .query(format!(
                "{SELECT_TENANT} tenant WHERE \
                 auth_key_hash = $hash OR rbac_key_hash = $hash OR \
                 logging_key_hash = $hash OR notifications_key_hash = $hash OR \
                 email_key_hash = $hash"
            ))
            .bind(("hash", key_hash.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TenantRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "tenant".into(),
            id: "api_key".into(),
        })?;

        Ok(row.try_into_tenant()?)
    }

    async fn update(&self, id: Uuid, input: UpdateTenant) -> StratusResult<Tenant> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.admin_email.is_some() {
            sets.push("admin_email = $admin_email");
        }
        if input.business_type.is_some() {
            sets.push("business_type = $business_type");
        }
        if input.status.is_some() {
            sets.push("status = $status");
        }
        if input.enabled_modules.is_some() {
            sets.push("enabled_modules = $enabled_modules");
        }
        if input.permission_template.is_some() {
            sets.push("permission_template = $permission_template");
        }
        if input.custom_permissions.is_some() {
            sets.push("custom_permissions = $custom_permissions");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('tenant', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(query).bind(("id", id_str.clone()));

        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(admin_email) = input.admin_email {
            builder = builder.bind(("admin_email", admin_email));
        }
        if let Some(business_type) = input.business_type {
            builder = builder.bind(("business_type", business_type));
        }
        if let Some(ref status) = input.status {
            builder = builder.bind(("status", status_to_string(status).to_string()));
        }
        if let Some(enabled_modules) = input.enabled_modules {
            let modules: Vec<String> = enabled_modules
                .iter()
                .map(|m| m.as_str().to_string())
                .collect();
            builder = builder.bind(("enabled_modules", modules));
        }
        if let Some(permission_template) = input.permission_template {
            // Some(None) clears the reference.
            builder = builder.bind(("permission_template", permission_template));
        }
        if let Some(custom_permissions) = input.custom_permissions {
            builder = builder.bind(("custom_permissions", custom_permissions));
        }

        let result = builder.await.map_err(DbError::from)?;
        result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        Ok(self.fetch_by_id(id).await?)
    }

    async fn set_status(&self, id: Uuid, status: TenantStatus) -> StratusResult<()> {
        self.db
            .query(
                "UPDATE type::record('tenant', $id) SET \
                 status = $status, updated_at = time::now()",
            )
            .bind(("id", id.to_string()))
            .bind(("status", status_to_string(&status).to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn set_module_key(
        &self,
        id: Uuid,
        module: Module,
        record: ApiKeyRecord,
    ) -> StratusResult<()> {
        let (hash_col, cipher_col) = key_columns(module);
        let query = format!(
            "UPDATE type::record('tenant', $id) SET \
             {hash_col} = $hash, {cipher_col} = $cipher, \
             updated_at = time::now()"
        );

        self.db
            .query(query)
            .bind(("id", id.to_string()))
            .bind(("hash", record.key_hash))
            .bind(("cipher", record.key_cipher))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn list(&self, pagination: Pagination) -> StratusResult<PaginatedResult<Tenant>> {
        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM tenant GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(format!(
                "{SELECT_TENANT} tenant \
                 ORDER BY created_at ASC \
                 LIMIT $limit START $offset"
            ))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TenantRow> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_tenant())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
