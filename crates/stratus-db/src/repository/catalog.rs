//! SurrealDB implementation of [`CatalogRepository`].
//!
//! Catalog entries use their stable string ids as record ids, so
//! removal + re-add with the same id restores a tenant's reference.

use stratus_core::error::StratusResult;
use stratus_core::models::catalog::{BusinessType, DefaultRole, PermissionTemplate, SsoProvider};
use stratus_core::repository::CatalogRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct TemplateRow {
    record_id: String,
    name: String,
    permissions: Vec<String>,
}

#[derive(Debug, SurrealValue)]
struct BusinessTypeRow {
    record_id: String,
    name: String,
    default_roles: Vec<String>,
}

#[derive(Debug, SurrealValue)]
struct DefaultRoleRow {
    record_id: String,
    name: String,
    description: String,
    permissions: Vec<String>,
}

#[derive(Debug, SurrealValue)]
struct SsoProviderRow {
    record_id: String,
    name: String,
    kind: String,
}

/// SurrealDB implementation of the platform catalog repository.
#[derive(Clone)]
pub struct SurrealCatalogRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealCatalogRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn remove(&self, table: &str, id: &str) -> StratusResult<()> {
        self.db
            .query(format!("DELETE type::record('{table}', $id)"))
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;
        Ok(())
    }
}

impl<C: Connection> CatalogRepository for SurrealCatalogRepository<C> {
    async fn list_permission_templates(&self) -> StratusResult<Vec<PermissionTemplate>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM permission_template \
                 ORDER BY name ASC",
            )
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TemplateRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .map(|r| PermissionTemplate {
                id: r.record_id,
                name: r.name,
                permissions: r.permissions,
            })
            .collect())
    }

    async fn get_permission_template(&self, id: &str) -> StratusResult<PermissionTemplate> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * \
                 FROM type::record('permission_template', $id)",
            )
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TemplateRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "permission_template".into(),
            id: id.to_string(),
        })?;

        Ok(PermissionTemplate {
            id: row.record_id,
            name: row.name,
            permissions: row.permissions,
        })
    }

    async fn upsert_permission_template(&self, template: PermissionTemplate) -> StratusResult<()> {
        self.db
            .query(
                "UPSERT type::record('permission_template', $id) SET \
                 name = $name, permissions = $permissions",
            )
            .bind(("id", template.id))
            .bind(("name", template.name))
            .bind(("permissions", template.permissions))
            .await
            .map_err(DbError::from)?;
        Ok(())
    }

    async fn remove_permission_template(&self, id: &str) -> StratusResult<()> {
        self.remove("permission_template", id).await
    }

    async fn list_business_types(&self) -> StratusResult<Vec<BusinessType>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM business_type \
                 ORDER BY name ASC",
            )
            .await
            .map_err(DbError::from)?;

        let rows: Vec<BusinessTypeRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .map(|r| BusinessType {
                id: r.record_id,
                name: r.name,
                default_roles: r.default_roles,
            })
            .collect())
    }

    async fn get_business_type(&self, id: &str) -> StratusResult<BusinessType> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * \
                 FROM type::record('business_type', $id)",
            )
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<BusinessTypeRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "business_type".into(),
            id: id.to_string(),
        })?;

        Ok(BusinessType {
            id: row.record_id,
            name: row.name,
            default_roles: row.default_roles,
        })
    }

    async fn upsert_business_type(&self, business_type: BusinessType) -> StratusResult<()> {
        self.db
            .query(
                "UPSERT type::record('business_type', $id) SET \
                 name = $name, default_roles = $default_roles",
            )
            .bind(("id", business_type.id))
            .bind(("name", business_type.name))
            .bind(("default_roles", business_type.default_roles))
            .await
            .map_err(DbError::from)?;
        Ok(())
    }

    async fn remove_business_type(&self, id: &str) -> StratusResult<()> {
        self.remove("business_type", id).await
    }

    async fn list_default_roles(&self) -> StratusResult<Vec<DefaultRole>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM default_role \
                 ORDER BY name ASC",
            )
            .await
            .map_err(DbError::from)?;

        let rows: Vec<DefaultRoleRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .map(|r| DefaultRole {
                id: r.record_id,
                name: r.name,
                description: r.description,
                permissions: r.permissions,
            })
            .collect())
    }

    async fn get_default_role(&self, id: &str) -> StratusResult<DefaultRole> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * \
                 FROM type::record('default_role', $id)",
            )
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<DefaultRoleRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "default_role".into(),
            id: id.to_string(),
        })?;

        Ok(DefaultRole {
            id: row.record_id,
            name: row.name,
            description: row.description,
            permissions: row.permissions,
        })
    }

    async fn upsert_default_role(&self, role: DefaultRole) -> StratusResult<()> {
        self.db
            .query(
                "UPSERT type::record('default_role', $id) SET \
                 name = $name, description = $description, \
                 permissions = $permissions",
            )
            .bind(("id", role.id))
            .bind(("name", role.name))
            .bind(("description", role.description))
            .bind(("permissions", role.permissions))
            .await
            .map_err(DbError::from)?;
        Ok(())
    }

    async fn remove_default_role(&self, id: &str) -> StratusResult<()> {
        self.remove("default_role", id).await
    }

    async fn list_sso_providers(&self) -> StratusResult<Vec<SsoProvider>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM sso_provider \
                 ORDER BY name ASC",
            )
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SsoProviderRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .map(|r| SsoProvider {
                id: r.record_id,
                name: r.name,
                kind: r.kind,
            })
            .collect())
    }

    async fn upsert_sso_provider(&self, provider: SsoProvider) -> StratusResult<()> {
        self.db
            .query(
                "UPSERT type::record('sso_provider', $id) SET \
                 name = $name, kind = $kind",
            )
            .bind(("id", provider.id))
            .bind(("name", provider.name))
            .bind(("kind", provider.kind))
            .await
            .map_err(DbError::from)?;
        Ok(())
    }

    async fn remove_sso_provider(&self, id: &str) -> StratusResult<()> {
        self.remove("sso_provider", id).await
    }
}
