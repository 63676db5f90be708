//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! UUIDs are stored as strings. Enums are stored as strings with
//! ASSERT constraints for validation. Catalog tables use their stable
//! string ids as record ids.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1 — initial table definitions
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Tenants (global scope)
-- =======================================================================
DEFINE TABLE tenant SCHEMAFULL;
DEFINE FIELD org_id ON TABLE tenant TYPE string;
DEFINE FIELD name ON TABLE tenant TYPE string;
DEFINE FIELD admin_email ON TABLE tenant TYPE string;
DEFINE FIELD business_type ON TABLE tenant TYPE option<string>;
DEFINE FIELD status ON TABLE tenant TYPE string \
    ASSERT $value IN ['Pending', 'Active', 'Suspended'];
DEFINE FIELD enabled_modules ON TABLE tenant TYPE array;
DEFINE FIELD enabled_modules.* ON TABLE tenant TYPE string;
-- One (lookup hash, enc:v1 envelope) column pair per module key.
DEFINE FIELD auth_key_hash ON TABLE tenant TYPE option<string>;
DEFINE FIELD auth_key_cipher ON TABLE tenant TYPE option<string>;
DEFINE FIELD rbac_key_hash ON TABLE tenant TYPE option<string>;
DEFINE FIELD rbac_key_cipher ON TABLE tenant TYPE option<string>;
DEFINE FIELD logging_key_hash ON TABLE tenant TYPE option<string>;
DEFINE FIELD logging_key_cipher ON TABLE tenant TYPE option<string>;
DEFINE FIELD notifications_key_hash ON TABLE tenant TYPE option<string>;
DEFINE FIELD notifications_key_cipher ON TABLE tenant TYPE option<string>;
DEFINE FIELD email_key_hash ON TABLE tenant TYPE option<string>;
DEFINE FIELD email_key_cipher ON TABLE tenant TYPE option<string>;
DEFINE FIELD permission_template ON TABLE tenant TYPE option<string>;
DEFINE FIELD custom_permissions ON TABLE tenant TYPE array;
DEFINE FIELD custom_permissions.* ON TABLE tenant TYPE string;
DEFINE FIELD created_at ON TABLE tenant TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE tenant TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_tenant_org_id ON TABLE tenant COLUMNS org_id UNIQUE;
DEFINE INDEX idx_tenant_auth_key ON TABLE tenant COLUMNS auth_key_hash;
DEFINE INDEX idx_tenant_rbac_key ON TABLE tenant COLUMNS rbac_key_hash;
DEFINE INDEX idx_tenant_logging_key ON TABLE tenant \
    COLUMNS logging_key_hash;
DEFINE INDEX idx_tenant_notifications_key ON TABLE tenant \
    COLUMNS notifications_key_hash;
DEFINE INDEX idx_tenant_email_key ON TABLE tenant \
    COLUMNS email_key_hash;

-- =======================================================================
-- Tenant users (tenant scope)
-- =======================================================================
DEFINE TABLE tenant_user SCHEMAFULL;
DEFINE FIELD tenant_id ON TABLE tenant_user TYPE string;
DEFINE FIELD email ON TABLE tenant_user TYPE string;
DEFINE FIELD password_hash ON TABLE tenant_user TYPE string;
DEFINE FIELD status ON TABLE tenant_user TYPE string \
    ASSERT $value IN ['Active', 'Inactive'];
DEFINE FIELD email_verified ON TABLE tenant_user TYPE bool \
    DEFAULT false;
DEFINE FIELD last_login_at ON TABLE tenant_user TYPE option<datetime>;
DEFINE FIELD created_at ON TABLE tenant_user TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE tenant_user TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_tenant_user_email ON TABLE tenant_user \
    COLUMNS tenant_id, email UNIQUE;

-- =======================================================================
-- Platform admins (global scope)
-- =======================================================================
DEFINE TABLE platform_admin SCHEMAFULL;
DEFINE FIELD email ON TABLE platform_admin TYPE string;
DEFINE FIELD name ON TABLE platform_admin TYPE string;
-- NONE for SSO-only admins.
DEFINE FIELD password_hash ON TABLE platform_admin TYPE option<string>;
DEFINE FIELD role ON TABLE platform_admin TYPE string \
    ASSERT $value IN ['admin', 'super_admin'];
DEFINE FIELD is_active ON TABLE platform_admin TYPE bool DEFAULT true;
DEFINE FIELD last_login_at ON TABLE platform_admin \
    TYPE option<datetime>;
DEFINE FIELD created_at ON TABLE platform_admin TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_platform_admin_email ON TABLE platform_admin \
    COLUMNS email UNIQUE;

-- =======================================================================
-- Roles (tenant scope)
-- =======================================================================
DEFINE TABLE role SCHEMAFULL;
DEFINE FIELD tenant_id ON TABLE role TYPE string;
DEFINE FIELD name ON TABLE role TYPE string;
DEFINE FIELD description ON TABLE role TYPE string;
DEFINE FIELD permissions ON TABLE role TYPE array;
DEFINE FIELD permissions.* ON TABLE role TYPE string;
DEFINE FIELD is_default ON TABLE role TYPE bool DEFAULT false;
DEFINE FIELD catalog_role ON TABLE role TYPE option<string>;
DEFINE FIELD created_at ON TABLE role TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE role TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_role_tenant_name ON TABLE role \
    COLUMNS tenant_id, name UNIQUE;

-- =======================================================================
-- Platform catalog (global scope; stable string ids as record ids)
-- =======================================================================
DEFINE TABLE permission_template SCHEMAFULL;
DEFINE FIELD name ON TABLE permission_template TYPE string;
DEFINE FIELD permissions ON TABLE permission_template TYPE array;
DEFINE FIELD permissions.* ON TABLE permission_template TYPE string;

DEFINE TABLE business_type SCHEMAFULL;
DEFINE FIELD name ON TABLE business_type TYPE string;
DEFINE FIELD default_roles ON TABLE business_type TYPE array;
DEFINE FIELD default_roles.* ON TABLE business_type TYPE string;

DEFINE TABLE default_role SCHEMAFULL;
DEFINE FIELD name ON TABLE default_role TYPE string;
DEFINE FIELD description ON TABLE default_role TYPE string;
DEFINE FIELD permissions ON TABLE default_role TYPE array;
DEFINE FIELD permissions.* ON TABLE default_role TYPE string;

DEFINE TABLE sso_provider SCHEMAFULL;
DEFINE FIELD name ON TABLE sso_provider TYPE string;
DEFINE FIELD kind ON TABLE sso_provider TYPE string;

-- =======================================================================
-- Token revocation registry (jti as record id)
-- =======================================================================
DEFINE TABLE revoked_token SCHEMAFULL;
DEFINE FIELD expires_at ON TABLE revoked_token TYPE datetime;
DEFINE FIELD revoked_at ON TABLE revoked_token TYPE datetime \
    DEFAULT time::now();

-- =======================================================================
-- Graph Edge Tables (relations)
-- =======================================================================

-- User -> Role assignment
DEFINE TABLE has_role TYPE RELATION SCHEMAFULL;
";

// -----------------------------------------------------------------------
// Public API
// -----------------------------------------------------------------------

/// Run all pending migrations against the given SurrealDB client.
///
/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the current maximum.
/// All DEFINE statements are idempotent so re-running is safe.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    // Ensure migration tracking table exists (idempotent).
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    // Determine current schema version.
    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            db.query(migration.sql).await?.check().map_err(|e| {
                DbError::Migration(format!(
                    "Migration v{} '{}' failed: {}",
                    migration.version, migration.name, e,
                ))
            })?;

            // Record the applied migration.
            db.query(
                "CREATE _migration SET version = $version, \
                 name = $name",
            )
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;
        }
    }

    Ok(())
}
