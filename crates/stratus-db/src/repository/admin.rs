//! SurrealDB implementation of [`PlatformAdminRepository`].

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHasher};
use chrono::{DateTime, Utc};
use stratus_core::error::StratusResult;
use stratus_core::models::admin::{AdminRole, CreatePlatformAdmin, PlatformAdmin};
use stratus_core::repository::PlatformAdminRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct AdminRow {
    record_id: String,
    email: String,
    name: String,
    password_hash: Option<String>,
    role: String,
    is_active: bool,
    last_login_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

fn parse_role(s: &str) -> Result<AdminRole, DbError> {
    match s {
        "admin" => Ok(AdminRole::Admin),
        "super_admin" => Ok(AdminRole::SuperAdmin),
        other => Err(DbError::Decode(format!("unknown admin role: {other}"))),
    }
}

fn role_to_string(r: &AdminRole) -> &'static str {
    match r {
        AdminRole::Admin => "admin",
        AdminRole::SuperAdmin => "super_admin",
    }
}

impl AdminRow {
    fn try_into_admin(self) -> Result<PlatformAdmin, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Decode(format!("invalid UUID: {e}")))?;
        Ok(PlatformAdmin {
            id,
            email: self.email,
            name: self.name,
            password_hash: self.password_hash,
            role: parse_role(&self.role)?,
            is_active: self.is_active,
            last_login_at: self.last_login_at,
            created_at: self.created_at,
        })
    }
}

fn hash_password(password: &str) -> Result<String, DbError> {
    let params = argon2::Params::new(19456, 2, 1, None)
        .map_err(|e| DbError::Decode(format!("argon2 params error: {e}")))?;
    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);
    let salt = SaltString::generate(&mut argon2::password_hash::rand_core::OsRng);
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| DbError::Decode(format!("password hash error: {e}")))?;
    Ok(hash.to_string())
}

/// SurrealDB implementation of the platform-admin repository.
#[derive(Clone)]
pub struct SurrealPlatformAdminRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealPlatformAdminRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> PlatformAdminRepository for SurrealPlatformAdminRepository<C> {
    async fn create(&self, input: CreatePlatformAdmin) -> StratusResult<PlatformAdmin> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        // SSO-only admins carry no hash at all.
        let password_hash = match &input.password {
            Some(p) => Some(hash_password(p)?),
            None => None,
        };

        let result = self
            .db
            .query(
                "CREATE type::record('platform_admin', $id) SET \
                 email = $email, name = $name, \
                 password_hash = $password_hash, \
                 role = $role, is_active = true, \
                 last_login_at = NONE",
            )
            .bind(("id", id_str.clone()))
            .bind(("email", input.email))
            .bind(("name", input.name))
            .bind(("password_hash", password_hash))
            .bind(("role", role_to_string(&input.role).to_string()))
            .await
            .map_err(DbError::from)?;

        result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        self.get_by_id(id).await
    }

    async fn get_by_id(&self, id: Uuid) -> StratusResult<PlatformAdmin> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * \
                 FROM type::record('platform_admin', $id)",
            )
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AdminRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "platform_admin".into(),
            id: id_str,
        })?;

        Ok(row.try_into_admin()?)
    }

    async fn get_by_email(&self, email: &str) -> StratusResult<PlatformAdmin> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM platform_admin \
                 WHERE email = $email",
            )
            .bind(("email", email.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AdminRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "platform_admin".into(),
            id: format!("email={email}"),
        })?;

        Ok(row.try_into_admin()?)
    }

    async fn record_login(&self, id: Uuid, at: DateTime<Utc>) -> StratusResult<()> {
        self.db
            .query(
                "UPDATE type::record('platform_admin', $id) SET \
                 last_login_at = $at",
            )
            .bind(("id", id.to_string()))
            .bind(("at", at))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn set_active(&self, id: Uuid, is_active: bool) -> StratusResult<()> {
        self.db
            .query(
                "UPDATE type::record('platform_admin', $id) SET \
                 is_active = $is_active",
            )
            .bind(("id", id.to_string()))
            .bind(("is_active", is_active))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }
}
