//! SurrealDB implementation of [`RevocationRepository`].
//!
//! The registry is shared by every server process, which is what makes
//! logout effective across a multi-process deployment. Entries outlive
//! their usefulness at the token's natural expiry and are reaped by
//! `cleanup_expired`.

use chrono::{DateTime, Utc};
use stratus_core::error::StratusResult;
use stratus_core::repository::RevocationRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct RevokedRow {
    #[allow(dead_code)]
    record_id: String,
}

#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the token revocation registry.
#[derive(Clone)]
pub struct SurrealRevocationRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealRevocationRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> RevocationRepository for SurrealRevocationRepository<C> {
    async fn revoke(&self, jti: &str, expires_at: DateTime<Utc>) -> StratusResult<()> {
        // Revoking twice is a no-op; last write wins.
        self.db
            .query(
                "UPSERT type::record('revoked_token', $jti) SET \
                 expires_at = $expires_at, revoked_at = time::now()",
            )
            .bind(("jti", jti.to_string()))
            .bind(("expires_at", expires_at))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn is_revoked(&self, jti: &str) -> StratusResult<bool> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id \
                 FROM type::record('revoked_token', $jti)",
            )
            .bind(("jti", jti.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RevokedRow> = result.take(0).map_err(DbError::from)?;
        Ok(!rows.is_empty())
    }

    async fn cleanup_expired(&self) -> StratusResult<u64> {
        // Count expired entries first, then delete.
        let mut count_result = self
            .db
            .query(
                "SELECT count() AS total FROM revoked_token \
                 WHERE expires_at < time::now() GROUP ALL",
            )
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        self.db
            .query("DELETE revoked_token WHERE expires_at < time::now()")
            .await
            .map_err(DbError::from)?;

        Ok(total)
    }
}
