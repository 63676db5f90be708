//! Platform-admin authentication.
//!
//! Platform admins are global accounts; their tokens carry `platform`
//! scope and no tenant id.

use chrono::{DateTime, Utc};
use stratus_core::error::{StratusError, StratusResult};
use stratus_core::models::admin::{AdminRole, PlatformAdmin};
use stratus_core::repository::{PlatformAdminRepository, RevocationRepository};
use tracing::info;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::password;
use crate::service::verify_token;
use crate::token::{self, AccessTokenClaims};

#[derive(Debug)]
pub struct PlatformLoginOutput {
    pub token: String,
    pub admin: PlatformAdmin,
    pub expires_at: DateTime<Utc>,
}

pub struct PlatformAuthService<A: PlatformAdminRepository, V: RevocationRepository> {
    admin_repo: A,
    revocations: V,
    config: AuthConfig,
}

impl<A: PlatformAdminRepository, V: RevocationRepository> PlatformAuthService<A, V> {
    pub fn new(admin_repo: A, revocations: V, config: AuthConfig) -> Self {
        Self {
            admin_repo,
            revocations,
            config,
        }
    }

    /// Authenticate a platform admin by email + password.
    ///
    /// SSO-only admins have no stored hash and cannot password-login;
    /// that path, like unknown email and inactive account, burns a
    /// dummy hash comparison and collapses to `InvalidCredentials`.
    pub async fn login(&self, email: &str, password: &str) -> StratusResult<PlatformLoginOutput> {
        let pepper = self.config.pepper.as_deref();

        let admin = match self.admin_repo.get_by_email(email).await {
            Ok(a) => a,
            Err(stratus_core::StratusError::NotFound { .. }) => {
                password::dummy_verify(password, pepper);
                info!("platform login failed: unknown admin");
                return Err(AuthError::InvalidCredentials.into());
            }
            Err(e) => return Err(e),
        };

        let Some(hash) = admin.password_hash.as_deref() else {
            password::dummy_verify(password, pepper);
            info!(admin_id = %admin.id, "platform login failed: SSO-only admin");
            return Err(AuthError::InvalidCredentials.into());
        };

        let valid = password::verify_password(password, hash, pepper).map_err::<StratusError, _>(AuthError::into)?;
        if !valid {
            info!(admin_id = %admin.id, "platform login failed: bad password");
            return Err(AuthError::InvalidCredentials.into());
        }

        if !admin.is_active {
            info!(admin_id = %admin.id, "platform login failed: inactive admin");
            return Err(AuthError::InvalidCredentials.into());
        }

        let now = Utc::now();
        self.admin_repo.record_login(admin.id, now).await?;

        let role = match admin.role {
            AdminRole::Admin => "admin",
            AdminRole::SuperAdmin => "super_admin",
        };
        let token = token::issue_platform_token(admin.id, &admin.email, role, &self.config)
            .map_err::<StratusError, _>(AuthError::into)?;
        let expires_at = now + chrono::Duration::seconds(self.config.token_lifetime_secs as i64);

        info!(admin_id = %admin.id, "platform login succeeded");

        Ok(PlatformLoginOutput {
            token,
            admin,
            expires_at,
        })
    }

    /// Verify a platform token (signature, expiry, revocation, scope).
    pub async fn verify(&self, token: &str) -> StratusResult<AccessTokenClaims> {
        let claims = verify_token(token, &self.config, &self.revocations).await?;
        if claims.scope != token::TokenScope::Platform {
            return Err(AuthError::InvalidToken("not a platform token".into()).into());
        }
        Ok(claims)
    }
}
