//! Authentication service — tenant-user login, token verification, and
//! logout orchestration.

use chrono::{DateTime, TimeZone, Utc};
use stratus_core::error::{StratusError, StratusResult};
use stratus_core::models::user::{TenantUser, UserStatus};
use stratus_core::repository::{RevocationRepository, RoleRepository, UserRepository};
use tracing::info;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::password;
use crate::token::{self, AccessTokenClaims};

/// Successful login result.
#[derive(Debug)]
pub struct LoginOutput {
    /// Signed session token.
    pub token: String,
    pub user: TenantUser,
    pub expires_at: DateTime<Utc>,
}

/// Verify a token end-to-end: signature, issuer, expiry (zero leeway),
/// then the revocation registry.
///
/// Expiry is checked before revocation, so a revoked token that has
/// since passed its natural expiry fails with the ordinary expiry
/// error and its registry entry can be reaped.
pub async fn verify_token<V: RevocationRepository>(
    token: &str,
    config: &AuthConfig,
    revocations: &V,
) -> StratusResult<AccessTokenClaims> {
    let claims = token::decode_token(token, config).map_err::<StratusError, _>(AuthError::into)?;
    if revocations.is_revoked(&claims.jti).await? {
        return Err(AuthError::RevokedToken.into());
    }
    Ok(claims)
}

/// Authentication service for tenant users.
///
/// Generic over repository implementations so that the auth layer has
/// no dependency on the database crate.
pub struct AuthService<U: UserRepository, R: RoleRepository, V: RevocationRepository> {
    user_repo: U,
    role_repo: R,
    revocations: V,
    config: AuthConfig,
}

impl<U: UserRepository, R: RoleRepository, V: RevocationRepository> AuthService<U, R, V> {
    pub fn new(user_repo: U, role_repo: R, revocations: V, config: AuthConfig) -> Self {
        Self {
            user_repo,
            role_repo,
            revocations,
            config,
        }
    }

    /// Authenticate a tenant user by email + password and mint a
    /// session token.
    ///
    /// Every failure path — unknown user, inactive account, wrong
    /// password — collapses to `InvalidCredentials`; the specific
    /// reason is logged server-side only. The unknown-user path still
    /// performs a hash comparison so its timing matches the
    /// known-user path.
    pub async fn login(
        &self,
        tenant_id: Uuid,
        email: &str,
        password: &str,
    ) -> StratusResult<LoginOutput> {
        let pepper = self.config.pepper.as_deref();

        let user = match self.user_repo.get_by_email(tenant_id, email).await {
            Ok(u) => u,
            Err(stratus_core::StratusError::NotFound { .. }) => {
                password::dummy_verify(password, pepper);
                info!(tenant_id = %tenant_id, "login failed: unknown user");
                return Err(AuthError::InvalidCredentials.into());
            }
            Err(e) => return Err(e),
        };

        let valid = password::verify_password(password, &user.password_hash, pepper)
            .map_err::<StratusError, _>(AuthError::into)?;
        if !valid {
            info!(tenant_id = %tenant_id, user_id = %user.id, "login failed: bad password");
            return Err(AuthError::InvalidCredentials.into());
        }

        if user.status != UserStatus::Active {
            info!(tenant_id = %tenant_id, user_id = %user.id, "login failed: inactive account");
            return Err(AuthError::InvalidCredentials.into());
        }

        let roles = self.role_repo.get_user_roles(tenant_id, user.id).await?;
        let role_ids: Vec<Uuid> = roles.iter().map(|r| r.id).collect();

        let now = Utc::now();
        self.user_repo.record_login(tenant_id, user.id, now).await?;

        let token =
            token::issue_tenant_token(user.id, tenant_id, &user.email, &role_ids, &self.config)
                .map_err::<StratusError, _>(AuthError::into)?;
        let expires_at = now + chrono::Duration::seconds(self.config.token_lifetime_secs as i64);

        info!(tenant_id = %tenant_id, user_id = %user.id, "login succeeded");

        Ok(LoginOutput {
            token,
            user,
            expires_at,
        })
    }

    /// Verify a session token (signature, expiry, revocation).
    pub async fn verify(&self, token: &str) -> StratusResult<AccessTokenClaims> {
        verify_token(token, &self.config, &self.revocations).await
    }

    /// Invalidate a token by adding its id to the revocation registry.
    ///
    /// The registry entry inherits the token's own expiry, so it can be
    /// reaped once the ordinary expiry check takes over. Tokens that do
    /// not decode cannot be logged out.
    pub async fn logout(&self, token: &str) -> StratusResult<()> {
        let claims = token::decode_token(token, &self.config).map_err::<StratusError, _>(AuthError::into)?;
        let expires_at = Utc
            .timestamp_opt(claims.exp, 0)
            .single()
            .unwrap_or_else(Utc::now);
        self.revocations.revoke(&claims.jti, expires_at).await?;
        info!(jti = %claims.jti, "token revoked");
        Ok(())
    }

    /// Drop registry entries for tokens past their natural expiry.
    pub async fn reap_revocations(&self) -> StratusResult<u64> {
        self.revocations.cleanup_expired().await
    }
}
