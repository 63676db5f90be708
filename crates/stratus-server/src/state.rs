//! Shared application state and request extractors.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use stratus_auth::token::AccessTokenClaims;
use stratus_auth::{AuthService, CredentialStore, PlatformAuthService};
use stratus_core::StratusError;
use stratus_core::models::tenant::Tenant;
use stratus_db::repository::{
    SurrealCatalogRepository, SurrealPlatformAdminRepository, SurrealRevocationRepository,
    SurrealRoleRepository, SurrealTenantRepository, SurrealUserRepository,
};
use stratus_db::DbManager;
use stratus_rbac::{OnboardingService, PermissionResolver};

use crate::error::ApiError;

/// Connection type all repositories share in the server binary.
pub type Db = surrealdb::engine::remote::ws::Client;

pub type TenantRepo = SurrealTenantRepository<Db>;
pub type UserRepo = SurrealUserRepository<Db>;
pub type RoleRepo = SurrealRoleRepository<Db>;
pub type AdminRepo = SurrealPlatformAdminRepository<Db>;
pub type CatalogRepo = SurrealCatalogRepository<Db>;
pub type RevocationRepo = SurrealRevocationRepository<Db>;

#[derive(Clone)]
pub struct AppState {
    pub credentials: Arc<CredentialStore<TenantRepo>>,
    pub auth: Arc<AuthService<UserRepo, RoleRepo, RevocationRepo>>,
    pub platform_auth: Arc<PlatformAuthService<AdminRepo, RevocationRepo>>,
    pub resolver: Arc<PermissionResolver<TenantRepo, UserRepo, RoleRepo, CatalogRepo>>,
    pub onboarding: Arc<OnboardingService<TenantRepo, CatalogRepo>>,
    pub tenants: TenantRepo,
    pub catalog: CatalogRepo,
    pub db: DbManager,
}

/// The tenant resolved from the request's `X-API-Key` header.
pub struct ApiKeyTenant(pub Tenant);

impl FromRequestParts<AppState> for ApiKeyTenant {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let key = parts
            .headers
            .get("x-api-key")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                ApiError::from(StratusError::AuthenticationFailed {
                    reason: "missing API key".into(),
                })
            })?;

        let tenant = state.credentials.authenticate(key).await?;
        Ok(ApiKeyTenant(tenant))
    }
}

/// Claims of a verified `Authorization: Bearer` token, plus the raw
/// token for logout.
pub struct BearerToken {
    pub claims: AccessTokenClaims,
    pub raw: String,
}

impl FromRequestParts<AppState> for BearerToken {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or_else(|| {
                ApiError::from(StratusError::AuthenticationFailed {
                    reason: "missing bearer token".into(),
                })
            })?
            .to_string();

        let claims = state.auth.verify(&raw).await?;
        Ok(BearerToken { claims, raw })
    }
}

/// Claims of a verified platform-scoped bearer token.
pub struct PlatformBearer(pub AccessTokenClaims);

impl FromRequestParts<AppState> for PlatformBearer {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or_else(|| {
                ApiError::from(StratusError::AuthenticationFailed {
                    reason: "missing bearer token".into(),
                })
            })?;

        let claims = state.platform_auth.verify(raw).await?;
        Ok(PlatformBearer(claims))
    }
}
