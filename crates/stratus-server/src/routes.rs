//! HTTP route handlers.

use std::collections::BTreeMap;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use stratus_core::StratusError;
use stratus_core::models::tenant::{Module, Tenant, TenantStatus};
use stratus_core::models::user::{TenantUser, UserStatus};
use stratus_core::repository::{CatalogRepository, TenantRepository};
use stratus_rbac::NewTenant;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::{ApiKeyTenant, AppState, BearerToken, PlatformBearer};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/verify", get(verify))
        .route("/rbac/check-permission", post(check_permission))
        .route("/tenant/config-status", get(config_status))
        .route("/catalog/permission-templates", get(list_permission_templates))
        .route("/catalog/business-types", get(list_business_types))
        .route("/catalog/default-roles", get(list_default_roles))
        .route("/catalog/sso-providers", get(list_sso_providers))
        .route("/platform/login", post(platform_login))
        .route("/platform/tenants", post(onboard_tenant))
        .route("/platform/tenants/{id}/status", post(set_tenant_status))
        .route("/platform/tenants/{id}/keys/{module}", post(rotate_key))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Result<&'static str, ApiError> {
    state
        .db
        .ping()
        .await
        .map_err(|e| ApiError::from(StratusError::Database(e.to_string())))?;
    Ok("OK")
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

/// Tenant user without its password hash.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UserView {
    id: Uuid,
    tenant_id: Uuid,
    email: String,
    status: UserStatus,
    email_verified: bool,
    last_login_at: Option<DateTime<Utc>>,
}

impl From<TenantUser> for UserView {
    fn from(u: TenantUser) -> Self {
        Self {
            id: u.id,
            tenant_id: u.tenant_id,
            email: u.email,
            status: u.status,
            email_verified: u.email_verified,
            last_login_at: u.last_login_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    success: bool,
    token: String,
    user: UserView,
    expires_at: DateTime<Utc>,
}

async fn login(
    State(state): State<AppState>,
    ApiKeyTenant(tenant): ApiKeyTenant,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let output = state.auth.login(tenant.id, &body.email, &body.password).await?;
    Ok(Json(LoginResponse {
        success: true,
        token: output.token,
        user: output.user.into(),
        expires_at: output.expires_at,
    }))
}

async fn logout(
    State(state): State<AppState>,
    bearer: BearerToken,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.auth.logout(&bearer.raw).await?;
    Ok(Json(json!({ "success": true })))
}

async fn verify(bearer: BearerToken) -> Json<serde_json::Value> {
    Json(json!({ "claims": bearer.claims }))
}

// ---------------------------------------------------------------------------
// RBAC
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CheckPermissionRequest {
    user_id: Uuid,
    permission: String,
}

async fn check_permission(
    State(state): State<AppState>,
    ApiKeyTenant(tenant): ApiKeyTenant,
    Json(body): Json<CheckPermissionRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let allowed = state
        .resolver
        .has_permission(tenant.id, body.user_id, &body.permission)
        .await?;
    Ok(Json(json!({ "allowed": allowed })))
}

async fn config_status(
    State(state): State<AppState>,
    ApiKeyTenant(tenant): ApiKeyTenant,
) -> Result<Json<serde_json::Value>, ApiError> {
    let revoked = state.resolver.config_status(tenant.id).await?;
    let entries: Vec<serde_json::Value> = revoked
        .iter()
        .map(|r| json!({ "kind": r.kind, "id": r.id }))
        .collect();
    Ok(Json(json!({ "revoked": entries })))
}

// ---------------------------------------------------------------------------
// Catalog (polled by dashboards; ordered collections)
// ---------------------------------------------------------------------------

async fn list_permission_templates(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let items = state.catalog.list_permission_templates().await?;
    Ok(Json(json!({ "items": items })))
}

async fn list_business_types(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let items = state.catalog.list_business_types().await?;
    Ok(Json(json!({ "items": items })))
}

async fn list_default_roles(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let items = state.catalog.list_default_roles().await?;
    Ok(Json(json!({ "items": items })))
}

async fn list_sso_providers(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let items = state.catalog.list_sso_providers().await?;
    Ok(Json(json!({ "items": items })))
}

// ---------------------------------------------------------------------------
// Platform administration
// ---------------------------------------------------------------------------

async fn platform_login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let output = state.platform_auth.login(&body.email, &body.password).await?;
    Ok(Json(json!({
        "success": true,
        "token": output.token,
        "admin": {
            "id": output.admin.id,
            "email": output.admin.email,
            "name": output.admin.name,
            "role": output.admin.role,
        },
        "expiresAt": output.expires_at,
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OnboardTenantRequest {
    org_id: String,
    name: String,
    admin_email: String,
    business_type: Option<String>,
    enabled_modules: Vec<String>,
    permission_template: Option<String>,
}

/// Tenant without its key material.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TenantView {
    id: Uuid,
    org_id: String,
    name: String,
    admin_email: String,
    business_type: Option<String>,
    status: TenantStatus,
    enabled_modules: Vec<Module>,
    permission_template: Option<String>,
    custom_permissions: Vec<String>,
}

impl From<Tenant> for TenantView {
    fn from(t: Tenant) -> Self {
        Self {
            id: t.id,
            org_id: t.org_id,
            name: t.name,
            admin_email: t.admin_email,
            business_type: t.business_type,
            status: t.status,
            enabled_modules: t.enabled_modules,
            permission_template: t.permission_template,
            custom_permissions: t.custom_permissions,
        }
    }
}

fn parse_module(s: &str) -> Result<Module, ApiError> {
    Module::parse(s).ok_or_else(|| {
        ApiError::from(StratusError::Validation {
            message: format!("unknown module: {s}"),
        })
    })
}

async fn onboard_tenant(
    State(state): State<AppState>,
    PlatformBearer(_claims): PlatformBearer,
    Json(body): Json<OnboardTenantRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let enabled_modules = body
        .enabled_modules
        .iter()
        .map(|m| parse_module(m))
        .collect::<Result<Vec<_>, _>>()?;

    let (tenant, issued) = state
        .onboarding
        .onboard(NewTenant {
            org_id: body.org_id,
            name: body.name,
            admin_email: body.admin_email,
            business_type: body.business_type,
            enabled_modules,
            permission_template: body.permission_template,
        })
        .await?;

    // The only response that ever carries raw keys.
    let api_keys: BTreeMap<&'static str, String> = issued
        .into_iter()
        .map(|k| (k.module.as_str(), k.raw_key))
        .collect();

    Ok(Json(json!({
        "tenant": TenantView::from(tenant),
        "apiKeys": api_keys,
    })))
}

#[derive(Debug, Deserialize)]
struct SetStatusRequest {
    status: TenantStatus,
}

async fn set_tenant_status(
    State(state): State<AppState>,
    PlatformBearer(_claims): PlatformBearer,
    Path(id): Path<Uuid>,
    Json(body): Json<SetStatusRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    // Surface a 404 before writing.
    state.tenants.get_by_id(id).await?;
    state.tenants.set_status(id, body.status).await?;
    Ok(Json(json!({ "success": true })))
}

async fn rotate_key(
    State(state): State<AppState>,
    PlatformBearer(_claims): PlatformBearer,
    Path((id, module)): Path<(Uuid, String)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let module = parse_module(&module)?;
    let raw = state.credentials.rotate(id, module).await?;
    Ok(Json(json!({ "module": module, "apiKey": raw })))
}
