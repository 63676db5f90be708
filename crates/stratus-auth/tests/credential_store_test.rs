//! Integration tests for the API-key credential store.

use std::collections::BTreeMap;

use stratus_auth::apikey::issue_key;
use stratus_auth::{CredentialStore, SecretCodec};
use stratus_core::StratusError;
use stratus_core::models::tenant::{ApiKeyRecord, CreateTenant, Module, TenantStatus};
use stratus_core::repository::TenantRepository;
use stratus_db::repository::SurrealTenantRepository;
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;

type Db = surrealdb::engine::local::Db;

fn codec() -> SecretCodec {
    SecretCodec::new("test-app-secret")
}

async fn setup() -> (SurrealTenantRepository<Db>, CredentialStore<SurrealTenantRepository<Db>>) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    stratus_db::run_migrations(&db).await.unwrap();

    let repo = SurrealTenantRepository::new(db);
    let store = CredentialStore::new(repo.clone(), codec());
    (repo, store)
}

/// Provision a tenant with freshly issued keys for the given modules
/// and record extra key material for modules outside the enabled set.
async fn provision(
    repo: &SurrealTenantRepository<Db>,
    org_id: &str,
    enabled: &[Module],
    keyed: &[Module],
) -> (stratus_core::models::tenant::Tenant, BTreeMap<Module, String>) {
    let codec = codec();
    let mut api_keys = BTreeMap::new();
    let mut raw_keys = BTreeMap::new();
    for module in keyed {
        let (raw, record): (String, ApiKeyRecord) = issue_key(&codec, *module).unwrap();
        api_keys.insert(*module, record);
        raw_keys.insert(*module, raw);
    }

    let tenant = repo
        .provision(
            CreateTenant {
                org_id: org_id.into(),
                name: "Keyed Tenant".into(),
                admin_email: "admin@keyed.example".into(),
                business_type: None,
                enabled_modules: enabled.to_vec(),
                api_keys,
                permission_template: None,
                custom_permissions: vec![],
            },
            vec![],
        )
        .await
        .unwrap();

    (tenant, raw_keys)
}

#[tokio::test]
async fn authenticate_valid_key() {
    let (repo, store) = setup().await;
    let (tenant, keys) = provision(
        &repo,
        "acme",
        &[Module::Auth, Module::Rbac],
        &[Module::Auth, Module::Rbac],
    )
    .await;
    repo.set_status(tenant.id, TenantStatus::Active).await.unwrap();

    let resolved = store.authenticate(&keys[&Module::Auth]).await.unwrap();
    assert_eq!(resolved.id, tenant.id);

    let resolved = store.authenticate(&keys[&Module::Rbac]).await.unwrap();
    assert_eq!(resolved.id, tenant.id);
}

#[tokio::test]
async fn unknown_key_is_rejected() {
    let (_, store) = setup().await;

    let err = store
        .authenticate(&stratus_auth::apikey::generate_key(Module::Auth))
        .await
        .unwrap_err();
    assert!(matches!(err, StratusError::AuthenticationFailed { .. }));
}

#[tokio::test]
async fn malformed_key_is_rejected() {
    let (_, store) = setup().await;

    // No known module prefix.
    assert!(store.authenticate("bogus_0123456789abcdefghij").await.is_err());
    // Known prefix but opaque part far too short.
    assert!(store.authenticate("auth_short").await.is_err());
}

#[tokio::test]
async fn key_for_disabled_module_is_rejected() {
    let (repo, store) = setup().await;

    // The logging key row and string exist, but the module is not in
    // the tenant's enabled set.
    let (tenant, keys) = provision(
        &repo,
        "acme",
        &[Module::Auth],
        &[Module::Auth, Module::Logging],
    )
    .await;
    repo.set_status(tenant.id, TenantStatus::Active).await.unwrap();

    let err = store.authenticate(&keys[&Module::Logging]).await.unwrap_err();
    assert!(matches!(err, StratusError::AuthenticationFailed { .. }));

    // The auth key still works.
    store.authenticate(&keys[&Module::Auth]).await.unwrap();
}

#[tokio::test]
async fn key_for_non_active_tenant_is_rejected() {
    let (repo, store) = setup().await;
    let (tenant, keys) = provision(&repo, "acme", &[Module::Auth], &[Module::Auth]).await;

    // Tenants start pending.
    let err = store.authenticate(&keys[&Module::Auth]).await.unwrap_err();
    assert!(matches!(err, StratusError::AuthenticationFailed { .. }));

    repo.set_status(tenant.id, TenantStatus::Active).await.unwrap();
    store.authenticate(&keys[&Module::Auth]).await.unwrap();

    repo.set_status(tenant.id, TenantStatus::Suspended).await.unwrap();
    let err = store.authenticate(&keys[&Module::Auth]).await.unwrap_err();
    assert!(matches!(err, StratusError::AuthenticationFailed { .. }));
}

#[tokio::test]
async fn forged_prefix_is_rejected() {
    let (repo, store) = setup().await;
    let (tenant, keys) = provision(
        &repo,
        "acme",
        &[Module::Auth, Module::Rbac],
        &[Module::Auth, Module::Rbac],
    )
    .await;
    repo.set_status(tenant.id, TenantStatus::Active).await.unwrap();

    // Re-prefix the auth key as an rbac key; the opaque part still
    // matches a stored key but the module claim does not.
    let forged = keys[&Module::Auth].replace("auth_", "rbac_");
    let err = store.authenticate(&forged).await.unwrap_err();
    assert!(matches!(err, StratusError::AuthenticationFailed { .. }));
}

#[tokio::test]
async fn rotation_invalidates_previous_key() {
    let (repo, store) = setup().await;
    let (tenant, keys) = provision(&repo, "acme", &[Module::Auth], &[Module::Auth]).await;
    repo.set_status(tenant.id, TenantStatus::Active).await.unwrap();

    let old_key = keys[&Module::Auth].clone();
    store.authenticate(&old_key).await.unwrap();

    let new_key = store.rotate(tenant.id, Module::Auth).await.unwrap();
    assert_ne!(new_key, old_key);

    // Last write wins: only the new key resolves.
    assert!(store.authenticate(&old_key).await.is_err());
    let resolved = store.authenticate(&new_key).await.unwrap();
    assert_eq!(resolved.id, tenant.id);
}

#[tokio::test]
async fn rotation_requires_enabled_module() {
    let (repo, store) = setup().await;
    let (tenant, _) = provision(&repo, "acme", &[Module::Auth], &[Module::Auth]).await;

    let err = store.rotate(tenant.id, Module::Email).await.unwrap_err();
    assert!(matches!(err, StratusError::Validation { .. }));
}

#[tokio::test]
async fn stored_envelope_is_encrypted_but_recoverable() {
    let (repo, store) = setup().await;
    let (tenant, keys) = provision(&repo, "acme", &[Module::Auth], &[Module::Auth]).await;
    repo.set_status(tenant.id, TenantStatus::Active).await.unwrap();

    let raw = &keys[&Module::Auth];
    let stored = repo.get_by_id(tenant.id).await.unwrap();
    let record = &stored.api_keys[&Module::Auth];

    // At rest: a tagged envelope, never the raw key.
    assert!(record.key_cipher.starts_with("enc:v1:"));
    assert!(!record.key_cipher.contains(raw.as_str()));

    // And it decrypts back to exactly the issued key.
    assert_eq!(&codec().decrypt(&record.key_cipher).unwrap(), raw);
}
