//! Integration tests for tenant onboarding and the catalog watcher
//! using in-memory SurrealDB.

use std::time::Duration;

use stratus_auth::SecretCodec;
use stratus_core::StratusError;
use stratus_core::models::catalog::{
    BusinessType, CatalogKind, DefaultRole, PermissionTemplate, SsoProvider,
};
use stratus_core::models::tenant::{Module, TenantStatus};
use stratus_core::repository::{CatalogRepository, RoleRepository, TenantRepository};
use stratus_db::repository::{
    SurrealCatalogRepository, SurrealRoleRepository, SurrealTenantRepository,
};
use stratus_rbac::{CatalogWatcher, NewTenant, OnboardingService};
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;

type Db = surrealdb::engine::local::Db;

async fn setup() -> (
    SurrealTenantRepository<Db>,
    SurrealRoleRepository<Db>,
    SurrealCatalogRepository<Db>,
    OnboardingService<SurrealTenantRepository<Db>, SurrealCatalogRepository<Db>>,
) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    stratus_db::run_migrations(&db).await.unwrap();

    let tenants = SurrealTenantRepository::new(db.clone());
    let roles = SurrealRoleRepository::new(db.clone());
    let catalog = SurrealCatalogRepository::new(db.clone());
    let onboarding = OnboardingService::new(
        tenants.clone(),
        catalog.clone(),
        SecretCodec::new("test-app-secret"),
    );

    (tenants, roles, catalog, onboarding)
}

fn new_tenant(org_id: &str, business_type: Option<&str>) -> NewTenant {
    NewTenant {
        org_id: org_id.into(),
        name: "Acme".into(),
        admin_email: "admin@acme.example".into(),
        business_type: business_type.map(String::from),
        enabled_modules: vec![Module::Auth, Module::Rbac, Module::Logging],
        permission_template: None,
    }
}

#[tokio::test]
async fn onboarding_issues_one_key_per_module() {
    let (_, _, _, onboarding) = setup().await;

    let (tenant, issued) = onboarding.onboard(new_tenant("acme", None)).await.unwrap();

    assert_eq!(tenant.status, TenantStatus::Pending);
    assert_eq!(issued.len(), 3);
    for key in &issued {
        assert!(key.raw_key.starts_with(key.module.key_prefix()));
        // Only hash + envelope persist on the row.
        let record = &tenant.api_keys[&key.module];
        assert!(record.key_cipher.starts_with("enc:v1:"));
        assert_ne!(record.key_hash, key.raw_key);
    }
}

#[tokio::test]
async fn onboarding_seeds_business_type_roles() {
    let (_, roles, catalog, onboarding) = setup().await;

    catalog
        .upsert_default_role(DefaultRole {
            id: "clinic-admin".into(),
            name: "Clinic Admin".into(),
            description: "Runs the clinic".into(),
            permissions: vec!["patient.read".into()],
        })
        .await
        .unwrap();
    catalog
        .upsert_business_type(BusinessType {
            id: "healthcare".into(),
            name: "Healthcare".into(),
            default_roles: vec!["clinic-admin".into()],
        })
        .await
        .unwrap();

    let (tenant, _) = onboarding
        .onboard(new_tenant("clinic", Some("healthcare")))
        .await
        .unwrap();

    let seeded = roles.list(tenant.id, Default::default()).await.unwrap().items;
    assert_eq!(seeded.len(), 1);
    assert_eq!(seeded[0].name, "Clinic Admin");
    assert!(seeded[0].is_default);
    assert_eq!(seeded[0].catalog_role.as_deref(), Some("clinic-admin"));
}

#[tokio::test]
async fn onboarding_falls_back_to_builtin_roles() {
    let (_, roles, _, onboarding) = setup().await;

    let (tenant, _) = onboarding.onboard(new_tenant("acme", None)).await.unwrap();

    let seeded = roles.list(tenant.id, Default::default()).await.unwrap().items;
    let names: Vec<&str> = seeded.iter().map(|r| r.name.as_str()).collect();
    assert!(names.contains(&"Admin"));
    assert!(names.contains(&"User"));

    let admin = seeded.iter().find(|r| r.name == "Admin").unwrap();
    assert!(admin.permissions.contains(&"role.manage".to_string()));
}

#[tokio::test]
async fn onboarding_rejects_duplicates_and_bad_references() {
    let (_, _, _, onboarding) = setup().await;

    onboarding.onboard(new_tenant("acme", None)).await.unwrap();

    let dup = onboarding.onboard(new_tenant("acme", None)).await.unwrap_err();
    assert!(matches!(dup, StratusError::AlreadyExists { .. }));

    let bad_slug = onboarding
        .onboard(new_tenant("Not A Slug", None))
        .await
        .unwrap_err();
    assert!(matches!(bad_slug, StratusError::Validation { .. }));

    let bad_bt = onboarding
        .onboard(new_tenant("other", Some("nonexistent")))
        .await
        .unwrap_err();
    assert!(matches!(bad_bt, StratusError::Validation { .. }));

    let mut bad_tpl = new_tenant("third", None);
    bad_tpl.permission_template = Some("nope".into());
    let err = onboarding.onboard(bad_tpl).await.unwrap_err();
    assert!(matches!(err, StratusError::Validation { .. }));
}

#[tokio::test]
async fn onboarding_failure_leaves_nothing_behind() {
    let (tenants, _, _, onboarding) = setup().await;

    // Unknown business type fails after validation, before any write.
    let err = onboarding
        .onboard(new_tenant("acme", Some("nonexistent")))
        .await
        .unwrap_err();
    assert!(matches!(err, StratusError::Validation { .. }));

    let err = tenants.get_by_org_id("acme").await.unwrap_err();
    assert!(matches!(err, StratusError::NotFound { .. }));
}

#[tokio::test]
async fn watcher_reports_additions_and_removals() {
    let (_, _, catalog, _) = setup().await;

    catalog
        .upsert_permission_template(PermissionTemplate {
            id: "oldTpl".into(),
            name: "Old".into(),
            permissions: vec![],
        })
        .await
        .unwrap();

    let mut watcher = CatalogWatcher::new(catalog.clone(), Duration::from_secs(30));
    let mut rx = watcher.subscribe();

    // First poll primes the snapshot; nothing is reported.
    let changes = watcher.poll_once().await.unwrap();
    assert!(changes.is_empty());

    // Remove one template, add a provider.
    catalog.remove_permission_template("oldTpl").await.unwrap();
    catalog
        .upsert_sso_provider(SsoProvider {
            id: "okta".into(),
            name: "Okta".into(),
            kind: "oidc".into(),
        })
        .await
        .unwrap();

    let changes = watcher.poll_once().await.unwrap();
    assert_eq!(changes.len(), 2);

    let template_change = changes
        .iter()
        .find(|c| c.kind == CatalogKind::PermissionTemplates)
        .unwrap();
    assert!(template_change.added.is_empty());
    assert_eq!(template_change.removed, vec!["oldTpl".to_string()]);

    let provider_change = changes
        .iter()
        .find(|c| c.kind == CatalogKind::SsoProviders)
        .unwrap();
    assert_eq!(provider_change.added, vec!["okta".to_string()]);

    // Subscribers get the same diffs pushed.
    let first = rx.try_recv().unwrap();
    let second = rx.try_recv().unwrap();
    let kinds = [first.kind, second.kind];
    assert!(kinds.contains(&CatalogKind::PermissionTemplates));
    assert!(kinds.contains(&CatalogKind::SsoProviders));

    // A quiet poll reports nothing.
    let changes = watcher.poll_once().await.unwrap();
    assert!(changes.is_empty());
}
