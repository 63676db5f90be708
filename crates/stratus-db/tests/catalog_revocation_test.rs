//! Integration tests for the catalog and revocation repositories using
//! in-memory SurrealDB.

use chrono::{Duration, Utc};
use stratus_core::StratusError;
use stratus_core::models::catalog::{BusinessType, DefaultRole, PermissionTemplate, SsoProvider};
use stratus_core::repository::{CatalogRepository, RevocationRepository};
use stratus_db::repository::{SurrealCatalogRepository, SurrealRevocationRepository};
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;

async fn setup() -> Surreal<surrealdb::engine::local::Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    stratus_db::run_migrations(&db).await.unwrap();
    db
}

#[tokio::test]
async fn permission_template_lifecycle() {
    let catalog = SurrealCatalogRepository::new(setup().await);

    catalog
        .upsert_permission_template(PermissionTemplate {
            id: "standard".into(),
            name: "Standard".into(),
            permissions: vec!["user.read".into(), "user.create".into()],
        })
        .await
        .unwrap();
    catalog
        .upsert_permission_template(PermissionTemplate {
            id: "minimal".into(),
            name: "Minimal".into(),
            permissions: vec!["user.read".into()],
        })
        .await
        .unwrap();

    let all = catalog.list_permission_templates().await.unwrap();
    assert_eq!(all.len(), 2);
    // Ordered by name.
    assert_eq!(all[0].id, "minimal");

    let standard = catalog.get_permission_template("standard").await.unwrap();
    assert_eq!(standard.permissions.len(), 2);

    // Upsert with the same id replaces, not duplicates.
    catalog
        .upsert_permission_template(PermissionTemplate {
            id: "standard".into(),
            name: "Standard".into(),
            permissions: vec!["user.read".into()],
        })
        .await
        .unwrap();
    assert_eq!(catalog.list_permission_templates().await.unwrap().len(), 2);
    let standard = catalog.get_permission_template("standard").await.unwrap();
    assert_eq!(standard.permissions, vec!["user.read".to_string()]);

    catalog.remove_permission_template("standard").await.unwrap();
    let err = catalog.get_permission_template("standard").await.unwrap_err();
    assert!(matches!(err, StratusError::NotFound { .. }));
    assert_eq!(catalog.list_permission_templates().await.unwrap().len(), 1);
}

#[tokio::test]
async fn business_type_references_default_roles() {
    let catalog = SurrealCatalogRepository::new(setup().await);

    catalog
        .upsert_default_role(DefaultRole {
            id: "retail-admin".into(),
            name: "Retail Admin".into(),
            description: "Runs the store".into(),
            permissions: vec!["store.manage".into()],
        })
        .await
        .unwrap();
    catalog
        .upsert_business_type(BusinessType {
            id: "retail".into(),
            name: "Retail".into(),
            default_roles: vec!["retail-admin".into()],
        })
        .await
        .unwrap();

    let bt = catalog.get_business_type("retail").await.unwrap();
    assert_eq!(bt.default_roles, vec!["retail-admin".to_string()]);

    let role = catalog.get_default_role("retail-admin").await.unwrap();
    assert_eq!(role.permissions, vec!["store.manage".to_string()]);

    catalog.remove_default_role("retail-admin").await.unwrap();
    assert!(catalog.get_default_role("retail-admin").await.is_err());
    // The business type still lists the now-dangling reference; that is
    // exactly what revocation detection reports on.
    let bt = catalog.get_business_type("retail").await.unwrap();
    assert_eq!(bt.default_roles, vec!["retail-admin".to_string()]);
}

#[tokio::test]
async fn sso_provider_lifecycle() {
    let catalog = SurrealCatalogRepository::new(setup().await);

    catalog
        .upsert_sso_provider(SsoProvider {
            id: "azure-ad".into(),
            name: "Azure AD".into(),
            kind: "oidc".into(),
        })
        .await
        .unwrap();

    let all = catalog.list_sso_providers().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].kind, "oidc");

    catalog.remove_sso_provider("azure-ad").await.unwrap();
    assert!(catalog.list_sso_providers().await.unwrap().is_empty());
}

#[tokio::test]
async fn revocation_registry_roundtrip() {
    let revocations = SurrealRevocationRepository::new(setup().await);

    let jti = uuid::Uuid::new_v4().to_string();
    assert!(!revocations.is_revoked(&jti).await.unwrap());

    revocations
        .revoke(&jti, Utc::now() + Duration::hours(8))
        .await
        .unwrap();
    assert!(revocations.is_revoked(&jti).await.unwrap());

    // Revoking again is a no-op, not an error.
    revocations
        .revoke(&jti, Utc::now() + Duration::hours(8))
        .await
        .unwrap();
    assert!(revocations.is_revoked(&jti).await.unwrap());
}

#[tokio::test]
async fn cleanup_reaps_only_expired_entries() {
    let revocations = SurrealRevocationRepository::new(setup().await);

    revocations
        .revoke("expired-jti", Utc::now() - Duration::minutes(5))
        .await
        .unwrap();
    revocations
        .revoke("live-jti", Utc::now() + Duration::hours(1))
        .await
        .unwrap();

    let reaped = revocations.cleanup_expired().await.unwrap();
    assert_eq!(reaped, 1);

    assert!(!revocations.is_revoked("expired-jti").await.unwrap());
    assert!(revocations.is_revoked("live-jti").await.unwrap());
}
