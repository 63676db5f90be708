//! Integration tests for tenant-user and role repositories using
//! in-memory SurrealDB.

use stratus_core::StratusError;
use stratus_core::models::role::{CreateRole, UpdateRole};
use stratus_core::models::tenant::CreateTenant;
use stratus_core::models::user::{CreateTenantUser, UpdateTenantUser, UserStatus};
use stratus_core::repository::{Pagination, RoleRepository, TenantRepository, UserRepository};
use stratus_db::repository::{
    SurrealRoleRepository, SurrealTenantRepository, SurrealUserRepository,
};
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;

/// Spin up in-memory DB, run migrations, create a tenant.
async fn setup() -> (Surreal<surrealdb::engine::local::Db>, Uuid) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    stratus_db::run_migrations(&db).await.unwrap();

    let tenant_repo = SurrealTenantRepository::new(db.clone());
    let tenant = tenant_repo
        .provision(
            CreateTenant {
                org_id: "test-tenant".into(),
                name: "Test Tenant".into(),
                admin_email: "admin@test.example".into(),
                business_type: None,
                enabled_modules: vec![],
                api_keys: Default::default(),
                permission_template: None,
                custom_permissions: vec![],
            },
            vec![],
        )
        .await
        .unwrap();

    (db, tenant.id)
}

fn role_input(tenant_id: Uuid, name: &str, permissions: &[&str]) -> CreateRole {
    CreateRole {
        tenant_id,
        name: name.into(),
        description: format!("{name} role"),
        permissions: permissions.iter().map(|p| p.to_string()).collect(),
        is_default: false,
        catalog_role: None,
    }
}

#[tokio::test]
async fn user_create_and_lookup() {
    let (db, tenant_id) = setup().await;
    let users = SurrealUserRepository::new(db);

    let user = users
        .create(CreateTenantUser {
            tenant_id,
            email: "alice@example.com".into(),
            password: "correct-horse-battery".into(),
        })
        .await
        .unwrap();

    assert_eq!(user.status, UserStatus::Active);
    assert!(!user.email_verified);
    assert!(user.last_login_at.is_none());
    // Raw password never stored.
    assert_ne!(user.password_hash, "correct-horse-battery");
    assert!(user.password_hash.starts_with("$argon2id$"));

    let by_email = users.get_by_email(tenant_id, "alice@example.com").await.unwrap();
    assert_eq!(by_email.id, user.id);

    let err = users.get_by_email(tenant_id, "nobody@example.com").await.unwrap_err();
    assert!(matches!(err, StratusError::NotFound { .. }));
}

#[tokio::test]
async fn user_email_is_tenant_scoped() {
    let (db, tenant_id) = setup().await;
    let users = SurrealUserRepository::new(db);

    users
        .create(CreateTenantUser {
            tenant_id,
            email: "alice@example.com".into(),
            password: "pw-alice-12345".into(),
        })
        .await
        .unwrap();

    // Same email under a different tenant id is invisible here.
    let err = users
        .get_by_email(Uuid::new_v4(), "alice@example.com")
        .await
        .unwrap_err();
    assert!(matches!(err, StratusError::NotFound { .. }));
}

#[tokio::test]
async fn user_soft_delete_and_update() {
    let (db, tenant_id) = setup().await;
    let users = SurrealUserRepository::new(db);

    let user = users
        .create(CreateTenantUser {
            tenant_id,
            email: "bob@example.com".into(),
            password: "pw-bob-123456".into(),
        })
        .await
        .unwrap();

    users.delete(tenant_id, user.id).await.unwrap();
    let after = users.get_by_id(tenant_id, user.id).await.unwrap();
    assert_eq!(after.status, UserStatus::Inactive);

    let updated = users
        .update(
            tenant_id,
            user.id,
            UpdateTenantUser {
                status: Some(UserStatus::Active),
                email_verified: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.status, UserStatus::Active);
    assert!(updated.email_verified);
}

#[tokio::test]
async fn record_login_stamps_timestamp() {
    let (db, tenant_id) = setup().await;
    let users = SurrealUserRepository::new(db);

    let user = users
        .create(CreateTenantUser {
            tenant_id,
            email: "carol@example.com".into(),
            password: "pw-carol-1234".into(),
        })
        .await
        .unwrap();

    let now = chrono::Utc::now();
    users.record_login(tenant_id, user.id, now).await.unwrap();

    let after = users.get_by_id(tenant_id, user.id).await.unwrap();
    let stamped = after.last_login_at.unwrap();
    assert!((stamped - now).num_seconds().abs() < 2);
}

#[tokio::test]
async fn role_assignment_roundtrip() {
    let (db, tenant_id) = setup().await;
    let users = SurrealUserRepository::new(db.clone());
    let roles = SurrealRoleRepository::new(db);

    let user = users
        .create(CreateTenantUser {
            tenant_id,
            email: "dave@example.com".into(),
            password: "pw-dave-12345".into(),
        })
        .await
        .unwrap();

    let editor = roles
        .create(role_input(tenant_id, "Editor", &["doc.read", "doc.write"]))
        .await
        .unwrap();
    let viewer = roles
        .create(role_input(tenant_id, "Viewer", &["doc.read"]))
        .await
        .unwrap();

    roles.assign_to_user(tenant_id, user.id, editor.id).await.unwrap();
    roles.assign_to_user(tenant_id, user.id, viewer.id).await.unwrap();

    let assigned = roles.get_user_roles(tenant_id, user.id).await.unwrap();
    assert_eq!(assigned.len(), 2);

    roles
        .unassign_from_user(tenant_id, user.id, viewer.id)
        .await
        .unwrap();
    let assigned = roles.get_user_roles(tenant_id, user.id).await.unwrap();
    assert_eq!(assigned.len(), 1);
    assert_eq!(assigned[0].name, "Editor");
}

#[tokio::test]
async fn role_update_and_delete() {
    let (db, tenant_id) = setup().await;
    let users = SurrealUserRepository::new(db.clone());
    let roles = SurrealRoleRepository::new(db);

    let user = users
        .create(CreateTenantUser {
            tenant_id,
            email: "erin@example.com".into(),
            password: "pw-erin-12345".into(),
        })
        .await
        .unwrap();

    let role = roles
        .create(role_input(tenant_id, "Support", &["ticket.read"]))
        .await
        .unwrap();
    roles.assign_to_user(tenant_id, user.id, role.id).await.unwrap();

    let updated = roles
        .update(
            tenant_id,
            role.id,
            UpdateRole {
                permissions: Some(vec!["ticket.read".into(), "ticket.close".into()]),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.permissions.len(), 2);

    // Deleting the role also removes its assignment edges.
    roles.delete(tenant_id, role.id).await.unwrap();
    assert!(roles.get_by_id(tenant_id, role.id).await.is_err());
    let assigned = roles.get_user_roles(tenant_id, user.id).await.unwrap();
    assert!(assigned.is_empty());
}

#[tokio::test]
async fn list_users_pages() {
    let (db, tenant_id) = setup().await;
    let users = SurrealUserRepository::new(db);

    for i in 0..3 {
        users
            .create(CreateTenantUser {
                tenant_id,
                email: format!("user{i}@example.com"),
                password: "pw-list-12345".into(),
            })
            .await
            .unwrap();
    }

    let page = users
        .list(
            tenant_id,
            Pagination {
                offset: 1,
                limit: 10,
            },
        )
        .await
        .unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.items.len(), 2);
}
