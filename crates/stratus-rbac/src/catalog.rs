//! Catalog change detection.
//!
//! The platform catalog is polled, not pushed. Changes are detected by
//! set difference over stable ids; a removed entry that a tenant still
//! references marks that reference revoked. Revocations are advisory
//! states surfaced to tenant admins, not failures.

use std::collections::HashSet;

use stratus_core::models::catalog::CatalogKind;
use stratus_core::models::role::Role;
use stratus_core::models::tenant::Tenant;

/// Additions and removals between two polls of one catalog. No ordering
/// guarantee on either list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogDiff {
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

impl CatalogDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Pure set difference by id between the previous and current contents
/// of a catalog.
pub fn diff_catalog(previous: &[String], current: &[String]) -> CatalogDiff {
    let prev: HashSet<&str> = previous.iter().map(String::as_str).collect();
    let cur: HashSet<&str> = current.iter().map(String::as_str).collect();

    CatalogDiff {
        added: current
            .iter()
            .filter(|id| !prev.contains(id.as_str()))
            .cloned()
            .collect(),
        removed: previous
            .iter()
            .filter(|id| !cur.contains(id.as_str()))
            .cloned()
            .collect(),
    }
}

/// The id sets of every catalog as of one poll.
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    pub permission_templates: Vec<String>,
    pub business_types: Vec<String>,
    pub default_roles: Vec<String>,
    pub sso_providers: Vec<String>,
}

impl CatalogSnapshot {
    fn contains(&self, kind: CatalogKind, id: &str) -> bool {
        let ids = match kind {
            CatalogKind::PermissionTemplates => &self.permission_templates,
            CatalogKind::BusinessTypes => &self.business_types,
            CatalogKind::DefaultRoles => &self.default_roles,
            CatalogKind::SsoProviders => &self.sso_providers,
        };
        ids.iter().any(|i| i == id)
    }
}

/// A tenant configuration reference whose catalog entry no longer
/// exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevokedReference {
    pub kind: CatalogKind,
    pub id: String,
}

/// Flag every reference in a tenant's stored configuration — its
/// permission template, business type, and catalog-seeded roles — that
/// the catalog no longer contains.
pub fn revoked_references(
    tenant: &Tenant,
    roles: &[Role],
    snapshot: &CatalogSnapshot,
) -> Vec<RevokedReference> {
    let mut revoked = Vec::new();

    if let Some(tpl) = &tenant.permission_template {
        if !snapshot.contains(CatalogKind::PermissionTemplates, tpl) {
            revoked.push(RevokedReference {
                kind: CatalogKind::PermissionTemplates,
                id: tpl.clone(),
            });
        }
    }

    if let Some(bt) = &tenant.business_type {
        if !snapshot.contains(CatalogKind::BusinessTypes, bt) {
            revoked.push(RevokedReference {
                kind: CatalogKind::BusinessTypes,
                id: bt.clone(),
            });
        }
    }

    for role in roles {
        let Some(src) = &role.catalog_role else {
            continue;
        };
        let already_flagged = revoked
            .iter()
            .any(|r| r.kind == CatalogKind::DefaultRoles && &r.id == src);
        if !snapshot.contains(CatalogKind::DefaultRoles, src) && !already_flagged {
            revoked.push(RevokedReference {
                kind: CatalogKind::DefaultRoles,
                id: src.clone(),
            });
        }
    }

    revoked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(xs: &[&str]) -> Vec<String> {
        xs.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn diff_reports_added_and_removed() {
        let diff = diff_catalog(&ids(&["oldTpl", "keep"]), &ids(&["keep", "newTpl"]));
        assert_eq!(diff.added, ids(&["newTpl"]));
        assert_eq!(diff.removed, ids(&["oldTpl"]));
    }

    #[test]
    fn diff_of_identical_sets_is_empty() {
        let diff = diff_catalog(&ids(&["a", "b"]), &ids(&["b", "a"]));
        assert!(diff.is_empty());
    }

    #[test]
    fn diff_from_empty_previous_is_all_added() {
        let diff = diff_catalog(&[], &ids(&["a", "b"]));
        assert_eq!(diff.added.len(), 2);
        assert!(diff.removed.is_empty());
    }

    #[test]
    fn diff_ignores_duplicates() {
        let diff = diff_catalog(&ids(&["a", "a"]), &ids(&["a"]));
        assert!(diff.is_empty());
    }
}
