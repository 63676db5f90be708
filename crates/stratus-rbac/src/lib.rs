//! Stratus RBAC — permission resolution, catalog change detection, and
//! tenant onboarding.

pub mod catalog;
pub mod error;
pub mod provision;
pub mod resolver;
pub mod watcher;

pub use catalog::{CatalogDiff, CatalogSnapshot, RevokedReference, diff_catalog};
pub use error::RbacError;
pub use provision::{IssuedKey, NewTenant, OnboardingService};
pub use resolver::PermissionResolver;
pub use watcher::{CatalogChange, CatalogWatcher};
