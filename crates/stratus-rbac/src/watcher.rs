//! Catalog polling and change fan-out.
//!
//! The minimum contract is polling + set difference (the dashboards do
//! exactly that on a 30 s interval). The watcher layers a broadcast
//! channel on top so server-side subscribers get the same diffs pushed.

use std::time::Duration;

use stratus_core::models::catalog::CatalogKind;
use stratus_core::repository::CatalogRepository;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::catalog::{CatalogSnapshot, diff_catalog};
use crate::error::RbacError;
use crate::resolver::load_snapshot;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// One catalog's additions/removals observed by a poll.
#[derive(Debug, Clone)]
pub struct CatalogChange {
    pub kind: CatalogKind,
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

/// Polls the catalog on a fixed interval and broadcasts diffs.
pub struct CatalogWatcher<C: CatalogRepository> {
    catalog: C,
    poll_interval: Duration,
    tx: broadcast::Sender<CatalogChange>,
    snapshot: Option<CatalogSnapshot>,
}

impl<C: CatalogRepository> CatalogWatcher<C> {
    pub fn new(catalog: C, poll_interval: Duration) -> Self {
        let (tx, _) = broadcast::channel(64);
        Self {
            catalog,
            poll_interval,
            tx,
            snapshot: None,
        }
    }

    /// Subscribe to future catalog changes.
    pub fn subscribe(&self) -> broadcast::Receiver<CatalogChange> {
        self.tx.subscribe()
    }

    /// Poll once and diff against the previous snapshot.
    ///
    /// The first poll primes the snapshot and reports nothing — the
    /// initial catalog contents are not "additions".
    pub async fn poll_once(&mut self) -> Result<Vec<CatalogChange>, RbacError> {
        let current = load_snapshot(&self.catalog).await?;

        let changes = match &self.snapshot {
            None => Vec::new(),
            Some(previous) => {
                let pairs = [
                    (
                        CatalogKind::PermissionTemplates,
                        &previous.permission_templates,
                        &current.permission_templates,
                    ),
                    (
                        CatalogKind::BusinessTypes,
                        &previous.business_types,
                        &current.business_types,
                    ),
                    (
                        CatalogKind::DefaultRoles,
                        &previous.default_roles,
                        &current.default_roles,
                    ),
                    (
                        CatalogKind::SsoProviders,
                        &previous.sso_providers,
                        &current.sso_providers,
                    ),
                ];
                pairs
                    .into_iter()
                    .filter_map(|(kind, prev, cur)| {
                        let diff = diff_catalog(prev, cur);
                        if diff.is_empty() {
                            None
                        } else {
                            Some(CatalogChange {
                                kind,
                                added: diff.added,
                                removed: diff.removed,
                            })
                        }
                    })
                    .collect()
            }
        };

        self.snapshot = Some(current);

        for change in &changes {
            debug!(
                kind = ?change.kind,
                added = change.added.len(),
                removed = change.removed.len(),
                "catalog change detected"
            );
            // No subscribers is fine; diffs are also returned.
            let _ = self.tx.send(change.clone());
        }

        Ok(changes)
    }

    /// Run the polling loop forever. Poll failures are logged and the
    /// loop keeps going with the previous snapshot intact.
    pub async fn run(mut self) {
        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            if let Err(e) = self.poll_once().await {
                warn!(error = %e, "catalog poll failed");
            }
        }
    }
}
