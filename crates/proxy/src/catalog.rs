//! Catalog cache.
//!
//! Holds a time-boxed snapshot of the remote item catalog. Readers get an
//! `Arc<Snapshot>` and never observe a partially replaced list.
//!
//! Refresh rules:
//! - a fresh snapshot is returned without I/O
//! - an expired or missing snapshot triggers exactly one upstream fetch,
//!   shared by every caller that raced past the expiry
//! - a failed fetch is logged and absorbed: callers get the previous
//!   snapshot, or an empty one if nothing was ever fetched
//! - malformed entries are skipped; the rest of the document is kept

use arc_swap::ArcSwapOption;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use mirror_common::{CatalogItem, Snapshot};
use mirror_config::MirrorConfig;

use crate::errors::{CatalogError, ProxyError};

/// Upper bound on a single catalog download
const CATALOG_FETCH_TIMEOUT: Duration = Duration::from_secs(120);

/// Single-flight cache over the remote catalog document
pub struct CatalogCache {
    client: reqwest::Client,
    catalog_url: String,
    ttl: Duration,
    snapshot: ArcSwapOption<Snapshot>,
    /// Serializes refresh attempts
    refresh_lock: Mutex<()>,
    /// Refresh attempts started
    attempts: AtomicU64,
    /// Refresh attempts finished, successful or not. Waiters compare it
    /// against the value seen before queueing on `refresh_lock` to detect
    /// that their round already ran.
    completed: AtomicU64,
}

impl CatalogCache {
    pub fn new(client: reqwest::Client, catalog_url: impl Into<String>, ttl: Duration) -> Self {
        let catalog_url = catalog_url.into();
        debug!(
            catalog_url = %catalog_url,
            ttl_secs = ttl.as_secs(),
            "Creating catalog cache"
        );
        Self {
            client,
            catalog_url,
            ttl,
            snapshot: ArcSwapOption::empty(),
            refresh_lock: Mutex::new(()),
            attempts: AtomicU64::new(0),
            completed: AtomicU64::new(0),
        }
    }

    /// Build a cache with its own HTTP client from configuration
    pub fn from_config(config: &MirrorConfig) -> Result<Self, ProxyError> {
        let client = reqwest::Client::builder()
            .user_agent(config.default_user_agent.as_str())
            .timeout(CATALOG_FETCH_TIMEOUT)
            .build()
            .map_err(ProxyError::ClientBuild)?;

        Ok(Self::new(client, config.catalog_url.clone(), config.catalog_ttl()))
    }

    /// Current snapshot without refreshing; empty if nothing was ever fetched
    pub fn current(&self) -> Arc<Snapshot> {
        self.snapshot
            .load_full()
            .unwrap_or_else(|| Arc::new(Snapshot::empty()))
    }

    /// Number of refresh attempts started so far
    pub fn refresh_attempts(&self) -> u64 {
        self.attempts.load(Ordering::Acquire)
    }

    /// Return the catalog, refreshing it first if it has expired.
    ///
    /// Never fails. Upstream problems degrade to a stale or empty snapshot.
    pub async fn get_items(&self) -> Arc<Snapshot> {
        if let Some(snapshot) = self.fresh_snapshot() {
            return snapshot;
        }

        let observed = self.completed.load(Ordering::Acquire);
        let _guard = self.refresh_lock.lock().await;

        // Another caller refreshed (or tried to) while we waited
        if self.completed.load(Ordering::Acquire) != observed {
            return self.current();
        }
        if let Some(snapshot) = self.fresh_snapshot() {
            return snapshot;
        }

        let attempt = self.attempts.fetch_add(1, Ordering::AcqRel) + 1;
        let started = Instant::now();

        let result = self.fetch().await;
        self.completed.fetch_add(1, Ordering::AcqRel);

        match result {
            Ok(items) => {
                let snapshot = Arc::new(Snapshot::new(items));
                self.snapshot.store(Some(Arc::clone(&snapshot)));
                info!(
                    attempt,
                    items = snapshot.len(),
                    fetched_at = %snapshot.fetched_at_utc().to_rfc3339(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Catalog refreshed"
                );
                snapshot
            }
            Err(e) => {
                let stale = self.snapshot.load_full();
                warn!(
                    attempt,
                    error = %e,
                    catalog_url = %self.catalog_url,
                    stale_items = stale.as_ref().map(|s| s.len()).unwrap_or(0),
                    "Catalog refresh failed, serving previous snapshot"
                );
                stale.unwrap_or_else(|| Arc::new(Snapshot::empty()))
            }
        }
    }

    /// Look up an item by identifier, refreshing the catalog if needed
    pub async fn find(&self, id: &str) -> Option<CatalogItem> {
        let snapshot = self.get_items().await;
        let item = snapshot.find(id).cloned();
        if item.is_none() {
            debug!(item_id = %id, catalog_items = snapshot.len(), "Item not in catalog");
        }
        item
    }

    fn fresh_snapshot(&self) -> Option<Arc<Snapshot>> {
        self.snapshot
            .load_full()
            .filter(|snapshot| snapshot.is_fresh(self.ttl))
    }

    async fn fetch(&self) -> Result<Vec<CatalogItem>, CatalogError> {
        debug!(catalog_url = %self.catalog_url, "Fetching catalog");

        let response = self.client.get(&self.catalog_url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Status(status));
        }

        // Decoded per entry: a malformed entry is dropped, not the catalog
        let entries = response.json::<Vec<serde_json::Value>>().await?;
        let total = entries.len();
        let items: Vec<CatalogItem> = entries
            .into_iter()
            .filter_map(|entry| match serde_json::from_value(entry) {
                Ok(item) => Some(item),
                Err(e) => {
                    debug!(error = %e, "Skipping malformed catalog entry");
                    None
                }
            })
            .collect();

        if items.len() < total {
            warn!(
                skipped = total - items.len(),
                total,
                "Catalog contained malformed entries"
            );
        }
        Ok(items)
    }
}
