//! Catalog domain types shared by the mirror crates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::time::{Duration, Instant};

use crate::ids::ItemId;

// ============================================================================
// Catalog
// ============================================================================

/// One distributable entry of the catalog.
///
/// Deserialized from the upstream catalog document. Fields the mirror does
/// not use are ignored; missing or `null` string fields become empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    /// Stable unique identifier
    pub id: ItemId,
    /// Human-readable name, used for display and search
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    /// URL of the downloadable binary artifact
    #[serde(default, deserialize_with = "null_as_empty")]
    pub file: String,
    /// URL of the upstream detail page
    #[serde(default, deserialize_with = "null_as_empty")]
    pub page: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Immutable copy of the catalog at a point in time.
///
/// Snapshots are replaced wholesale, never mutated, so readers holding an
/// `Arc<Snapshot>` always observe a complete list.
#[derive(Debug, Clone)]
pub struct Snapshot {
    items: Vec<CatalogItem>,
    fetched_at: Instant,
    fetched_at_utc: DateTime<Utc>,
}

impl Snapshot {
    /// Create a snapshot stamped with the current time
    pub fn new(items: Vec<CatalogItem>) -> Self {
        Self {
            items,
            fetched_at: Instant::now(),
            fetched_at_utc: Utc::now(),
        }
    }

    /// Snapshot with no items, returned when nothing was ever fetched
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Wall-clock time of the fetch
    pub fn fetched_at_utc(&self) -> DateTime<Utc> {
        self.fetched_at_utc
    }

    /// Time elapsed since the snapshot was fetched
    pub fn age(&self) -> Duration {
        self.fetched_at.elapsed()
    }

    /// Whether the snapshot is younger than `ttl`
    pub fn is_fresh(&self, ttl: Duration) -> bool {
        self.age() < ttl
    }

    /// Look up an item by identifier.
    ///
    /// A miss is a normal outcome, not an error.
    pub fn find(&self, id: &str) -> Option<&CatalogItem> {
        self.items.iter().find(|item| item.id == *id)
    }
}

// ============================================================================
// Rewriting
// ============================================================================

/// Per-request origins used when rewriting upstream content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteContext {
    /// Origin of the mirrored upstream, e.g. `https://chromewebstore.google.com`
    pub source_origin: String,
    /// Public origin of this mirror, e.g. `https://mirror.example.com`
    pub target_origin: String,
}

impl RewriteContext {
    pub fn new(source_origin: impl Into<String>, target_origin: impl Into<String>) -> Self {
        Self {
            source_origin: source_origin.into(),
            target_origin: target_origin.into(),
        }
    }
}
