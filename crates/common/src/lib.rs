//! Shared types for the extension store mirror.
//!
//! - [`CatalogItem`] and [`Snapshot`]: the mirrored catalog
//! - [`RewriteContext`]: origins used when rewriting upstream content
//! - [`ItemId`] and [`RequestId`]: identifier newtypes

pub mod ids;
pub mod types;

pub use ids::{ItemId, RequestId};
pub use types::{CatalogItem, RewriteContext, Snapshot};
