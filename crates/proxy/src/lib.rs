//! Webstore Mirror Library
//!
//! A rewriting reverse mirror for an extension store.
//!
//! This library provides the components of the mirror:
//!
//! - **Catalog**: single-flight, time-boxed cache of the remote item list
//! - **Rewriting**: upstream origins and root-relative links point back at the mirror
//! - **Content Proxy**: fetch, classify, rewrite and stream upstream responses
//! - **Pages**: search, error pages, robots.txt and sitemap.xml
//! - **Server**: hyper connection loop with graceful shutdown
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use mirror_config::MirrorConfig;
//! use mirror_proxy::{serve, AppState};
//!
//! let state = Arc::new(AppState::new(MirrorConfig::default())?);
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:8787").await?;
//! serve(state, listener, tokio::signal::ctrl_c().map(|_| ())).await?;
//! ```

// ============================================================================
// Module Declarations
// ============================================================================

pub mod app;
pub mod catalog;
pub mod errors;
pub mod handlers;
pub mod http_helpers;
pub mod proxy;
pub mod rewrite;
pub mod router;
pub mod server;
pub mod shutdown;
pub mod templates;

// ============================================================================
// Public API Re-exports
// ============================================================================

// Application state
pub use app::AppState;

// Catalog
pub use catalog::CatalogCache;

// Error handling
pub use errors::{CatalogError, ProxyError};

// HTTP plumbing
pub use http_helpers::{ProxyBody, RequestInfo};

// Proxy core
pub use proxy::{inject_banner, ContentKind, ContentProxy, ProxyOutcome};

// URL rewriting
pub use rewrite::{rewrite_redirect_location, rewrite_urls};

// Routing
pub use router::{dispatch, handle_request, Route};

// Server
pub use server::serve;
pub use shutdown::ShutdownCoordinator;
