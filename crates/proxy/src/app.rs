//! Application state shared by every request.

use std::sync::Arc;

use mirror_config::MirrorConfig;

use crate::catalog::CatalogCache;
use crate::errors::ProxyError;
use crate::proxy::ContentProxy;

/// Process-wide state, built once at startup and shared through an `Arc`
pub struct AppState {
    pub config: Arc<MirrorConfig>,
    pub catalog: CatalogCache,
    pub proxy: ContentProxy,
}

impl AppState {
    pub fn new(config: MirrorConfig) -> Result<Self, ProxyError> {
        let catalog = CatalogCache::from_config(&config)?;
        let proxy = ContentProxy::new(&config)?;
        Ok(Self {
            config: Arc::new(config),
            catalog,
            proxy,
        })
    }
}
