//! Search page handler.

use http::Response;

use crate::app::AppState;
use crate::errors::ProxyError;
use crate::http_helpers::{ProxyBody, RequestInfo};
use crate::templates::render_search_page;

use super::{generated, HTML_CONTENT_TYPE};

/// Render the search page over the current catalog.
///
/// An unavailable catalog yields a page with no results, not an error.
pub async fn handle_search(
    state: &AppState,
    info: &RequestInfo,
    query: &str,
) -> Result<Response<ProxyBody>, ProxyError> {
    let snapshot = state.catalog.get_items().await;
    let html = render_search_page(
        &state.config.site,
        snapshot.items(),
        query,
        state.config.max_search_results,
        &info.current_url(),
    );

    Ok(generated(HTML_CONTENT_TYPE, "public, max-age=3600", html)?)
}
