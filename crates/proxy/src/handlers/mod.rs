//! Route handlers.
//!
//! Handlers return `Result`; the router turns any error into the local
//! not-found page. Only [`error`] builds responses infallibly.

use http::header::{CACHE_CONTROL, CONTENT_TYPE, X_CONTENT_TYPE_OPTIONS};
use http::{Response, StatusCode};

use crate::http_helpers::{full, ProxyBody};

pub mod crx;
pub mod detail;
pub mod error;
pub mod passthrough;
pub mod robots;
pub mod search;
pub mod sitemap;

pub use crx::handle_crx;
pub use detail::handle_detail;
pub use error::{method_not_allowed, not_found};
pub use passthrough::handle_passthrough;
pub use robots::handle_robots;
pub use search::handle_search;
pub use sitemap::handle_sitemap;

const HTML_CONTENT_TYPE: &str = "text/html; charset=UTF-8";

/// 200 response for a locally generated document
fn generated(
    content_type: &'static str,
    cache_control: &'static str,
    body: String,
) -> Result<Response<ProxyBody>, http::Error> {
    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, content_type)
        .header(CACHE_CONTROL, cache_control)
        .header(X_CONTENT_TYPE_OPTIONS, "nosniff")
        .body(full(body))
}
