//! Error page responses.

use http::header::{ALLOW, CONTENT_TYPE, X_CONTENT_TYPE_OPTIONS};
use http::{HeaderValue, Response, StatusCode};

use crate::app::AppState;
use crate::http_helpers::{full, ProxyBody, RequestInfo};
use crate::templates::{render_error_page, render_not_found};

use super::HTML_CONTENT_TYPE;

/// The local 404 page. Never fails.
pub fn not_found(state: &AppState, info: &RequestInfo) -> Response<ProxyBody> {
    let html = render_not_found(&state.config.site, &info.path, &info.current_url());
    html_page(StatusCode::NOT_FOUND, html)
}

/// 405 for anything other than GET and HEAD
pub fn method_not_allowed(state: &AppState, info: &RequestInfo) -> Response<ProxyBody> {
    let html = render_error_page(
        &state.config.site,
        StatusCode::METHOD_NOT_ALLOWED,
        "This mirror is read-only. Only GET and HEAD requests are supported.",
        &format!("{} {}", info.method, info.path),
        &info.current_url(),
    );
    let mut response = html_page(StatusCode::METHOD_NOT_ALLOWED, html);
    response
        .headers_mut()
        .insert(ALLOW, HeaderValue::from_static("GET, HEAD"));
    response
}

fn html_page(status: StatusCode, html: String) -> Response<ProxyBody> {
    let mut response = Response::new(full(html));
    *response.status_mut() = status;
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(HTML_CONTENT_TYPE));
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    response
}
