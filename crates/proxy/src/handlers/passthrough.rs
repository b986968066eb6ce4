//! Passthrough of unmatched paths to the upstream store.

use http::{Response, StatusCode};
use tracing::debug;

use crate::app::AppState;
use crate::errors::ProxyError;
use crate::http_helpers::{ProxyBody, RequestInfo};

use super::not_found;

/// Mirror `{upstream}{path}?{query}`; an upstream 404 becomes the local 404 page
pub async fn handle_passthrough(
    state: &AppState,
    info: &RequestInfo,
) -> Result<Response<ProxyBody>, ProxyError> {
    let target = format!("{}{}", state.proxy.upstream_origin(), info.path_and_query());
    let response = state.proxy.proxy_request(info, &target, None).await?;

    if response.status() == StatusCode::NOT_FOUND {
        debug!(target = %target, "Upstream has no such page");
        return Ok(not_found(state, info));
    }
    Ok(response)
}
