//! Item detail handler: proxies the item's upstream page with the banner.

use http::Response;

use crate::app::AppState;
use crate::errors::ProxyError;
use crate::http_helpers::{ProxyBody, RequestInfo};

use super::not_found;

pub async fn handle_detail(
    state: &AppState,
    info: &RequestInfo,
    item_id: &str,
) -> Result<Response<ProxyBody>, ProxyError> {
    let Some(item) = state.catalog.find(item_id).await else {
        return Ok(not_found(state, info));
    };

    state
        .proxy
        .proxy_request(info, &item.page, Some(item.id.as_str()))
        .await
}
