//! CRX download handler.
//!
//! Streams the item's artifact with the upstream status and headers, minus
//! hop-by-hop headers, and marks it as an attachment named `{id}.crx`.

use http::header::CONTENT_DISPOSITION;
use http::{HeaderValue, Response};
use tracing::debug;

use crate::app::AppState;
use crate::errors::ProxyError;
use crate::http_helpers::{is_hop_by_hop_header, stream, ProxyBody, RequestInfo};

use super::not_found;

pub async fn handle_crx(
    state: &AppState,
    info: &RequestInfo,
    item_id: &str,
) -> Result<Response<ProxyBody>, ProxyError> {
    let Some(item) = state.catalog.find(item_id).await else {
        return Ok(not_found(state, info));
    };

    let upstream = state.proxy.fetch_download(&item.file).await?;
    let status = upstream.status();
    debug!(
        item_id = %item.id,
        upstream_status = status.as_u16(),
        content_length = ?upstream.content_length(),
        "Streaming download"
    );

    let mut builder = Response::builder().status(status);
    for (name, value) in upstream.headers() {
        if is_hop_by_hop_header(name.as_str()) || name == CONTENT_DISPOSITION {
            continue;
        }
        builder = builder.header(name, value);
    }

    let disposition = HeaderValue::try_from(format!("attachment; filename=\"{}.crx\"", item.id))
        .map_err(http::Error::from)?;
    builder = builder.header(CONTENT_DISPOSITION, disposition);

    Ok(builder.body(stream(upstream))?)
}
