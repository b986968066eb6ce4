//! Request routing.
//!
//! | Path              | Handler                         |
//! |-------------------|---------------------------------|
//! | `/`               | search page                     |
//! | `/robots.txt`     | robots.txt                      |
//! | `/sitemap.xml`    | sitemap.xml                     |
//! | `/detail/{id}`    | proxied detail page with banner |
//! | `/crx/{id}`       | artifact download               |
//! | `/search[/{q}]`   | search page                     |
//! | anything else     | passthrough to the upstream     |
//!
//! This is the single place where handler errors become the 404 page.

use http::{Method, Request, Response};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, info_span, warn, Instrument};

use mirror_common::RequestId;

use crate::app::AppState;
use crate::handlers;
use crate::http_helpers::{ProxyBody, RequestInfo};

/// A resolved route
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Search page with an optional, already decoded query
    Search(Option<String>),
    Robots,
    Sitemap,
    Detail(Option<String>),
    Crx(Option<String>),
    Passthrough,
}

impl Route {
    pub fn resolve(path: &str) -> Self {
        match path {
            "" | "/" => Route::Search(None),
            "/robots.txt" => Route::Robots,
            "/sitemap.xml" => Route::Sitemap,
            _ if path.starts_with("/detail/") => Route::Detail(second_segment(path)),
            _ if path.starts_with("/crx/") => Route::Crx(second_segment(path)),
            _ if path.starts_with("/search") => Route::Search(second_segment(path).map(|q| {
                urlencoding::decode(&q)
                    .map(|decoded| decoded.into_owned())
                    .unwrap_or(q)
            })),
            _ => Route::Passthrough,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Route::Search(_) => "search",
            Route::Robots => "robots",
            Route::Sitemap => "sitemap",
            Route::Detail(_) => "detail",
            Route::Crx(_) => "crx",
            Route::Passthrough => "passthrough",
        }
    }
}

/// `/detail/{id}/extra` → `id`
fn second_segment(path: &str) -> Option<String> {
    path.split('/')
        .nth(2)
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
}

/// Handle one request inside its own tracing span
pub async fn handle_request<B>(state: Arc<AppState>, req: Request<B>) -> Response<ProxyBody> {
    let request_id = RequestId::new();
    let info = RequestInfo::from_request(&req, state.config.public_origin());
    drop(req);

    let span = info_span!(
        "request",
        request_id = %request_id,
        method = %info.method,
        path = %info.path,
    );

    async move {
        let started = Instant::now();
        let response = dispatch(&state, &info).await;
        info!(
            status = response.status().as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Request completed"
        );
        response
    }
    .instrument(span)
    .await
}

/// Route a request and translate handler failures into the 404 page
pub async fn dispatch(state: &AppState, info: &RequestInfo) -> Response<ProxyBody> {
    if info.method != Method::GET && info.method != Method::HEAD {
        return handlers::method_not_allowed(state, info);
    }

    let route = Route::resolve(&info.path);
    let result = match &route {
        Route::Search(query) => {
            handlers::handle_search(state, info, query.as_deref().unwrap_or("")).await
        }
        Route::Robots => handlers::handle_robots(info),
        Route::Sitemap => handlers::handle_sitemap(state, info).await,
        Route::Detail(Some(id)) => handlers::handle_detail(state, info, id).await,
        Route::Crx(Some(id)) => handlers::handle_crx(state, info, id).await,
        Route::Detail(None) | Route::Crx(None) => Ok(handlers::not_found(state, info)),
        Route::Passthrough => handlers::handle_passthrough(state, info).await,
    };

    match result {
        Ok(response) => response,
        Err(e) => {
            warn!(
                route = route.name(),
                error = %e,
                kind = e.kind(),
                "Request failed, serving not-found page"
            );
            handlers::not_found(state, info)
        }
    }
}
