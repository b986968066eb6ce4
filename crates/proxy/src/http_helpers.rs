//! HTTP helper utilities shared by the handlers and the content proxy.
//!
//! Response bodies are boxed into a single [`ProxyBody`] type so generated
//! pages, rewritten text and streamed binaries flow through one service.

use bytes::Bytes;
use futures::TryStreamExt;
use http::{header, Method, Request};
use http_body_util::{BodyExt, Empty, Full, StreamBody};
use hyper::body::Frame;

/// Boxed error carried by response bodies
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Response body used throughout the mirror
pub type ProxyBody = http_body_util::combinators::UnsyncBoxBody<Bytes, BoxError>;

/// A complete in-memory body
pub fn full(content: impl Into<Bytes>) -> ProxyBody {
    Full::new(content.into())
        .map_err(|never| match never {})
        .boxed_unsync()
}

/// A zero-length body
pub fn empty() -> ProxyBody {
    Empty::<Bytes>::new()
        .map_err(|never| match never {})
        .boxed_unsync()
}

/// Stream an upstream response body through unmodified
pub fn stream(response: reqwest::Response) -> ProxyBody {
    let frames = response
        .bytes_stream()
        .map_ok(Frame::data)
        .map_err(|e| Box::new(e) as BoxError);
    StreamBody::new(frames).boxed_unsync()
}

/// Request information needed by the handlers.
///
/// Extracted once per request so handlers never touch the raw request and
/// so the body type of the incoming request does not leak into them.
#[derive(Debug, Clone)]
pub struct RequestInfo {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    /// Public origin of the mirror as seen by the client
    pub origin: String,
    pub user_agent: Option<String>,
    pub accept: Option<String>,
    pub accept_language: Option<String>,
}

impl RequestInfo {
    /// Extract request information.
    ///
    /// `public_origin` wins over anything the request says about itself.
    pub fn from_request<B>(req: &Request<B>, public_origin: Option<&str>) -> Self {
        let uri = req.uri();
        let origin = match public_origin {
            Some(origin) => origin.to_string(),
            None => request_origin(req),
        };

        Self {
            method: req.method().clone(),
            path: uri.path().to_string(),
            query: uri.query().map(str::to_string),
            origin,
            user_agent: header_string(req, header::USER_AGENT),
            accept: header_string(req, header::ACCEPT),
            accept_language: header_string(req, header::ACCEPT_LANGUAGE),
        }
    }

    /// Path plus `?query` when a query is present
    pub fn path_and_query(&self) -> String {
        match &self.query {
            Some(query) => format!("{}?{}", self.path, query),
            None => self.path.clone(),
        }
    }

    /// Absolute URL of the requested page, without the query
    pub fn current_url(&self) -> String {
        format!("{}{}", self.origin, self.path)
    }
}

/// Derive the origin from `X-Forwarded-Proto` and `Host`
fn request_origin<B>(req: &Request<B>) -> String {
    let scheme = req
        .headers()
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .or_else(|| req.uri().scheme_str())
        .unwrap_or("http");

    let host = req
        .headers()
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .or_else(|| req.uri().authority().map(|a| a.as_str()))
        .unwrap_or("localhost");

    format!("{}://{}", scheme, host)
}

fn header_string<B>(req: &Request<B>, name: header::HeaderName) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Hop-by-hop headers are connection-scoped and never copied between hops
pub fn is_hop_by_hop_header(name: &str) -> bool {
    matches!(
        name.to_ascii_lowercase().as_str(),
        "connection"
            | "keep-alive"
            | "proxy-authenticate"
            | "proxy-authorization"
            | "te"
            | "trailer"
            | "trailers"
            | "transfer-encoding"
            | "upgrade"
    )
}
