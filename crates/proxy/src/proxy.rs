//! Content proxy.
//!
//! Fetches an upstream resource and turns it into a mirror response:
//!
//! ```text
//! Pending ─┬─ 301/302/307/308 ──────────────> Redirected
//!          ├─ other non-2xx ────────────────> Failed
//!          └─ 2xx ─┬─ text/html ────────────> HtmlRewritten (+ banner)
//!                  ├─ text/css ─────────────> CssRewritten
//!                  ├─ *javascript*, *json* ─> TextRewritten
//!                  └─ anything else ────────> Passthrough (streamed)
//! ```
//!
//! No retries. Dropping the returned future abandons the upstream fetch.

use http::header::{ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, LOCATION, REFERER, USER_AGENT};
use http::{Response, StatusCode};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::time::Duration;
use tracing::{debug, trace};
use url::Url;

use mirror_common::RewriteContext;
use mirror_config::MirrorConfig;

use crate::errors::ProxyError;
use crate::http_helpers::{empty, full, stream, ProxyBody, RequestInfo};
use crate::rewrite::{rewrite_redirect_location, rewrite_urls};
use crate::templates::render_banner;

const FALLBACK_ACCEPT: &str = "*/*";
const FALLBACK_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";

static BODY_OPEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<body[^>]*>").expect("body pattern is valid"));

/// How an upstream body is treated, decided by its declared content type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Html,
    Css,
    /// JavaScript or JSON: rewritten, original content type kept
    Script,
    /// Streamed through untouched
    Binary,
}

impl ContentKind {
    pub fn classify(content_type: &str) -> Self {
        let content_type = content_type.to_ascii_lowercase();
        if content_type.contains("text/html") {
            ContentKind::Html
        } else if content_type.contains("text/css") {
            ContentKind::Css
        } else if content_type.contains("javascript") || content_type.contains("json") {
            ContentKind::Script
        } else {
            ContentKind::Binary
        }
    }
}

/// Terminal state of a proxied request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyOutcome {
    Redirected,
    Failed,
    HtmlRewritten,
    CssRewritten,
    TextRewritten,
    Passthrough,
}

impl ProxyOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProxyOutcome::Redirected => "redirected",
            ProxyOutcome::Failed => "failed",
            ProxyOutcome::HtmlRewritten => "html_rewritten",
            ProxyOutcome::CssRewritten => "css_rewritten",
            ProxyOutcome::TextRewritten => "text_rewritten",
            ProxyOutcome::Passthrough => "passthrough",
        }
    }
}

/// Upstream fetcher and response rewriter
pub struct ContentProxy {
    /// Redirects are translated, never followed
    client: reqwest::Client,
    /// Follows redirects, for binary downloads
    download_client: reqwest::Client,
    upstream_origin: String,
    default_user_agent: String,
    timeout: Option<Duration>,
}

impl ContentProxy {
    pub fn new(config: &MirrorConfig) -> Result<Self, ProxyError> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(ProxyError::ClientBuild)?;

        let download_client = reqwest::Client::builder()
            .user_agent(config.default_user_agent.as_str())
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(ProxyError::ClientBuild)?;

        debug!(
            upstream = %config.upstream_origin(),
            timeout_secs = config.upstream_timeout_secs,
            "Creating content proxy"
        );

        Ok(Self {
            client,
            download_client,
            upstream_origin: config.upstream_origin().to_string(),
            default_user_agent: config.default_user_agent.clone(),
            timeout: config.upstream_timeout(),
        })
    }

    pub fn upstream_origin(&self) -> &str {
        &self.upstream_origin
    }

    /// Proxy `target_url` on behalf of `incoming`.
    ///
    /// The download banner is injected into HTML only when `item_id` is set.
    pub async fn proxy_request(
        &self,
        incoming: &RequestInfo,
        target_url: &str,
        item_id: Option<&str>,
    ) -> Result<Response<ProxyBody>, ProxyError> {
        let target = Url::parse(target_url)
            .map_err(|_| ProxyError::InvalidTarget(target_url.to_string()))?;
        let referer = target.origin().ascii_serialization();

        let request = self
            .client
            .get(target)
            .header(
                USER_AGENT,
                incoming
                    .user_agent
                    .as_deref()
                    .unwrap_or(&self.default_user_agent),
            )
            .header(ACCEPT, incoming.accept.as_deref().unwrap_or(FALLBACK_ACCEPT))
            .header(
                ACCEPT_LANGUAGE,
                incoming
                    .accept_language
                    .as_deref()
                    .unwrap_or(FALLBACK_ACCEPT_LANGUAGE),
            )
            .header(REFERER, referer);

        trace!(target = %target_url, "Sending upstream request");
        let response = self.send(request, target_url).await?;
        let status = response.status();

        let (outcome, reply) = if is_redirect(status) {
            (
                ProxyOutcome::Redirected,
                self.redirect_response(&response, &incoming.origin)?,
            )
        } else if !status.is_success() {
            let reply = Response::builder()
                .status(status)
                .header(CONTENT_TYPE, "text/plain; charset=UTF-8")
                .body(full(format!(
                    "Failed to fetch from upstream: {}",
                    status.as_u16()
                )))?;
            (ProxyOutcome::Failed, reply)
        } else {
            self.content_response(response, &incoming.origin, item_id)
                .await?
        };

        debug!(
            target = %target_url,
            upstream_status = status.as_u16(),
            outcome = outcome.as_str(),
            "Proxied upstream request"
        );
        Ok(reply)
    }

    /// Fetch a download artifact, following redirects
    pub async fn fetch_download(&self, file_url: &str) -> Result<reqwest::Response, ProxyError> {
        let url =
            Url::parse(file_url).map_err(|_| ProxyError::InvalidTarget(file_url.to_string()))?;
        self.send(self.download_client.get(url), file_url).await
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        target: &str,
    ) -> Result<reqwest::Response, ProxyError> {
        match self.timeout {
            Some(after) => tokio::time::timeout(after, request.send())
                .await
                .map_err(|_| ProxyError::Timeout {
                    target: target.to_string(),
                    after,
                })?
                .map_err(ProxyError::from),
            None => Ok(request.send().await?),
        }
    }

    fn redirect_response(
        &self,
        upstream: &reqwest::Response,
        worker_origin: &str,
    ) -> Result<Response<ProxyBody>, ProxyError> {
        let location = upstream
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok());

        let mut builder = Response::builder().status(upstream.status());
        if let Some(location) = location {
            let translated =
                rewrite_redirect_location(location, &self.upstream_origin, worker_origin);
            trace!(from = %location, to = %translated, "Translated redirect");
            builder = builder.header(LOCATION, translated);
        }
        Ok(builder.body(empty())?)
    }

    async fn content_response(
        &self,
        upstream: reqwest::Response,
        worker_origin: &str,
        item_id: Option<&str>,
    ) -> Result<(ProxyOutcome, Response<ProxyBody>), ProxyError> {
        let content_type = upstream
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let kind = ContentKind::classify(content_type.as_deref().unwrap_or(""));
        let ctx = RewriteContext::new(self.upstream_origin.as_str(), worker_origin);

        let (outcome, content_type, body) = match kind {
            ContentKind::Html => {
                let mut html = rewrite_urls(&upstream.text().await?, &ctx);
                if let Some(id) = item_id {
                    html = inject_banner(&html, &render_banner(worker_origin, id));
                }
                (
                    ProxyOutcome::HtmlRewritten,
                    Some("text/html; charset=UTF-8".to_string()),
                    full(html),
                )
            }
            ContentKind::Css => (
                ProxyOutcome::CssRewritten,
                Some("text/css; charset=UTF-8".to_string()),
                full(rewrite_urls(&upstream.text().await?, &ctx)),
            ),
            ContentKind::Script => (
                ProxyOutcome::TextRewritten,
                content_type,
                full(rewrite_urls(&upstream.text().await?, &ctx)),
            ),
            ContentKind::Binary => (ProxyOutcome::Passthrough, content_type, stream(upstream)),
        };

        let mut builder = Response::builder().status(StatusCode::OK);
        if let Some(content_type) = content_type {
            builder = builder.header(CONTENT_TYPE, content_type);
        }
        Ok((outcome, builder.body(body)?))
    }
}

fn is_redirect(status: StatusCode) -> bool {
    matches!(status.as_u16(), 301 | 302 | 307 | 308)
}

/// Insert `banner` right after the first `<body ...>` tag.
///
/// Markup without a body tag is returned unchanged.
pub fn inject_banner(html: &str, banner: &str) -> String {
    BODY_OPEN
        .replacen(html, 1, |caps: &Captures<'_>| format!("{}{}", &caps[0], banner))
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const MIRROR: &str = "https://mirror.example.com";

    fn proxy_for(server: &MockServer) -> ContentProxy {
        let config = MirrorConfig {
            upstream_base_url: server.uri(),
            ..Default::default()
        };
        ContentProxy::new(&config).unwrap()
    }

    fn incoming() -> RequestInfo {
        RequestInfo {
            method: http::Method::GET,
            path: "/".to_string(),
            query: None,
            origin: MIRROR.to_string(),
            user_agent: None,
            accept: None,
            accept_language: None,
        }
    }

    async fn body_string(response: Response<ProxyBody>) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_classify() {
        assert_eq!(ContentKind::classify("text/html; charset=utf-8"), ContentKind::Html);
        assert_eq!(ContentKind::classify("Text/CSS"), ContentKind::Css);
        assert_eq!(ContentKind::classify("application/javascript"), ContentKind::Script);
        assert_eq!(ContentKind::classify("application/json"), ContentKind::Script);
        assert_eq!(ContentKind::classify("image/png"), ContentKind::Binary);
        assert_eq!(ContentKind::classify(""), ContentKind::Binary);
    }

    #[test]
    fn test_inject_banner_after_first_body() {
        let html = r#"<html><body class="x"><p>a</p><body></html>"#;
        let result = inject_banner(html, "<B>");
        assert_eq!(result, r#"<html><body class="x"><B><p>a</p><body></html>"#);
    }

    #[test]
    fn test_inject_banner_without_body() {
        assert_eq!(inject_banner("<p>fragment</p>", "<B>"), "<p>fragment</p>");
    }

    #[tokio::test]
    async fn test_forwards_fallback_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .and(header("accept", "*/*"))
            .and(header("accept-language", "en-US,en;q=0.9"))
            .and(header("user-agent", "Mozilla/5.0 (compatible; webstore-mirror)"))
            .and(header("referer", server.uri().as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_raw("ok", "text/plain"))
            .expect(1)
            .mount(&server)
            .await;

        let proxy = proxy_for(&server);
        let response = proxy
            .proxy_request(&incoming(), &format!("{}/page", server.uri()), None)
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_redirect_is_translated_not_followed() {
        let server = MockServer::start().await;
        let location = format!("{}/detail/abc?hl=en", server.uri());
        Mock::given(method("GET"))
            .and(path("/old"))
            .respond_with(ResponseTemplate::new(301).insert_header("location", location.as_str()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/detail/abc"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let proxy = proxy_for(&server);
        let response = proxy
            .proxy_request(&incoming(), &format!("{}/old", server.uri()), None)
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(
            response.headers()[LOCATION],
            "https://mirror.example.com/detail/abc?hl=en"
        );
    }

    #[tokio::test]
    async fn test_redirect_without_location_passes_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(307))
            .mount(&server)
            .await;

        let proxy = proxy_for(&server);
        let response = proxy
            .proxy_request(&incoming(), &format!("{}/x", server.uri()), None)
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert!(response.headers().get(LOCATION).is_none());
        assert_eq!(body_string(response).await, "");
    }

    #[tokio::test]
    async fn test_upstream_error_is_plain_text() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
            .mount(&server)
            .await;

        let proxy = proxy_for(&server);
        let response = proxy
            .proxy_request(&incoming(), &format!("{}/x", server.uri()), None)
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.headers()[CONTENT_TYPE], "text/plain; charset=UTF-8");
        assert_eq!(body_string(response).await, "Failed to fetch from upstream: 503");
    }

    #[tokio::test]
    async fn test_html_rewritten_with_banner() {
        let server = MockServer::start().await;
        let html = format!(
            r#"<html><body><a href="/category">c</a><a href="{}/detail/y">y</a></body></html>"#,
            server.uri()
        );
        Mock::given(method("GET"))
            .and(path("/detail/abc"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(html, "text/html"))
            .mount(&server)
            .await;

        let proxy = proxy_for(&server);
        let response = proxy
            .proxy_request(&incoming(), &format!("{}/detail/abc", server.uri()), Some("abc"))
            .await
            .unwrap();

        assert_eq!(response.headers()[CONTENT_TYPE], "text/html; charset=UTF-8");
        let body = body_string(response).await;
        assert!(body.contains(r#"href="https://mirror.example.com/category""#));
        assert!(body.contains(r#"href="https://mirror.example.com/detail/y""#));
        assert!(body.contains(r#"href="https://mirror.example.com/crx/abc""#));
        assert!(!body.contains(&server.uri()));
    }

    #[tokio::test]
    async fn test_html_without_item_has_no_banner() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw("<html><body>x</body></html>", "text/html"),
            )
            .mount(&server)
            .await;

        let proxy = proxy_for(&server);
        let response = proxy
            .proxy_request(&incoming(), &format!("{}/", server.uri()), None)
            .await
            .unwrap();

        assert!(!body_string(response).await.contains("mirror-banner"));
    }

    #[tokio::test]
    async fn test_json_keeps_content_type() {
        let server = MockServer::start().await;
        let body = format!(r#"{{"url":"{}/x"}}"#, server.uri());
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/json"))
            .mount(&server)
            .await;

        let proxy = proxy_for(&server);
        let response = proxy
            .proxy_request(&incoming(), &format!("{}/api", server.uri()), None)
            .await
            .unwrap();

        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(
            body_string(response).await,
            r#"{"url":"https://mirror.example.com/x"}"#
        );
    }

    #[tokio::test]
    async fn test_binary_streamed_unmodified() {
        let server = MockServer::start().await;
        let bytes = vec![0x89, b'P', b'N', b'G', 0x00, 0xff];
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(bytes.clone(), "image/png"))
            .mount(&server)
            .await;

        let proxy = proxy_for(&server);
        let response = proxy
            .proxy_request(&incoming(), &format!("{}/logo.png", server.uri()), None)
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "image/png");
        let collected = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(collected.to_vec(), bytes);
    }

    #[tokio::test]
    async fn test_upstream_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;

        let mut proxy = proxy_for(&server);
        proxy.timeout = Some(Duration::from_millis(100));

        let result = proxy
            .proxy_request(&incoming(), &format!("{}/slow", server.uri()), None)
            .await;

        assert!(matches!(result, Err(ProxyError::Timeout { .. })));
    }

    #[tokio::test]
    async fn test_invalid_target() {
        let server = MockServer::start().await;
        let proxy = proxy_for(&server);

        let result = proxy.proxy_request(&incoming(), "not a url", None).await;

        assert!(matches!(result, Err(ProxyError::InvalidTarget(_))));
    }
}
