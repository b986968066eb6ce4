//! End-to-end tests: the full router against a mock upstream store.

use std::sync::Arc;

use http::header::{CONTENT_DISPOSITION, CONTENT_TYPE, HOST, LOCATION};
use http::{Method, Request, Response, StatusCode};
use http_body_util::BodyExt;
use serde_json::json;
use tokio::net::TcpListener;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use mirror_config::MirrorConfig;
use mirror_proxy::{handle_request, serve, AppState, ProxyBody};

const MIRROR_ORIGIN: &str = "https://mirror.example.com";

fn test_config(upstream: &MockServer) -> MirrorConfig {
    MirrorConfig {
        upstream_base_url: upstream.uri(),
        catalog_url: format!("{}/data.json", upstream.uri()),
        public_origin: Some(MIRROR_ORIGIN.to_string()),
        upstream_timeout_secs: 5,
        ..Default::default()
    }
}

async fn mount_catalog(upstream: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/data.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": "abc123",
                "name": "Dark Reader",
                "file": format!("{}/files/abc123", upstream.uri()),
                "page": format!("{}/detail/dark-reader/abc123", upstream.uri()),
            },
            {
                "id": "def456",
                "name": "uBlock Origin",
                "file": format!("{}/files/def456", upstream.uri()),
                "page": format!("{}/detail/ublock/def456", upstream.uri()),
            }
        ])))
        .mount(upstream)
        .await;
}

fn state_for(config: MirrorConfig) -> Arc<AppState> {
    Arc::new(AppState::new(config).unwrap())
}

fn get(uri: &str) -> Request<()> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header(HOST, "mirror.example.com")
        .body(())
        .unwrap()
}

async fn body_text(response: Response<ProxyBody>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_detail_page_is_rewritten_with_banner() {
    let upstream = MockServer::start().await;
    mount_catalog(&upstream).await;

    let page = format!(
        r#"<html><head></head><body><a href="/category/themes">Themes</a><img src="{}/icon.png"></body></html>"#,
        upstream.uri()
    );
    Mock::given(method("GET"))
        .and(path("/detail/dark-reader/abc123"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html; charset=utf-8")
                .set_body_string(page),
        )
        .mount(&upstream)
        .await;

    let state = state_for(test_config(&upstream));
    let response = handle_request(state, get("/detail/abc123")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[CONTENT_TYPE],
        "text/html; charset=UTF-8"
    );

    let body = body_text(response).await;
    assert!(body.contains(r#"href="https://mirror.example.com/crx/abc123""#));
    assert!(body.contains(r#"href="https://mirror.example.com/category/themes""#));
    assert!(body.contains(r#"src="https://mirror.example.com/icon.png""#));
    assert!(!body.contains(&upstream.uri()));
}

#[tokio::test]
async fn test_unknown_detail_id_is_not_found() {
    let upstream = MockServer::start().await;
    mount_catalog(&upstream).await;

    let state = state_for(test_config(&upstream));
    let response = handle_request(state, get("/detail/missing")).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_text(response).await;
    assert!(body.contains("Page Not Found"));
    assert!(body.contains("/detail/missing"));
}

#[tokio::test]
async fn test_crx_download_streams_attachment() {
    let upstream = MockServer::start().await;
    mount_catalog(&upstream).await;

    let artifact: Vec<u8> = vec![0x43, 0x72, 0x32, 0x34, 0x00, 0xff, 0x10];
    Mock::given(method("GET"))
        .and(path("/files/abc123"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("location", format!("{}/blobs/abc123", upstream.uri())),
        )
        .mount(&upstream)
        .await;
    Mock::given(method("GET"))
        .and(path("/blobs/abc123"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/x-chrome-extension")
                .insert_header("content-disposition", "inline")
                .set_body_bytes(artifact.clone()),
        )
        .mount(&upstream)
        .await;

    let state = state_for(test_config(&upstream));
    let response = handle_request(state, get("/crx/abc123")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[CONTENT_DISPOSITION],
        r#"attachment; filename="abc123.crx""#
    );
    assert_eq!(
        response.headers()[CONTENT_TYPE],
        "application/x-chrome-extension"
    );

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(bytes.as_ref(), artifact.as_slice());
}

#[tokio::test]
async fn test_crx_unknown_id_is_not_found() {
    let upstream = MockServer::start().await;
    mount_catalog(&upstream).await;

    let state = state_for(test_config(&upstream));
    let response = handle_request(state, get("/crx/zzz999")).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_passthrough_translates_redirects() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/category/extensions"))
        .respond_with(
            ResponseTemplate::new(301)
                .insert_header("location", format!("{}/category/all?hl=en", upstream.uri())),
        )
        .mount(&upstream)
        .await;

    let state = state_for(test_config(&upstream));
    let response = handle_request(state, get("/category/extensions")).await;

    assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(
        response.headers()[LOCATION],
        "https://mirror.example.com/category/all?hl=en"
    );
}

#[tokio::test]
async fn test_passthrough_upstream_not_found_uses_local_page() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/no/such/page"))
        .respond_with(ResponseTemplate::new(404).set_body_string("upstream 404"))
        .mount(&upstream)
        .await;

    let state = state_for(test_config(&upstream));
    let response = handle_request(state, get("/no/such/page")).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_text(response).await;
    assert!(body.contains("Page Not Found"));
    assert!(!body.contains("upstream 404"));
}

#[tokio::test]
async fn test_passthrough_connection_failure_is_not_found() {
    let upstream = MockServer::start().await;
    let config = MirrorConfig {
        upstream_base_url: "http://127.0.0.1:1".to_string(),
        ..test_config(&upstream)
    };

    let state = state_for(config);
    let response = handle_request(state, get("/anything")).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_search_page_embeds_catalog() {
    let upstream = MockServer::start().await;
    mount_catalog(&upstream).await;

    let state = state_for(test_config(&upstream));
    let response = handle_request(state, get("/search/dark%20reader")).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("const MIRROR_SEARCH"));
    assert!(body.contains(r#""id":"abc123""#));
    assert!(body.contains(r#""name":"uBlock Origin""#));
    assert!(body.contains(r#""initialQuery":"dark reader""#));
}

#[tokio::test]
async fn test_search_without_catalog_still_renders() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data.json"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&upstream)
        .await;

    let state = state_for(test_config(&upstream));
    let response = handle_request(state, get("/")).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains(r#""items":[]"#));
}

#[tokio::test]
async fn test_post_is_rejected() {
    let upstream = MockServer::start().await;
    let state = state_for(test_config(&upstream));

    let request = Request::builder()
        .method(Method::POST)
        .uri("/search")
        .header(HOST, "mirror.example.com")
        .body(())
        .unwrap();
    let response = handle_request(state, request).await;

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.headers()["allow"], "GET, HEAD");
}

#[tokio::test]
async fn test_sitemap_lists_items() {
    let upstream = MockServer::start().await;
    mount_catalog(&upstream).await;

    let state = state_for(test_config(&upstream));
    let response = handle_request(Arc::clone(&state), get("/sitemap.xml")).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    let lastmod = state
        .catalog
        .current()
        .fetched_at_utc()
        .format("%Y-%m-%d")
        .to_string();
    assert!(body.contains(&format!("<lastmod>{}</lastmod>", lastmod)));
    assert!(body.contains("<loc>https://mirror.example.com/search</loc>"));
    assert!(body.contains("<loc>https://mirror.example.com/detail/abc123</loc>"));
    assert!(body.contains("<loc>https://mirror.example.com/detail/def456</loc>"));
}

#[tokio::test]
async fn test_server_serves_and_shuts_down() {
    let upstream = MockServer::start().await;
    let config = MirrorConfig {
        public_origin: None,
        shutdown_timeout_secs: 2,
        ..test_config(&upstream)
    };
    let state = state_for(config);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();

    let server = tokio::spawn(serve(state, listener, async move {
        let _ = stop_rx.await;
    }));

    let response = reqwest::get(format!("http://{}/robots.txt", address))
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body = response.text().await.unwrap();
    assert!(body.contains(&format!("Sitemap: http://{}/sitemap.xml", address)));

    stop_tx.send(()).unwrap();
    let result = tokio::time::timeout(std::time::Duration::from_secs(5), server)
        .await
        .unwrap()
        .unwrap();
    assert!(result.is_ok());
}
