//! sitemap.xml handler.

use chrono::NaiveDate;
use html_escape::encode_quoted_attribute as xml_escape;
use http::Response;
use std::fmt::Write;
use tracing::info;

use mirror_common::CatalogItem;

use crate::app::AppState;
use crate::errors::ProxyError;
use crate::http_helpers::{ProxyBody, RequestInfo};

use super::generated;

pub async fn handle_sitemap(
    state: &AppState,
    info: &RequestInfo,
) -> Result<Response<ProxyBody>, ProxyError> {
    let snapshot = state.catalog.get_items().await;
    let max_entries = state.config.max_sitemap_entries;

    if snapshot.len() > max_entries {
        info!(
            included = max_entries,
            total = snapshot.len(),
            "Sitemap truncated"
        );
    }

    let xml = render_sitemap(
        &info.origin,
        snapshot.items(),
        max_entries,
        snapshot.fetched_at_utc().date_naive(),
    );
    Ok(generated(
        "application/xml; charset=UTF-8",
        "public, max-age=3600",
        xml,
    )?)
}

/// Home and search pages first, then up to `max_entries` detail pages
pub fn render_sitemap(
    origin: &str,
    items: &[CatalogItem],
    max_entries: usize,
    lastmod: NaiveDate,
) -> String {
    let lastmod = lastmod.format("%Y-%m-%d").to_string();
    let mut entries = String::new();

    push_entry(&mut entries, origin, &lastmod, "daily", "1.0");
    push_entry(&mut entries, &format!("{}/search", origin), &lastmod, "daily", "1.0");

    for item in items.iter().filter(|item| !item.id.as_str().is_empty()).take(max_entries) {
        let loc = format!("{}/detail/{}", origin, urlencoding::encode(item.id.as_str()));
        push_entry(&mut entries, &loc, &lastmod, "weekly", "0.8");
    }

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9"
        xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
        xsi:schemaLocation="http://www.sitemaps.org/schemas/sitemap/0.9
        http://www.sitemaps.org/schemas/sitemap/0.9/sitemap.xsd">{entries}
</urlset>"#
    )
}

fn push_entry(out: &mut String, loc: &str, lastmod: &str, changefreq: &str, priority: &str) {
    // Writing to a String cannot fail
    let _ = write!(
        out,
        "
  <url>
    <loc>{}</loc>
    <lastmod>{}</lastmod>
    <changefreq>{}</changefreq>
    <priority>{}</priority>
  </url>",
        xml_escape(loc),
        lastmod,
        changefreq,
        priority
    );
}
