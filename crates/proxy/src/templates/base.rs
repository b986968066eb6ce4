//! Base page layout shared by every generated page.

use html_escape::encode_text;

use mirror_config::SiteConfig;

use super::seo::{page_title, render_seo, SeoOptions};
use super::PageType;

/// A page to render inside the base layout
#[derive(Debug, Clone)]
pub struct Page<'a> {
    /// Page-specific title; the site name is appended
    pub title: &'a str,
    /// Trusted markup placed inside `<main>`
    pub content: &'a str,
    pub page_type: PageType,
    /// Trusted inline script placed before `</body>`
    pub script: Option<&'a str>,
    pub seo: SeoOptions,
}

/// Render a complete HTML document
pub fn render_page(site: &SiteConfig, page: &Page<'_>) -> String {
    let full_title = page_title(site, page.title);
    let seo = render_seo(site, &full_title, &page.seo);
    let script = page
        .script
        .map(|script| format!("<script>{}</script>", script))
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <title>{title}</title>
  {seo}
  <style>
{styles}
  </style>
</head>
<body>
  <div class="container">
    <header class="header" role="banner">
      <h1>{site_name}</h1>
      <p class="subtitle">Browse and download extensions and themes safely</p>
    </header>
    <main id="main-content" role="main">
      {content}
    </main>
  </div>
  {script}
</body>
</html>"#,
        title = encode_text(&full_title),
        seo = seo,
        styles = page.page_type.styles(),
        site_name = encode_text(&site.name),
        content = page.content,
        script = script,
    )
}
