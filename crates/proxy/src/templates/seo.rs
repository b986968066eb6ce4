//! SEO tags: meta, Open Graph, Twitter card and JSON-LD structured data.

use html_escape::encode_quoted_attribute as attr;
use serde_json::json;

use mirror_config::SiteConfig;

use super::json_for_script;

/// Structured data emitted with a page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructuredData {
    /// `WebSite` with a `SearchAction` pointing at `/search/{term}`
    WebSite,
    None,
}

/// Per-page SEO settings
#[derive(Debug, Clone)]
pub struct SeoOptions {
    pub description: String,
    pub keywords: String,
    pub canonical: Option<String>,
    /// URL of the page, for Open Graph
    pub url: String,
    pub robots: &'static str,
    pub og_type: &'static str,
    pub structured_data: StructuredData,
}

impl SeoOptions {
    /// Indexable page with the site's default description and keywords
    pub fn for_site(site: &SiteConfig, url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            description: site.description.clone(),
            keywords: site.keywords.clone(),
            canonical: Some(url.clone()),
            url,
            robots: "index, follow",
            og_type: "website",
            structured_data: StructuredData::WebSite,
        }
    }

    /// Page excluded from indexing, without structured data
    pub fn noindex(description: impl Into<String>, url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            description: description.into(),
            keywords: String::new(),
            canonical: Some(url.clone()),
            url,
            robots: "noindex, nofollow",
            og_type: "website",
            structured_data: StructuredData::None,
        }
    }
}

/// `"{page} | {site}"`, or the site name alone
pub fn page_title(site: &SiteConfig, page: &str) -> String {
    if page.is_empty() || page == site.name {
        site.name.clone()
    } else {
        format!("{} | {}", page, site.name)
    }
}

/// Render every SEO tag for the `<head>` of a page
pub fn render_seo(site: &SiteConfig, title: &str, options: &SeoOptions) -> String {
    let keywords = if options.keywords.is_empty() {
        site.keywords.as_str()
    } else {
        options.keywords.as_str()
    };
    let image = absolute_image(site);

    let mut tags = format!(
        r##"
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <meta name="description" content="{description}">
  <meta name="keywords" content="{keywords}">
  <meta name="robots" content="{robots}">
  <meta name="author" content="{author}">
  <meta name="theme-color" content="#1a73e8">"##,
        description = attr(&options.description),
        keywords = attr(keywords),
        robots = options.robots,
        author = attr(&site.name),
    );

    if let Some(ref canonical) = options.canonical {
        if !canonical.is_empty() {
            tags.push_str(&format!(
                "\n  <link rel=\"canonical\" href=\"{}\">",
                attr(canonical)
            ));
        }
    }

    tags.push_str(&format!(
        r#"
  <meta property="og:type" content="{og_type}">
  <meta property="og:title" content="{title}">
  <meta property="og:description" content="{description}">
  <meta property="og:image" content="{image}">
  <meta property="og:url" content="{url}">
  <meta property="og:site_name" content="{site_name}">
  <meta name="twitter:card" content="summary_large_image">
  <meta name="twitter:title" content="{title}">
  <meta name="twitter:description" content="{description}">
  <meta name="twitter:image" content="{image}">"#,
        og_type = options.og_type,
        title = attr(title),
        description = attr(&options.description),
        image = attr(&image),
        url = attr(&options.url),
        site_name = attr(&site.name),
    ));

    if let Some(ref handle) = site.twitter_handle {
        tags.push_str(&format!(
            "\n  <meta name=\"twitter:site\" content=\"{}\">",
            attr(handle)
        ));
    }

    if options.structured_data == StructuredData::WebSite {
        tags.push_str("\n  ");
        tags.push_str(&website_schema(site));
    }

    tags
}

fn absolute_image(site: &SiteConfig) -> String {
    if site.image.starts_with("http") {
        site.image.clone()
    } else {
        format!("{}{}", site.url.trim_end_matches('/'), site.image)
    }
}

fn website_schema(site: &SiteConfig) -> String {
    let site_url = site.url.trim_end_matches('/');
    let schema = json!({
        "@context": "https://schema.org",
        "@type": "WebSite",
        "name": site.name,
        "url": site_url,
        "description": site.description,
        "potentialAction": {
            "@type": "SearchAction",
            "target": {
                "@type": "EntryPoint",
                "urlTemplate": format!("{}/search/{{search_term_string}}", site_url),
            },
            "query-input": "required name=search_term_string",
        },
    });

    format!(
        "<script type=\"application/ld+json\">{}</script>",
        json_for_script(&schema)
    )
}
