//! Search page. Filtering runs in the browser over the embedded catalog.

use serde::Serialize;

use mirror_common::{CatalogItem, ItemId};
use mirror_config::SiteConfig;

use super::base::{render_page, Page};
use super::seo::SeoOptions;
use super::{json_for_script, PageType, SEARCH_JS};

const SEARCH_CONTENT: &str = r#"
    <section class="search-container" role="search" aria-label="Extension search">
      <input type="text" id="search-input" placeholder="Search extensions and themes..." aria-label="Search extensions and themes">
      <div class="search-icon" aria-hidden="true">🔍</div>
    </section>

    <section id="results" role="region" aria-live="polite" aria-label="Search results"></section>
  "#;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchData<'a> {
    items: Vec<SearchEntry<'a>>,
    initial_query: &'a str,
    max_results: usize,
}

/// The only item fields the browser needs
#[derive(Serialize)]
struct SearchEntry<'a> {
    id: &'a ItemId,
    name: &'a str,
}

/// Render the search page with the catalog embedded for client-side filtering
pub fn render_search_page(
    site: &SiteConfig,
    items: &[CatalogItem],
    initial_query: &str,
    max_results: usize,
    current_url: &str,
) -> String {
    let data = SearchData {
        items: items
            .iter()
            .map(|item| SearchEntry {
                id: &item.id,
                name: &item.name,
            })
            .collect(),
        initial_query,
        max_results,
    };
    let script = format!(
        "const MIRROR_SEARCH = {};\n{}",
        json_for_script(&data),
        SEARCH_JS
    );

    let (title, description, keywords) = if initial_query.is_empty() {
        (
            "Browse Chrome Extensions & Themes".to_string(),
            "Search and browse thousands of Chrome extensions and themes safely. \
             Download .crx files from our secure Chrome Web Store mirror."
                .to_string(),
            site.keywords.clone(),
        )
    } else {
        (
            format!("Search: {}", initial_query),
            format!(
                "Search results for \"{}\" - Browse Chrome extensions and themes safely",
                initial_query
            ),
            format!(
                "{}, chrome extensions, browser extensions, {}",
                initial_query, site.keywords
            ),
        )
    };

    let mut seo = SeoOptions::for_site(site, current_url);
    seo.description = description;
    seo.keywords = keywords;

    render_page(
        site,
        &Page {
            title: &title,
            content: SEARCH_CONTENT,
            page_type: PageType::Search,
            script: Some(&script),
            seo,
        },
    )
}
