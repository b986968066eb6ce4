//! HTML templates for locally generated pages.
//!
//! Stylesheets and the search script are embedded at compile time. Every
//! value interpolated into markup goes through `html-escape`; values
//! embedded in inline scripts go through [`json_for_script`].

use serde::Serialize;
use tracing::warn;

pub mod banner;
pub mod base;
pub mod error;
pub mod search;
pub mod seo;

pub use banner::render_banner;
pub use base::{render_page, Page};
pub use error::{render_error_page, render_not_found};
pub use search::render_search_page;
pub use seo::{page_title, render_seo, SeoOptions, StructuredData};

const BASE_CSS: &str = include_str!("../../assets/base.css");
const SEARCH_CSS: &str = include_str!("../../assets/search.css");
const ERROR_CSS: &str = include_str!("../../assets/error.css");
const BANNER_CSS: &str = include_str!("../../assets/banner.css");
const SEARCH_JS: &str = include_str!("../../assets/search.js");

/// Page family, selecting the inline stylesheet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageType {
    Base,
    Search,
    Error,
}

impl PageType {
    /// Shared styles followed by the page-specific ones
    pub fn styles(&self) -> String {
        let extra = match self {
            PageType::Base => "",
            PageType::Search => SEARCH_CSS,
            PageType::Error => ERROR_CSS,
        };
        format!("{}\n{}", BASE_CSS, extra)
    }
}

/// Serialize `value` for embedding inside a `<script>` element.
///
/// `</` is escaped so the data cannot close the surrounding element.
pub fn json_for_script<T: Serialize + ?Sized>(value: &T) -> String {
    match serde_json::to_string(value) {
        Ok(json) => json.replace("</", "<\\/"),
        Err(e) => {
            warn!(error = %e, "Failed to serialize inline script data");
            "null".to_string()
        }
    }
}
