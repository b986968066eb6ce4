//! Error pages.

use html_escape::encode_text;
use http::StatusCode;

use mirror_config::SiteConfig;

use super::base::{render_page, Page};
use super::seo::SeoOptions;
use super::PageType;

/// Render the 404 page, echoing the requested path
pub fn render_not_found(site: &SiteConfig, requested_path: &str, current_url: &str) -> String {
    let path = if requested_path.is_empty() {
        String::new()
    } else {
        format!(
            "<div class=\"error-path\">{}</div>",
            encode_text(requested_path)
        )
    };

    let content = format!(
        r#"
    <div style="text-align: center;">
      <div class="error-icon" aria-hidden="true">🔍</div>
      <h2 class="error-code">404</h2>
      <h3 class="error-title">Page Not Found</h3>
      <p class="error-description">
        Sorry, the page you are looking for could not be found. It might have been moved, deleted, or you entered the wrong URL.
      </p>
      {path}
      <div class="actions">
        <a href="/" class="btn btn-primary">🏠 Go to Home</a>
      </div>
    </div>
  "#
    );

    render_page(
        site,
        &Page {
            title: "404 - Page Not Found",
            content: &content,
            page_type: PageType::Error,
            script: None,
            seo: SeoOptions::noindex(format!("Page not found - {}", site.name), current_url),
        },
    )
}

/// Render a generic error page
pub fn render_error_page(
    site: &SiteConfig,
    status: StatusCode,
    message: &str,
    details: &str,
    current_url: &str,
) -> String {
    let reason = status.canonical_reason().unwrap_or("Error");
    let message = if message.is_empty() {
        String::new()
    } else {
        format!("<p class=\"error-description\">{}</p>", encode_text(message))
    };
    let details = if details.is_empty() {
        String::new()
    } else {
        format!("<div class=\"error-path\">{}</div>", encode_text(details))
    };

    let content = format!(
        r#"
    <div style="text-align: center;">
      <div class="error-icon" aria-hidden="true">⚠️</div>
      <h2 class="error-code">{code}</h2>
      <h3 class="error-title">{reason}</h3>
      {message}
      {details}
      <div class="actions">
        <a href="/" class="btn btn-primary">🏠 Go to Home</a>
        <a href="javascript:location.reload()" class="btn btn-secondary">🔄 Try Again</a>
      </div>
    </div>
  "#,
        code = status.as_u16(),
    );

    let title = format!("{} - {}", status.as_u16(), reason);
    render_page(
        site,
        &Page {
            title: &title,
            content: &content,
            page_type: PageType::Error,
            script: None,
            seo: SeoOptions::noindex(
                format!("{} error - {}", status.as_u16(), site.name),
                current_url,
            ),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_echoes_escaped_path() {
        let site = SiteConfig::default();
        let html = render_not_found(&site, "/<img src=x>", "https://m.example/x");

        assert!(html.contains("<div class=\"error-path\">/&lt;img src=x&gt;</div>"));
        assert!(html.contains("noindex, nofollow"));
        assert!(html.contains("404 - Page Not Found"));
    }

    #[test]
    fn test_error_page() {
        let site = SiteConfig::default();
        let html = render_error_page(
            &site,
            StatusCode::METHOD_NOT_ALLOWED,
            "Only GET and HEAD are supported",
            "POST /search",
            "https://m.example/search",
        );

        assert!(html.contains("<h2 class=\"error-code\">405</h2>"));
        assert!(html.contains("Method Not Allowed"));
        assert!(html.contains("Only GET and HEAD are supported"));
        assert!(html.contains("POST /search"));
    }
}
