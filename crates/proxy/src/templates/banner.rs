//! Download banner injected into proxied detail pages.

use html_escape::encode_double_quoted_attribute;

use super::BANNER_CSS;

/// Fixed-position bar linking to `{origin}/crx/{id}`
pub fn render_banner(origin: &str, item_id: &str) -> String {
    let href = format!("{}/crx/{}", origin, urlencoding::encode(item_id));
    format!(
        r#"
  <div id="mirror-banner">
    <style>{css}</style>
    <div class="info">
      <span>📦</span>
      <span>Download this extension or theme safely</span>
    </div>
    <a href="{href}" class="download-btn">
      <span>⬇️</span>
      <span>Download CRX</span>
    </a>
  </div>
  "#,
        css = BANNER_CSS,
        href = encode_double_quoted_attribute(&href),
    )
}
