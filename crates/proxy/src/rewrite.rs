//! URL rewriting for mirrored content.
//!
//! Rewriting is pattern based. Two passes run in a fixed order:
//!
//! 1. every literal occurrence of the upstream origin becomes the mirror origin
//! 2. root-relative `href`, `src` and `action` attribute values are prefixed
//!    with the mirror origin, keeping the original quote character
//!
//! Protocol-relative (`//host/...`) and absolute attribute values are left
//! alone, which makes rewriting already-rewritten content a no-op.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use url::Url;

use mirror_common::RewriteContext;

/// `href="/..."`, `src='/...'`, `action="/"`; never `//`
static ROOT_RELATIVE_ATTR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(href|src|action)=(?:"(/(?:[^/"\r\n][^"\r\n]*)?)"|'(/(?:[^/'\r\n][^'\r\n]*)?)')"#,
    )
    .expect("attribute pattern is valid")
});

/// Rewrite upstream references in a text body so they point at the mirror.
pub fn rewrite_urls(content: &str, ctx: &RewriteContext) -> String {
    let content = if ctx.source_origin.is_empty() {
        content.to_string()
    } else {
        content.replace(&ctx.source_origin, &ctx.target_origin)
    };

    ROOT_RELATIVE_ATTR
        .replace_all(&content, |caps: &Captures<'_>| {
            let attr = &caps[1];
            match (caps.get(2), caps.get(3)) {
                (Some(path), _) => format!("{}=\"{}{}\"", attr, ctx.target_origin, path.as_str()),
                (None, Some(path)) => format!("{}='{}{}'", attr, ctx.target_origin, path.as_str()),
                (None, None) => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Translate an upstream redirect `Location` into one that stays on the mirror.
///
/// - upstream locations keep their path and query under `worker_origin`
/// - other absolute URLs are returned unchanged
/// - relative locations are resolved against `worker_origin`; a
///   protocol-relative `//host/x` is treated as a path and stays on the mirror
pub fn rewrite_redirect_location(location: &str, source_base: &str, worker_origin: &str) -> String {
    let source_base = source_base.trim_end_matches('/');

    if !source_base.is_empty() {
        if let Some(rest) = location.strip_prefix(source_base) {
            // Only a full origin match counts: `https://host.evil` must not
            // match `https://host`
            if rest.is_empty() || rest.starts_with(['/', '?', '#']) {
                let path = match Url::parse(location) {
                    Ok(url) => match url.query() {
                        Some(query) => format!("{}?{}", url.path(), query),
                        None => url.path().to_string(),
                    },
                    Err(_) => rest.to_string(),
                };
                return format!("{}{}", worker_origin, path);
            }
        }
    }

    if Url::parse(location).is_ok() {
        return location.to_string();
    }

    if location.starts_with('/') {
        format!("{}{}", worker_origin, location)
    } else {
        format!("{}/{}", worker_origin, location)
    }
}
