//! Best-effort extraction helpers over parsed HTML.
//!
//! The forum's markup is semi-stable at best, so every helper here treats a
//! missing element or attribute as a normal case and yields an empty value
//! instead of an error. Callers decide which absences matter.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use scraper::{ElementRef, Html, Selector};

static IMG_SRC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(<img\b[^>]*?\bsrc\s*=\s*["'])([^"']*)(["'])"#)
        .expect("img src pattern is valid")
});

/// Compile a selector from a literal known to be valid.
pub(crate) fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector is valid")
}

/// First element matching `css` under `root`, if any.
pub(crate) fn first<'a>(root: &ElementRef<'a>, css: &Selector) -> Option<ElementRef<'a>> {
    root.select(css).next()
}

/// Trimmed text content of the first match, or `""`.
pub(crate) fn first_text(root: &ElementRef<'_>, css: &Selector) -> String {
    first(root, css)
        .map(|el| collect_text(&el))
        .unwrap_or_default()
}

/// Attribute of the first match, or `""`.
pub(crate) fn first_attr(root: &ElementRef<'_>, css: &Selector, name: &str) -> String {
    first(root, css)
        .and_then(|el| el.value().attr(name))
        .unwrap_or_default()
        .to_string()
}

/// All text under an element, whitespace-trimmed at the edges.
pub(crate) fn collect_text(el: &ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Whether an element carries `class_name` in its `class` attribute.
pub(crate) fn has_class(el: &ElementRef<'_>, class_name: &str) -> bool {
    el.value()
        .attr("class")
        .map(|classes| classes.split_whitespace().any(|c| c == class_name))
        .unwrap_or(false)
}

/// Parse a full document. Thin wrapper so parser modules do not need to
/// depend on `scraper` types directly for the common case.
pub(crate) fn parse_document(html: &str) -> Html {
    Html::parse_document(html)
}

/// Resolve a scraped URL against the forum origin.
///
/// Absolute URLs pass through unchanged, site-rooted ones get the origin
/// prefixed, and anything else is joined with a single slash. Empty input
/// stays empty: there is no URL to resolve.
#[must_use]
pub fn absolute_url(origin: &str, raw: &str) -> String {
    if raw.is_empty() {
        String::new()
    } else if raw.starts_with("http") {
        raw.to_string()
    } else if raw.starts_with('/') {
        format!("{origin}{raw}")
    } else {
        format!("{origin}/{raw}")
    }
}

/// Rewrite every `<img src=…>` in a markup fragment to its absolute form,
/// so serialized comment bodies render without any base-URL context.
#[must_use]
pub fn rewrite_img_sources(origin: &str, html: &str) -> String {
    IMG_SRC_RE
        .replace_all(html, |caps: &Captures<'_>| {
            format!("{}{}{}", &caps[1], absolute_url(origin, &caps[2]), &caps[3])
        })
        .into_owned()
}
