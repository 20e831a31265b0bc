//! Link discovery inside downloaded HTML and CSS.
//!
//! Returns raw link strings in document order, exactly as written. The
//! frontier handles dedup, the normalizer handles resolution. Malformed
//! markup is best-effort: the HTML parser recovers on its own and the CSS
//! scanner skips unterminated constructs.

use crate::result::ResourceKind;
use scraper::{Html, Selector};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredLink {
    pub raw: String,
    pub kind: ResourceKind,
}

impl DiscoveredLink {
    fn page(raw: &str) -> Self {
        Self {
            raw: raw.to_string(),
            kind: ResourceKind::Page,
        }
    }

    fn asset(raw: &str) -> Self {
        Self {
            raw: raw.to_string(),
            kind: ResourceKind::Asset,
        }
    }
}

/// Scan an HTML document for every link-bearing construct: anchors,
/// `<link>` targets, image/script/media sources, srcset candidates,
/// iframes, inline `style` attributes and `<style>` blocks.
pub fn extract_html_links(html: &str) -> Vec<DiscoveredLink> {
    let document = Html::parse_document(html);
    let mut links = Vec::new();

    let anchors = Selector::parse("a[href]").unwrap();
    for element in document.select(&anchors) {
        if let Some(href) = element.value().attr("href") {
            links.push(DiscoveredLink::page(href));
        }
    }

    let link_tags = Selector::parse("link[href]").unwrap();
    for element in document.select(&link_tags) {
        if let Some(href) = element.value().attr("href") {
            links.push(DiscoveredLink::asset(href));
        }
    }

    let src_selectors = [
        "img[src]",
        "script[src]",
        "video[src]",
        "audio[src]",
        "source[src]",
        "iframe[src]",
        "embed[src]",
    ];
    for selector in src_selectors {
        let sel = Selector::parse(selector).unwrap();
        for element in document.select(&sel) {
            if let Some(src) = element.value().attr("src") {
                links.push(DiscoveredLink::asset(src));
            }
        }
    }

    let srcsets = Selector::parse("img[srcset], source[srcset]").unwrap();
    for element in document.select(&srcsets) {
        if let Some(srcset) = element.value().attr("srcset") {
            for candidate in srcset_candidates(srcset) {
                links.push(DiscoveredLink::asset(&candidate));
            }
        }
    }

    let styled = Selector::parse("[style]").unwrap();
    for element in document.select(&styled) {
        if let Some(style) = element.value().attr("style") {
            for url in css_urls(style) {
                links.push(DiscoveredLink::asset(&url));
            }
        }
    }

    let style_blocks = Selector::parse("style").unwrap();
    for element in document.select(&style_blocks) {
        let css: String = element.text().collect();
        for url in css_urls(&css) {
            links.push(DiscoveredLink::asset(&url));
        }
    }

    links
}

/// Scan a CSS stylesheet for `url(...)` references and quoted `@import`
/// targets (nested imports included, since imported sheets are crawled
/// and scanned in turn).
pub fn extract_css_links(css: &str) -> Vec<DiscoveredLink> {
    css_urls(css)
        .into_iter()
        .map(|raw| DiscoveredLink {
            raw,
            kind: ResourceKind::Asset,
        })
        .collect()
}

/// Each srcset candidate is a URL optionally followed by a width or
/// density descriptor.
fn srcset_candidates(srcset: &str) -> Vec<String> {
    srcset
        .split(',')
        .filter_map(|candidate| {
            let url = candidate.trim().split_whitespace().next()?;
            if url.is_empty() {
                None
            } else {
                Some(url.to_string())
            }
        })
        .collect()
}

/// Pull every `url(...)` value (single-, double-, or unquoted) and every
/// quoted `@import` target out of a CSS fragment, in order.
pub fn css_urls(css: &str) -> Vec<String> {
    let mut out = Vec::new();
    // Case-insensitive scan; ASCII lowercasing keeps byte offsets aligned.
    let lower = css.to_ascii_lowercase();

    let mut from = 0;
    while let Some(rel) = lower[from..].find("url(") {
        let start = from + rel + 4;
        let Some((value, consumed)) = read_url_value(&css[start..]) else {
            break;
        };
        if !value.is_empty() {
            out.push(value);
        }
        from = start + consumed;
    }

    // @import "..." and @import '...'; the url() form is caught above.
    let mut from = 0;
    while let Some(rel) = lower[from..].find("@import") {
        let start = from + rel + "@import".len();
        let rest = css[start..].trim_start();
        if let Some(quote) = rest.chars().next()
            && (quote == '"' || quote == '\'')
            && let Some(end) = rest[1..].find(quote)
        {
            let value = rest[1..1 + end].trim();
            if !value.is_empty() {
                out.push(value.to_string());
            }
        }
        from = start;
    }

    out
}

/// Parse the value of a `url(` construct, starting just past the opening
/// paren. Returns the value and the number of bytes consumed, or None if
/// the construct never closes.
fn read_url_value(s: &str) -> Option<(String, usize)> {
    let trimmed = s.trim_start();
    let offset = s.len() - trimmed.len();
    match trimmed.chars().next() {
        Some(quote @ ('"' | '\'')) => {
            let end = trimmed[1..].find(quote)?;
            let value = trimmed[1..1 + end].trim().to_string();
            Some((value, offset + end + 2))
        }
        Some(_) => {
            let end = trimmed.find(')')?;
            let value = trimmed[..end].trim().to_string();
            Some((value, offset + end + 1))
        }
        None => None,
    }
}
