//! Rewriting persisted HTML/CSS so same-domain references point at their
//! local files, relative to the document doing the referencing.
//!
//! Only URLs present in the mapping table (i.e. actually mirrored) are
//! touched; external links keep their absolute remote form. Already-relative
//! output is not a mapping key, so running the rewriter twice is a no-op.

use crate::extract::{self, DiscoveredLink};
use crate::norm;
use std::collections::{HashMap, HashSet};
use std::path::{Component, Path, PathBuf};
use url::Url;

/// Rewrite every mirrored reference in an HTML document. `page_path` is the
/// document's own local file; `mappings` is normalized URL -> local path.
pub fn rewrite_html(
    html: &str,
    page_url: &Url,
    page_path: &Path,
    mappings: &HashMap<String, PathBuf>,
) -> String {
    let links = extract::extract_html_links(html);
    rewrite_links(html, links, page_url, page_path, mappings)
}

/// Rewrite `url(...)` and `@import` references in a stylesheet.
pub fn rewrite_css(
    css: &str,
    sheet_url: &Url,
    sheet_path: &Path,
    mappings: &HashMap<String, PathBuf>,
) -> String {
    let links = extract::extract_css_links(css);
    rewrite_links(css, links, sheet_url, sheet_path, mappings)
}

fn rewrite_links(
    content: &str,
    links: Vec<DiscoveredLink>,
    base_url: &Url,
    base_path: &Path,
    mappings: &HashMap<String, PathBuf>,
) -> String {
    let mut seen = HashSet::new();
    let mut out = content.to_string();
    for link in links {
        if !seen.insert(link.raw.clone()) || norm::is_unfetchable(&link.raw) {
            continue;
        }
        let Ok(absolute) = norm::normalize(&link.raw, base_url) else {
            continue;
        };
        let Some(target) = mappings.get(absolute.as_str()) else {
            continue;
        };
        let replacement = relative_href(base_path, target);
        if replacement != link.raw {
            out = replace_link(&out, &link.raw, &replacement);
        }
    }
    out
}

/// Relative path from one local file to another, `/`-separated regardless
/// of platform so it is valid inside HTML.
pub fn relative_href(from_file: &Path, to_file: &Path) -> String {
    let from_dir: Vec<Component> = from_file
        .parent()
        .map(|p| p.components().collect())
        .unwrap_or_default();
    let to_parts: Vec<Component> = to_file.components().collect();

    let mut shared = 0;
    while shared < from_dir.len()
        && shared < to_parts.len()
        && from_dir[shared] == to_parts[shared]
    {
        shared += 1;
    }

    let mut parts: Vec<String> = vec!["..".to_string(); from_dir.len() - shared];
    for part in &to_parts[shared..] {
        parts.push(part.as_os_str().to_string_lossy().into_owned());
    }
    if parts.is_empty() {
        to_file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    } else {
        parts.join("/")
    }
}

/// Replace every occurrence of a raw link with its local form, in the
/// quoting contexts links legitimately appear in: double-quoted,
/// single-quoted, parenthesized (CSS `url(...)`), and unquoted attribute
/// values. The scan does not track markup structure, so a mirrored URL
/// quoted verbatim in body text is rewritten along with the attributes.
fn replace_link(content: &str, raw: &str, replacement: &str) -> String {
    let mut out = content.to_string();
    let patterns = [
        (format!("\"{}\"", raw), format!("\"{}\"", replacement)),
        (format!("'{}'", raw), format!("'{}'", replacement)),
        (format!("({})", raw), format!("({})", replacement)),
    ];
    for (pattern, local) in &patterns {
        out = out.replace(pattern, local);
    }
    replace_unquoted_attr(&out, raw, replacement)
}

/// Handle `attr=value` with no quotes: the value runs until whitespace or
/// `>`. The replacement is emitted quoted.
fn replace_unquoted_attr(content: &str, raw: &str, replacement: &str) -> String {
    let needle = format!("={}", raw);
    let mut out = String::with_capacity(content.len());
    let mut rest = content;
    while let Some(pos) = rest.find(&needle) {
        let after = pos + needle.len();
        let delimited = match rest[after..].chars().next() {
            None => true,
            Some(c) => c.is_ascii_whitespace() || c == '>',
        };
        if delimited {
            out.push_str(&rest[..pos]);
            out.push_str("=\"");
            out.push_str(replacement);
            out.push('"');
            rest = &rest[after..];
        } else {
            out.push_str(&rest[..pos + 1]);
            rest = &rest[pos + 1..];
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mappings(entries: &[(&str, &str)]) -> HashMap<String, PathBuf> {
        entries
            .iter()
            .map(|(url, path)| (url.to_string(), PathBuf::from(path)))
            .collect()
    }

    #[test]
    fn relative_href_within_same_directory() {
        assert_eq!(
            relative_href(
                Path::new("out/example.com/index.html"),
                Path::new("out/example.com/logo.png")
            ),
            "logo.png"
        );
    }

    #[test]
    fn relative_href_descends_and_climbs() {
        assert_eq!(
            relative_href(
                Path::new("out/example.com/index.html"),
                Path::new("out/example.com/about/index.html")
            ),
            "about/index.html"
        );
        assert_eq!(
            relative_href(
                Path::new("out/example.com/blog/post/index.html"),
                Path::new("out/example.com/css/site.css")
            ),
            "../../css/site.css"
        );
    }

    #[test]
    fn rewrites_same_domain_links_and_leaves_externals() {
        let html = r#"<a href="/about">About</a>
<img src="logo.png">
<a href="https://external.com/x">Elsewhere</a>"#;
        let page_url = Url::parse("https://example.com/").unwrap();
        let page_path = Path::new("out/example.com/index.html");
        let map = mappings(&[
            ("https://example.com/about", "out/example.com/about/index.html"),
            ("https://example.com/logo.png", "out/example.com/logo.png"),
        ]);

        let rewritten = rewrite_html(html, &page_url, page_path, &map);
        assert!(rewritten.contains(r#"href="about/index.html""#));
        assert!(rewritten.contains(r#"src="logo.png""#));
        assert!(rewritten.contains(r#"href="https://external.com/x""#));
    }

    #[test]
    fn rewriting_is_idempotent() {
        let html = r#"<a href="/about">x</a><link href='/css/site.css'><img src=/logo.png>"#;
        let page_url = Url::parse("https://example.com/").unwrap();
        let page_path = Path::new("out/example.com/index.html");
        let map = mappings(&[
            ("https://example.com/about", "out/example.com/about/index.html"),
            ("https://example.com/css/site.css", "out/example.com/css/site.css"),
            ("https://example.com/logo.png", "out/example.com/logo.png"),
        ]);

        let once = rewrite_html(html, &page_url, page_path, &map);
        let twice = rewrite_html(&once, &page_url, page_path, &map);
        assert_eq!(once, twice);
        assert!(once.contains(r#"src="logo.png""#));
    }

    #[test]
    fn unmapped_links_are_untouched() {
        let html = r#"<a href="/missing">gone</a>"#;
        let page_url = Url::parse("https://example.com/").unwrap();
        let rewritten = rewrite_html(
            html,
            &page_url,
            Path::new("out/example.com/index.html"),
            &HashMap::new(),
        );
        assert_eq!(rewritten, html);
    }

    #[test]
    fn css_url_references_are_rewritten() {
        let css = ".hero { background: url('/img/hero.jpg'); }\n@import \"/css/base.css\";";
        let sheet_url = Url::parse("https://example.com/css/site.css").unwrap();
        let sheet_path = Path::new("out/example.com/css/site.css");
        let map = mappings(&[
            ("https://example.com/img/hero.jpg", "out/example.com/img/hero.jpg"),
            ("https://example.com/css/base.css", "out/example.com/css/base.css"),
        ]);

        let rewritten = rewrite_css(css, &sheet_url, sheet_path, &map);
        assert!(rewritten.contains("url('../img/hero.jpg')"));
        assert!(rewritten.contains("\"base.css\""));
    }

    #[test]
    fn query_bearing_links_map_to_their_own_files() {
        let html = r#"<a href="/search?q=rust">rust</a><a href="/search?q=go">go</a>"#;
        let page_url = Url::parse("https://example.com/").unwrap();
        let page_path = Path::new("out/example.com/index.html");
        let map = mappings(&[
            (
                "https://example.com/search?q=rust",
                "out/example.com/search/index@q=rust.html",
            ),
            (
                "https://example.com/search?q=go",
                "out/example.com/search/index@q=go.html",
            ),
        ]);

        let rewritten = rewrite_html(html, &page_url, page_path, &map);
        assert!(rewritten.contains(r#"href="search/index@q=rust.html""#));
        assert!(rewritten.contains(r#"href="search/index@q=go.html""#));
    }
}
