//! URL canonicalization and same-domain classification.

use crate::error::{MirrorError, Result};
use url::Url;

/// Which hosts count as in-domain relative to the seed host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DomainScope {
    /// Only the exact seed host.
    #[default]
    ExactHost,
    /// The seed host plus any subdomain of it, treating a leading `www.`
    /// on either side as equivalent.
    Subdomains,
}

/// Parse and validate a seed URL. Fatal on failure: a run cannot start
/// without a well-formed http(s) seed.
pub fn parse_seed(raw: &str) -> Result<Url> {
    let url =
        Url::parse(raw.trim()).map_err(|e| MirrorError::InvalidUrl(format!("{}: {}", raw, e)))?;
    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(MirrorError::InvalidUrl(format!(
                "unsupported scheme '{}' in {}",
                other, raw
            )));
        }
    }
    if url.host_str().is_none() {
        return Err(MirrorError::InvalidUrl(format!("{} has no host", raw)));
    }
    Ok(url)
}

/// True for link targets that can never be fetched over HTTP. These are
/// dropped before normalization rather than recorded as failures.
pub fn is_unfetchable(raw: &str) -> bool {
    let raw = raw.trim();
    raw.is_empty()
        || raw.starts_with('#')
        || has_scheme_prefix(raw, "javascript:")
        || has_scheme_prefix(raw, "mailto:")
        || has_scheme_prefix(raw, "tel:")
        || has_scheme_prefix(raw, "data:")
        || has_scheme_prefix(raw, "blob:")
}

fn has_scheme_prefix(raw: &str, scheme: &str) -> bool {
    raw.get(..scheme.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
}

/// Resolve a raw link against the page it appeared on and canonicalize it:
/// relative references resolved, fragment stripped, scheme/host lower-cased
/// and dot-segments collapsed by the url crate, query preserved verbatim.
/// Idempotent: normalizing an already-normalized URL returns it unchanged.
pub fn normalize(raw: &str, base: &Url) -> Result<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(MirrorError::InvalidUrl("empty link".to_string()));
    }
    let mut resolved = base
        .join(trimmed)
        .map_err(|e| MirrorError::InvalidUrl(format!("{}: {}", trimmed, e)))?;
    resolved.set_fragment(None);
    match resolved.scheme() {
        "http" | "https" => Ok(resolved),
        other => Err(MirrorError::InvalidUrl(format!(
            "unsupported scheme '{}' in {}",
            other, trimmed
        ))),
    }
}

/// Classify a normalized URL against the seed host under the configured
/// scope. Subdomains of the seed are external under `ExactHost`.
pub fn same_domain(url: &Url, seed_host: &str, scope: DomainScope) -> bool {
    let Some(host) = url.host_str() else {
        return false;
    };
    match scope {
        DomainScope::ExactHost => host == seed_host,
        DomainScope::Subdomains => {
            let root = seed_host.strip_prefix("www.").unwrap_or(seed_host);
            host == seed_host || host == root || host.ends_with(&format!(".{}", root))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com/blog/post.html").unwrap()
    }

    #[test]
    fn resolves_relative_references() {
        let url = normalize("../about", &base()).unwrap();
        assert_eq!(url.as_str(), "https://example.com/about");
    }

    #[test]
    fn resolves_root_relative_references() {
        let url = normalize("/contact", &base()).unwrap();
        assert_eq!(url.as_str(), "https://example.com/contact");
    }

    #[test]
    fn resolves_protocol_relative_references() {
        let url = normalize("//cdn.example.com/app.js", &base()).unwrap();
        assert_eq!(url.as_str(), "https://cdn.example.com/app.js");
    }

    #[test]
    fn strips_fragments_and_keeps_queries() {
        let url = normalize("/search?q=rust&page=2#results", &base()).unwrap();
        assert_eq!(url.as_str(), "https://example.com/search?q=rust&page=2");
    }

    #[test]
    fn lowercases_scheme_and_host() {
        let url = normalize("HTTPS://EXAMPLE.COM/Path", &base()).unwrap();
        assert_eq!(url.as_str(), "https://example.com/Path");
    }

    #[test]
    fn normalization_is_idempotent() {
        let once = normalize("/a/./b/../c?x=1", &base()).unwrap();
        let twice = normalize(once.as_str(), &base()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn rejects_non_http_schemes() {
        assert!(normalize("ftp://example.com/file", &base()).is_err());
    }

    #[test]
    fn unfetchable_schemes_are_detected() {
        assert!(is_unfetchable("mailto:me@example.com"));
        assert!(is_unfetchable("JavaScript:void(0)"));
        assert!(is_unfetchable("tel:+15551234"));
        assert!(is_unfetchable("data:image/png;base64,AAAA"));
        assert!(is_unfetchable("#top"));
        assert!(is_unfetchable("  "));
        assert!(!is_unfetchable("/about"));
        assert!(!is_unfetchable("//example.com/x"));
    }

    #[test]
    fn exact_host_excludes_subdomains() {
        let url = Url::parse("https://blog.example.com/").unwrap();
        assert!(!same_domain(&url, "example.com", DomainScope::ExactHost));
        assert!(same_domain(&url, "example.com", DomainScope::Subdomains));
    }

    #[test]
    fn subdomain_scope_treats_www_as_equivalent() {
        let bare = Url::parse("https://example.com/").unwrap();
        let www = Url::parse("https://www.example.com/").unwrap();
        assert!(same_domain(&bare, "www.example.com", DomainScope::Subdomains));
        assert!(same_domain(&www, "example.com", DomainScope::Subdomains));
        assert!(!same_domain(&bare, "www.example.com", DomainScope::ExactHost));
    }

    #[test]
    fn seed_must_be_http() {
        assert!(parse_seed("https://example.com/").is_ok());
        assert!(parse_seed("file:///etc/passwd").is_err());
        assert!(parse_seed("not a url").is_err());
    }
}
