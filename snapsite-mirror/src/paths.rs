//! Mapping remote URLs to local filesystem paths.
//!
//! The mirror is rooted per host and reproduces the URL path segments as
//! directories. The mapping is deterministic: the same URL always lands on
//! the same path, and URLs differing only by query string land on distinct
//! files.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use url::Url;

/// Longest allowed path component, in bytes. Anything longer is truncated
/// and suffixed with a hash of the original component.
const MAX_COMPONENT_BYTES: usize = 150;

/// Separator between a filename stem and its encoded query string.
const QUERY_SEPARATOR: char = '@';

/// Compute the local path for a normalized URL under the output root.
///
/// A URL ending in `/`, or whose last segment has no extension, maps to
/// `index.html` under that directory; `/faq` and `/faq/` therefore share
/// one target.
pub fn local_path(url: &Url, root: &Path) -> PathBuf {
    let host = url.host_str().unwrap_or("unknown-host");
    let host_dir = match url.port() {
        Some(port) => format!("{}_{}", host, port),
        None => host.to_string(),
    };
    let mut path = root.join(cap_component(sanitize(&host_dir)));

    let segments: Vec<&str> = url.path().split('/').filter(|s| !s.is_empty()).collect();
    let trailing_slash = url.path().ends_with('/');

    let (dirs, mut file): (&[&str], String) = if segments.is_empty() || trailing_slash {
        (&segments, "index.html".to_string())
    } else {
        let decoded_last = percent_decode(segments[segments.len() - 1]);
        if has_extension(&decoded_last) {
            (&segments[..segments.len() - 1], decoded_last)
        } else {
            (&segments, "index.html".to_string())
        }
    };

    for segment in dirs {
        path.push(cap_component(sanitize(&percent_decode(segment))));
    }

    if let Some(query) = url.query()
        && !query.is_empty()
    {
        file = attach_query(&file, query);
    }
    path.push(cap_component(sanitize(&file)));
    path
}

fn has_extension(name: &str) -> bool {
    match name.rsplit_once('.') {
        Some((stem, ext)) => !stem.is_empty() && !ext.is_empty(),
        None => false,
    }
}

/// `index.html` + `a=1` becomes `index@a=1.html`: the query stays part of
/// the filename, before the extension so the browser still sniffs the
/// right type.
fn attach_query(file: &str, query: &str) -> String {
    let encoded = encode_query(query);
    match file.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => {
            format!("{}{}{}.{}", stem, QUERY_SEPARATOR, encoded, ext)
        }
        _ => format!("{}{}{}", file, QUERY_SEPARATOR, encoded),
    }
}

/// Percent-encode anything outside a small safe set, `%` included, so
/// distinct queries always yield distinct filenames.
fn encode_query(query: &str) -> String {
    let mut out = String::with_capacity(query.len());
    for byte in query.bytes() {
        match byte {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'=' | b'&' | b'_' | b'-' | b'.' => {
                out.push(byte as char)
            }
            other => out.push_str(&format!("%{:02X}", other)),
        }
    }
    out
}

fn percent_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%'
            && i + 2 < bytes.len()
            && let (Some(hi), Some(lo)) = (hex_val(bytes[i + 1]), hex_val(bytes[i + 2]))
        {
            out.push(hi * 16 + lo);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_val(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// Replace filesystem-hostile characters with `_` and trim the dot/space
/// edges that Windows rejects.
fn sanitize(component: &str) -> String {
    let cleaned: String = component
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let trimmed = cleaned.trim_matches(['.', ' ']);
    if trimmed.is_empty() {
        "_".to_string()
    } else {
        trimmed.to_string()
    }
}

fn cap_component(component: String) -> String {
    if component.len() <= MAX_COMPONENT_BYTES {
        return component;
    }
    let mut hasher = DefaultHasher::new();
    component.hash(&mut hasher);
    let digest = hasher.finish();
    let mut cut = MAX_COMPONENT_BYTES - 17;
    while !component.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}-{:016x}", &component[..cut], digest)
}
