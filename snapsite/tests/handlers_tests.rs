use snapsite::handlers::*;
use std::path::PathBuf;

#[test]
fn test_parse_seed_url_with_scheme() {
    let result = parse_seed_url("https://example.com");
    assert_eq!(result, Ok("https://example.com".to_string()));
}

#[test]
fn test_parse_seed_url_without_scheme() {
    let result = parse_seed_url("example.com/start");
    assert_eq!(result, Ok("https://example.com/start".to_string()));
}

#[test]
fn test_parse_seed_url_trims_whitespace() {
    let result = parse_seed_url("  http://example.com  ");
    assert_eq!(result, Ok("http://example.com".to_string()));
}

#[test]
fn test_parse_seed_url_rejects_garbage() {
    assert!(parse_seed_url("not a valid url!!!").is_err());
    assert!(parse_seed_url("").is_err());
}

#[test]
fn test_parse_seed_url_rejects_non_http_schemes() {
    assert!(parse_seed_url("ftp://example.com/files").is_err());
    assert!(parse_seed_url("file:///etc/hosts").is_err());
}

#[test]
fn test_resolve_output_dir_prefers_explicit_argument() {
    let arg = "my_backup".to_string();
    let dir = resolve_output_dir(Some(&arg), "https://example.com/");
    assert_eq!(dir, PathBuf::from("my_backup"));
}

#[test]
fn test_resolve_output_dir_defaults_from_seed_host() {
    let dir = resolve_output_dir(None, "https://www.example.com/");
    assert_eq!(dir, PathBuf::from("example_com"));
}

#[test]
fn test_resolve_output_dir_expands_tilde() {
    let arg = "~/mirrors/example".to_string();
    let dir = resolve_output_dir(Some(&arg), "https://example.com/");
    assert!(!dir.to_string_lossy().starts_with('~'));
}
