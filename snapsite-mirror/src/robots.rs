//! robots.txt fetching and evaluation, cached per host for the run.
//!
//! Best-effort: if robots.txt cannot be fetched or returns a non-success
//! status, the host is treated as unrestricted.

use reqwest::Client;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use url::Url;

#[derive(Debug, Clone)]
struct Rule {
    allow: bool,
    prefix: String,
}

/// Parsed allow/disallow rules for one host.
#[derive(Debug, Clone, Default)]
pub struct RobotsPolicy {
    rules: Vec<Rule>,
}

impl RobotsPolicy {
    /// A policy with no restrictions.
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// Parse a robots.txt body, keeping rules from groups that apply to
    /// `*` or to the given user-agent token.
    pub fn parse(body: &str, user_agent: &str) -> Self {
        let ua_lower = user_agent.to_ascii_lowercase();
        let mut rules = Vec::new();
        let mut applies = false;
        let mut last_was_agent = false;

        for line in body.lines() {
            let line = line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            let Some((field, value)) = line.split_once(':') else {
                continue;
            };
            let field = field.trim().to_ascii_lowercase();
            let value = value.trim();

            match field.as_str() {
                "user-agent" => {
                    // Consecutive user-agent lines stack onto one group.
                    if !last_was_agent {
                        applies = false;
                    }
                    let token = value.to_ascii_lowercase();
                    if token == "*" || (!token.is_empty() && ua_lower.contains(&token)) {
                        applies = true;
                    }
                    last_was_agent = true;
                }
                "allow" | "disallow" => {
                    last_was_agent = false;
                    if !applies || value.is_empty() {
                        // An empty Disallow means "allow everything".
                        continue;
                    }
                    let mut prefix = value.to_string();
                    if !prefix.starts_with('/') {
                        prefix.insert(0, '/');
                    }
                    rules.push(Rule {
                        allow: field == "allow",
                        prefix,
                    });
                }
                _ => {
                    last_was_agent = false;
                }
            }
        }

        Self { rules }
    }

    /// Evaluate a URL path against the rules: longest matching prefix wins,
    /// `Allow` beats `Disallow` on equal length, no match means allowed.
    pub fn is_allowed(&self, url: &Url) -> bool {
        let path = url.path();
        let mut verdict = true;
        let mut best_len = 0;
        for rule in &self.rules {
            if path.starts_with(rule.prefix.as_str()) {
                let len = rule.prefix.len();
                if len > best_len || (len == best_len && rule.allow) {
                    best_len = len;
                    verdict = rule.allow;
                }
            }
        }
        verdict
    }
}

/// Per-host robots.txt cache. One network fetch per host per run.
#[derive(Default)]
pub struct RobotsCache {
    policies: Mutex<HashMap<String, Arc<RobotsPolicy>>>,
}

impl RobotsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether the URL may be fetched, loading the host's robots.txt
    /// on first encounter.
    pub async fn is_allowed(&self, client: &Client, url: &Url, user_agent: &str) -> bool {
        let Some(host) = url.host_str() else {
            return true;
        };
        let key = match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };

        let policy = {
            let mut policies = self.policies.lock().await;
            match policies.get(&key) {
                Some(policy) => policy.clone(),
                None => {
                    let policy = Arc::new(Self::load(client, url, user_agent).await);
                    policies.insert(key, policy.clone());
                    policy
                }
            }
        };

        policy.is_allowed(url)
    }

    async fn load(client: &Client, url: &Url, user_agent: &str) -> RobotsPolicy {
        let mut robots_url = url.clone();
        robots_url.set_path("/robots.txt");
        robots_url.set_query(None);

        match client.get(robots_url.clone()).send().await {
            Ok(response) if response.status().is_success() => match response.text().await {
                Ok(body) => {
                    debug!("loaded robots.txt from {}", robots_url);
                    RobotsPolicy::parse(&body, user_agent)
                }
                Err(e) => {
                    warn!("failed to read robots.txt body from {}: {}", robots_url, e);
                    RobotsPolicy::allow_all()
                }
            },
            Ok(response) => {
                debug!(
                    "robots.txt at {} returned {}, treating as unrestricted",
                    robots_url,
                    response.status()
                );
                RobotsPolicy::allow_all()
            }
            Err(e) => {
                debug!(
                    "could not fetch robots.txt from {}: {}, treating as unrestricted",
                    robots_url, e
                );
                RobotsPolicy::allow_all()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn empty_policy_allows_everything() {
        let policy = RobotsPolicy::allow_all();
        assert!(policy.is_allowed(&url("https://example.com/anything")));
    }

    #[test]
    fn disallow_prefix_blocks_subtree() {
        let policy = RobotsPolicy::parse("User-agent: *\nDisallow: /private/\n", "snapsite");
        assert!(!policy.is_allowed(&url("https://example.com/private/page")));
        assert!(policy.is_allowed(&url("https://example.com/public/page")));
    }

    #[test]
    fn allow_overrides_shorter_disallow() {
        let body = "User-agent: *\nDisallow: /docs/\nAllow: /docs/public/\n";
        let policy = RobotsPolicy::parse(body, "snapsite");
        assert!(!policy.is_allowed(&url("https://example.com/docs/internal")));
        assert!(policy.is_allowed(&url("https://example.com/docs/public/intro")));
    }

    #[test]
    fn rules_for_other_agents_are_ignored() {
        let body = "User-agent: badbot\nDisallow: /\n\nUser-agent: *\nDisallow: /tmp/\n";
        let policy = RobotsPolicy::parse(body, "snapsite");
        assert!(policy.is_allowed(&url("https://example.com/home")));
        assert!(!policy.is_allowed(&url("https://example.com/tmp/x")));
    }

    #[test]
    fn matching_agent_token_applies() {
        let body = "User-agent: snapsite\nDisallow: /secret/\n";
        let policy = RobotsPolicy::parse(body, "snapsite/0.2 (+https://example.org)");
        assert!(!policy.is_allowed(&url("https://example.com/secret/a")));
    }

    #[test]
    fn empty_disallow_means_unrestricted() {
        let policy = RobotsPolicy::parse("User-agent: *\nDisallow:\n", "snapsite");
        assert!(policy.is_allowed(&url("https://example.com/anything")));
    }

    #[test]
    fn comments_and_unknown_fields_are_skipped() {
        let body = "# mirror policy\nUser-agent: *\nCrawl-delay: 10\nDisallow: /cgi-bin/ # legacy\n";
        let policy = RobotsPolicy::parse(body, "snapsite");
        assert!(!policy.is_allowed(&url("https://example.com/cgi-bin/run")));
    }
}
