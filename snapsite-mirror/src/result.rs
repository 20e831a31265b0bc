use serde::{Deserialize, Serialize};
use std::fmt;

/// What a discovered link points at, from the perspective of the page that
/// referenced it. Anchors and `<link>` navigation targets are pages,
/// everything else (images, scripts, stylesheets, media, CSS references)
/// is an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceKind {
    Page,
    Asset,
}

/// Why a URL was skipped or could not be mirrored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureReason {
    InvalidUrl,
    RobotsDisallowed,
    HttpStatus(u16),
    Timeout,
    Connect,
    Request(String),
    Write(String),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::InvalidUrl => write!(f, "invalid URL"),
            FailureReason::RobotsDisallowed => write!(f, "disallowed by robots.txt"),
            FailureReason::HttpStatus(code) => write!(f, "HTTP {}", code),
            FailureReason::Timeout => write!(f, "request timed out"),
            FailureReason::Connect => write!(f, "connection failed"),
            FailureReason::Request(msg) => write!(f, "request error: {}", msg),
            FailureReason::Write(msg) => write!(f, "write error: {}", msg),
        }
    }
}

/// A URL that could not be mirrored, with the reason. Failures accumulate
/// into the run summary and never abort the crawl.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Failure {
    pub url: String,
    pub reason: FailureReason,
}

impl Failure {
    pub fn new(url: impl Into<String>, reason: FailureReason) -> Self {
        Self {
            url: url.into(),
            reason,
        }
    }
}

/// Final accounting for a mirror run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MirrorSummary {
    pub seed: String,
    pub output_dir: String,
    pub pages: usize,
    pub assets: usize,
    pub total_files: usize,
    pub total_bytes: u64,
    /// Off-domain URLs that were discovered but deliberately not fetched.
    pub externals: Vec<String>,
    pub failures: Vec<Failure>,
}

impl MirrorSummary {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }
}
