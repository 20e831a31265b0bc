//! The crawl orchestrator: a bounded pool of fetch workers draining a
//! shared frontier, persisting everything in-domain, then a final rewrite
//! pass over all saved HTML/CSS once the complete mapping table exists.
//! Per-URL problems become failure records; only startup problems abort.

use crate::error::{MirrorError, Result};
use crate::fetch::{Fetched, Fetcher};
use crate::frontier::{Frontier, FrontierEntry};
use crate::norm::{self, DomainScope};
use crate::paths;
use crate::result::{Failure, FailureReason, MirrorSummary};
use crate::rewrite;
use crate::robots::RobotsCache;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use url::Url;

pub type ProgressCallback = Arc<dyn Fn(usize, String) + Send + Sync>;

const DEFAULT_USER_AGENT: &str = "snapsite/0.2 (+https://github.com/trapdoorsec/snapsite)";

/// Which rewriter a persisted file needs in the final pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextKind {
    Html,
    Css,
}

struct PersistedText {
    url: Url,
    path: PathBuf,
    kind: TextKind,
}

/// Mutable crawl state, shared by all workers as one aggregate.
struct Shared {
    frontier: Mutex<Frontier>,
    mappings: Mutex<HashMap<String, PathBuf>>,
    texts: Mutex<Vec<PersistedText>>,
    failures: Mutex<Vec<Failure>>,
    externals: Mutex<HashSet<String>>,
    pages: AtomicUsize,
    assets: AtomicUsize,
    bytes: AtomicU64,
    busy: AtomicUsize,
    processed: AtomicUsize,
}

impl Shared {
    fn new() -> Self {
        Self {
            frontier: Mutex::new(Frontier::new()),
            mappings: Mutex::new(HashMap::new()),
            texts: Mutex::new(Vec::new()),
            failures: Mutex::new(Vec::new()),
            externals: Mutex::new(HashSet::new()),
            pages: AtomicUsize::new(0),
            assets: AtomicUsize::new(0),
            bytes: AtomicU64::new(0),
            busy: AtomicUsize::new(0),
            processed: AtomicUsize::new(0),
        }
    }

    async fn record_failure(&self, url: &str, reason: FailureReason) {
        debug!("recording failure for {}: {}", url, reason);
        self.failures.lock().await.push(Failure::new(url, reason));
    }
}

pub struct Mirror {
    output_dir: PathBuf,
    workers: usize,
    timeout: Duration,
    delay: Duration,
    user_agent: String,
    max_pages: Option<usize>,
    scope: DomainScope,
    progress_callback: Option<ProgressCallback>,
    cancel: Arc<AtomicBool>,
}

impl Mirror {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            workers: 4,
            timeout: Duration::from_secs(30),
            delay: Duration::ZERO,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_pages: None,
            scope: DomainScope::ExactHost,
            progress_callback: None,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_max_pages(mut self, max_pages: Option<usize>) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn with_domain_scope(mut self, scope: DomainScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Flag checked by the workers. Setting it stops new fetches; in-flight
    /// requests finish and the rewrite pass still runs over whatever was
    /// persisted.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        self.cancel.clone()
    }

    /// Mirror the site rooted at the seed URL. Fatal only for an unusable
    /// seed or output directory; every per-URL error ends up in the
    /// summary's failure list.
    pub async fn run(&self, seed: &str) -> Result<MirrorSummary> {
        let seed_url = norm::parse_seed(seed)?;
        let seed_host = seed_url
            .host_str()
            .ok_or_else(|| MirrorError::InvalidUrl(format!("{} has no host", seed)))?
            .to_string();

        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| {
                MirrorError::Output(format!("cannot create {}: {}", self.output_dir.display(), e))
            })?;

        info!(
            "mirroring {} into {} with {} workers",
            seed_url,
            self.output_dir.display(),
            self.workers
        );

        let fetcher = Arc::new(Fetcher::new(&self.user_agent, self.timeout, self.delay)?);
        let robots = Arc::new(RobotsCache::new());
        let shared = Arc::new(Shared::new());

        shared
            .frontier
            .lock()
            .await
            .push(FrontierEntry::seed(seed_url.clone()));

        let mut handles = Vec::new();
        for worker_id in 0..self.workers {
            let ctx = WorkerContext {
                shared: shared.clone(),
                fetcher: fetcher.clone(),
                robots: robots.clone(),
                seed_host: seed_host.clone(),
                scope: self.scope,
                user_agent: self.user_agent.clone(),
                output_dir: self.output_dir.clone(),
                max_pages: self.max_pages,
                cancel: self.cancel.clone(),
                progress_callback: self.progress_callback.clone(),
            };
            handles.push(tokio::spawn(async move {
                worker_loop(worker_id, ctx).await;
            }));
        }

        for joined in futures::future::join_all(handles).await {
            joined?;
        }

        self.rewrite_pass(&shared).await;

        let failures = shared.failures.lock().await.clone();
        let mut externals: Vec<String> = shared.externals.lock().await.iter().cloned().collect();
        externals.sort();

        let pages = shared.pages.load(Ordering::SeqCst);
        let assets = shared.assets.load(Ordering::SeqCst);
        let summary = MirrorSummary {
            seed: seed_url.to_string(),
            output_dir: self.output_dir.display().to_string(),
            pages,
            assets,
            total_files: pages + assets,
            total_bytes: shared.bytes.load(Ordering::SeqCst),
            externals,
            failures,
        };
        info!(
            "mirror complete: {} pages, {} assets, {} failures",
            summary.pages,
            summary.assets,
            summary.failed()
        );
        Ok(summary)
    }

    /// Final pass over every persisted HTML/CSS file with the complete
    /// mapping table, so forward references discovered after a page was
    /// saved still get rewritten.
    async fn rewrite_pass(&self, shared: &Shared) {
        let mappings = shared.mappings.lock().await.clone();
        let texts = shared.texts.lock().await;
        debug!(
            "rewrite pass over {} files with {} mappings",
            texts.len(),
            mappings.len()
        );
        for text in texts.iter() {
            let bytes = match tokio::fs::read(&text.path).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    shared
                        .record_failure(text.url.as_str(), FailureReason::Write(e.to_string()))
                        .await;
                    continue;
                }
            };
            let content = String::from_utf8_lossy(&bytes);
            let rewritten = match text.kind {
                TextKind::Html => rewrite::rewrite_html(&content, &text.url, &text.path, &mappings),
                TextKind::Css => rewrite::rewrite_css(&content, &text.url, &text.path, &mappings),
            };
            if rewritten.as_str() != content.as_ref()
                && let Err(e) = tokio::fs::write(&text.path, rewritten).await
            {
                shared
                    .record_failure(text.url.as_str(), FailureReason::Write(e.to_string()))
                    .await;
            }
        }
    }
}

struct WorkerContext {
    shared: Arc<Shared>,
    fetcher: Arc<Fetcher>,
    robots: Arc<RobotsCache>,
    seed_host: String,
    scope: DomainScope,
    user_agent: String,
    output_dir: PathBuf,
    max_pages: Option<usize>,
    cancel: Arc<AtomicBool>,
    progress_callback: Option<ProgressCallback>,
}

async fn worker_loop(worker_id: usize, ctx: WorkerContext) {
    debug!("worker {} started", worker_id);
    loop {
        if ctx.cancel.load(Ordering::SeqCst) {
            debug!("worker {} stopping on cancel", worker_id);
            break;
        }

        // Claim an entry and mark ourselves busy under the same lock, so an
        // idle worker observing (empty queue, nobody busy) can safely exit.
        let (entry, drained) = {
            let mut frontier = ctx.shared.frontier.lock().await;
            match frontier.pop() {
                Some(entry) => {
                    ctx.shared.busy.fetch_add(1, Ordering::SeqCst);
                    (Some(entry), false)
                }
                None => (None, ctx.shared.busy.load(Ordering::SeqCst) == 0),
            }
        };

        let Some(entry) = entry else {
            if drained {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
            continue;
        };

        if let Some(max) = ctx.max_pages
            && ctx.shared.processed.fetch_add(1, Ordering::SeqCst) >= max
        {
            debug!("page budget of {} reached, stopping", max);
            ctx.cancel.store(true, Ordering::SeqCst);
            ctx.shared.busy.fetch_sub(1, Ordering::SeqCst);
            continue;
        }

        if let Some(ref callback) = ctx.progress_callback {
            callback(worker_id, entry.url.to_string());
        }

        process_entry(&ctx, &entry).await;
        ctx.shared.busy.fetch_sub(1, Ordering::SeqCst);
    }
    debug!("worker {} finished", worker_id);
}

async fn process_entry(ctx: &WorkerContext, entry: &FrontierEntry) {
    let url = &entry.url;

    if !ctx
        .robots
        .is_allowed(ctx.fetcher.client(), url, &ctx.user_agent)
        .await
    {
        ctx.shared
            .record_failure(url.as_str(), FailureReason::RobotsDisallowed)
            .await;
        return;
    }

    let fetched = match ctx.fetcher.fetch(url).await {
        Ok(fetched) => fetched,
        Err(reason) => {
            ctx.shared.record_failure(url.as_str(), reason).await;
            return;
        }
    };

    if !fetched.is_success() {
        ctx.shared
            .record_failure(url.as_str(), FailureReason::HttpStatus(fetched.status))
            .await;
        return;
    }

    let path = paths::local_path(url, &ctx.output_dir);
    if let Some(parent) = path.parent()
        && let Err(e) = tokio::fs::create_dir_all(parent).await
    {
        ctx.shared
            .record_failure(url.as_str(), FailureReason::Write(e.to_string()))
            .await;
        return;
    }
    if let Err(e) = tokio::fs::write(&path, &fetched.bytes).await {
        ctx.shared
            .record_failure(url.as_str(), FailureReason::Write(e.to_string()))
            .await;
        return;
    }

    // Mappings grow monotonically; the final rewrite pass sees them all.
    ctx.shared
        .mappings
        .lock()
        .await
        .insert(url.as_str().to_string(), path.clone());
    ctx.shared
        .bytes
        .fetch_add(fetched.bytes.len() as u64, Ordering::SeqCst);

    let kind = text_kind(&fetched, url);
    match kind {
        Some(TextKind::Html) => ctx.shared.pages.fetch_add(1, Ordering::SeqCst),
        _ => ctx.shared.assets.fetch_add(1, Ordering::SeqCst),
    };
    debug!("saved {} -> {}", url, path.display());

    let Some(kind) = kind else {
        return;
    };

    let content = String::from_utf8_lossy(&fetched.bytes);
    let discovered = match kind {
        TextKind::Html => crate::extract::extract_html_links(&content),
        TextKind::Css => crate::extract::extract_css_links(&content),
    };

    for link in discovered {
        if norm::is_unfetchable(&link.raw) {
            continue;
        }
        let absolute = match norm::normalize(&link.raw, url) {
            Ok(absolute) => absolute,
            Err(e) => {
                warn!("dropping malformed link on {}: {}", url, e);
                ctx.shared
                    .record_failure(&link.raw, FailureReason::InvalidUrl)
                    .await;
                continue;
            }
        };
        if norm::same_domain(&absolute, &ctx.seed_host, ctx.scope) {
            ctx.shared.frontier.lock().await.push(FrontierEntry {
                url: absolute,
                kind: link.kind,
                depth: entry.depth + 1,
                referrer: Some(url.to_string()),
            });
        } else {
            ctx.shared
                .externals
                .lock()
                .await
                .insert(absolute.to_string());
        }
    }

    ctx.shared.texts.lock().await.push(PersistedText {
        url: url.clone(),
        path,
        kind,
    });
}

/// Decide whether a persisted resource needs link extraction and a rewrite
/// pass, from the content type with a file-extension fallback.
fn text_kind(fetched: &Fetched, url: &Url) -> Option<TextKind> {
    if let Some(ref content_type) = fetched.content_type {
        let ct = content_type.to_ascii_lowercase();
        if ct.contains("text/html") || ct.contains("application/xhtml") {
            return Some(TextKind::Html);
        }
        if ct.contains("text/css") {
            return Some(TextKind::Css);
        }
        return None;
    }
    let path = url.path().to_ascii_lowercase();
    if path.ends_with(".css") {
        Some(TextKind::Css)
    } else if path.ends_with(".html") || path.ends_with(".htm") || path.ends_with('/') {
        Some(TextKind::Html)
    } else {
        None
    }
}

impl Default for Mirror {
    fn default() -> Self {
        Self::new("mirror")
    }
}
