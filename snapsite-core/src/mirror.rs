use indicatif::{ProgressBar, ProgressStyle};
use snapsite_mirror::{DomainScope, Mirror, MirrorSummary};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Options for configuring a mirror run
pub struct MirrorOptions {
    pub seed: String,
    pub output_dir: PathBuf,
    pub workers: usize,
    pub timeout_secs: u64,
    pub delay_ms: u64,
    pub max_pages: Option<usize>,
    pub include_subdomains: bool,
    pub user_agent: Option<String>,
    pub show_progress: bool,
}

impl Default for MirrorOptions {
    fn default() -> Self {
        Self {
            seed: String::new(),
            output_dir: PathBuf::from("mirror"),
            workers: 4,
            timeout_secs: 30,
            delay_ms: 0,
            max_pages: None,
            include_subdomains: false,
            user_agent: None,
            show_progress: false,
        }
    }
}

/// Callback for reporting per-URL mirror progress
pub type MirrorProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

/// Derive a default output directory name from the seed URL's host:
/// `www.` stripped, runs of non-alphanumerics collapsed to `_`.
pub fn default_output_dir(seed: &str) -> String {
    let host = Url::parse(seed)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_default();
    let stripped = host.strip_prefix("www.").unwrap_or(&host);

    let mut name = String::with_capacity(stripped.len());
    let mut last_was_sep = false;
    for c in stripped.chars() {
        if c.is_ascii_alphanumeric() {
            name.push(c);
            last_was_sep = false;
        } else if !last_was_sep {
            name.push('_');
            last_was_sep = true;
        }
    }
    let name = name.trim_matches('_');
    if name.is_empty() {
        "mirror".to_string()
    } else {
        name.to_string()
    }
}

/// Execute a mirror run with the given options.
/// Returns the run summary; individual fetch failures live inside it.
pub async fn execute_mirror(
    options: MirrorOptions,
    progress_callback: Option<MirrorProgressCallback>,
) -> Result<MirrorSummary, String> {
    let MirrorOptions {
        seed,
        output_dir,
        workers,
        timeout_secs,
        delay_ms,
        max_pages,
        include_subdomains,
        user_agent,
        show_progress,
    } = options;

    // Single spinner for overall progress (only if enabled)
    let progress_bar = if show_progress {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap(),
        );
        pb.set_message("Starting mirror...");
        Some(Arc::new(pb))
    } else {
        None
    };

    let processed_count = Arc::new(AtomicUsize::new(0));

    let internal_callback: snapsite_mirror::ProgressCallback = {
        let pb_clone = progress_bar.clone();
        let count_clone = processed_count.clone();
        let user_callback = progress_callback.clone();
        Arc::new(move |_worker_id: usize, url: String| {
            let count = count_clone.fetch_add(1, Ordering::Relaxed) + 1;
            if let Some(ref pb) = pb_clone {
                pb.set_message(format!("Mirroring... {} URLs processed", count));
                pb.tick();
            }
            if let Some(ref callback) = user_callback {
                callback(url);
            }
        })
    };

    let scope = if include_subdomains {
        DomainScope::Subdomains
    } else {
        DomainScope::ExactHost
    };

    let mut mirror = Mirror::new(output_dir)
        .with_workers(workers)
        .with_timeout(Duration::from_secs(timeout_secs))
        .with_delay(Duration::from_millis(delay_ms))
        .with_max_pages(max_pages)
        .with_domain_scope(scope)
        .with_progress_callback(internal_callback);
    if let Some(ua) = user_agent {
        mirror = mirror.with_user_agent(ua);
    }

    // Ctrl-C stops new fetches; in-flight requests finish and whatever was
    // saved still gets its rewrite pass.
    let cancel = mirror.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            debug!("interrupt received, draining");
            cancel.store(true, Ordering::SeqCst);
        }
    });

    let summary = mirror.run(&seed).await.map_err(|e| e.to_string())?;

    if let Some(ref pb) = progress_bar {
        let total = processed_count.load(Ordering::Relaxed);
        pb.finish_with_message(format!("Mirror complete! {} URLs processed", total));
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_output_dir_strips_www_and_specials() {
        assert_eq!(default_output_dir("https://www.example.com/"), "example_com");
        assert_eq!(default_output_dir("https://blog.example.co.uk"), "blog_example_co_uk");
        assert_eq!(default_output_dir("https://example.com:8080/x"), "example_com");
    }

    #[test]
    fn default_output_dir_falls_back_for_garbage() {
        assert_eq!(default_output_dir("not a url"), "mirror");
    }

    #[test]
    fn options_default_to_a_small_worker_pool() {
        let options = MirrorOptions::default();
        assert_eq!(options.workers, 4);
        assert_eq!(options.timeout_secs, 30);
        assert!(!options.include_subdomains);
        assert!(options.max_pages.is_none());
    }
}
