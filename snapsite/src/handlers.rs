use clap::ArgMatches;
use colored::Colorize;
use snapsite_core::{
    MirrorOptions, default_output_dir, execute_mirror, generate_mirror_report, mirror_report_json,
};
use snapsite_mirror::FailureReason;
use std::path::PathBuf;
use url::Url;

/// Parse a seed argument, assuming https:// when the scheme is missing.
pub fn parse_seed_url(raw: &str) -> Result<String, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err("empty seed URL".to_string());
    }

    if let Ok(url) = Url::parse(raw)
        && matches!(url.scheme(), "http" | "https")
        && url.host_str().is_some()
    {
        return Ok(raw.to_string());
    }

    // No scheme ("example.com/start") - try https://
    if !raw.contains("://") {
        let with_scheme = format!("https://{}", raw);
        if let Ok(url) = Url::parse(&with_scheme)
            && url.host_str().is_some()
        {
            return Ok(with_scheme);
        }
    }

    Err(format!("invalid seed URL '{}'", raw))
}

/// Expand a user-supplied output directory, or derive one from the seed.
pub fn resolve_output_dir(arg: Option<&String>, seed: &str) -> PathBuf {
    match arg {
        Some(dir) => PathBuf::from(shellexpand::tilde(dir).as_ref()),
        None => PathBuf::from(default_output_dir(seed)),
    }
}

pub async fn handle_mirror(sub_matches: &ArgMatches) {
    // Initialize tracing for logging
    tracing_subscriber::fmt::init();

    let raw_seed = sub_matches.get_one::<String>("url").unwrap();
    let seed = match parse_seed_url(raw_seed) {
        Ok(seed) => seed,
        Err(e) => {
            eprintln!("✗ {}", e);
            std::process::exit(1);
        }
    };

    let threads = *sub_matches.get_one::<usize>("threads").unwrap_or(&4);
    let timeout_secs = *sub_matches.get_one::<u64>("timeout").unwrap_or(&30);
    let delay_ms = *sub_matches.get_one::<u64>("delay").unwrap_or(&0);
    let max_pages = sub_matches.get_one::<usize>("max-pages").copied();
    let include_subdomains = sub_matches.get_flag("include-subdomains");
    let user_agent = sub_matches.get_one::<String>("user-agent").cloned();
    let format = sub_matches
        .get_one::<String>("format")
        .map(String::as_str)
        .unwrap_or("text");
    let report_path = sub_matches.get_one::<PathBuf>("report").cloned();
    let output_dir = resolve_output_dir(sub_matches.get_one::<String>("output"), &seed);

    println!("\n🕸  Mirroring {}", seed);
    println!("Workers: {}", threads);
    println!("Output: {}", output_dir.display());
    let scope = if include_subdomains {
        "seed host + subdomains"
    } else {
        "exact host only"
    };
    println!("Scope: {}\n", scope);

    let options = MirrorOptions {
        seed,
        output_dir,
        workers: threads,
        timeout_secs,
        delay_ms,
        max_pages,
        include_subdomains,
        user_agent,
        show_progress: true, // Enable the spinner in CLI mode
    };

    let summary = match execute_mirror(options, None).await {
        Ok(summary) => summary,
        Err(e) => {
            eprintln!("✗ Mirror failed: {}", e);
            std::process::exit(1);
        }
    };

    println!("\n{} Mirror complete!\n", "✓".green().bold());

    if summary.failed() > 0 {
        let robots_skips = summary
            .failures
            .iter()
            .filter(|f| f.reason == FailureReason::RobotsDisallowed)
            .count();
        let mut note = format!("{} URL(s) could not be mirrored", summary.failed());
        if robots_skips > 0 {
            note.push_str(&format!(" ({} disallowed by robots.txt)", robots_skips));
        }
        println!("{} {}", "⚠".yellow().bold(), note);
    }

    let report = if format == "json" {
        match mirror_report_json(&summary) {
            Ok(json) => json,
            Err(e) => {
                eprintln!("✗ Failed to serialize report: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        generate_mirror_report(&summary)
    };

    match report_path {
        Some(path) => {
            if let Err(e) = std::fs::write(&path, &report) {
                eprintln!("✗ Failed to write report to {}: {}", path.display(), e);
                std::process::exit(1);
            }
            println!("Report saved to {}", path.display());
        }
        None => print!("{}", report),
    }
    // Individual fetch failures are data, not errors: the process exits 0.
}
