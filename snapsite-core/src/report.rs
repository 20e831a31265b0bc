use snapsite_mirror::{FailureReason, MirrorSummary};

/// Render a human-readable run summary.
pub fn generate_mirror_report(summary: &MirrorSummary) -> String {
    let mut report = String::new();
    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");
    report.push_str("# Mirror summary\n");
    report.push_str(&format!(
        "  Generated: {}\n",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    ));
    report.push_str(&format!("  Seed: {}\n", summary.seed));
    report.push_str(&format!("  Output: {}\n", summary.output_dir));
    report.push('\n');
    report.push_str(&format!("  Pages downloaded: {}\n", summary.pages));
    report.push_str(&format!("  Assets downloaded: {}\n", summary.assets));
    report.push_str(&format!("  Total files: {}\n", summary.total_files));
    report.push_str(&format!(
        "  Total bytes: {}\n",
        format_bytes(summary.total_bytes)
    ));
    report.push_str(&format!(
        "  External links (not fetched): {}\n",
        summary.externals.len()
    ));
    report.push_str(&format!("  Failed URLs: {}\n", summary.failed()));

    if !summary.externals.is_empty() {
        report.push_str("\n## External links\n");
        for external in summary.externals.iter().take(20) {
            report.push_str(&format!("  \x1b[36m→\x1b[0m {}\n", external));
        }
        if summary.externals.len() > 20 {
            report.push_str(&format!(
                "  ... and {} more\n",
                summary.externals.len() - 20
            ));
        }
    }

    if !summary.failures.is_empty() {
        report.push_str("\n## Failures\n");
        for failure in &summary.failures {
            let reason = match &failure.reason {
                FailureReason::RobotsDisallowed => {
                    format!("\x1b[33m{}\x1b[0m", failure.reason) // yellow
                }
                FailureReason::HttpStatus(_) => {
                    format!("\x1b[33m{}\x1b[0m", failure.reason) // yellow
                }
                _ => format!("\x1b[31m{}\x1b[0m", failure.reason), // red
            };
            report.push_str(&format!("  ✗ {} ({})\n", failure.url, reason));
        }
    }

    report.push_str("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
    report
}

/// Machine-readable variant for `--format json`.
pub fn mirror_report_json(summary: &MirrorSummary) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(summary)
}

fn format_bytes(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = KIB * 1024;
    const GIB: u64 = MIB * 1024;
    match bytes {
        0..KIB => format!("{} B", bytes),
        KIB..MIB => format!("{:.1} KiB", bytes as f64 / KIB as f64),
        MIB..GIB => format!("{:.1} MiB", bytes as f64 / MIB as f64),
        _ => format!("{:.1} GiB", bytes as f64 / GIB as f64),
    }
}
