pub mod mirror;
pub mod report;

pub use mirror::{MirrorOptions, MirrorProgressCallback, default_output_dir, execute_mirror};
pub use report::{generate_mirror_report, mirror_report_json};

use colored::Colorize;

pub fn print_banner() {
    let banner = r#"
                               _ _
   ___ _ __   __ _ _ __  ___(_) |_ ___
  / __| '_ \ / _` | '_ \/ __| | __/ _ \
  \__ \ | | | (_| | |_) \__ \ | ||  __/
  |___/_| |_|\__,_| .__/|___/_|\__\___|
                  |_|
"#;
    println!("{}", banner.bright_cyan());
    println!(
        "  {} v{} - static website mirroring\n",
        "snapsite".bright_white().bold(),
        env!("CARGO_PKG_VERSION")
    );
}
