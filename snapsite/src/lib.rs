// Include handlers module directly from handlers.rs
#[path = "handlers.rs"]
pub mod handlers;

// Re-export commonly used handler functions for convenience
pub use handlers::{parse_seed_url, resolve_output_dir};

// Re-export mirror functionality from snapsite-core
pub use snapsite_core::{
    MirrorOptions, MirrorProgressCallback, default_output_dir, execute_mirror,
    generate_mirror_report, mirror_report_json,
};
