pub mod error;
pub mod extract;
pub mod fetch;
pub mod frontier;
pub mod mirror;
pub mod norm;
pub mod paths;
pub mod result;
pub mod rewrite;
pub mod robots;

pub use error::MirrorError;
pub use mirror::{Mirror, ProgressCallback};
pub use norm::DomainScope;
pub use result::{Failure, FailureReason, MirrorSummary, ResourceKind};
