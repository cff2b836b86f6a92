// file: src/pipeline/mod.rs
// description: pipeline module exports and public api
// reference: pipeline orchestration

pub mod orchestrator;
pub mod progress;
pub mod replacer;
pub mod transformer;

pub use orchestrator::{RunReport, SyncPipeline, build_snapshot};
pub use progress::{ProgressTracker, RunStats};
pub use replacer::{IndexReplacer, ReplaceReport};
pub use transformer::RecordTransformer;
