// file: src/lib.rs
// description: library entry point and public api exports
// reference: rust library patterns
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/readme.md"))]

pub mod config;
pub mod error;
pub mod models;
pub mod parser;
pub mod pipeline;
pub mod store;
pub mod utils;

pub use config::{Config, SourceConfig, StoreConfig};
pub use error::{Result, SyncError};
pub use models::{Document, Snapshot};
pub use parser::{RawRow, RecordReader};
pub use pipeline::{
    IndexReplacer, ProgressTracker, RecordTransformer, ReplaceReport, RunReport, RunStats,
    SyncPipeline,
};
pub use store::{
    BulkOperation, BulkResponse, CreateOutcome, DeleteOutcome, ElasticClient, IndexMapping,
    IndexStore,
};
pub use utils::{HealthCheck, HealthReport, HealthStatus, OperationTimer, Validator};
