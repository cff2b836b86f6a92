// file: src/store/mod.rs
// description: index store capabilities consumed by the replacer
// reference: internal module structure

pub mod bulk;
pub mod client;
pub mod schema;

pub use bulk::{BulkItemOutcome, BulkOperation, BulkResponse};
pub use client::ElasticClient;
pub use schema::IndexMapping;

use crate::error::Result;
use std::future::Future;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    AlreadyExists,
}

/// What the sync job needs from a search index backend.
///
/// Implementations map every transport or protocol failure to
/// `SyncError::StoreUnavailable`.
pub trait IndexStore {
    fn ping(&self) -> impl Future<Output = Result<()>>;

    fn index_exists(&self, index: &str) -> impl Future<Output = Result<bool>>;

    /// A missing index is `Ok(DeleteOutcome::NotFound)`, not an error.
    fn delete_index(&self, index: &str) -> impl Future<Output = Result<DeleteOutcome>>;

    /// Creates `index` with `mapping` unless it already exists.
    fn create_index(
        &self,
        index: &str,
        mapping: &IndexMapping,
    ) -> impl Future<Output = Result<CreateOutcome>>;

    /// Submits every operation in one request. Per-item failures are
    /// reported in the response, not raised.
    fn bulk_index(
        &self,
        index: &str,
        operations: &[BulkOperation<'_>],
    ) -> impl Future<Output = Result<BulkResponse>>;

    /// Zero when the index does not exist.
    fn count_documents(&self, index: &str) -> impl Future<Output = Result<u64>>;
}
