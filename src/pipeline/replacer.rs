// file: src/pipeline/replacer.rs
// description: wholesale replacement of the index content with one snapshot
// reference: drop-if-exists, ensure-mapping, single bulk write
//
// The replacement is not atomic. The old index is deleted before the bulk
// write is sent, so readers see a missing or partially filled index until the
// write completes, and a failed write leaves the index empty with no copy of
// the previous content. Closing that window needs a staging index swapped in
// behind an alias, which this job does not do.

use crate::error::{Result, SyncError};
use crate::models::Snapshot;
use crate::store::{
    BulkItemOutcome, BulkOperation, CreateOutcome, DeleteOutcome, IndexMapping, IndexStore,
};
use crate::utils::telemetry::OperationTimer;
use crate::utils::validation::Validator;
use std::time::Duration;
use tracing::{info, warn};

/// Failed bulk items kept in the report and logged individually.
pub const MAX_FAILURE_SAMPLES: usize = 10;

const SLOW_BULK_THRESHOLD: Duration = Duration::from_secs(120);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplaceReport {
    pub index: String,
    pub previous_index_deleted: bool,
    pub mapping_created: bool,
    pub submitted: usize,
    pub indexed: usize,
    pub failed: usize,
    pub took_ms: u64,
    pub failure_samples: Vec<BulkItemOutcome>,
}

impl ReplaceReport {
    pub fn is_complete(&self) -> bool {
        self.indexed == self.submitted
    }
}

pub struct IndexReplacer<'a, S: IndexStore> {
    store: &'a S,
    index: String,
    mapping: IndexMapping,
}

impl<'a, S: IndexStore> IndexReplacer<'a, S> {
    pub fn new(store: &'a S, index: impl Into<String>) -> Self {
        Self {
            store,
            index: index.into(),
            mapping: IndexMapping::default(),
        }
    }

    pub fn with_mapping(mut self, mapping: IndexMapping) -> Self {
        self.mapping = mapping;
        self
    }

    pub fn index(&self) -> &str {
        &self.index
    }

    /// Makes the index hold exactly `snapshot`.
    ///
    /// An empty snapshot is rejected before any store call. Any store failure
    /// aborts the run; a partial bulk failure does not.
    pub async fn replace(&self, snapshot: &Snapshot) -> Result<ReplaceReport> {
        if snapshot.is_empty() {
            return Err(SyncError::EmptySnapshot {
                index: self.index.clone(),
            });
        }
        Validator::validate_index_name(&self.index)?;

        let previous_index_deleted = match self.store.delete_index(&self.index).await? {
            DeleteOutcome::Deleted => {
                warn!(
                    "Deleted index {}; it stays incomplete until the bulk write finishes",
                    self.index
                );
                true
            }
            DeleteOutcome::NotFound => {
                info!("Index {} did not exist, nothing to delete", self.index);
                false
            }
        };

        let mapping_created = matches!(
            self.store.create_index(&self.index, &self.mapping).await?,
            CreateOutcome::Created
        );

        let ids: Vec<String> = snapshot.with_storage_ids().map(|(id, _)| id).collect();
        let operations: Vec<BulkOperation<'_>> = ids
            .iter()
            .zip(snapshot.documents())
            .map(|(id, document)| BulkOperation {
                id: id.as_str(),
                document,
            })
            .collect();

        info!(
            "Inserting {} records into index {}",
            operations.len(),
            self.index
        );
        let timer = OperationTimer::new("bulk write");
        let response = self.store.bulk_index(&self.index, &operations).await?;
        timer.warn_if_slow(SLOW_BULK_THRESHOLD, "bulk request");
        timer.finish_with_count(operations.len());

        let submitted = operations.len();
        let indexed = response.indexed();
        let failure_samples: Vec<BulkItemOutcome> =
            response.failed().take(MAX_FAILURE_SAMPLES).cloned().collect();

        if indexed != submitted {
            warn!(
                "Index {}: {} of {} records confirmed by the store",
                self.index, indexed, submitted
            );
            for item in &failure_samples {
                warn!(
                    "  id {} status {}: {}",
                    item.id,
                    item.status,
                    item.error.as_deref().unwrap_or("no reason given")
                );
            }
        }

        info!("{} records indexed into {}", indexed, self.index);

        Ok(ReplaceReport {
            index: self.index.clone(),
            previous_index_deleted,
            mapping_created,
            submitted,
            indexed,
            failed: submitted.saturating_sub(indexed),
            took_ms: response.took_ms,
            failure_samples,
        })
    }
}
