// file: src/pipeline/orchestrator.rs
// description: runs one sync: read the source, build the snapshot, replace the index
// reference: orchestrates the batch ingestion workflow

use crate::config::StoreConfig;
use crate::error::{Result, SyncError};
use crate::models::Snapshot;
use crate::parser::RecordReader;
use crate::pipeline::progress::{ProgressTracker, RunStats};
use crate::pipeline::replacer::{IndexReplacer, ReplaceReport};
use crate::pipeline::transformer::RecordTransformer;
use crate::store::{IndexMapping, IndexStore};
use chrono::{DateTime, Utc};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{Instrument, debug, info, info_span};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub snapshot_digest: String,
    pub stats: RunStats,
    /// `None` for dry runs.
    pub replace: Option<ReplaceReport>,
}

impl RunReport {
    pub fn indexed(&self) -> usize {
        self.stats.documents_indexed
    }
}

/// Reads every data row and transforms it, failing on the first bad row.
pub fn build_snapshot<R: Read>(
    reader: &mut RecordReader<R>,
    transformer: &RecordTransformer,
    progress: &ProgressTracker,
) -> Result<Snapshot> {
    let mut snapshot = Snapshot::new();

    while let Some(row) = reader.next_row()? {
        progress.inc_rows_read();
        snapshot.push(transformer.transform(row)?);
        progress.add_document();
    }

    debug!(
        "Built snapshot of {} documents from {} rows",
        snapshot.len(),
        reader.rows_read()
    );
    Ok(snapshot)
}

pub struct SyncPipeline<'a, S: IndexStore> {
    store: &'a S,
    index: String,
    mapping: IndexMapping,
    show_progress: bool,
}

impl<'a, S: IndexStore> SyncPipeline<'a, S> {
    pub fn new(store: &'a S, config: &StoreConfig) -> Result<Self> {
        let mapping = match &config.mapping_path {
            Some(path) => IndexMapping::from_file(path)?,
            None => IndexMapping::default(),
        };

        Ok(Self {
            store,
            index: config.index_name.clone(),
            mapping,
            show_progress: false,
        })
    }

    pub fn with_progress(mut self, enabled: bool) -> Self {
        self.show_progress = enabled;
        self
    }

    pub fn index(&self) -> &str {
        &self.index
    }

    pub async fn run_path(&self, path: &Path, dry_run: bool) -> Result<RunReport> {
        let path = path.to_path_buf();
        self.run(move || RecordReader::open(&path), dry_run).await
    }

    pub async fn run_reader<R>(&self, source: R, dry_run: bool) -> Result<RunReport>
    where
        R: Read + Send + 'static,
    {
        self.run(move || RecordReader::from_reader(source), dry_run)
            .await
    }

    async fn run<R, F>(&self, open: F, dry_run: bool) -> Result<RunReport>
    where
        R: Read + Send + 'static,
        F: FnOnce() -> Result<RecordReader<R>> + Send + 'static,
    {
        let run_id = Uuid::new_v4();
        let span = info_span!("sync", %run_id, index = %self.index);

        async move {
            let started_at = Utc::now();
            let start = Instant::now();
            info!("Starting IndicePA sync into {}", self.index);

            let progress = Arc::new(ProgressTracker::new(self.show_progress));
            let snapshot = load_snapshot(open, Arc::clone(&progress)).await?;
            let mut stats = progress.get_stats();
            progress.finish();

            let snapshot_digest = snapshot.digest();
            info!(
                "Read {} records (snapshot sha256 {})",
                snapshot.len(),
                snapshot_digest
            );

            let replace = if dry_run {
                if snapshot.is_empty() {
                    return Err(SyncError::EmptySnapshot {
                        index: self.index.clone(),
                    });
                }
                info!("Dry run: index {} left untouched", self.index);
                None
            } else {
                let replacer = IndexReplacer::new(self.store, self.index.clone())
                    .with_mapping(self.mapping.clone());
                Some(replacer.replace(&snapshot).await?)
            };

            if let Some(report) = &replace {
                stats.documents_submitted = report.submitted;
                stats.documents_indexed = report.indexed;
                stats.documents_failed = report.failed;
            }
            stats.duration_secs = start.elapsed().as_secs_f64();

            let report = RunReport {
                run_id,
                started_at,
                snapshot_digest,
                stats,
                replace,
            };
            log_final_stats(&report);
            Ok(report)
        }
        .instrument(span)
        .await
    }
}

async fn load_snapshot<R, F>(open: F, progress: Arc<ProgressTracker>) -> Result<Snapshot>
where
    R: Read + Send + 'static,
    F: FnOnce() -> Result<RecordReader<R>> + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut reader = open()?;
        build_snapshot(&mut reader, &RecordTransformer::new(), &progress)
    })
    .await?
}

fn log_final_stats(report: &RunReport) {
    let stats = &report.stats;
    info!("=== Sync Summary ===");
    info!("Run: {} started {}", report.run_id, report.started_at.to_rfc3339());
    info!("Duration: {:.2} seconds", stats.duration_secs);
    info!("Rows read: {}", stats.rows_read);
    info!("Documents built: {}", stats.documents_built);
    if report.replace.is_some() {
        info!("Documents submitted: {}", stats.documents_submitted);
        info!("Documents indexed: {}", stats.documents_indexed);
        info!("Documents failed: {}", stats.documents_failed);
        info!("Success rate: {:.2}%", stats.success_rate());
    }
    info!("Read speed: {:.2} rows/sec", stats.rows_per_second());
    info!("====================");
}

/// Resolves the source path: an explicit CLI value wins over the config.
pub fn resolve_source(cli_value: Option<PathBuf>, configured: &Path) -> PathBuf {
    cli_value.unwrap_or_else(|| configured.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::models::Document;
    use crate::pipeline::replacer::testing::{RecordingStore, StoreCall};
    use pretty_assertions::assert_eq;
    use std::io::Cursor;
    use tempfile::TempDir;

    const SAMPLE: &str = "code\tdesc\ttype\tX\tY\tZ\tW\taddr@example.org\n\
                          0001\tMinistry A\tX\tCentral\tY\tZ\tW\tministryA@pec.it";

    fn pipeline(store: &RecordingStore) -> SyncPipeline<'_, RecordingStore> {
        SyncPipeline::new(store, &Config::default_config().store).unwrap()
    }

    #[tokio::test]
    async fn test_end_to_end_single_row() {
        let store = RecordingStore::new();

        let report = pipeline(&store)
            .run_reader(Cursor::new(SAMPLE), false)
            .await
            .unwrap();

        assert_eq!(report.indexed(), 1);
        assert_eq!(report.stats.rows_read, 1);
        assert_eq!(
            store.calls(),
            vec![
                StoreCall::Delete("indicepa_pec".to_string()),
                StoreCall::Create("indicepa_pec".to_string()),
                StoreCall::Bulk("indicepa_pec".to_string(), vec!["0".to_string()]),
            ]
        );

        let contents = store.contents("indicepa_pec").unwrap();
        assert_eq!(
            contents["0"],
            Document::new("0001", "Ministry A", "Central", "ministryA@pec.it")
        );
    }

    #[tokio::test]
    async fn test_header_only_is_empty_snapshot() {
        let store = RecordingStore::new();

        let err = pipeline(&store)
            .run_reader(Cursor::new("code\tdesc\ttype\tX\tY\tZ\tW\taddr\n"), false)
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::EmptySnapshot { .. }));
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_short_row_aborts_before_store() {
        let store = RecordingStore::new();
        let input = format!("{}\n0002\tToo short\tL6\n", SAMPLE);

        let err = pipeline(&store)
            .run_reader(Cursor::new(input), false)
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::FieldMissing { line: 3, found: 3, .. }));
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_short_row_line_in_crlf_export() {
        let store = RecordingStore::new();
        let input = format!("{}\r\n0002\tToo short\tL6\r\n", SAMPLE.replace('\n', "\r\n"));

        let err = pipeline(&store)
            .run_reader(Cursor::new(input), false)
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::FieldMissing { line: 3, found: 3, .. }));
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_unclosed_quote_in_description_fails_run() {
        let store = RecordingStore::new();
        let input = "code\tdesc\ttype\tX\tY\tZ\tW\taddr\n\
                     0001\t\"Ministry A\tX\tCentral\tY\tZ\tW\ta@pec.it\n\
                     0002\tB\tx\tL2\t\t\t\tb@pec.it\n";

        let err = pipeline(&store)
            .run_reader(Cursor::new(input), false)
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::FieldMissing { line: 2, found: 2, .. }));
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_unclosed_quote_in_address_merges_later_rows() {
        let store = RecordingStore::new();
        let input = "code\tdesc\ttype\tX\tY\tZ\tW\taddr\n\
                     0001\tA\tx\tL1\t\t\t\t\"a@pec.it\n\
                     0002\tB\tx\tL2\t\t\t\tb@pec.it\n\
                     0003\tC\tx\tL3\t\t\t\tc@pec.it\n";

        let report = pipeline(&store)
            .run_reader(Cursor::new(input), false)
            .await
            .unwrap();

        assert_eq!(report.stats.rows_read, 1);
        assert_eq!(report.indexed(), 1);
        let contents = store.contents("indicepa_pec").unwrap();
        assert_eq!(
            contents["0"].contact_address(),
            "a@pec.it\n0002\tB\tx\tL2\t\t\t\tb@pec.it\n0003\tC\tx\tL3\t\t\t\tc@pec.it\n"
        );
    }

    #[tokio::test]
    async fn test_two_runs_are_idempotent() {
        let store = RecordingStore::new();
        let sync = pipeline(&store);

        let first = sync
            .run_reader(Cursor::new(SAMPLE), false)
            .await
            .unwrap();
        let after_first = store.contents("indicepa_pec");

        let second = sync
            .run_reader(Cursor::new(SAMPLE), false)
            .await
            .unwrap();
        let after_second = store.contents("indicepa_pec");

        assert_eq!(first.snapshot_digest, second.snapshot_digest);
        assert_eq!(after_first, after_second);
        assert_eq!(first.indexed(), second.indexed());

        let first_replace = first.replace.unwrap();
        let second_replace = second.replace.unwrap();
        assert!(!first_replace.previous_index_deleted);
        assert!(second_replace.previous_index_deleted);
    }

    #[tokio::test]
    async fn test_dry_run_skips_store() {
        let store = RecordingStore::new();

        let report = pipeline(&store)
            .run_reader(Cursor::new(SAMPLE), true)
            .await
            .unwrap();

        assert!(report.replace.is_none());
        assert_eq!(report.stats.documents_built, 1);
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_run_path_missing_file() {
        let store = RecordingStore::new();

        let err = pipeline(&store)
            .run_path(Path::new("/nonexistent/pec.txt"), false)
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::SourceUnavailable { .. }));
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_run_path_from_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("pec.txt");
        std::fs::write(&path, format!("{}\nC_H501\tRoma\tX\tL6\t\t\t\troma@pec.it\n", SAMPLE))
            .unwrap();
        let store = RecordingStore::new();

        let report = pipeline(&store).run_path(&path, false).await.unwrap();

        assert_eq!(report.indexed(), 2);
        let contents = store.contents("indicepa_pec").unwrap();
        assert_eq!(contents["1"].code(), "c_h501");
    }

    #[test]
    fn test_resolve_source_prefers_cli() {
        let configured = Path::new("pec.txt");
        assert_eq!(resolve_source(None, configured), PathBuf::from("pec.txt"));
        assert_eq!(
            resolve_source(Some(PathBuf::from("/tmp/other.txt")), configured),
            PathBuf::from("/tmp/other.txt")
        );
    }
}
