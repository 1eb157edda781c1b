use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::IngestError;
use crate::types::ColumnDescriptor;

/// Severity classification used for observer callbacks and alerting thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum IngestSeverity {
    /// Informational event.
    Info,
    /// Warning-level event (non-fatal, e.g. a dropped field).
    Warning,
    /// Error-level event (a row or a column failed).
    Error,
    /// Critical error (the run cannot proceed, or the store is unreachable).
    Critical,
}

/// Context about an ingestion event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestContext {
    /// Target list name.
    pub list: String,
    /// 1-based input row the event belongs to, if any.
    pub row: Option<usize>,
}

impl IngestContext {
    pub fn run(list: &str) -> Self {
        Self {
            list: list.to_string(),
            row: None,
        }
    }

    pub fn row(list: &str, row: usize) -> Self {
        Self {
            list: list.to_string(),
            row: Some(row),
        }
    }
}

/// Stats reported when a run completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IngestStats {
    /// Input rows seen.
    pub rows: usize,
    /// Rows committed.
    pub committed: usize,
    /// Rows that failed.
    pub failed: usize,
    /// Failed rows whose item a later flush committed anyway.
    pub late_committed: usize,
    /// Columns added by schema provisioning.
    pub columns_provisioned: usize,
}

/// Observer interface for ingestion outcomes.
///
/// This is the single reporting channel for errors and diagnostics. Implementors can record
/// metrics, logs, or trigger alerts.
pub trait IngestObserver: Send + Sync {
    /// Called when a run completes (possibly with failed rows).
    fn on_success(&self, _ctx: &IngestContext, _stats: IngestStats) {}

    /// Called for every error, fatal or not.
    fn on_failure(&self, _ctx: &IngestContext, _severity: IngestSeverity, _error: &IngestError) {}

    /// Called when a failure meets an alert threshold.
    ///
    /// Default behavior forwards to [`Self::on_failure`].
    fn on_alert(&self, ctx: &IngestContext, severity: IngestSeverity, error: &IngestError) {
        self.on_failure(ctx, severity, error)
    }

    /// Called for non-fatal diagnostics such as [`IngestError::UnknownFieldDropped`].
    fn on_warning(&self, _ctx: &IngestContext, _warning: &IngestError) {}

    /// Called after schema provisioning created a column.
    fn on_column_provisioned(&self, _ctx: &IngestContext, _column: &ColumnDescriptor) {}
}

/// Severity of an error, as reported to observers.
pub fn severity_for_error(e: &IngestError) -> IngestSeverity {
    match e {
        IngestError::ListNotFound { .. } => IngestSeverity::Critical,
        IngestError::Io(_) => IngestSeverity::Critical,
        IngestError::Store(crate::store::StoreError::Transport { .. }) => IngestSeverity::Critical,
        IngestError::Store(_) => IngestSeverity::Error,
        IngestError::SchemaProvision { .. } => IngestSeverity::Error,
        IngestError::RowCommit { .. } => IngestSeverity::Error,
        IngestError::UnknownFieldDropped { .. } => IngestSeverity::Warning,
        IngestError::CommittedAfterFailure { .. } => IngestSeverity::Warning,
        IngestError::Csv(err) => match err.kind() {
            ::csv::ErrorKind::Io(_) => IngestSeverity::Critical,
            _ => IngestSeverity::Error,
        },
        IngestError::InvalidInput { .. } => IngestSeverity::Error,
    }
}

/// An observer that fans out callbacks to a list of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn IngestObserver>>,
}

impl CompositeObserver {
    /// Create a new composite observer from a list of observers.
    pub fn new(observers: Vec<Arc<dyn IngestObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl IngestObserver for CompositeObserver {
    fn on_success(&self, ctx: &IngestContext, stats: IngestStats) {
        for o in &self.observers {
            o.on_success(ctx, stats);
        }
    }

    fn on_failure(&self, ctx: &IngestContext, severity: IngestSeverity, error: &IngestError) {
        for o in &self.observers {
            o.on_failure(ctx, severity, error);
        }
    }

    fn on_alert(&self, ctx: &IngestContext, severity: IngestSeverity, error: &IngestError) {
        for o in &self.observers {
            o.on_alert(ctx, severity, error);
        }
    }

    fn on_warning(&self, ctx: &IngestContext, warning: &IngestError) {
        for o in &self.observers {
            o.on_warning(ctx, warning);
        }
    }

    fn on_column_provisioned(&self, ctx: &IngestContext, column: &ColumnDescriptor) {
        for o in &self.observers {
            o.on_column_provisioned(ctx, column);
        }
    }
}

fn row_label(ctx: &IngestContext) -> String {
    ctx.row.map_or_else(|| "-".to_string(), |r| r.to_string())
}

/// Logs ingestion events to stderr.
#[derive(Debug, Default)]
pub struct StdErrObserver;

impl IngestObserver for StdErrObserver {
    fn on_success(&self, ctx: &IngestContext, stats: IngestStats) {
        eprintln!(
            "[ingest][ok] list={} rows={} committed={} failed={} late={} columns_provisioned={}",
            ctx.list,
            stats.rows,
            stats.committed,
            stats.failed,
            stats.late_committed,
            stats.columns_provisioned
        );
    }

    fn on_failure(&self, ctx: &IngestContext, severity: IngestSeverity, error: &IngestError) {
        eprintln!(
            "[ingest][{:?}] list={} row={} err={}",
            severity,
            ctx.list,
            row_label(ctx),
            error
        );
    }

    fn on_alert(&self, ctx: &IngestContext, severity: IngestSeverity, error: &IngestError) {
        eprintln!(
            "[ALERT][ingest][{:?}] list={} row={} err={}",
            severity,
            ctx.list,
            row_label(ctx),
            error
        );
    }

    fn on_warning(&self, ctx: &IngestContext, warning: &IngestError) {
        eprintln!("[ingest][Warning] list={} row={} {}", ctx.list, row_label(ctx), warning);
    }

    fn on_column_provisioned(&self, ctx: &IngestContext, column: &ColumnDescriptor) {
        eprintln!(
            "[ingest][column] list={} added={} kind={}",
            ctx.list, column.name, column.kind
        );
    }
}

/// Appends ingestion events to a local log file.
#[derive(Debug)]
pub struct FileObserver {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileObserver {
    /// Create a file observer that appends events to `path`.
    ///
    /// Writes are best-effort; failures to open/write the log file are ignored.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    fn append_line(&self, line: &str) {
        let _guard = self.lock.lock().ok();
        if let Ok(mut f) = OpenOptions::new().create(true).append(true).open(&self.path) {
            let _ = writeln!(f, "{line}");
        }
    }
}

impl IngestObserver for FileObserver {
    fn on_success(&self, ctx: &IngestContext, stats: IngestStats) {
        self.append_line(&format!(
            "{} ok list={} rows={} committed={} failed={} late={} columns_provisioned={}",
            unix_ts(),
            ctx.list,
            stats.rows,
            stats.committed,
            stats.failed,
            stats.late_committed,
            stats.columns_provisioned
        ));
    }

    fn on_failure(&self, ctx: &IngestContext, severity: IngestSeverity, error: &IngestError) {
        self.append_line(&format!(
            "{} fail severity={:?} list={} row={} err={}",
            unix_ts(),
            severity,
            ctx.list,
            row_label(ctx),
            error
        ));
    }

    fn on_alert(&self, ctx: &IngestContext, severity: IngestSeverity, error: &IngestError) {
        self.append_line(&format!(
            "{} ALERT severity={:?} list={} row={} err={}",
            unix_ts(),
            severity,
            ctx.list,
            row_label(ctx),
            error
        ));
    }

    fn on_warning(&self, ctx: &IngestContext, warning: &IngestError) {
        self.append_line(&format!(
            "{} warn list={} row={} {}",
            unix_ts(),
            ctx.list,
            row_label(ctx),
            warning
        ));
    }

    fn on_column_provisioned(&self, ctx: &IngestContext, column: &ColumnDescriptor) {
        self.append_line(&format!(
            "{} column list={} added={} kind={}",
            unix_ts(),
            ctx.list,
            column.name,
            column.kind
        ));
    }
}

/// Forwards ingestion events to `tracing` with structured fields.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl IngestObserver for TracingObserver {
    fn on_success(&self, ctx: &IngestContext, stats: IngestStats) {
        tracing::info!(
            list = %ctx.list,
            rows = stats.rows,
            committed = stats.committed,
            failed = stats.failed,
            late_committed = stats.late_committed,
            columns_provisioned = stats.columns_provisioned,
            "ingestion finished"
        );
    }

    fn on_failure(&self, ctx: &IngestContext, severity: IngestSeverity, error: &IngestError) {
        tracing::error!(list = %ctx.list, row = ?ctx.row, ?severity, %error, "ingestion failure");
    }

    fn on_alert(&self, ctx: &IngestContext, severity: IngestSeverity, error: &IngestError) {
        tracing::error!(list = %ctx.list, row = ?ctx.row, ?severity, %error, alert = true, "ingestion alert");
    }

    fn on_warning(&self, ctx: &IngestContext, warning: &IngestError) {
        tracing::warn!(list = %ctx.list, row = ?ctx.row, %warning, "ingestion warning");
    }

    fn on_column_provisioned(&self, ctx: &IngestContext, column: &ColumnDescriptor) {
        tracing::info!(list = %ctx.list, column = %column.name, kind = %column.kind, "column provisioned");
    }
}

fn unix_ts() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
