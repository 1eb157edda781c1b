//! The ingestion driver.
//!
//! A run goes through these phases:
//!
//! 1. **Init**: resolve the target list. A missing list is fatal unless
//!    [`IngestOptions::auto_create`] is set, in which case it is created.
//! 2. **Schema provisioning** (new lists, or existing ones with
//!    [`IngestOptions::reconcile_existing`]): infer column kinds from the first record, create the
//!    missing columns, then re-read the schema.
//! 3. **Row loop**: for each record in order, map it onto a staged item, stage it, commit the
//!    session, and (unless [`IngestOptions::quiet`]) read the new item back.
//!
//! The schema snapshot is taken once and used for every row; fields introduced by later rows are
//! dropped and reported, never provisioned. Each row is its own commit, so a failed row never
//! rolls back earlier ones.
//!
//! A session may keep the work of a failed commit and flush it with a later one. Ids returned
//! ahead of the current row's own id are attributed to those earlier failed rows and reported as
//! late commits.

use std::fmt;
use std::sync::Arc;

use crate::error::{IngestError, IngestResult};
use crate::mapping::map_row_with_report;
use crate::schema::{provision, reconcile};
use crate::store::StoreSession;
use crate::types::{ColumnDescriptor, ColumnSet, CommitResult, ItemId, Record, StagedItem};

use super::observability::{
    severity_for_error, IngestContext, IngestObserver, IngestSeverity, IngestStats,
};

/// How errors affect the rest of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMode {
    /// Report the error and carry on; the failed unit yields no result.
    #[default]
    Soft,
    /// Report the error and stop the run, returning it.
    Strict,
}

/// What happens on the session after a row failed to stage or commit (soft mode only).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowFailurePolicy {
    /// Move straight on to the next row.
    #[default]
    SkipRow,
    /// Flush the session once more and, unless quiet, read back any item that flush produced.
    /// Such items belong to failed rows and are also listed in [`IngestReport::late_commits`].
    FlushAndConfirm,
}

/// Options controlling an ingestion run.
///
/// Use [`Default`] for common cases.
#[derive(Clone)]
pub struct IngestOptions {
    /// Create the list (and provision its columns) when it does not exist.
    pub auto_create: bool,
    /// Also provision missing columns on a list that already exists.
    pub reconcile_existing: bool,
    /// Skip reading committed items back.
    pub quiet: bool,
    /// Soft (report and continue) or strict (report and abort).
    pub error_mode: ErrorMode,
    /// Session handling after a failed row.
    pub after_row_failure: RowFailurePolicy,
    /// Optional observer for logging/alerts.
    pub observer: Option<Arc<dyn IngestObserver>>,
    /// Severity threshold at which `on_alert` is invoked.
    pub alert_at_or_above: IngestSeverity,
}

impl fmt::Debug for IngestOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestOptions")
            .field("auto_create", &self.auto_create)
            .field("reconcile_existing", &self.reconcile_existing)
            .field("quiet", &self.quiet)
            .field("error_mode", &self.error_mode)
            .field("after_row_failure", &self.after_row_failure)
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            auto_create: false,
            reconcile_existing: false,
            quiet: false,
            error_mode: ErrorMode::default(),
            after_row_failure: RowFailurePolicy::default(),
            observer: None,
            alert_at_or_above: IngestSeverity::Critical,
        }
    }
}

/// A field left out of a row's item because the list has no writable column for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedField {
    pub row: usize,
    pub field: String,
}

/// A failed row whose staged item survived the failed commit and was flushed later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LateCommit {
    pub row: usize,
    pub item_id: ItemId,
}

/// Everything a run did.
#[derive(Debug, Default)]
pub struct IngestReport {
    pub list: String,
    /// Whether the list was created by this run.
    pub created_list: bool,
    /// Columns added by schema provisioning, in creation order.
    pub provisioned: Vec<ColumnDescriptor>,
    /// Writable schema snapshot used for every row.
    pub columns: ColumnSet,
    /// One entry per input row, in input order.
    pub results: Vec<CommitResult>,
    /// Read-back records of committed items (empty when quiet).
    pub confirmations: Vec<Record>,
    pub dropped_fields: Vec<DroppedField>,
    /// Rows reported as failed whose item was nonetheless committed by a later flush.
    pub late_commits: Vec<LateCommit>,
}

impl IngestReport {
    pub fn committed(&self) -> usize {
        self.results.iter().filter(|r| r.success()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.committed()
    }

    fn stats(&self) -> IngestStats {
        IngestStats {
            rows: self.results.len(),
            committed: self.committed(),
            failed: self.failed(),
            late_committed: self.late_commits.len(),
            columns_provisioned: self.provisioned.len(),
        }
    }
}

/// Write `records` into the list named `list_name` through `session`.
///
/// Returns `Err` for fatal errors (an unresolvable list, a failed schema read) and, in
/// [`ErrorMode::Strict`], for the first error of any kind. Items committed before a strict abort
/// stay committed.
///
/// # Examples
///
/// ```rust
/// use list_ingest::ingestion::{ingest_records, IngestOptions};
/// use list_ingest::store::InMemoryStore;
/// use list_ingest::types::{ColumnKind, Record};
///
/// # fn main() -> Result<(), list_ingest::IngestError> {
/// let mut store = InMemoryStore::new();
/// let records = vec![Record::new().with("Title", "Hello").with("Score", 3.5f64)];
/// let opts = IngestOptions {
///     auto_create: true,
///     ..Default::default()
/// };
///
/// let report = ingest_records(&mut store, "Scores", &records, &opts)?;
/// assert_eq!(report.committed(), 1);
/// assert_eq!(report.columns.kind_of("Score"), Some(ColumnKind::Number));
/// # Ok(())
/// # }
/// ```
pub fn ingest_records<S: StoreSession>(
    session: &mut S,
    list_name: &str,
    records: &[Record],
    options: &IngestOptions,
) -> IngestResult<IngestReport> {
    let run = Run { list_name, options };
    let mut report = IngestReport {
        list: list_name.to_string(),
        ..Default::default()
    };

    tracing::debug!(list = list_name, rows = records.len(), "resolving list");
    let list = match run.fatal(session.resolve_list(list_name))? {
        Some(list) => list,
        None if options.auto_create => {
            tracing::debug!(list = list_name, "creating list");
            report.created_list = true;
            run.fatal(session.create_list(list_name))?
        }
        None => {
            return Err(run.fail(
                None,
                IngestError::ListNotFound {
                    list: list_name.to_string(),
                },
            ));
        }
    };

    report.columns = run.fatal(session.get_columns(&list))?.writable();

    if report.created_list || options.reconcile_existing {
        if let Some(sample) = records.first() {
            let wanted = reconcile(&report.columns, sample);
            tracing::debug!(list = list_name, missing = wanted.len(), "provisioning columns");
            let provisioned = provision(session, &list, &wanted);
            for column in &provisioned.created {
                run.column_provisioned(column);
            }
            report.provisioned = provisioned.created;
            if let Some(e) = provisioned.error {
                let e = run.fail(None, e);
                if options.error_mode == ErrorMode::Strict {
                    return Err(e);
                }
            }
            report.columns = run.fatal(session.get_columns(&list))?.writable();
        }
    }

    // Rows whose item was staged but whose commit failed; the session may still hold their work.
    let mut unsettled: Vec<usize> = Vec::new();

    for (idx0, record) in records.iter().enumerate() {
        let row = idx0 + 1;
        let mapped = map_row_with_report(record, &report.columns);
        for field in mapped.dropped {
            run.dropped(row, &field);
            report.dropped_fields.push(DroppedField { row, field });
        }

        let outcome = match stage_and_commit(session, &list, mapped.item, row) {
            Ok(mut ids) => {
                // This row's item was staged last; anything before it is earlier leftover work.
                let own = ids.pop();
                run.settle(session, &list, &mut unsettled, ids, &mut report);
                own.ok_or_else(|| IngestError::RowCommit {
                    row,
                    message: "store assigned no item id".to_string(),
                })
            }
            Err(failure) => {
                if failure.staged {
                    unsettled.push(row);
                }
                Err(failure.error)
            }
        };

        match outcome {
            Ok(id) => {
                if !options.quiet {
                    run.confirm(session, &list, row, &id, &mut report)?;
                }
                report.results.push(CommitResult {
                    row,
                    item_id: Some(id),
                    error: None,
                });
            }
            Err(e) => {
                let e = run.fail(Some(row), e);
                if options.error_mode == ErrorMode::Strict {
                    return Err(e);
                }
                if options.after_row_failure == RowFailurePolicy::FlushAndConfirm {
                    run.flush_after_failure(session, &list, row, &mut unsettled, &mut report);
                }
                report.results.push(CommitResult {
                    row,
                    item_id: None,
                    error: Some(e),
                });
            }
        }
    }

    if let Some(obs) = options.observer.as_ref() {
        obs.on_success(&IngestContext::run(list_name), report.stats());
    }
    Ok(report)
}

struct Unflushed {
    /// Whether the item reached the session before the failure.
    staged: bool,
    error: IngestError,
}

fn stage_and_commit<S: StoreSession>(
    session: &mut S,
    list: &S::List,
    item: StagedItem,
    row: usize,
) -> Result<Vec<ItemId>, Unflushed> {
    let row_err = |message: String| IngestError::RowCommit { row, message };
    session.stage_new_item(list, item).map_err(|e| Unflushed {
        staged: false,
        error: row_err(e.to_string()),
    })?;
    session.commit().map_err(|e| Unflushed {
        staged: true,
        error: row_err(e.to_string()),
    })
}

struct Run<'a> {
    list_name: &'a str,
    options: &'a IngestOptions,
}

impl Run<'_> {
    fn ctx(&self, row: Option<usize>) -> IngestContext {
        match row {
            Some(row) => IngestContext::row(self.list_name, row),
            None => IngestContext::run(self.list_name),
        }
    }

    /// Report an error to the observer and hand it back.
    fn fail(&self, row: Option<usize>, e: IngestError) -> IngestError {
        if let Some(obs) = self.options.observer.as_ref() {
            let ctx = self.ctx(row);
            let sev = severity_for_error(&e);
            obs.on_failure(&ctx, sev, &e);
            if sev >= self.options.alert_at_or_above {
                obs.on_alert(&ctx, sev, &e);
            }
        }
        e
    }

    /// Store errors outside the row loop end the run in either mode.
    fn fatal<T>(&self, result: crate::store::StoreResult<T>) -> IngestResult<T> {
        result.map_err(|e| self.fail(None, e.into()))
    }

    fn warn(&self, row: usize, warning: IngestError) {
        if let Some(obs) = self.options.observer.as_ref() {
            obs.on_warning(&self.ctx(Some(row)), &warning);
        }
    }

    fn dropped(&self, row: usize, field: &str) {
        tracing::debug!(list = self.list_name, row, field, "dropping unknown field");
        self.warn(
            row,
            IngestError::UnknownFieldDropped {
                row,
                field: field.to_string(),
            },
        );
    }

    fn column_provisioned(&self, column: &ColumnDescriptor) {
        if let Some(obs) = self.options.observer.as_ref() {
            obs.on_column_provisioned(&self.ctx(None), column);
        }
    }

    fn confirm<S: StoreSession>(
        &self,
        session: &mut S,
        list: &S::List,
        row: usize,
        id: &ItemId,
        report: &mut IngestReport,
    ) -> IngestResult<()> {
        match session.read_item(list, id) {
            Ok(record) => report.confirmations.push(record),
            Err(e) => {
                let e = self.fail(Some(row), e.into());
                if self.options.error_mode == ErrorMode::Strict {
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    /// Attribute ids from a successful flush to rows that failed earlier.
    ///
    /// A successful commit flushes everything pending, so `unsettled` is emptied. Ids are matched
    /// to the most recently failed rows in staging order; rows left without an id had their work
    /// discarded by the store.
    fn settle<S: StoreSession>(
        &self,
        session: &mut S,
        list: &S::List,
        unsettled: &mut Vec<usize>,
        ids: Vec<ItemId>,
        report: &mut IngestReport,
    ) {
        let rows = std::mem::take(unsettled);
        if ids.is_empty() {
            return;
        }
        let unattributed = ids.len().saturating_sub(rows.len());
        if unattributed > 0 {
            tracing::warn!(list = self.list_name, unattributed, "flush returned ids for no known row");
        }
        let first_row = rows.len().saturating_sub(ids.len());
        let confirm = self.options.after_row_failure == RowFailurePolicy::FlushAndConfirm
            && !self.options.quiet;

        for (&row, item_id) in rows[first_row..].iter().zip(ids.into_iter().skip(unattributed)) {
            tracing::debug!(list = self.list_name, row, item_id = %item_id, "failed row committed by later flush");
            self.warn(
                row,
                IngestError::CommittedAfterFailure {
                    row,
                    item_id: item_id.clone(),
                },
            );
            if confirm {
                match session.read_item(list, &item_id) {
                    Ok(record) => report.confirmations.push(record),
                    Err(e) => {
                        self.fail(Some(row), e.into());
                    }
                }
            }
            report.late_commits.push(LateCommit { row, item_id });
        }
    }

    fn flush_after_failure<S: StoreSession>(
        &self,
        session: &mut S,
        list: &S::List,
        row: usize,
        unsettled: &mut Vec<usize>,
        report: &mut IngestReport,
    ) {
        tracing::debug!(list = self.list_name, row, "flushing session after failed row");
        match session.commit() {
            Ok(ids) => self.settle(session, list, unsettled, ids, report),
            Err(e) => {
                self.fail(
                    Some(row),
                    IngestError::RowCommit {
                        row,
                        message: e.to_string(),
                    },
                );
            }
        }
    }
}

/// Owned ingestion request.
///
/// This can be useful if you want to enqueue ingestion work in a job system.
#[derive(Clone)]
pub struct IngestRequest {
    /// Name of the target list.
    pub list_name: String,
    /// Options controlling ingestion.
    pub options: IngestOptions,
}

impl fmt::Debug for IngestRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestRequest")
            .field("list_name", &self.list_name)
            .field("options", &self.options)
            .finish()
    }
}

impl IngestRequest {
    pub fn new(list_name: impl Into<String>) -> Self {
        Self {
            list_name: list_name.into(),
            options: IngestOptions::default(),
        }
    }

    /// Execute the request by calling [`ingest_records`].
    pub fn run<S: StoreSession>(&self, session: &mut S, records: &[Record]) -> IngestResult<IngestReport> {
        ingest_records(session, &self.list_name, records, &self.options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{InMemoryStore, StoreCall};
    use crate::types::{ColumnKind, Value};

    fn titles(titles: &[&str]) -> Vec<Record> {
        titles.iter().map(|t| Record::new().with("Title", *t)).collect()
    }

    #[test]
    fn schema_is_read_once_per_run_for_existing_list() {
        let mut store = InMemoryStore::new().with_list("L", InMemoryStore::default_columns());
        let report = ingest_records(&mut store, "L", &titles(&["a", "b", "c"]), &IngestOptions::default()).unwrap();
        assert_eq!(report.committed(), 3);
        let reads = store.journal().iter().filter(|c| **c == StoreCall::GetColumns).count();
        assert_eq!(reads, 1);
    }

    #[test]
    fn existing_list_never_gains_columns_by_default() {
        let mut store = InMemoryStore::new().with_list("L", InMemoryStore::default_columns());
        let records = vec![Record::new().with("Title", "a").with("Extra", 1i32)];
        let report = ingest_records(&mut store, "L", &records, &IngestOptions::default()).unwrap();
        assert!(report.provisioned.is_empty());
        assert_eq!(report.dropped_fields, vec![DroppedField { row: 1, field: "Extra".to_string() }]);
        assert!(!store.columns("L").unwrap().contains("Extra"));
    }

    #[test]
    fn reconcile_existing_provisions_on_existing_list() {
        let mut store = InMemoryStore::new().with_list("L", InMemoryStore::default_columns());
        let records = vec![Record::new().with("Title", "a").with("Due", Value::text("2024-01-01"))];
        let opts = IngestOptions {
            reconcile_existing: true,
            ..Default::default()
        };
        let report = ingest_records(&mut store, "L", &records, &opts).unwrap();
        assert_eq!(report.provisioned, vec![ColumnDescriptor::new("Due", ColumnKind::Text)]);
        assert_eq!(report.committed(), 1);
    }

    #[test]
    fn provisioning_happens_before_the_first_commit() {
        let mut store = InMemoryStore::new();
        let records = vec![Record::new().with("Title", "a").with("Score", 1.0f64)];
        let opts = IngestOptions {
            auto_create: true,
            quiet: true,
            ..Default::default()
        };
        ingest_records(&mut store, "L", &records, &opts).unwrap();
        let journal = store.journal();
        let created = journal
            .iter()
            .position(|c| *c == StoreCall::CreateColumn("Score".to_string()))
            .unwrap();
        let first_commit = journal.iter().position(|c| *c == StoreCall::Commit).unwrap();
        assert!(created < first_commit);
    }

    #[test]
    fn empty_input_with_auto_create_only_creates_the_list() {
        let mut store = InMemoryStore::new();
        let opts = IngestOptions {
            auto_create: true,
            ..Default::default()
        };
        let report = ingest_records(&mut store, "L", &[], &opts).unwrap();
        assert!(report.created_list);
        assert!(report.results.is_empty());
        assert!(store.columns("L").is_some());
    }

    #[test]
    fn quiet_skips_read_back() {
        let mut store = InMemoryStore::new().with_list("L", InMemoryStore::default_columns());
        let opts = IngestOptions {
            quiet: true,
            ..Default::default()
        };
        let report = ingest_records(&mut store, "L", &titles(&["a"]), &opts).unwrap();
        assert!(report.confirmations.is_empty());
        assert!(!store.journal().iter().any(|c| matches!(c, StoreCall::ReadItem(_))));
    }

    #[test]
    fn request_runs_with_its_options() {
        let mut store = InMemoryStore::new();
        let mut req = IngestRequest::new("L");
        req.options.auto_create = true;
        let report = req.run(&mut store, &titles(&["a"])).unwrap();
        assert!(report.created_list);
        assert_eq!(report.confirmations.len(), 1);
    }
}
