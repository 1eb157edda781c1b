//! In-process [`StoreSession`] implementation.
//!
//! Behaves like a remote list store: new lists come with a computed `ID` column and a `Title`
//! text column, items get per-list numeric ids on commit, and wire values are decoded from
//! their markup-escaped form when stored. Failures can be injected per commit call or per
//! column name, and every call is recorded in a journal.

use std::collections::HashSet;

use crate::coerce::unescape_markup;
use crate::types::{ColumnDescriptor, ColumnKind, ColumnSet, ItemId, Record, StagedItem, Value};

use super::{StoreError, StoreResult, StoreSession};

/// Handle to a list inside an [`InMemoryStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemoryListId(usize);

/// One recorded call against an [`InMemoryStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    ResolveList(String),
    CreateList(String),
    GetColumns,
    CreateColumn(String),
    StageNewItem,
    Commit,
    ReadItem(ItemId),
}

#[derive(Debug, Clone)]
struct MemoryItem {
    id: u64,
    fields: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
struct MemoryList {
    name: String,
    columns: ColumnSet,
    items: Vec<MemoryItem>,
    next_id: u64,
}

impl MemoryList {
    fn new(name: &str, columns: ColumnSet) -> Self {
        Self {
            name: name.to_string(),
            columns,
            items: Vec::new(),
            next_id: 1,
        }
    }
}

/// An in-memory list store with failure injection.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    lists: Vec<MemoryList>,
    pending: Vec<(MemoryListId, StagedItem)>,
    commit_calls: usize,
    failing_commits: HashSet<usize>,
    stalled_commits: HashSet<usize>,
    failing_columns: HashSet<String>,
    journal: Vec<StoreCall>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Columns every newly created list starts with.
    pub fn default_columns() -> ColumnSet {
        ColumnSet::new(vec![
            ColumnDescriptor::new("ID", ColumnKind::Computed),
            ColumnDescriptor::new("Title", ColumnKind::Text),
        ])
    }

    /// Add an existing list with exactly `columns`.
    pub fn with_list(mut self, name: &str, columns: ColumnSet) -> Self {
        self.lists.push(MemoryList::new(name, columns));
        self
    }

    /// Make the `n`-th call to [`StoreSession::commit`] (1-based) fail and discard its work.
    pub fn fail_commit(mut self, n: usize) -> Self {
        self.failing_commits.insert(n);
        self
    }

    /// Make the `n`-th call to [`StoreSession::commit`] (1-based) fail with a transport error
    /// while keeping its work pending, so the next successful commit flushes it.
    pub fn fail_commit_keep_pending(mut self, n: usize) -> Self {
        self.stalled_commits.insert(n);
        self
    }

    /// Make creation of any column named `name` fail.
    pub fn fail_column_creation(mut self, name: &str) -> Self {
        self.failing_columns.insert(name.to_string());
        self
    }

    /// Every call made so far, in order.
    pub fn journal(&self) -> &[StoreCall] {
        &self.journal
    }

    /// All columns of a list, computed ones included.
    pub fn columns(&self, list: &str) -> Option<&ColumnSet> {
        self.find(list).map(|l| &l.columns)
    }

    /// Committed items of a list as records (with their `ID`), in commit order.
    pub fn items(&self, list: &str) -> Vec<Record> {
        self.find(list)
            .map(|l| l.items.iter().map(item_record).collect())
            .unwrap_or_default()
    }

    fn find(&self, name: &str) -> Option<&MemoryList> {
        self.lists.iter().find(|l| l.name == name)
    }

    fn list_mut(&mut self, id: MemoryListId) -> StoreResult<&mut MemoryList> {
        self.lists.get_mut(id.0).ok_or_else(|| StoreError::NotFound {
            what: format!("list #{}", id.0),
        })
    }

    fn check_item(&self, list: MemoryListId, item: &StagedItem) -> StoreResult<()> {
        let target = self.lists.get(list.0).ok_or_else(|| StoreError::NotFound {
            what: format!("list #{}", list.0),
        })?;
        for column in item.columns() {
            match target.columns.kind_of(column) {
                Some(kind) if kind.is_writable() => {}
                Some(_) => {
                    return Err(StoreError::Rejected {
                        message: format!("column '{column}' is read-only"),
                    });
                }
                None => {
                    return Err(StoreError::Rejected {
                        message: format!("column '{column}' does not exist"),
                    });
                }
            }
        }
        Ok(())
    }
}

fn item_record(item: &MemoryItem) -> Record {
    let mut record = Record::new().with("ID", Value::UInt64(item.id));
    for (name, value) in &item.fields {
        record.insert(name.as_str(), Value::text(value.as_str()));
    }
    record
}

impl StoreSession for InMemoryStore {
    type List = MemoryListId;

    fn resolve_list(&mut self, name: &str) -> StoreResult<Option<MemoryListId>> {
        self.journal.push(StoreCall::ResolveList(name.to_string()));
        Ok(self
            .lists
            .iter()
            .position(|l| l.name == name)
            .map(MemoryListId))
    }

    fn create_list(&mut self, name: &str) -> StoreResult<MemoryListId> {
        self.journal.push(StoreCall::CreateList(name.to_string()));
        if self.find(name).is_some() {
            return Err(StoreError::Rejected {
                message: format!("list '{name}' already exists"),
            });
        }
        self.lists.push(MemoryList::new(name, Self::default_columns()));
        Ok(MemoryListId(self.lists.len() - 1))
    }

    fn get_columns(&mut self, list: &MemoryListId) -> StoreResult<ColumnSet> {
        self.journal.push(StoreCall::GetColumns);
        Ok(self.list_mut(*list)?.columns.writable())
    }

    fn create_column(&mut self, list: &MemoryListId, column: &ColumnDescriptor) -> StoreResult<()> {
        self.journal.push(StoreCall::CreateColumn(column.name.clone()));
        if self.failing_columns.contains(&column.name) {
            return Err(StoreError::Rejected {
                message: format!("column '{}' could not be created", column.name),
            });
        }
        let target = self.list_mut(*list)?;
        if !target.columns.insert(column.clone()) {
            return Err(StoreError::Rejected {
                message: format!("column '{}' already exists", column.name),
            });
        }
        Ok(())
    }

    fn stage_new_item(&mut self, list: &MemoryListId, item: StagedItem) -> StoreResult<()> {
        self.journal.push(StoreCall::StageNewItem);
        self.list_mut(*list)?;
        self.pending.push((*list, item));
        Ok(())
    }

    fn commit(&mut self) -> StoreResult<Vec<ItemId>> {
        self.journal.push(StoreCall::Commit);
        self.commit_calls += 1;
        if self.stalled_commits.contains(&self.commit_calls) {
            return Err(StoreError::Transport {
                message: format!("commit #{} timed out", self.commit_calls),
            });
        }
        let pending = std::mem::take(&mut self.pending);

        if self.failing_commits.contains(&self.commit_calls) {
            return Err(StoreError::Rejected {
                message: format!("commit #{} failed", self.commit_calls),
            });
        }
        for (list, item) in &pending {
            self.check_item(*list, item)?;
        }

        let mut ids = Vec::with_capacity(pending.len());
        for (list, item) in pending {
            let target = self.list_mut(list)?;
            let id = target.next_id;
            target.next_id += 1;
            let fields = item
                .iter()
                .map(|(name, value)| (name.to_string(), unescape_markup(value.as_str()).into_owned()))
                .collect();
            target.items.push(MemoryItem { id, fields });
            ids.push(ItemId::new(id.to_string()));
        }
        Ok(ids)
    }

    fn read_item(&mut self, list: &MemoryListId, id: &ItemId) -> StoreResult<Record> {
        self.journal.push(StoreCall::ReadItem(id.clone()));
        let target = self.list_mut(*list)?;
        target
            .items
            .iter()
            .find(|item| item.id.to_string() == id.as_str())
            .map(item_record)
            .ok_or_else(|| StoreError::NotFound {
                what: format!("item {id} in list '{}'", target.name),
            })
    }
}
