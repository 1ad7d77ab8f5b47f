// used for the set of matched rows
use roaring::RoaringTreemap;
// used for the match index, keyed by row identifiers
use seahash::SeaHasher;
use tracing::debug;

use core::convert::Infallible;
use core::hash::BuildHasherDefault;
use std::collections::HashMap;
use std::collections::hash_map::Iter;

use crate::compile::{ColumnSet, CompiledExpr};
use crate::dataset::{ColumnId, Dataset, RowId};
use crate::error::EvaluationError;

pub type RowHasher = BuildHasherDefault<SeaHasher>;

/// Which rows a search examines for highlighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanScope {
    /// The first `n` rows, i.e. what the view has materialized so far.
    Materialized(u64),
    Full,
}
impl ScanScope {
    pub fn limit(self, dataset: &Dataset) -> u64 {
        match self {
            ScanScope::Materialized(n) => n.min(dataset.row_count()),
            ScanScope::Full => dataset.row_count(),
        }
    }
}

// ------------- MatchIndex -------------
/// For every matched row, the columns that made it match.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchIndex {
    entries: HashMap<RowId, ColumnSet, RowHasher>,
}
impl MatchIndex {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn insert(&mut self, row: RowId, columns: ColumnSet) {
        self.entries.insert(row, columns);
    }
    pub fn columns(&self, row: RowId) -> Option<&ColumnSet> {
        self.entries.get(&row)
    }
    pub fn contains(&self, row: RowId, column: ColumnId) -> bool {
        self.entries
            .get(&row)
            .is_some_and(|columns| columns.contains(&column))
    }
    pub fn contains_row(&self, row: RowId) -> bool {
        self.entries.contains_key(&row)
    }
    pub fn len(&self) -> usize {
        self.entries.len()
    }
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
    /// Number of highlighted cells over all rows.
    pub fn cell_count(&self) -> usize {
        self.entries.values().map(|c| c.len()).sum()
    }
    pub fn iter(&self) -> Iter<'_, RowId, ColumnSet> {
        self.entries.iter()
    }
}

// ------------- Execution -------------
#[derive(Debug, Clone, PartialEq)]
pub struct FilterOutcome {
    /// Matches within the scanned scope, in original row order.
    pub matched_rows: RoaringTreemap,
    pub match_index: MatchIndex,
    /// Matches over the whole dataset, including rows beyond the scope.
    pub total_found: u64,
    /// Rows examined for highlighting.
    pub scanned: u64,
}

/// Runs a compiled filter to completion.
///
/// Only rows inside `scope` are indexed, but every row of the dataset is
/// tested so that `total_found` covers the whole table. A scoped search
/// therefore still costs a pass over all rows.
pub fn execute(compiled: &CompiledExpr, dataset: &Dataset, scope: ScanScope) -> FilterOutcome {
    match scan(compiled, dataset, scope, |_| Ok::<(), Infallible>(())) {
        Ok(outcome) => outcome,
        Err(never) => match never {},
    }
}

/// Runs a compiled filter, polling `interrupt` every `interval` rows.
///
/// Rows inside `scope` are evaluated with column tracking and indexed. The
/// remaining rows are only counted towards `total_found`, with the cheaper
/// short-circuiting test, and are polled for interruption like the rest.
pub fn execute_with<F>(
    compiled: &CompiledExpr,
    dataset: &Dataset,
    scope: ScanScope,
    interval: u32,
    interrupt: F,
) -> Result<FilterOutcome, EvaluationError>
where
    F: Fn() -> bool,
{
    let interval = u64::from(interval.max(1));
    scan(compiled, dataset, scope, |id| {
        if id > 0 && id % interval == 0 && interrupt() {
            debug!(scanned = id, "scan interrupted");
            return Err(EvaluationError::Interrupted { scanned: id });
        }
        Ok(())
    })
}

fn scan<E, C>(
    compiled: &CompiledExpr,
    dataset: &Dataset,
    scope: ScanScope,
    mut checkpoint: C,
) -> Result<FilterOutcome, E>
where
    C: FnMut(RowId) -> Result<(), E>,
{
    let limit = scope.limit(dataset);
    let mut matched_rows = RoaringTreemap::new();
    let mut match_index = MatchIndex::new();
    let mut beyond = 0u64;
    for row in dataset.rows(0..dataset.row_count()) {
        let id = row.id();
        checkpoint(id)?;
        if id < limit {
            let (verdict, columns) = compiled.evaluate(&row);
            if verdict {
                matched_rows.insert(id);
                match_index.insert(id, columns);
            }
        } else if compiled.matches(&row) {
            beyond += 1;
        }
    }
    let total_found = matched_rows.len() + beyond;
    debug!(
        dataset = dataset.name(),
        scanned = limit,
        matched = matched_rows.len(),
        total_found,
        "scan complete"
    );
    Ok(FilterOutcome {
        matched_rows,
        match_index,
        total_found,
        scanned: limit,
    })
}
