//! State a grid view keeps on the interaction thread.
//!
//! A [`GridView`] owns the window over its dataset, the latest applied search
//! result and what is needed to highlight and navigate matches. It is fed
//! [`SearchEvent`]s by its owner, which also holds the coordinator; the view
//! itself never talks to the coordinator.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::compile::ColumnSet;
use crate::config::EngineConfig;
use crate::dataset::{CellRef, ColumnId, Dataset, RowId, RowRef};
use crate::error::{Result, TabfindError};
use crate::execute::ScanScope;
use crate::session::{SearchEvent, SearchResult, Seq};
use crate::window::ViewWindow;

/// A highlighted cell, as visited by match navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MatchCell {
    pub row: RowId,
    pub column: ColumnId,
}

/// Outcome of asking for more rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Growth {
    pub added: u64,
    /// The active search only covered the previous window and should be
    /// submitted again with the view's new scan scope.
    pub rescan: bool,
}

pub struct GridView {
    dataset: Arc<Dataset>,
    batch_size: u32,
    scroll_proximity: u32,
    window: ViewWindow,
    result: Option<SearchResult>,
    // highest seq ever applied, kept across reloads
    seq_floor: Seq,
    results_window: ViewWindow,
    cells: Vec<MatchCell>,
    cursor: Option<usize>,
    hidden: BTreeSet<ColumnId>,
}
impl GridView {
    pub fn new(dataset: Arc<Dataset>, config: &EngineConfig) -> Self {
        let window = ViewWindow::new(dataset.row_count(), config.batch_size);
        Self {
            dataset,
            batch_size: config.batch_size,
            scroll_proximity: config.scroll_proximity,
            window,
            result: None,
            seq_floor: 0,
            results_window: ViewWindow::new(0, config.batch_size),
            cells: Vec::new(),
            cursor: None,
            hidden: BTreeSet::new(),
        }
    }
    pub fn dataset(&self) -> &Arc<Dataset> {
        &self.dataset
    }
    pub fn window(&self) -> ViewWindow {
        self.window
    }
    /// What a search submitted for this view should scan.
    pub fn scan_scope(&self) -> ScanScope {
        ScanScope::Materialized(self.window.materialized_count())
    }
    pub fn materialized_rows(&self) -> impl Iterator<Item = RowRef<'_>> + '_ {
        self.dataset.rows(self.window.range())
    }

    // ------------- Windowing -------------
    pub fn request_more_rows(&mut self) -> Growth {
        let added = self.window.grow(self.batch_size);
        Growth {
            added,
            rescan: added > 0 && self.result.is_some(),
        }
    }
    /// Called with the last visible row whenever the grid scrolls.
    pub fn on_scroll(&mut self, position: u64) -> Option<Growth> {
        self.window
            .near_boundary(position, self.scroll_proximity)
            .then(|| self.request_more_rows())
    }
    /// Replaces the dataset snapshot; the window starts over and any
    /// result, which referred to the old rows, is discarded. Results still
    /// arriving for the old snapshot are refused by [`GridView::apply`].
    pub fn reload(&mut self, dataset: Arc<Dataset>) {
        debug!(dataset = dataset.name(), rows = dataset.row_count(), "view reloaded");
        self.window.reset(dataset.row_count(), self.batch_size);
        self.dataset = dataset;
        self.hidden.clear();
        self.clear_search();
    }

    // ------------- Results -------------
    /// Applies a delivered search event. Returns whether the view changed.
    /// Failed searches leave the previous result in place, as do events
    /// not newer than the last one applied and results computed on another
    /// dataset snapshot.
    pub fn apply(&mut self, event: &SearchEvent) -> bool {
        match event {
            SearchEvent::Completed(result) => {
                if result.seq <= self.seq_floor {
                    return false;
                }
                if result.snapshot != self.dataset.snapshot() {
                    debug!(
                        seq = result.seq,
                        snapshot = result.snapshot,
                        current = self.dataset.snapshot(),
                        "result for another snapshot ignored"
                    );
                    return false;
                }
                self.seq_floor = result.seq;
                self.results_window
                    .reset(result.matched_rows.len(), self.batch_size);
                self.cells = result
                    .matched_rows
                    .iter()
                    .flat_map(|row| {
                        result
                            .match_index
                            .columns(row)
                            .into_iter()
                            .flatten()
                            .map(move |&column| MatchCell { row, column })
                    })
                    .collect();
                self.cursor = None;
                self.result = Some(result.clone());
                true
            }
            SearchEvent::Failed { .. } => false,
        }
    }
    pub fn clear_search(&mut self) {
        self.result = None;
        self.results_window.reset(0, self.batch_size);
        self.cells.clear();
        self.cursor = None;
    }
    pub fn result(&self) -> Option<&SearchResult> {
        self.result.as_ref()
    }
    pub fn query(&self) -> Option<&str> {
        self.result.as_ref().map(|r| r.query.as_str())
    }
    pub fn applied_seq(&self) -> Option<Seq> {
        self.result.as_ref().map(|r| r.seq)
    }
    pub fn total_found(&self) -> u64 {
        self.result.as_ref().map_or(0, |r| r.total_found)
    }
    pub fn is_highlighted(&self, row: RowId, column: ColumnId) -> bool {
        !self.hidden.contains(&column)
            && self
                .result
                .as_ref()
                .is_some_and(|r| r.match_index.contains(row, column))
    }
    pub fn highlighted_columns(&self, row: RowId) -> Option<&ColumnSet> {
        self.result.as_ref()?.match_index.columns(row)
    }
    /// The materialized part of the results pane, in original row order.
    pub fn matched_rows(&self) -> Vec<RowId> {
        let take = usize::try_from(self.results_window.materialized_count()).unwrap_or(usize::MAX);
        self.result
            .as_ref()
            .map(|r| r.matched_rows.iter().take(take).collect())
            .unwrap_or_default()
    }
    pub fn results_window(&self) -> ViewWindow {
        self.results_window
    }
    pub fn request_more_results(&mut self) -> u64 {
        self.results_window.grow(self.batch_size)
    }

    // ------------- Navigation -------------
    /// Moves to the next highlighted cell, wrapping around, and makes sure
    /// its row is materialized.
    pub fn next_match(&mut self) -> Option<MatchCell> {
        self.step(true)
    }
    pub fn previous_match(&mut self) -> Option<MatchCell> {
        self.step(false)
    }
    pub fn current_match(&self) -> Option<MatchCell> {
        self.cursor.and_then(|i| self.cells.get(i)).copied()
    }
    fn step(&mut self, forward: bool) -> Option<MatchCell> {
        let len = self.cells.len();
        if len == 0 {
            return None;
        }
        let mut index = self.cursor;
        // hidden columns are skipped, at most one full lap
        for _ in 0..len {
            let next = match (index, forward) {
                (None, true) => 0,
                (None, false) => len - 1,
                (Some(i), true) => (i + 1) % len,
                (Some(i), false) => (i + len - 1) % len,
            };
            index = Some(next);
            let cell = self.cells[next];
            if !self.hidden.contains(&cell.column) {
                self.cursor = index;
                self.window.reveal(cell.row, self.batch_size);
                return Some(cell);
            }
        }
        None
    }

    // ------------- Columns -------------
    pub fn set_column_visible(&mut self, name: &str, visible: bool) -> Result<()> {
        let column = self
            .dataset
            .column_id(name)
            .ok_or_else(|| TabfindError::UnknownColumn(name.to_string()))?;
        if visible {
            self.hidden.remove(&column);
        } else {
            self.hidden.insert(column);
        }
        Ok(())
    }
    pub fn visible_columns(&self) -> Vec<ColumnId> {
        (0..self.dataset.column_count())
            .filter(|c| !self.hidden.contains(c))
            .collect()
    }
    /// The visible cells of a materialized row.
    pub fn project(&self, row: RowId) -> Option<Vec<Option<CellRef<'_>>>> {
        if !self.window.contains(row) {
            return None;
        }
        let row = self.dataset.row(row)?;
        Some(self.visible_columns().into_iter().map(|c| row.get(c)).collect())
    }
}

// ------------- Found tally -------------
pub type ViewId = u64;

/// Match counts of all views searched with the same text, so a single
/// "X of Y found" line can be shown.
#[derive(Debug, Clone, Default)]
pub struct FoundTally {
    counts: BTreeMap<ViewId, u64>,
}
impl FoundTally {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn record(&mut self, view: ViewId, total_found: u64) {
        self.counts.insert(view, total_found);
    }
    pub fn remove(&mut self, view: ViewId) {
        self.counts.remove(&view);
    }
    pub fn clear(&mut self) {
        self.counts.clear();
    }
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }
    pub fn summary(&self, current: ViewId) -> FoundSummary {
        FoundSummary {
            current: self.counts.get(&current).copied().unwrap_or(0),
            total: self.total(),
            views: self.counts.len(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FoundSummary {
    pub current: u64,
    pub total: u64,
    pub views: usize,
}
impl fmt::Display for FoundSummary {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.views > 1 {
            write!(f, "{} of {} total found", self.current, self.total)
        } else {
            write!(f, "{} found items", self.current)
        }
    }
}
