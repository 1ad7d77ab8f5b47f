// used to keep the one-to-one mapping between column names and their positions
use bimap::BiMap;
use serde::{Deserialize, Serialize};

// used to print out readable forms of cells and types
use std::fmt;
use std::ops::Range;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::DatasetError;

// ------------- Identifiers -------------
// A row is identified by its original position in the dataset. Filtering and
// paging never renumber rows, so identifiers stay valid across searches.
pub type RowId = u64;
pub type ColumnId = usize;
/// Identifies one built dataset, so results can be matched to the rows they
/// were computed on.
pub type SnapshotId = u64;

static NEXT_SNAPSHOT: AtomicU64 = AtomicU64::new(1);

// ------------- Types and values -------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnType {
    Integer,
    Float,
    Text,
}
impl ColumnType {
    pub fn is_numeric(self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::Float)
    }
}
impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ColumnType::Integer => write!(f, "Integer"),
            ColumnType::Float => write!(f, "Float"),
            ColumnType::Text => write!(f, "Text"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    Float(f64),
    Text(String),
}
impl Value {
    pub fn is_numeric(&self) -> bool {
        !matches!(self, Value::Text(_))
    }
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(x) => Some(*x),
            Value::Text(_) => None,
        }
    }
}
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}
impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}
impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}
impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_owned())
    }
}
impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

/// A borrowed view of a single cell, handed out while rows are materialized.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CellRef<'a> {
    Integer(i64),
    Float(f64),
    Text(&'a str),
}
impl CellRef<'_> {
    pub fn to_value(self) -> Value {
        match self {
            CellRef::Integer(i) => Value::Integer(i),
            CellRef::Float(x) => Value::Float(x),
            CellRef::Text(s) => Value::Text(s.to_owned()),
        }
    }
}
impl fmt::Display for CellRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CellRef::Integer(i) => write!(f, "{}", i),
            CellRef::Float(x) => write!(f, "{}", x),
            CellRef::Text(s) => write!(f, "{}", s),
        }
    }
}

// ------------- Column -------------
#[derive(Debug, Clone)]
enum ColumnData {
    Integer(Vec<Option<i64>>),
    Float(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
}

#[derive(Debug, Clone)]
pub struct Column {
    name: String,
    column_type: ColumnType,
    data: ColumnData,
}
impl Column {
    fn new(name: String, column_type: ColumnType) -> Self {
        let data = match column_type {
            ColumnType::Integer => ColumnData::Integer(Vec::new()),
            ColumnType::Float => ColumnData::Float(Vec::new()),
            ColumnType::Text => ColumnData::Text(Vec::new()),
        };
        Self {
            name,
            column_type,
            data,
        }
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn column_type(&self) -> ColumnType {
        self.column_type
    }
    pub fn cell(&self, row: RowId) -> Option<CellRef<'_>> {
        let i = usize::try_from(row).ok()?;
        match &self.data {
            ColumnData::Integer(v) => v.get(i).copied().flatten().map(CellRef::Integer),
            ColumnData::Float(v) => v.get(i).copied().flatten().map(CellRef::Float),
            ColumnData::Text(v) => v.get(i).and_then(|s| s.as_deref()).map(CellRef::Text),
        }
    }
    // cells are checked by the builder before any of them is pushed
    fn push(&mut self, cell: Option<Value>) {
        match (&mut self.data, cell) {
            (ColumnData::Integer(v), Some(Value::Integer(i))) => v.push(Some(i)),
            (ColumnData::Float(v), Some(Value::Float(x))) => v.push(Some(x)),
            (ColumnData::Float(v), Some(Value::Integer(i))) => v.push(Some(i as f64)),
            (ColumnData::Text(v), Some(Value::Text(s))) => v.push(Some(s)),
            (ColumnData::Integer(v), _) => v.push(None),
            (ColumnData::Float(v), _) => v.push(None),
            (ColumnData::Text(v), _) => v.push(None),
        }
    }
    fn accepts(&self, cell: &Option<Value>) -> bool {
        match (self.column_type, cell) {
            (_, None) => true,
            (ColumnType::Integer, Some(Value::Integer(_))) => true,
            (ColumnType::Float, Some(Value::Float(_) | Value::Integer(_))) => true,
            (ColumnType::Text, Some(Value::Text(_))) => true,
            _ => false,
        }
    }
}

// ------------- Dataset -------------
/// A typed, column-oriented table. Once built it is never mutated; a reload
/// produces a new dataset, which is shared between the interaction thread and
/// search workers as an `Arc<Dataset>` snapshot.
#[derive(Debug, Clone)]
pub struct Dataset {
    name: String,
    columns: Vec<Column>,
    lookup: BiMap<String, ColumnId>,
    row_count: u64,
    snapshot: SnapshotId,
}
impl Dataset {
    pub fn builder(name: impl Into<String>) -> DatasetBuilder {
        DatasetBuilder::new(name)
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }
    pub fn column(&self, column: ColumnId) -> Option<&Column> {
        self.columns.get(column)
    }
    pub fn column_id(&self, name: &str) -> Option<ColumnId> {
        self.lookup.get_by_left(name).copied()
    }
    pub fn column_name(&self, column: ColumnId) -> Option<&str> {
        self.lookup.get_by_right(&column).map(String::as_str)
    }
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }
    pub fn snapshot(&self) -> SnapshotId {
        self.snapshot
    }
    pub fn row_count(&self) -> u64 {
        self.row_count
    }
    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }
    pub fn row(&self, id: RowId) -> Option<RowRef<'_>> {
        (id < self.row_count).then_some(RowRef { dataset: self, id })
    }
    /// Rows in the given id range, clipped to the dataset.
    pub fn rows(&self, range: Range<RowId>) -> impl Iterator<Item = RowRef<'_>> + '_ {
        let end = range.end.min(self.row_count);
        (range.start..end).map(move |id| RowRef { dataset: self, id })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RowRef<'a> {
    dataset: &'a Dataset,
    id: RowId,
}
impl<'a> RowRef<'a> {
    pub fn id(&self) -> RowId {
        self.id
    }
    pub fn dataset(&self) -> &'a Dataset {
        self.dataset
    }
    pub fn get(&self, column: ColumnId) -> Option<CellRef<'a>> {
        self.dataset.columns.get(column)?.cell(self.id)
    }
    pub fn get_by_name(&self, name: &str) -> Option<CellRef<'a>> {
        self.get(self.dataset.column_id(name)?)
    }
    pub fn cells(&self) -> Vec<Option<CellRef<'a>>> {
        self.dataset
            .columns
            .iter()
            .map(|c| c.cell(self.id))
            .collect()
    }
}

// ------------- Builder -------------
/// Used by the loading side (CSV, SQLite, ...) to hand a table to the engine.
#[derive(Debug)]
pub struct DatasetBuilder {
    name: String,
    columns: Vec<Column>,
    lookup: BiMap<String, ColumnId>,
    row_count: u64,
}
impl DatasetBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            lookup: BiMap::new(),
            row_count: 0,
        }
    }
    pub fn column(
        mut self,
        name: impl Into<String>,
        column_type: ColumnType,
    ) -> Result<Self, DatasetError> {
        let name = name.into();
        if self.lookup.contains_left(&name) {
            return Err(DatasetError::DuplicateColumn(name));
        }
        self.lookup.insert(name.clone(), self.columns.len());
        self.columns.push(Column::new(name, column_type));
        Ok(self)
    }
    /// Appends a row, either completely or not at all. Cells given as `None`
    /// are missing values.
    pub fn push_row<I, V>(&mut self, cells: I) -> Result<RowId, DatasetError>
    where
        I: IntoIterator<Item = V>,
        V: Into<Option<Value>>,
    {
        let row = self.row_count;
        let cells: Vec<Option<Value>> = cells.into_iter().map(Into::into).collect();
        if cells.len() != self.columns.len() {
            return Err(DatasetError::Arity {
                row,
                expected: self.columns.len(),
                found: cells.len(),
            });
        }
        if let Some(column) = self
            .columns
            .iter()
            .zip(&cells)
            .find_map(|(column, cell)| (!column.accepts(cell)).then_some(column))
        {
            return Err(DatasetError::CellType {
                row,
                column: column.name.clone(),
                expected: column.column_type,
            });
        }
        for (column, cell) in self.columns.iter_mut().zip(cells) {
            column.push(cell);
        }
        self.row_count += 1;
        Ok(row)
    }
    pub fn build(self) -> Dataset {
        Dataset {
            name: self.name,
            columns: self.columns,
            lookup: self.lookup,
            row_count: self.row_count,
            snapshot: NEXT_SNAPSHOT.fetch_add(1, Ordering::Relaxed),
        }
    }
}
