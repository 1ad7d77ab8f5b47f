use thiserror::Error;

use crate::dataset::ColumnType;
use crate::parser::Operator;

// ------------- Parsing -------------
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Empty query")]
    Empty,
    #[error("Unbalanced parentheses at position {position}")]
    UnbalancedParentheses { position: usize },
    #[error("Missing operator in term '{term}'")]
    MissingOperator { term: String },
    #[error("Missing literal in term '{term}'")]
    MissingLiteral { term: String },
    #[error("Unknown operator '{operator}'")]
    UnknownOperator { operator: String },
    #[error("Unknown connector '{connector}' (expected and/or)")]
    UnknownConnector { connector: String },
    #[error("Syntax error at {line}:{col}: {message}")]
    Syntax { message: String, line: usize, col: usize },
}

// ------------- Compilation -------------
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("Unknown column '{column}'")]
    UnknownColumn { column: String },
    #[error("Type mismatch: '{operator}' not allowed between {column_type} column '{column}' and literal '{literal}'")]
    TypeMismatch {
        column: String,
        column_type: ColumnType,
        operator: Operator,
        literal: String,
    },
}

// ------------- Evaluation -------------
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvaluationError {
    #[error("Scan interrupted after {scanned} rows")]
    Interrupted { scanned: u64 },
    // reserved for coercions that can fail mid-scan, none exist after compilation
    #[error("Coercion failed in column '{column}': {message}")]
    Coercion { column: String, message: String },
}

// ------------- Dataset construction -------------
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DatasetError {
    #[error("Duplicate column '{0}'")]
    DuplicateColumn(String),
    #[error("Row {row} has {found} cells, expected {expected}")]
    Arity { row: u64, expected: usize, found: usize },
    #[error("Row {row}: column '{column}' expects {expected}")]
    CellType { row: u64, column: String, expected: ColumnType },
}

/// Why a particular search was rejected. Delivered with a failed search event.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
}

#[derive(Error, Debug)]
pub enum TabfindError {
    #[error("Config error: {0}")]
    Config(String),
    #[error("Dataset error: {0}")]
    Dataset(#[from] DatasetError),
    #[error("Search error: {0}")]
    Search(#[from] SearchError),
    #[error("Unknown column '{0}'")]
    UnknownColumn(String),
}

pub type Result<T> = std::result::Result<T, TabfindError>;

// Helper conversions
impl From<config::ConfigError> for TabfindError {
    fn from(e: config::ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}
impl From<ParseError> for TabfindError {
    fn from(e: ParseError) -> Self {
        Self::Search(SearchError::Parse(e))
    }
}
impl From<CompileError> for TabfindError {
    fn from(e: CompileError) -> Self {
        Self::Search(SearchError::Compile(e))
    }
}
