//! Compilation of parsed expressions against a dataset.
//!
//! Compilation resolves column names and checks every operator against the
//! column type, so once an expression has compiled its evaluation is total:
//! no row can produce a type error mid-scan.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::dataset::{CellRef, ColumnId, ColumnType, Dataset, RowRef, Value};
use crate::error::CompileError;
use crate::parser::{Condition, Expression, Operator};

/// Columns that contributed to a match, in column order.
pub type ColumnSet = BTreeSet<ColumnId>;

// ------------- Predicate -------------
#[derive(Debug, Clone, PartialEq)]
enum Test {
    // integer column against an integer literal, compared exactly
    Integer(i64),
    // any other numeric pairing, compared as floats
    Number(f64),
    // text column against the literal as typed (Eq/Ne only)
    Text(String),
}

/// A compiled, type-checked test of one column against one literal.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    column: ColumnId,
    operator: Operator,
    test: Test,
}
impl Predicate {
    pub fn compile(condition: &Condition, dataset: &Dataset) -> Result<Self, CompileError> {
        let column = dataset
            .column_id(&condition.column)
            .ok_or_else(|| CompileError::UnknownColumn {
                column: condition.column.clone(),
            })?;
        // the id came from the dataset's own lookup
        let column_type = dataset
            .column(column)
            .map(|c| c.column_type())
            .ok_or_else(|| CompileError::UnknownColumn {
                column: condition.column.clone(),
            })?;
        let mismatch = || CompileError::TypeMismatch {
            column: condition.column.clone(),
            column_type,
            operator: condition.operator,
            literal: condition.lexeme.clone(),
        };
        let test = match (column_type, &condition.literal) {
            (ColumnType::Integer, Value::Integer(i)) => Test::Integer(*i),
            (ColumnType::Integer | ColumnType::Float, literal) if literal.is_numeric() => {
                Test::Number(literal.as_f64().ok_or_else(mismatch)?)
            }
            (ColumnType::Text, _) if !condition.operator.is_ordering() => {
                Test::Text(condition.lexeme.clone())
            }
            _ => return Err(mismatch()),
        };
        Ok(Self {
            column,
            operator: condition.operator,
            test,
        })
    }
    pub fn column(&self) -> ColumnId {
        self.column
    }
    pub fn operator(&self) -> Operator {
        self.operator
    }
    /// Missing cells never satisfy a predicate, whatever the operator.
    pub fn test(&self, row: &RowRef) -> bool {
        let ordering = match (&self.test, row.get(self.column)) {
            (Test::Integer(target), Some(CellRef::Integer(i))) => Some(i.cmp(target)),
            (Test::Number(target), Some(CellRef::Integer(i))) => (i as f64).partial_cmp(target),
            (Test::Number(target), Some(CellRef::Float(x))) => x.partial_cmp(target),
            (Test::Text(target), Some(CellRef::Text(s))) => Some(s.cmp(&target.as_str())),
            _ => None,
        };
        ordering.is_some_and(|o: Ordering| self.operator.holds(o))
    }
}

// ------------- Combinator -------------
#[derive(Debug, Clone, PartialEq)]
pub enum CompiledExpr {
    Leaf(Predicate),
    And(Box<CompiledExpr>, Box<CompiledExpr>),
    Or(Box<CompiledExpr>, Box<CompiledExpr>),
}
impl CompiledExpr {
    /// Compiles every leaf; groups only fixed the tree shape and are dropped.
    pub fn compile(expression: &Expression, dataset: &Dataset) -> Result<Self, CompileError> {
        Ok(match expression {
            Expression::Leaf(condition) => CompiledExpr::Leaf(Predicate::compile(condition, dataset)?),
            Expression::And(l, r) => CompiledExpr::And(
                Box::new(Self::compile(l, dataset)?),
                Box::new(Self::compile(r, dataset)?),
            ),
            Expression::Or(l, r) => CompiledExpr::Or(
                Box::new(Self::compile(l, dataset)?),
                Box::new(Self::compile(r, dataset)?),
            ),
            Expression::Group(inner) => Self::compile(inner, dataset)?,
        })
    }

    /// Evaluates the expression for a row, short-circuiting both ways.
    pub fn matches(&self, row: &RowRef) -> bool {
        match self {
            CompiledExpr::Leaf(predicate) => predicate.test(row),
            CompiledExpr::And(l, r) => l.matches(row) && r.matches(row),
            CompiledExpr::Or(l, r) => l.matches(row) || r.matches(row),
        }
    }

    /// Evaluates the expression and reports the columns whose predicates
    /// satisfied it. Only sub-expressions that are themselves true contribute
    /// columns. An `And` stops at a false left side. An `Or` also looks at its
    /// right side after a true left side, so that every satisfied alternative
    /// is highlighted.
    pub fn evaluate(&self, row: &RowRef) -> (bool, ColumnSet) {
        let mut columns = ColumnSet::new();
        let verdict = self.evaluate_into(row, &mut columns);
        if !verdict {
            columns.clear();
        }
        (verdict, columns)
    }
    fn evaluate_into(&self, row: &RowRef, columns: &mut ColumnSet) -> bool {
        match self {
            CompiledExpr::Leaf(predicate) => {
                let verdict = predicate.test(row);
                if verdict {
                    columns.insert(predicate.column());
                }
                verdict
            }
            CompiledExpr::And(l, r) => {
                let mut left = ColumnSet::new();
                if !l.evaluate_into(row, &mut left) {
                    return false;
                }
                let mut right = ColumnSet::new();
                if !r.evaluate_into(row, &mut right) {
                    return false;
                }
                columns.append(&mut left);
                columns.append(&mut right);
                true
            }
            CompiledExpr::Or(l, r) => {
                let mut left = ColumnSet::new();
                let mut right = ColumnSet::new();
                let left_verdict = l.evaluate_into(row, &mut left);
                let right_verdict = r.evaluate_into(row, &mut right);
                if left_verdict {
                    columns.append(&mut left);
                }
                if right_verdict {
                    columns.append(&mut right);
                }
                left_verdict || right_verdict
            }
        }
    }

    /// Every column the expression tests.
    pub fn columns(&self) -> ColumnSet {
        match self {
            CompiledExpr::Leaf(predicate) => ColumnSet::from([predicate.column()]),
            CompiledExpr::And(l, r) | CompiledExpr::Or(l, r) => {
                let mut columns = l.columns();
                columns.append(&mut r.columns());
                columns
            }
        }
    }
}

pub fn compile(expression: &Expression, dataset: &Dataset) -> Result<CompiledExpr, CompileError> {
    CompiledExpr::compile(expression, dataset)
}
