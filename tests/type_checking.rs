mod common;

use tabfind::compile::compile;
use tabfind::dataset::{CellRef, ColumnType, Dataset, Value};
use tabfind::error::{CompileError, DatasetError};
use tabfind::execute::{ScanScope, execute};
use tabfind::parser::{Operator, parse};

use common::{cities, ids};

fn search(dataset: &Dataset, query: &str) -> Result<Vec<u64>, CompileError> {
    let expression = parse(query).expect("query ok");
    let compiled = compile(&expression, dataset)?;
    Ok(ids(&execute(&compiled, dataset, ScanScope::Full).matched_rows))
}

#[test]
fn ordering_a_text_column_is_rejected() {
    let dataset = cities();
    for query in ["city > 5", "city > \"5\"", "city <= Rayville"] {
        let err = search(&dataset, query).unwrap_err();
        assert!(
            matches!(
                err,
                CompileError::TypeMismatch {
                    column_type: ColumnType::Text,
                    ..
                }
            ),
            "{query} should not compile, got {err:?}"
        );
    }
    assert_eq!(
        search(&dataset, "city > 5"),
        Err(CompileError::TypeMismatch {
            column: "city".to_string(),
            column_type: ColumnType::Text,
            operator: Operator::Gt,
            literal: "5".to_string(),
        })
    );
}

#[test]
fn text_literal_against_numeric_column_is_rejected() {
    let dataset = cities();
    assert!(matches!(
        search(&dataset, "index = Rayville"),
        Err(CompileError::TypeMismatch { .. })
    ));
    // quoted digits are text
    assert!(matches!(
        search(&dataset, "price < \"10\""),
        Err(CompileError::TypeMismatch { .. })
    ));
}

#[test]
fn a_bad_leaf_rejects_the_whole_query() {
    let dataset = cities();
    assert!(search(&dataset, "index < 10 or city > 5").is_err());
    assert_eq!(
        search(&dataset, "index < 10 or population > 5"),
        Err(CompileError::UnknownColumn {
            column: "population".to_string()
        })
    );
}

#[test]
fn numeric_comparisons() {
    let dataset = cities();
    assert_eq!(search(&dataset, "index = 8").expect("compiles"), vec![3]);
    assert_eq!(search(&dataset, "index >= 11").expect("compiles"), vec![0, 4]);
    assert_eq!(search(&dataset, "index <= 3").expect("compiles"), vec![2, 5]);
    // integer column against a decimal literal
    assert_eq!(search(&dataset, "index > 7.5").expect("compiles"), vec![0, 3, 4]);
    // float column against an integer literal
    assert_eq!(search(&dataset, "price > 9").expect("compiles"), vec![0, 1, 4]);
    assert_eq!(search(&dataset, "price = 7").expect("compiles"), vec![5]);
}

#[test]
fn text_equality() {
    let dataset = cities();
    assert_eq!(search(&dataset, "city = Rayville").expect("compiles"), vec![2, 3]);
    assert_eq!(search(&dataset, "city != Dalton").expect("compiles"), vec![1, 2, 3, 4]);
    // case matters
    assert!(search(&dataset, "city = rayville").expect("compiles").is_empty());
}

#[test]
fn text_columns_compare_against_the_literal_as_typed() {
    let mut builder = Dataset::builder("zips")
        .column("zip", ColumnType::Text)
        .expect("zip column");
    for zip in ["007", "7", "0.50"] {
        builder.push_row([Value::from(zip)]).expect("row accepted");
    }
    let dataset = builder.build();
    assert_eq!(search(&dataset, "zip = 007").expect("compiles"), vec![0]);
    assert_eq!(search(&dataset, "zip = 7").expect("compiles"), vec![1]);
    assert_eq!(search(&dataset, "zip = 0.50").expect("compiles"), vec![2]);
}

#[test]
fn missing_cells_never_match() {
    let dataset = cities();
    // row 2 has no price
    assert_eq!(search(&dataset, "price != 1000").expect("compiles"), vec![0, 1, 3, 4, 5]);
    assert!(!search(&dataset, "price < 1000").expect("compiles").contains(&2));
}

#[test]
fn builder_rejects_bad_rows_atomically() {
    let builder = Dataset::builder("bad")
        .column("a", ColumnType::Integer)
        .expect("a column");
    let err = builder.column("a", ColumnType::Text).unwrap_err();
    assert_eq!(err, DatasetError::DuplicateColumn("a".to_string()));

    let mut builder = Dataset::builder("bad")
        .column("a", ColumnType::Integer)
        .expect("a column")
        .column("b", ColumnType::Float)
        .expect("b column");
    assert_eq!(
        builder.push_row([Value::Integer(1)]),
        Err(DatasetError::Arity {
            row: 0,
            expected: 2,
            found: 1
        })
    );
    assert!(matches!(
        builder.push_row([Value::Integer(1), Value::from("x")]),
        Err(DatasetError::CellType { row: 0, .. })
    ));
    // integers widen into float columns
    assert_eq!(builder.push_row([Value::Integer(1), Value::Integer(2)]), Ok(0));
    let dataset = builder.build();
    assert_eq!(dataset.row_count(), 1);
    let row = dataset.row(0).expect("row 0");
    assert_eq!(row.get_by_name("b"), Some(CellRef::Float(2.0)));
    assert_eq!(dataset.column_name(1), Some("b"));
}
