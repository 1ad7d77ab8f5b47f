#![allow(dead_code)]

use roaring::RoaringTreemap;
use tabfind::dataset::{ColumnType, Dataset, Value};
use tracing_subscriber::EnvFilter;

/// Sends engine logs to the test output, filtered by `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// Row ids and index values:
//   0: 11 Dalton    1: 6 Fenwick   2: 3 Rayville
//   3:  8 Rayville  4: 12 Ostrava  5: 2 Dalton
pub fn cities() -> Dataset {
    let mut builder = Dataset::builder("cities")
        .column("index", ColumnType::Integer)
        .expect("index column")
        .column("city", ColumnType::Text)
        .expect("city column")
        .column("price", ColumnType::Float)
        .expect("price column");
    let rows: [(i64, &str, Option<f64>); 6] = [
        (11, "Dalton", Some(9.5)),
        (6, "Fenwick", Some(12.25)),
        (3, "Rayville", None),
        (8, "Rayville", Some(3.75)),
        (12, "Ostrava", Some(100.5)),
        (2, "Dalton", Some(7.0)),
    ];
    for (index, city, price) in rows {
        builder
            .push_row([Some(Value::from(index)), Some(Value::from(city)), price.map(Value::from)])
            .expect("row accepted");
    }
    builder.build()
}

/// Index and city only, in the row order of the Rayville example.
pub fn rayville() -> Dataset {
    let mut builder = Dataset::builder("rayville")
        .column("index", ColumnType::Integer)
        .expect("index column")
        .column("city", ColumnType::Text)
        .expect("city column");
    let rows: [(i64, &str); 6] = [
        (11, "Rayville"),
        (6, "New York"),
        (3, "Chicago"),
        (8, "Rayville"),
        (12, "LosAngeles"),
        (2, "Rayville"),
    ];
    for (index, city) in rows {
        builder
            .push_row([Value::from(index), Value::from(city)])
            .expect("row accepted");
    }
    builder.build()
}

/// `n` holds the row position, `parity` is "even" or "odd".
pub fn numbered(rows: u64) -> Dataset {
    let mut builder = Dataset::builder("numbered")
        .column("n", ColumnType::Integer)
        .expect("n column")
        .column("parity", ColumnType::Text)
        .expect("parity column");
    for n in 0..rows {
        let parity = if n % 2 == 0 { "even" } else { "odd" };
        builder
            .push_row([Value::Integer(n as i64), Value::from(parity)])
            .expect("row accepted");
    }
    builder.build()
}

pub fn ids(rows: &RoaringTreemap) -> Vec<u64> {
    rows.iter().collect()
}
