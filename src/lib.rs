//! Tabfind – filtering and match highlighting for large tabular datasets.
//!
//! Tabfind takes a filter query such as
//! `index < 10 or (index > 5 and city = Rayville)` and runs it over a typed,
//! column-oriented [`dataset::Dataset`]. A search produces:
//! * the set of matching rows, in original row order;
//! * a match index recording, for every matching row, which columns satisfied
//!   the query, so those cells can be highlighted;
//! * a count of matches over the whole dataset.
//!
//! Large tables are never shown at once. A [`window::ViewWindow`] exposes a
//! growing prefix of the rows and searches follow that prefix, while the
//! total count still covers everything.
//!
//! ## Modules
//! * [`dataset`] – Typed columns, row references and the builder used to load a table.
//! * [`parser`] – The query grammar (`filter.pest`) and the [`parser::Expression`] tree.
//!   `and` binds tighter than `or`; parentheses group explicitly.
//! * [`compile`] – Resolves columns, type-checks every comparison and evaluates rows,
//!   short-circuiting where it can.
//! * [`execute`] – Scans a dataset and builds the [`execute::MatchIndex`].
//! * [`window`] – Incremental materialization of rows.
//! * [`session`] – The [`session::SearchCoordinator`]: searches run off the
//!   interaction thread and only the most recent one is ever delivered.
//! * [`view`] – Consumer-side state of a grid (highlights, match navigation,
//!   column visibility) and the found-items tally across views.
//! * [`config`] – [`config::EngineConfig`], read from JSON and `TABFIND_` environment variables.
//! * [`error`] – Error types.
//!
//! ## Query Language
//! A term compares a column to a literal: `name = Alice`, `price >= 9.5`,
//! `"first name" != "O""Brien"`. Unquoted literals that look like integers or
//! decimals are numeric; quoted literals are always text. Text columns only
//! support `=` and `!=`; ordering a text column is rejected before any row is
//! scanned. Keywords and symbols are configurable through
//! [`config::SyntaxConfig`].
//!
//! ## Quick Start
//! ```
//! use tabfind::dataset::{ColumnType, Dataset, Value};
//! use tabfind::execute::{execute, ScanScope};
//!
//! let mut builder = Dataset::builder("cities")
//!     .column("index", ColumnType::Integer).unwrap()
//!     .column("city", ColumnType::Text).unwrap();
//! for (i, city) in [(11i64, "Rayville"), (6, "Dalton"), (8, "Rayville")] {
//!     builder.push_row([Value::from(i), Value::from(city)]).unwrap();
//! }
//! let dataset = builder.build();
//!
//! let expression = tabfind::parser::parse("index < 10 and city = Rayville").unwrap();
//! let compiled = tabfind::compile::compile(&expression, &dataset).unwrap();
//! let outcome = execute(&compiled, &dataset, ScanScope::Full);
//! assert_eq!(outcome.matched_rows.iter().collect::<Vec<_>>(), vec![2]);
//! ```
//!
//! ## Threads
//! Datasets are shared as `Arc<Dataset>` snapshots and never mutated. The
//! coordinator runs every search on a worker; workers poll a cancellation
//! flag and a superseded search's result is dropped on arrival. Views and
//! windows belong to the interaction thread.
//!
//! ## Logging
//! The crate logs through `tracing` and never installs a subscriber.

pub mod compile;
pub mod config;
pub mod dataset;
pub mod error;
pub mod execute;
pub mod parser;
pub mod session;
pub mod view;
pub mod window;

pub use config::EngineConfig;
pub use dataset::{ColumnType, Dataset, Value};
pub use error::{Result, TabfindError};
pub use session::{SearchCoordinator, SearchEvent, SearchResult};
pub use view::{FoundTally, GridView};
