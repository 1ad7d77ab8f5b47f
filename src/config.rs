//! Engine configuration.
//!
//! Settings are read with the `config` crate from an optional JSON file and
//! then overridden by `TABFIND_`-prefixed environment variables, e.g.
//! `TABFIND_BATCH_SIZE=100`. Everything has a default, so an engine can run
//! without any configuration at all.

use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;

use crate::error::{Result, TabfindError};
use crate::parser::Operator;

// characters the grammar accepts in operator and connector symbols
const OPERATOR_CHARS: &str = "=!<>~";
const CONNECTOR_SYMBOLS: [&str; 6] = ["&&", "||", "&", "|", ",", ";"];

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OperatorSymbol {
    pub symbol: String,
    pub operator: Operator,
}
impl OperatorSymbol {
    fn new(symbol: &str, operator: Operator) -> Self {
        Self {
            symbol: symbol.to_string(),
            operator,
        }
    }
}

/// Keywords and symbols of the query language.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SyntaxConfig {
    /// Words joining terms into conjunctions, matched case-insensitively.
    pub and_keywords: Vec<String>,
    /// Words joining conjunctions into disjunctions, matched case-insensitively.
    pub or_keywords: Vec<String>,
    pub and_symbols: Vec<String>,
    pub or_symbols: Vec<String>,
    pub operators: Vec<OperatorSymbol>,
}
impl Default for SyntaxConfig {
    fn default() -> Self {
        Self {
            and_keywords: vec!["and".to_string()],
            or_keywords: vec!["or".to_string()],
            and_symbols: vec!["&".to_string(), ",".to_string()],
            or_symbols: Vec::new(),
            operators: vec![
                OperatorSymbol::new("=", Operator::Eq),
                OperatorSymbol::new("!=", Operator::Ne),
                OperatorSymbol::new(">", Operator::Gt),
                OperatorSymbol::new("<", Operator::Lt),
                OperatorSymbol::new(">=", Operator::Ge),
                OperatorSymbol::new("<=", Operator::Le),
            ],
        }
    }
}
impl SyntaxConfig {
    pub fn is_and(&self, connector: &str) -> bool {
        self.and_symbols.iter().any(|s| s == connector)
            || self
                .and_keywords
                .iter()
                .any(|k| k.eq_ignore_ascii_case(connector))
    }
    pub fn is_or(&self, connector: &str) -> bool {
        self.or_symbols.iter().any(|s| s == connector)
            || self
                .or_keywords
                .iter()
                .any(|k| k.eq_ignore_ascii_case(connector))
    }
    pub fn operator(&self, symbol: &str) -> Option<Operator> {
        self.operators
            .iter()
            .find(|o| o.symbol == symbol)
            .map(|o| o.operator)
    }
    pub fn validate(&self) -> Result<()> {
        if self.and_keywords.is_empty() && self.and_symbols.is_empty() {
            return Err(TabfindError::Config("no AND connector configured".into()));
        }
        if self.or_keywords.is_empty() && self.or_symbols.is_empty() {
            return Err(TabfindError::Config("no OR connector configured".into()));
        }
        for keyword in self.and_keywords.iter().chain(&self.or_keywords) {
            let is_word = !keyword.is_empty()
                && keyword
                    .chars()
                    .all(|c| !c.is_whitespace() && !"=!<>~()\"&|,;".contains(c));
            if !is_word {
                return Err(TabfindError::Config(format!(
                    "connector keyword '{}' is not a single word",
                    keyword
                )));
            }
        }
        if let Some(keyword) = self.and_keywords.iter().find(|k| {
            self.or_keywords
                .iter()
                .any(|o| o.eq_ignore_ascii_case(k))
        }) {
            return Err(TabfindError::Config(format!(
                "keyword '{}' is both an AND and an OR connector",
                keyword
            )));
        }
        for symbol in self.and_symbols.iter().chain(&self.or_symbols) {
            if !CONNECTOR_SYMBOLS.contains(&symbol.as_str()) {
                return Err(TabfindError::Config(format!(
                    "connector symbol '{}' is not one of {:?}",
                    symbol, CONNECTOR_SYMBOLS
                )));
            }
        }
        if let Some(symbol) = self.and_symbols.iter().find(|s| self.or_symbols.contains(s)) {
            return Err(TabfindError::Config(format!(
                "symbol '{}' is both an AND and an OR connector",
                symbol
            )));
        }
        for o in &self.operators {
            if o.symbol.is_empty() || !o.symbol.chars().all(|c| OPERATOR_CHARS.contains(c)) {
                return Err(TabfindError::Config(format!(
                    "operator symbol '{}' may only use the characters {}",
                    o.symbol, OPERATOR_CHARS
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Rows materialized initially and added on every grow.
    pub batch_size: u32,
    /// How close (in rows) a scroll position must get to the materialized
    /// boundary before more rows are requested.
    pub scroll_proximity: u32,
    /// Rows scanned between two checks of the interrupt flag.
    pub interrupt_interval: u32,
    pub syntax: SyntaxConfig,
}
impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            batch_size: 500,
            scroll_proximity: 20,
            interrupt_interval: 4096,
            syntax: SyntaxConfig::default(),
        }
    }
}
impl EngineConfig {
    /// Reads `path` (if it exists) and the environment.
    pub fn load(path: &str) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(Environment::with_prefix("TABFIND").try_parsing(true))
            .build()?;
        Self::finish(settings)
    }
    pub fn from_json(json: &str) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::from_str(json, FileFormat::Json))
            .build()?;
        Self::finish(settings)
    }
    fn finish(settings: Config) -> Result<Self> {
        let engine_config: EngineConfig = settings.try_deserialize()?;
        engine_config.validate()?;
        Ok(engine_config)
    }
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(TabfindError::Config("batch_size must be positive".into()));
        }
        if self.interrupt_interval == 0 {
            return Err(TabfindError::Config(
                "interrupt_interval must be positive".into(),
            ));
        }
        self.syntax.validate()
    }
}
