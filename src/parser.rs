//! Parsing of filter queries into an [`Expression`] tree.
//!
//! A query is a sequence of comparison terms `column operator literal` joined
//! by connectors. With the default syntax `and`, `&` and `,` join terms into
//! conjunctions and `or` joins conjunctions into disjunctions, so `and` binds
//! tighter than `or`. Parentheses group explicitly.
//!
//! The pest grammar in `filter.pest` only tokenizes and groups. Connector
//! words and operator symbols are classified here against a [`SyntaxConfig`],
//! which is how keyword and symbol sets stay configurable. An unquoted
//! connector keyword is never taken as a column or literal; `city = "and"`
//! is how the text is searched for.

use lazy_static::lazy_static;
use pest::Parser;
use pest::Position;
use pest::iterators::{Pair, Pairs};
use pest_derive::Parser;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use std::cmp::Ordering;
use std::fmt;
use std::iter::Peekable;

use crate::config::SyntaxConfig;
use crate::dataset::Value;
use crate::error::ParseError;

#[derive(Parser)]
#[grammar = "filter.pest"]
struct FilterGrammar;

lazy_static! {
    static ref INTEGER: Regex = Regex::new(r"^-?[0-9]+$").unwrap();
    static ref DECIMAL: Regex = Regex::new(r"^-?[0-9]+\.[0-9]+$").unwrap();
}

// ------------- Operator -------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
}
impl Operator {
    pub fn is_ordering(self) -> bool {
        matches!(self, Operator::Gt | Operator::Lt | Operator::Ge | Operator::Le)
    }
    /// Whether `left <op> right` holds, given how left compares to right.
    pub fn holds(self, ordering: Ordering) -> bool {
        match self {
            Operator::Eq => ordering == Ordering::Equal,
            Operator::Ne => ordering != Ordering::Equal,
            Operator::Gt => ordering == Ordering::Greater,
            Operator::Lt => ordering == Ordering::Less,
            Operator::Ge => ordering != Ordering::Less,
            Operator::Le => ordering != Ordering::Greater,
        }
    }
    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "!=",
            Operator::Gt => ">",
            Operator::Lt => "<",
            Operator::Ge => ">=",
            Operator::Le => "<=",
        }
    }
}
impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

// ------------- Condition -------------
/// One comparison of a column against a literal. The lexeme is the literal
/// as the user typed it, which is what text columns compare against.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub column: String,
    pub operator: Operator,
    pub literal: Value,
    pub lexeme: String,
}
impl Condition {
    pub fn new(column: impl Into<String>, operator: Operator, literal: Value) -> Self {
        let lexeme = literal.to_string();
        Self {
            column: column.into(),
            operator,
            literal,
            lexeme,
        }
    }
}
impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let needs_quotes = self.lexeme.is_empty()
            || self
                .lexeme
                .chars()
                .any(|c| c.is_whitespace() || "=!<>~()\"&|,;".contains(c));
        if needs_quotes {
            write!(
                f,
                "{} {} \"{}\"",
                self.column,
                self.operator,
                self.lexeme.replace('"', "\"\"")
            )
        } else {
            write!(f, "{} {} {}", self.column, self.operator, self.lexeme)
        }
    }
}

// ------------- Expression -------------
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Leaf(Condition),
    And(Box<Expression>, Box<Expression>),
    Or(Box<Expression>, Box<Expression>),
    // marks a parenthesized sub-expression, only relevant for evaluation order
    Group(Box<Expression>),
}
impl Expression {
    pub fn and(left: Expression, right: Expression) -> Self {
        Expression::And(Box::new(left), Box::new(right))
    }
    pub fn or(left: Expression, right: Expression) -> Self {
        Expression::Or(Box::new(left), Box::new(right))
    }
    /// All leaf conditions, left to right.
    pub fn conditions(&self) -> Vec<&Condition> {
        let mut conditions = Vec::new();
        self.collect_conditions(&mut conditions);
        conditions
    }
    fn collect_conditions<'a>(&'a self, conditions: &mut Vec<&'a Condition>) {
        match self {
            Expression::Leaf(condition) => conditions.push(condition),
            Expression::And(l, r) | Expression::Or(l, r) => {
                l.collect_conditions(conditions);
                r.collect_conditions(conditions);
            }
            Expression::Group(inner) => inner.collect_conditions(conditions),
        }
    }
}
// Conjunctions and disjunctions are always printed in parentheses, so the
// printed form shows how the query was actually grouped.
impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expression::Leaf(condition) => write!(f, "{}", condition),
            Expression::And(l, r) => write!(f, "({} and {})", l, r),
            Expression::Or(l, r) => write!(f, "({} or {})", l, r),
            Expression::Group(inner) => write!(f, "{}", inner),
        }
    }
}

// ------------- Parser -------------
enum Connector {
    And,
    Or,
}

type Tokens<'i> = Peekable<Pairs<'i, Rule>>;

pub struct QueryParser<'c> {
    syntax: &'c SyntaxConfig,
}
impl<'c> QueryParser<'c> {
    pub fn new(syntax: &'c SyntaxConfig) -> Self {
        Self { syntax }
    }
    pub fn parse(&self, text: &str) -> Result<Expression, ParseError> {
        if text.trim().is_empty() {
            return Err(ParseError::Empty);
        }
        check_parentheses(text)?;
        let mut pairs = FilterGrammar::parse(Rule::query, text).map_err(syntax_error)?;
        let expression = pairs
            .next()
            .and_then(|query| query.into_inner().find(|p| p.as_rule() == Rule::expression))
            .ok_or(ParseError::Empty)?;
        let parsed = self.expression(expression, text)?;
        debug!(query = text, parsed = %parsed, "parsed filter");
        Ok(parsed)
    }

    // Walks one parenthesis level as operand (connector operand)*, collecting
    // conjunction chains separated by OR connectors, then joins the chains.
    // This is what makes AND bind tighter.
    fn expression(&self, pair: Pair<Rule>, text: &str) -> Result<Expression, ParseError> {
        let level = pair.as_span();
        let mut tokens = pair.into_inner().peekable();
        let mut disjuncts: Vec<Vec<Expression>> = vec![Vec::new()];
        let mut connector: Option<Pair<Rule>> = None;
        loop {
            let Some(token) = tokens.next() else {
                return Err(match connector {
                    Some(c) => syntax_at(
                        c.as_span().end_pos(),
                        format!("expected column or group after '{}'", c.as_str()),
                    ),
                    None => syntax_at(level.start_pos(), "empty group".to_string()),
                });
            };
            let operand = match token.as_rule() {
                Rule::group => {
                    let inner = token
                        .clone()
                        .into_inner()
                        .next()
                        .ok_or_else(|| syntax_at(token.as_span().start_pos(), "empty group".to_string()))?;
                    Expression::Group(Box::new(self.expression(inner, text)?))
                }
                Rule::bare | Rule::quoted if self.is_word(&token) => {
                    self.term(token, &mut tokens, text)?
                }
                _ => {
                    return Err(syntax_at(
                        token.as_span().start_pos(),
                        format!("expected column or group, found '{}'", token.as_str()),
                    ));
                }
            };
            if let Some(conjuncts) = disjuncts.last_mut() {
                conjuncts.push(operand);
            }
            let Some(token) = tokens.next() else {
                break;
            };
            match token.as_rule() {
                Rule::bare | Rule::symbol => match self.connector(token.as_str())? {
                    Connector::And => (),
                    Connector::Or => disjuncts.push(Vec::new()),
                },
                _ => {
                    return Err(syntax_at(
                        token.as_span().start_pos(),
                        format!("expected connector, found '{}'", token.as_str()),
                    ));
                }
            }
            connector = Some(token);
        }
        disjuncts
            .into_iter()
            .map(|conjuncts| conjuncts.into_iter().reduce(Expression::and))
            .collect::<Option<Vec<_>>>()
            .and_then(|chains| chains.into_iter().reduce(Expression::or))
            .ok_or(ParseError::Empty)
    }

    fn connector(&self, connector: &str) -> Result<Connector, ParseError> {
        if self.syntax.is_and(connector) {
            Ok(Connector::And)
        } else if self.syntax.is_or(connector) {
            Ok(Connector::Or)
        } else {
            Err(ParseError::UnknownConnector {
                connector: connector.to_string(),
            })
        }
    }

    fn is_connector(&self, word: &str) -> bool {
        self.syntax.is_and(word) || self.syntax.is_or(word)
    }

    // Words that can stand for a column or a literal. Unquoted connector
    // keywords never do; quoting them makes them text.
    fn is_word(&self, token: &Pair<Rule>) -> bool {
        match token.as_rule() {
            Rule::quoted => true,
            Rule::bare => !self.is_connector(token.as_str()),
            _ => false,
        }
    }

    // Consumes `operator literal` after the column token. The term text used in
    // errors runs from the column to the last token that belongs to the term.
    fn term<'i>(
        &self,
        column: Pair<'i, Rule>,
        tokens: &mut Tokens<'i>,
        text: &str,
    ) -> Result<Expression, ParseError> {
        let start = column.as_span().start();
        let term_to = |end: usize| text.get(start..end).unwrap_or_default().trim().to_string();
        let Some(operator) = tokens.next_if(|t| t.as_rule() == Rule::operator) else {
            // "name Alice" still reads as one term missing its operator
            let end = tokens
                .next_if(|t| self.is_word(t))
                .map_or(column.as_span().end(), |word| word.as_span().end());
            return Err(ParseError::MissingOperator { term: term_to(end) });
        };
        let symbol = operator.as_str();
        let resolved = self
            .syntax
            .operator(symbol)
            .ok_or_else(|| ParseError::UnknownOperator {
                operator: symbol.to_string(),
            })?;
        let literal = tokens
            .next_if(|t| self.is_word(t))
            .ok_or_else(|| ParseError::MissingLiteral {
                term: term_to(operator.as_span().end()),
            })?;
        let (value, lexeme) = classify_literal(&literal);
        Ok(Expression::Leaf(Condition {
            column: token_text(&column),
            operator: resolved,
            literal: value,
            lexeme,
        }))
    }
}

/// Parses a query using the default syntax.
pub fn parse(text: &str) -> Result<Expression, ParseError> {
    QueryParser::new(&SyntaxConfig::default()).parse(text)
}

// quoted tokens have their quotes stripped and doubled quotes collapsed
fn token_text(token: &Pair<Rule>) -> String {
    match token.as_rule() {
        Rule::quoted => token
            .clone()
            .into_inner()
            .next()
            .map(|inner| inner.as_str().replace("\"\"", "\""))
            .unwrap_or_default(),
        _ => token.as_str().to_string(),
    }
}

fn classify_literal(token: &Pair<Rule>) -> (Value, String) {
    let lexeme = token_text(token);
    if token.as_rule() == Rule::quoted {
        return (Value::Text(lexeme.clone()), lexeme);
    }
    let value = if INTEGER.is_match(&lexeme) {
        match lexeme.parse::<i64>() {
            Ok(i) => Value::Integer(i),
            // too many digits for an i64, still numeric
            Err(_) => lexeme
                .parse::<f64>()
                .map(Value::Float)
                .unwrap_or_else(|_| Value::Text(lexeme.clone())),
        }
    } else if DECIMAL.is_match(&lexeme) {
        lexeme
            .parse::<f64>()
            .map(Value::Float)
            .unwrap_or_else(|_| Value::Text(lexeme.clone()))
    } else {
        Value::Text(lexeme.clone())
    };
    (value, lexeme)
}

fn check_parentheses(text: &str) -> Result<(), ParseError> {
    let mut open = Vec::new();
    let mut in_string = false;
    for (position, c) in text.chars().enumerate() {
        match c {
            '"' => in_string = !in_string,
            '(' if !in_string => open.push(position),
            ')' if !in_string => {
                if open.pop().is_none() {
                    return Err(ParseError::UnbalancedParentheses { position });
                }
            }
            _ => (),
        }
    }
    match open.pop() {
        Some(position) => Err(ParseError::UnbalancedParentheses { position }),
        None => Ok(()),
    }
}

fn syntax_at(position: Position, message: String) -> ParseError {
    let (line, col) = position.line_col();
    ParseError::Syntax { message, line, col }
}

fn syntax_error(e: pest::error::Error<Rule>) -> ParseError {
    let (line, col) = match e.line_col {
        pest::error::LineColLocation::Pos((l, c)) => (l, c),
        pest::error::LineColLocation::Span((l, c), _) => (l, c),
    };
    ParseError::Syntax {
        message: e.variant.message().to_string(),
        line,
        col,
    }
}
