use tabfind::config::{OperatorSymbol, SyntaxConfig};
use tabfind::dataset::Value;
use tabfind::error::ParseError;
use tabfind::parser::{Condition, Expression, Operator, QueryParser, parse};

fn leaf(column: &str, operator: Operator, literal: Value) -> Expression {
    Expression::Leaf(Condition::new(column, operator, literal))
}

#[test]
fn and_binds_tighter_than_or() {
    let parsed = parse("a=1 or a=2 and b=3").expect("query ok");
    let expected = Expression::or(
        leaf("a", Operator::Eq, Value::Integer(1)),
        Expression::and(
            leaf("a", Operator::Eq, Value::Integer(2)),
            leaf("b", Operator::Eq, Value::Integer(3)),
        ),
    );
    assert_eq!(parsed, expected);
    assert_eq!(parsed.to_string(), "(a = 1 or (a = 2 and b = 3))");
}

#[test]
fn parentheses_override_precedence() {
    let parsed = parse("(a=1 or a=2) and b=3").expect("query ok");
    assert_eq!(parsed.to_string(), "((a = 1 or a = 2) and b = 3)");
    assert!(matches!(parsed, Expression::And(ref left, _) if matches!(**left, Expression::Group(_))));
    // nested groups and whitespace around them
    let nested = parse(" ( ( a = 1 ) ) ").expect("query ok");
    assert_eq!(nested.to_string(), "a = 1");
}

#[test]
fn chains_fold_left() {
    let parsed = parse("a=1 and b=2 and c=3 or d=4 or e=5").expect("query ok");
    assert_eq!(
        parsed.to_string(),
        "((((a = 1 and b = 2) and c = 3) or d = 4) or e = 5)"
    );
}

#[test]
fn connector_symbols_and_case() {
    let symbols = parse("a=1 & b=2, c=3").expect("query ok");
    let words = parse("a=1 AND b=2 And c=3").expect("query ok");
    assert_eq!(symbols, words);
    let conditions = symbols.conditions();
    assert_eq!(conditions.len(), 3);
    assert_eq!(conditions[2].column, "c");
}

#[test]
fn operators() {
    let cases = [
        ("a = 1", Operator::Eq),
        ("a != 1", Operator::Ne),
        ("a > 1", Operator::Gt),
        ("a < 1", Operator::Lt),
        ("a >= 1", Operator::Ge),
        ("a<=1", Operator::Le),
    ];
    for (query, operator) in cases {
        let parsed = parse(query).expect("query ok");
        assert_eq!(parsed.conditions()[0].operator, operator, "operator of '{query}'");
    }
}

#[test]
fn literal_classification() {
    let literal = |query: &str| parse(query).expect("query ok").conditions()[0].literal.clone();
    assert_eq!(literal("n = 42"), Value::Integer(42));
    assert_eq!(literal("n < -3"), Value::Integer(-3));
    assert_eq!(literal("price >= 9.5"), Value::Float(9.5));
    assert_eq!(literal("city = Rayville"), Value::from("Rayville"));
    // beyond i64, still a number
    assert_eq!(literal("n = 99999999999999999999"), Value::Float(99999999999999999999.0));
    // quoted literals are text whatever they contain
    assert_eq!(literal("zip = \"007\""), Value::from("007"));
}

#[test]
fn lexeme_keeps_the_literal_as_typed() {
    let parsed = parse("zip = 007").expect("query ok");
    let condition = parsed.conditions()[0];
    assert_eq!(condition.literal, Value::Integer(7));
    assert_eq!(condition.lexeme, "007");
}

#[test]
fn quoted_names_and_escaped_quotes() {
    let parsed = parse(r#""first name" = "O""Brien (jr)""#).expect("query ok");
    let condition = parsed.conditions()[0];
    assert_eq!(condition.column, "first name");
    assert_eq!(condition.literal, Value::from("O\"Brien (jr)"));
    assert_eq!(parsed.to_string(), r#"first name = "O""Brien (jr)""#);
}

#[test]
fn empty_query() {
    assert_eq!(parse(""), Err(ParseError::Empty));
    assert_eq!(parse("  \t "), Err(ParseError::Empty));
}

#[test]
fn unbalanced_parentheses() {
    assert_eq!(
        parse("(a=1 or b=2"),
        Err(ParseError::UnbalancedParentheses { position: 0 })
    );
    assert_eq!(
        parse("a=1)"),
        Err(ParseError::UnbalancedParentheses { position: 3 })
    );
}

#[test]
fn incomplete_terms() {
    assert_eq!(
        parse("name Alice"),
        Err(ParseError::MissingOperator {
            term: "name Alice".to_string()
        })
    );
    assert_eq!(
        parse("a = 1 and name ="),
        Err(ParseError::MissingLiteral {
            term: "name =".to_string()
        })
    );
    assert_eq!(
        parse("a =< 5"),
        Err(ParseError::UnknownOperator {
            operator: "=<".to_string()
        })
    );
    assert_eq!(
        parse("a = = 5"),
        Err(ParseError::MissingLiteral {
            term: "a =".to_string()
        })
    );
}

#[test]
fn connector_keywords_are_not_literals() {
    let missing_literal = |term: &str| {
        Err(ParseError::MissingLiteral {
            term: term.to_string(),
        })
    };
    assert_eq!(parse("a = and b = 2"), missing_literal("a ="));
    assert_eq!(parse("city = or index = 2"), missing_literal("city ="));
    assert_eq!(parse("city = and"), missing_literal("city ="));
    assert_eq!(parse("(city != OR)"), missing_literal("city !="));
    assert_eq!(
        parse("a and b = 1"),
        Err(ParseError::MissingOperator {
            term: "a".to_string()
        })
    );
    // quoting makes the word text again
    let quoted = parse("city = \"and\"").expect("query ok");
    assert_eq!(quoted.conditions()[0].literal, Value::from("and"));
}

#[test]
fn syntax_errors_point_at_the_offending_token() {
    assert!(matches!(
        parse("a = 1 and = 2"),
        Err(ParseError::Syntax { line: 1, col: 11, .. })
    ));
    assert!(matches!(
        parse("a = 1\nand\n= 2"),
        Err(ParseError::Syntax { line: 3, col: 1, .. })
    ));
    assert!(matches!(
        parse("and a = 1"),
        Err(ParseError::Syntax { line: 1, col: 1, .. })
    ));
    assert!(matches!(
        parse("a = 1 and ()"),
        Err(ParseError::Syntax { line: 1, .. })
    ));
}

#[test]
fn unknown_connector() {
    assert_eq!(
        parse("a=1 xor b=2"),
        Err(ParseError::UnknownConnector {
            connector: "xor".to_string()
        })
    );
}

#[test]
fn dangling_connector_is_a_syntax_error() {
    let err = parse("a = 1 and").unwrap_err();
    assert!(matches!(err, ParseError::Syntax { line: 1, .. }), "got {err:?}");
}

#[test]
fn configured_keywords() {
    let syntax = SyntaxConfig {
        and_keywords: vec!["und".to_string()],
        or_keywords: vec!["oder".to_string()],
        or_symbols: vec!["|".to_string()],
        ..SyntaxConfig::default()
    };
    let parser = QueryParser::new(&syntax);
    let german = parser.parse("a=1 oder a=2 UND b=3").expect("query ok");
    assert_eq!(german, parse("a=1 or a=2 and b=3").expect("query ok"));
    // keywords of the default syntax are plain words here
    let literal = parser.parse("a = or").expect("query ok");
    assert_eq!(literal.conditions()[0].literal, Value::from("or"));
    assert!(matches!(
        parser.parse("a = oder"),
        Err(ParseError::MissingLiteral { .. })
    ));
    let piped = parser.parse("a=1 | a=2").expect("query ok");
    assert_eq!(piped.to_string(), "(a = 1 or a = 2)");
    assert_eq!(
        parser.parse("a=1 and b=2"),
        Err(ParseError::UnknownConnector {
            connector: "and".to_string()
        })
    );
}

#[test]
fn configured_operators() {
    let syntax = SyntaxConfig {
        operators: vec![
            OperatorSymbol {
                symbol: "==".to_string(),
                operator: Operator::Eq,
            },
            OperatorSymbol {
                symbol: "<>".to_string(),
                operator: Operator::Ne,
            },
        ],
        ..SyntaxConfig::default()
    };
    let parser = QueryParser::new(&syntax);
    let parsed = parser.parse("a == 1 and b <> 2").expect("query ok");
    let operators: Vec<Operator> = parsed.conditions().iter().map(|c| c.operator).collect();
    assert_eq!(operators, vec![Operator::Eq, Operator::Ne]);
    assert!(matches!(
        parser.parse("a = 1"),
        Err(ParseError::UnknownOperator { .. })
    ));
}
