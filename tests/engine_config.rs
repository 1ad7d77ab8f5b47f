use std::fs;

use tabfind::config::{EngineConfig, SyntaxConfig};
use tabfind::error::TabfindError;
use tabfind::parser::{Operator, QueryParser};

#[test]
fn defaults() {
    let config = EngineConfig::default();
    assert_eq!(config.batch_size, 500);
    assert_eq!(config.scroll_proximity, 20);
    assert_eq!(config.interrupt_interval, 4096);
    assert!(config.syntax.is_and("AND"));
    assert!(config.syntax.is_and(","));
    assert!(config.syntax.is_or("or"));
    assert!(!config.syntax.is_or("|"));
    assert_eq!(config.syntax.operator(">="), Some(Operator::Ge));
    config.validate().expect("defaults are valid");
}

#[test]
fn partial_json_keeps_defaults() {
    let config = EngineConfig::from_json(r#"{ "batch_size": 100 }"#).expect("config ok");
    assert_eq!(config.batch_size, 100);
    assert_eq!(config.scroll_proximity, 20);
    assert_eq!(config.syntax, SyntaxConfig::default());
}

#[test]
fn syntax_from_json() {
    let config = EngineConfig::from_json(
        r#"{
            "syntax": {
                "and_keywords": ["und"],
                "or_keywords": ["oder"],
                "operators": [
                    { "symbol": "==", "operator": "Eq" },
                    { "symbol": ">", "operator": "Gt" }
                ]
            }
        }"#,
    )
    .expect("config ok");
    let parsed = QueryParser::new(&config.syntax)
        .parse("a == 1 und b > 2 oder c == 3")
        .expect("query ok");
    assert_eq!(parsed.to_string(), "((a = 1 and b > 2) or c = 3)");
}

#[test]
fn invalid_settings_are_rejected() {
    let rejected = [
        r#"{ "batch_size": 0 }"#,
        r#"{ "interrupt_interval": 0 }"#,
        r#"{ "syntax": { "and_keywords": ["either"], "or_keywords": ["Either"] } }"#,
        r#"{ "syntax": { "or_keywords": [], "or_symbols": [] } }"#,
        r#"{ "syntax": { "and_symbols": ["+"] } }"#,
        r#"{ "syntax": { "and_keywords": ["and also"] } }"#,
        r#"{ "syntax": { "operators": [{ "symbol": "eq", "operator": "Eq" }] } }"#,
    ];
    for json in rejected {
        let err = EngineConfig::from_json(json).unwrap_err();
        assert!(matches!(err, TabfindError::Config(_)), "{json} gave {err}");
    }
}

#[test]
fn load_layers_file_and_environment() {
    // a missing file is not an error
    let config = EngineConfig::load("tabfind-no-such-file").expect("config ok");
    assert_eq!(config.batch_size, 500);

    let path = std::env::temp_dir().join("tabfind-engine-config.json");
    fs::write(&path, r#"{ "batch_size": 250, "scroll_proximity": 10 }"#).expect("write config");
    // SAFETY: no other test in this binary reads or writes the environment
    unsafe { std::env::set_var("TABFIND_SCROLL_PROXIMITY", "5") };
    let config = EngineConfig::load(path.to_str().expect("utf-8 path")).expect("config ok");
    unsafe { std::env::remove_var("TABFIND_SCROLL_PROXIMITY") };
    let _ = fs::remove_file(&path);
    assert_eq!(config.batch_size, 250);
    assert_eq!(config.scroll_proximity, 5);
}
