// tests/format_tests.rs

use exhibit_expression::{
    LexError, ParseError, Registry,
    format::{FormatRule, FormatScanner, FormatTokenKind, FormatValue, parse_format_rules},
    parse_expression_at,
};
use pretty_assertions::assert_eq;

fn rules(text: &str) -> Result<Vec<FormatRule>, ParseError> {
    let registry = Registry::standard();
    let parse = |text: &str, start: usize| parse_expression_at(text, start, &registry);
    parse_format_rules(text, &parse)
}

fn settings(text: &str) -> Vec<(String, Vec<FormatValue>)> {
    rules(text)
        .unwrap_or_else(|e| panic!("Failed for input {}: {}", text, e))
        .into_iter()
        .flat_map(|rule| rule.settings)
        .map(|setting| (setting.name, setting.values))
        .collect()
}

// ============================================================================
// Scanner
// ============================================================================

#[test]
fn test_scanner_tokens() {
    let registry = Registry::standard();
    let parse = |text: &str, start: usize| parse_expression_at(text, start, &registry);
    let mut scanner = FormatScanner::new("{ size: 12px; } 'x'", 0, &parse).unwrap();

    let mut kinds = Vec::new();
    while let Some(token) = scanner.token() {
        kinds.push(token.kind.clone());
        scanner.next().unwrap();
    }
    assert_eq!(
        kinds,
        vec![
            FormatTokenKind::Delimiter('{'),
            FormatTokenKind::Identifier("size".into()),
            FormatTokenKind::Delimiter(':'),
            FormatTokenKind::Number(12.0),
            FormatTokenKind::Identifier("px".into()),
            FormatTokenKind::Delimiter(';'),
            FormatTokenKind::Delimiter('}'),
            FormatTokenKind::String("x".into()),
        ]
    );
}

#[test]
fn test_scanner_start_offset() {
    let registry = Registry::standard();
    let parse = |text: &str, start: usize| parse_expression_at(text, start, &registry);
    let scanner = FormatScanner::new("skip #abc", 5, &parse).unwrap();
    let token = scanner.token().unwrap();
    assert_eq!(token.kind, FormatTokenKind::Color("#abc".into()));
    assert_eq!((token.start, token.end), (5, 9));
}

// ============================================================================
// Rules
// ============================================================================

#[test]
fn test_list_rule() {
    let parsed = rules(r#"list { separator: ", "; last-separator: ", and " }"#).unwrap();
    assert_eq!(parsed.len(), 1);
    assert_eq!(parsed[0].value_type, "list");
    assert_eq!(
        settings(r#"list { separator: ", "; last-separator: ", and " }"#),
        vec![
            ("separator".to_string(), vec![FormatValue::String(", ".into())]),
            ("last-separator".to_string(), vec![FormatValue::String(", and ".into())]),
        ]
    );
}

#[test]
fn test_several_rules() {
    let parsed = rules("number { decimal-digits: 2 } date { show: date-time }; item").unwrap();
    let types: Vec<&str> = parsed.iter().map(|r| r.value_type.as_str()).collect();
    assert_eq!(types, vec!["number", "date", "item"]);
    assert!(parsed[2].settings.is_empty());
    assert!(rules("").unwrap().is_empty());
}

#[test]
fn test_value_kinds() {
    assert_eq!(
        settings("text { color: #ff0 #00ffcc; size: 12px }"),
        vec![
            (
                "color".to_string(),
                vec![FormatValue::Color("#ff0".into()), FormatValue::Color("#00ffcc".into())]
            ),
            (
                "size".to_string(),
                vec![FormatValue::Number(12.0), FormatValue::Identifier("px".into())]
            ),
        ]
    );
}

#[test]
fn test_url_values() {
    assert_eq!(
        settings("url { target: url( http://example.com/a?b=c ) }"),
        vec![(
            "target".to_string(),
            vec![FormatValue::Url(" http://example.com/a?b=c ".into())]
        )]
    );
    // `url` without a paren is a plain identifier
    assert_eq!(
        settings("link { style: url }"),
        vec![("style".to_string(), vec![FormatValue::Identifier("url".into())])]
    );
}

#[test]
fn test_embedded_expression() {
    let parsed = settings(r#"item { title: expression(concat(.label, " (", .year, ")")) }"#);
    assert_eq!(parsed.len(), 1);
    match &parsed[0].1[..] {
        [FormatValue::Expression(expression)] => {
            assert_eq!(expression.to_string(), r#"concat(.label, " (", .year, ")")"#);
        }
        other => panic!("expected one expression, got {:?}", other),
    }

    let spaced = settings("item { title: expression( .label  ) }");
    assert!(matches!(&spaced[0].1[..], [FormatValue::Expression(e)] if e.to_string() == ".label"));
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_missing_colon() {
    assert_eq!(
        rules(r#"list { separator ", " }"#).unwrap_err(),
        ParseError::Expected {
            expected: "':'",
            found: "\", \"".into(),
            position: 17
        }
    );
}

#[test]
fn test_unclosed_rule() {
    let err = rules("list { separator: 'x'").unwrap_err();
    assert!(matches!(err, ParseError::Expected { found, .. } if found == "end of text"));
}

#[test]
fn test_unclosed_expression() {
    assert_eq!(
        rules("item { title: expression(.label }").unwrap_err(),
        ParseError::Lex(LexError::MissingExpressionParen { position: 32 })
    );
}

#[test]
fn test_unclosed_url() {
    assert_eq!(
        rules("url { target: url(http://x }").unwrap_err(),
        ParseError::Lex(LexError::MissingUrlParen { position: 14 })
    );
}

#[test]
fn test_unexpected_character() {
    assert_eq!(
        rules("list { sep: @ }").unwrap_err(),
        ParseError::Lex(LexError::UnexpectedCharacter { ch: '@', position: 12 })
    );
}

#[test]
fn test_embedded_parse_error_surfaces() {
    let err = rules("item { title: expression(1 + ) }").unwrap_err();
    assert!(matches!(err, ParseError::UnexpectedToken { position: 29, .. }));
}
