use exhibit_expression::{
    Collection, EvalContext, EvalError, EvalResult, MemoryDatabase, Registry, Roots, VALUE_ROOT, Value, ValueSet, ValueType,
    parse_expression,
};
use pretty_assertions::assert_eq;

const LIBRARY: &str = r#"{
    "types": { "Book": {}, "Author": {} },
    "properties": {
        "year": { "valueType": "number" },
        "pages": { "valueType": "number" },
        "written-by": { "valueType": "item" },
        "available": { "valueType": "text" }
    },
    "items": [
        { "id": "dune", "label": "Dune", "type": "Book", "year": "1965", "pages": 412,
          "written-by": "herbert", "tag": ["sf", "classic"], "available": "true" },
        { "id": "messiah", "label": "Dune Messiah", "type": "Book", "year": 1969, "pages": 256,
          "written-by": "herbert", "tag": ["sf"], "available": "false" },
        { "id": "left-hand", "label": "The Left Hand of Darkness", "type": "Book", "year": 1969,
          "written-by": "le-guin", "tag": ["sf", "classic"], "available": "true" },
        { "id": "herbert", "label": "Frank Herbert", "type": "Author", "born": "1920-10-08" },
        { "id": "le-guin", "label": "Ursula K. Le Guin", "type": "Author", "born": "1929-10-21" }
    ]
}"#;

fn library() -> MemoryDatabase {
    let mut db = MemoryDatabase::new();
    db.load_json(LIBRARY).unwrap();
    db
}

fn eval_on(expr_str: &str, item: &str) -> Result<(Vec<Value>, ValueType), EvalError> {
    let registry = Registry::standard();
    let db = library();
    let expression = parse_expression(expr_str, &registry).unwrap();
    let result = expression.evaluate_on_item(item, &db, &registry)?;
    Ok((result.values.to_vec(), result.value_type))
}

fn values_on(expr_str: &str, item: &str) -> Vec<Value> {
    eval_on(expr_str, item)
        .unwrap_or_else(|e| panic!("Failed for {}: {}", expr_str, e))
        .0
}

fn texts(items: &[&str]) -> Vec<Value> {
    items.iter().map(|s| Value::from(*s)).collect()
}

// ============================================================================
// Constants and Operators
// ============================================================================

#[test]
fn test_arithmetic() {
    let test_cases = vec![
        ("3 + 4 * 2", 11.0),
        ("(3 + 4) * 2", 14.0),
        ("10 - 2 - 3", 5.0),
        ("7 / 2", 3.5),
        ("'12px' + 1", 13.0),
    ];

    for (input, expected) in test_cases {
        let (values, value_type) = eval_on(input, "dune").unwrap();
        assert_eq!(values, vec![Value::Number(expected)], "Failed for input: {}", input);
        assert_eq!(value_type, ValueType::Number);
    }
}

#[test]
fn test_comparisons() {
    let test_cases = vec![
        ("1 < 2", true),
        ("2 <= 2", true),
        ("3 > 4", false),
        ("'10' >= 9", true),
        ("'a' = 'a'", true),
        ("'a' <> 'a'", false),
        ("'1' = 1", false),
        ("1 = 1.0", true),
    ];

    for (input, expected) in test_cases {
        let (values, value_type) = eval_on(input, "dune").unwrap();
        assert_eq!(values, vec![Value::Boolean(expected)], "Failed for input: {}", input);
        assert_eq!(value_type, ValueType::Boolean);
    }
}

#[test]
fn test_operator_cross_product_order() {
    let registry = Registry::standard();
    let db = MemoryDatabase::new();
    let roots = Roots::new()
        .with("x", Collection::sequence(texts(&["a", "b"]), ValueType::Text))
        .with("y", Collection::sequence(texts(&["a", "b", "a"]), ValueType::Text));
    let expression = parse_expression("x = y", &registry).unwrap();

    // row-major: (a,a) (a,b) (a,a) (b,a) (b,b) (b,a)
    let ctx = EvalContext::new(&roots, VALUE_ROOT, &db, &registry);
    let collection = expression.root().evaluate(&ctx).unwrap();
    let ordered: Vec<Value> = collection.iter().cloned().collect();
    assert_eq!(
        ordered,
        [true, false, true, false, true, false]
            .into_iter()
            .map(Value::Boolean)
            .collect::<Vec<_>>()
    );
    assert_eq!(collection.value_type(), &ValueType::Boolean);

    let result = expression.evaluate(&roots, VALUE_ROOT, &db, &registry).unwrap();
    assert_eq!(result.size, 6);
    assert_eq!(result.values.to_vec(), vec![Value::Boolean(true), Value::Boolean(false)]);
}

#[test]
fn test_arithmetic_over_paths() {
    assert_eq!(values_on(".pages / 4", "dune"), vec![Value::Number(103.0)]);
    assert_eq!(values_on(".year + 1", "dune"), vec![Value::Number(1966.0)]);
}

// ============================================================================
// Paths
// ============================================================================

#[test]
fn test_forward_paths() {
    assert_eq!(values_on(".label", "dune"), texts(&["Dune"]));
    assert_eq!(values_on(".written-by.label", "dune"), texts(&["Frank Herbert"]));
    assert_eq!(values_on(".tag", "dune"), texts(&["sf", "classic"]));
    assert_eq!(values_on(".missing", "dune"), Vec::<Value>::new());
}

#[test]
fn test_path_value_types() {
    assert_eq!(eval_on(".year", "dune").unwrap().1, ValueType::Number);
    assert_eq!(eval_on(".written-by", "dune").unwrap().1, ValueType::Item);
    assert_eq!(eval_on(".tag", "dune").unwrap().1, ValueType::Text);
    assert_eq!(eval_on("!written-by", "herbert").unwrap().1, ValueType::Item);
    assert_eq!(eval_on("value", "dune").unwrap().1, ValueType::Item);
}

#[test]
fn test_backward_paths() {
    assert_eq!(values_on("!written-by", "herbert"), texts(&["dune", "messiah"]));
    assert_eq!(
        values_on("!written-by.label", "le-guin"),
        texts(&["The Left Hand of Darkness"])
    );
}

#[test]
fn test_array_hop_keeps_duplicates() {
    let registry = Registry::standard();
    let db = library();
    let set = parse_expression("!written-by.tag", &registry).unwrap();
    let sequence = parse_expression("!written-by.@tag", &registry).unwrap();

    let set = set.evaluate_on_item("herbert", &db, &registry).unwrap();
    let sequence = sequence.evaluate_on_item("herbert", &db, &registry).unwrap();
    assert_eq!(set.size, 2);
    assert_eq!(sequence.size, 3);
    assert_eq!(sequence.values.to_vec(), texts(&["sf", "classic"]));
}

#[test]
fn test_named_roots() {
    let registry = Registry::standard();
    let db = library();
    let roots = Roots::new().with_value("book", Value::from("messiah"), ValueType::Item);
    let expression = parse_expression("book.label", &registry).unwrap();
    let result = expression.evaluate(&roots, VALUE_ROOT, &db, &registry).unwrap();
    assert_eq!(result.values.to_vec(), texts(&["Dune Messiah"]));

    let missing = parse_expression(".label", &registry).unwrap();
    assert_eq!(
        missing.evaluate(&roots, VALUE_ROOT, &db, &registry).unwrap_err(),
        EvalError::UndefinedRoot { name: "value".into() }
    );
}

#[test]
fn test_test_exists() {
    let registry = Registry::standard();
    let db = library();
    let all_books = Roots::new().with(
        VALUE_ROOT,
        Collection::sequence(texts(&["dune", "messiah", "left-hand"]), ValueType::Item),
    );

    let test_cases = vec![
        (".written-by.born", true),
        (".written-by.missing", false),
        ("!written-by", false),
        ("count(.missing)", true),
        ("union(.missing)", false),
    ];
    for (input, expected) in test_cases {
        let expression = parse_expression(input, &registry).unwrap();
        let exists = expression.test_exists(&all_books, VALUE_ROOT, &db, &registry).unwrap();
        assert_eq!(exists, expected, "Failed for input: {}", input);
    }
}

#[test]
fn test_walk_backward_to_items() {
    let registry = Registry::standard();
    let db = library();
    let expression = parse_expression(".written-by.label", &registry).unwrap();
    let path = expression.path().unwrap();

    let labels: ValueSet = texts(&["Frank Herbert"]).into_iter().collect();
    let books = path.walk_backward(&labels, ValueType::Text, None, &db);
    assert_eq!(books.value_type(), &ValueType::Item);
    assert_eq!(books.get_set().to_vec(), texts(&["dune", "messiah"]));

    let only_messiah: ValueSet = texts(&["messiah"]).into_iter().collect();
    let filtered = path.walk_backward(&labels, ValueType::Text, Some(&only_messiah), &db);
    assert_eq!(filtered.get_set().to_vec(), texts(&["messiah"]));
}

// ============================================================================
// Controls
// ============================================================================

#[test]
fn test_if() {
    assert_eq!(values_on("if(.available = 'true', 'yes', 'no')", "dune"), texts(&["yes"]));
    assert_eq!(values_on("if(.available = 'true', 'yes', 'no')", "messiah"), texts(&["no"]));
    assert_eq!(values_on("if(.missing, 'yes', 'no')", "dune"), texts(&["no"]));
    assert_eq!(values_on("if(0, 'yes', 'no')", "dune"), texts(&["no"]));
    assert_eq!(values_on("if('', 'yes', 'no')", "dune"), texts(&["no"]));
}

#[test]
fn test_if_evaluates_only_taken_branch() {
    assert_eq!(values_on("if(1, 'ok', undefined-function())", "dune"), texts(&["ok"]));
    assert_eq!(
        eval_on("if(0, 'ok', undefined-function())", "dune").unwrap_err(),
        EvalError::UnknownFunction {
            name: "undefined-function".into()
        }
    );
}

#[test]
fn test_foreach() {
    let (values, value_type) = eval_on("foreach(!written-by, .pages * 2)", "herbert").unwrap();
    assert_eq!(values, vec![Value::Number(824.0), Value::Number(512.0)]);
    assert_eq!(value_type, ValueType::Number);

    let (values, value_type) = eval_on("foreach(.missing, 1)", "dune").unwrap();
    assert!(values.is_empty());
    assert_eq!(value_type, ValueType::Text);
}

#[test]
fn test_foreach_restores_value() {
    // `value` inside the body is the element; after it, the item again
    assert_eq!(
        values_on("concat(foreach(.written-by, .label), '/', .label)", "dune"),
        texts(&["Frank Herbert/Dune"])
    );
}

#[test]
fn test_default() {
    assert_eq!(values_on("default(.missing, .label)", "dune"), texts(&["Dune"]));
    assert_eq!(values_on("default(\"\", \"\", \"x\")", "dune"), texts(&["x"]));
    assert_eq!(values_on("default(.label, undefined-function())", "dune"), texts(&["Dune"]));
    let (values, value_type) = eval_on("default(.missing, .other)", "dune").unwrap();
    assert!(values.is_empty());
    assert_eq!(value_type, ValueType::Text);
}

#[test]
fn test_filter_keeps_text_true_only() {
    let (values, value_type) = eval_on("filter(!written-by, .available)", "herbert").unwrap();
    assert_eq!(values, texts(&["dune"]));
    assert_eq!(value_type, ValueType::Item);

    // comparisons yield boolean true, which does not count
    assert!(values_on("filter(!written-by, .pages > 0)", "herbert").is_empty());
}

#[test]
fn test_control_argument_count() {
    assert_eq!(
        eval_on("if(1, 2)", "dune").unwrap_err(),
        EvalError::ArgumentCount {
            name: "if".into(),
            expected: 3,
            found: 2
        }
    );
}

// ============================================================================
// Functions
// ============================================================================

#[test]
fn test_counting_functions() {
    assert_eq!(values_on("count(!written-by)", "herbert"), vec![Value::Number(2.0)]);
    assert_eq!(values_on("count(.missing)", "herbert"), vec![Value::Number(0.0)]);
    assert_eq!(values_on("exists(.born)", "herbert"), vec![Value::Boolean(true)]);
    assert_eq!(values_on("not(exists(.missing))", "herbert"), vec![Value::Boolean(true)]);
    assert_eq!(values_on("not('true')", "herbert"), vec![Value::Boolean(true)]);
}

#[test]
fn test_set_functions() {
    assert_eq!(values_on("union(.tag, 'new', .tag)", "dune"), texts(&["sf", "classic", "new"]));
    assert_eq!(values_on("contains(.tag, 'sf')", "dune"), vec![Value::Boolean(true)]);
    assert_eq!(values_on("contains(.tag, 'classic')", "messiah"), vec![Value::Boolean(false)]);
    assert_eq!(values_on("contains(.missing, .missing)", "dune"), vec![Value::Boolean(false)]);
}

#[test]
fn test_numeric_functions() {
    assert_eq!(values_on("add(!written-by.pages, 2)", "herbert"), vec![Value::Number(670.0)]);
    assert_eq!(values_on("multiply(2, 3, 'x')", "herbert"), vec![Value::Number(6.0)]);
    assert_eq!(values_on("min(!written-by.year)", "herbert"), vec![Value::Number(1965.0)]);
    assert_eq!(values_on("max(!written-by.year)", "herbert"), vec![Value::Number(1969.0)]);
    assert!(values_on("max('none')", "herbert").is_empty());
}

#[test]
fn test_concat() {
    assert_eq!(
        values_on("concat(.label, ' (', .year, ')')", "dune"),
        texts(&["Dune (1965)"])
    );
}

#[test]
fn test_large_numbers_use_exponent_text() {
    assert_eq!(
        values_on("concat(1000000000000000000000 + 0)", "dune"),
        texts(&["1e+21"])
    );

    let registry = Registry::standard();
    let mut db = MemoryDatabase::new();
    db.add_triple("1e+21", "label", Value::from("googolish"));
    let roots = Roots::new().with_value(VALUE_ROOT, Value::Number(1e21), ValueType::Number);
    let expression = parse_expression(".label", &registry).unwrap();
    let result = expression.evaluate(&roots, VALUE_ROOT, &db, &registry).unwrap();
    assert_eq!(result.values.to_vec(), texts(&["googolish"]));
}

#[test]
fn test_date_range() {
    let test_cases = vec![
        ("date-range('2000-01-01', '2000-01-31')", 30.0),
        ("date-range('2000-01-01', '2000-01-31', 'week')", 4.0),
        ("date-range('2000-01-01T00:00:00Z', '2000-01-01T00:00:05Z', 'second')", 5.0),
        ("date-range('2000-01-01', '2000-01-02', 'fortnight')", 86_400_000.0),
        ("date-range(.born, '1930-10-08', 'year')", 10.0),
    ];
    for (input, expected) in test_cases {
        assert_eq!(values_on(input, "herbert"), vec![Value::Number(expected)], "Failed for input: {}", input);
    }
    assert!(values_on("date-range(.missing, '2000-01-01')", "herbert").is_empty());
}

#[test]
fn test_distance() {
    assert_eq!(
        values_on("distance('0,0', 0, 1, 'km', 0.1)", "dune"),
        vec![Value::Number(111.3)]
    );
    assert_eq!(
        values_on("distance('0,0', 0, 1, 'mile')", "dune"),
        vec![Value::Number(69.0)]
    );
    assert!(values_on("distance('nowhere', 0, 1)", "dune").is_empty());
}

#[test]
fn test_now_is_a_date() {
    let (values, value_type) = eval_on("now()", "dune").unwrap();
    assert_eq!(values.len(), 1);
    assert_eq!(value_type, ValueType::Date);
}

#[test]
fn test_unknown_function_at_evaluation() {
    assert_eq!(
        eval_on("a()", "dune").unwrap_err(),
        EvalError::UnknownFunction { name: "a".into() }
    );
}

#[test]
fn test_registered_extension_function() {
    let mut registry = Registry::standard();
    registry
        .register_function("shout", |args: &[Collection]| -> EvalResult<Collection> {
            let values = args
                .iter()
                .flat_map(|arg| arg.iter())
                .map(|v| Value::Text(v.as_text().to_uppercase()))
                .collect::<Vec<_>>();
            Ok(Collection::sequence(values, ValueType::Text))
        })
        .unwrap();

    let db = library();
    let expression = parse_expression("shout(.label)", &registry).unwrap();
    let result = expression.evaluate_single_on_item("dune", &db, &registry).unwrap();
    assert_eq!(result.value, Some(Value::from("DUNE")));
    assert_eq!(result.value_type, ValueType::Text);
}

#[test]
fn test_removed_control_fails_at_evaluation() {
    let mut registry = Registry::standard();
    let db = library();
    let expression = parse_expression("if(1, 2, 3)", &registry).unwrap();
    registry.remove_control("if");
    assert_eq!(
        expression.evaluate_on_item("dune", &db, &registry).unwrap_err(),
        EvalError::UnknownControl { name: "if".into() }
    );
}

#[test]
fn test_evaluate_single_on_empty() {
    let registry = Registry::standard();
    let db = library();
    let expression = parse_expression(".year", &registry).unwrap();
    let result = expression.evaluate_single_on_item("herbert", &db, &registry).unwrap();
    assert_eq!(result.value, None);
    assert_eq!(result.value_type, ValueType::Number);
}
