// tests/registry_tests.rs

use jex::{compile, eval, eval_with, EvalError, Registry, Value};
use serde_json::json;

fn run(expr: &str, msg: serde_json::Value) -> Result<Value, EvalError> {
    let ast = compile(expr).unwrap_or_else(|e| panic!("parse failed for {:?}: {}", expr, e));
    eval(&ast, &Value::from(msg))
}

fn run_ok(expr: &str, msg: serde_json::Value) -> Value {
    run(expr, msg).unwrap_or_else(|e| panic!("eval failed for {:?}: {}", expr, e))
}

// ============================================================================
// Reductions
// ============================================================================

#[test]
fn test_sum() {
    assert_eq!(
        run_ok(
            "$sum(.items[].price)",
            json!({"items": [{"price": 1}, {"price": 2}, {"price": 3}]})
        ),
        Value::Number(6.0)
    );
    assert_eq!(run_ok("$sum(.xs)", json!({"xs": []})), Value::Number(0.0));
}

#[test]
fn test_min_max() {
    let msg = json!({"xs": [3.5, -1.0, 7.0]});
    assert_eq!(run_ok("$min(.xs)", msg.clone()), Value::Number(-1.0));
    assert_eq!(run_ok("$max(.xs)", msg), Value::Number(7.0));
}

#[test]
fn test_len() {
    assert_eq!(run_ok("$len(.xs)", json!({"xs": [1, 2, 3]})), Value::Number(3.0));
    assert_eq!(run_ok("$len(.xs)", json!({"xs": []})), Value::Number(0.0));
}

#[test]
fn test_reductions_return_null_on_wrong_shape() {
    let test_cases = vec!["$sum(.v)", "$min(.v)", "$max(.v)", "$len(.v)"];
    for expr in test_cases {
        assert_eq!(
            run_ok(expr, json!({"v": "not a list"})),
            Value::Null,
            "Failed for: {}",
            expr
        );
    }

    // numeric reductions also refuse lists with non-numeric elements;
    // $len counts any list
    for expr in ["$sum(.v)", "$min(.v)", "$max(.v)"] {
        assert_eq!(
            run_ok(expr, json!({"v": ["a", 1]})),
            Value::Null,
            "mixed elements, failed for: {}",
            expr
        );
    }
    assert_eq!(run_ok("$len(.v)", json!({"v": ["a", 1]})), Value::Number(2.0));
}

// ============================================================================
// Math
// ============================================================================

#[test]
fn test_math_functions() {
    assert_eq!(run_ok("$sqrt(.n)", json!({"n": 9})), Value::Number(3.0));
    assert_eq!(run_ok("$sqrt(.n)", json!({"n": -1})), Value::Null);
    assert_eq!(run_ok("$abs(.n)", json!({"n": -2.5})), Value::Number(2.5));
    assert_eq!(run_ok("$floor(.n)", json!({"n": 2.9})), Value::Number(2.0));
    assert_eq!(run_ok("$pow(.a, .b)", json!({"a": 2, "b": 10})), Value::Number(1024.0));
    assert_eq!(run_ok("$pow(.a, 'x')", json!({"a": 2})), Value::Null);
}

// ============================================================================
// Shape Conversions
// ============================================================================

#[test]
fn test_keys() {
    let result = run_ok("$keys(.obj)", json!({"obj": {"a": 1, "b": 2}}));
    let mut names: Vec<String> = match result {
        Value::Array(items) => items
            .into_iter()
            .map(|v| v.as_str().unwrap_or_default().to_string())
            .collect(),
        other => panic!("expected array, got {:?}", other),
    };
    names.sort();
    assert_eq!(names, vec!["a".to_string(), "b".to_string()]);
}

#[test]
fn test_str() {
    let test_cases = vec![
        ("$str(.v)", json!({"v": 42}), "42"),
        ("$str(.v)", json!({"v": 2.5}), "2.5"),
        ("$str(.v)", json!({"v": true}), "true"),
        ("$str(.v)", json!({"v": null}), "null"),
        ("$str(.v)", json!({"v": "pass"}), "pass"),
        // containers render as canonical JSON with sorted keys
        ("$str(.v)", json!({"v": {"b": 1, "a": [true, null]}}), "{\"a\":[true,null],\"b\":1}"),
    ];

    for (expr, msg, expected) in test_cases {
        assert_eq!(
            run_ok(expr, msg),
            Value::String(expected.to_string()),
            "Failed for: {}",
            expr
        );
    }
}

#[test]
fn test_num() {
    assert_eq!(run_ok("$num(.v)", json!({"v": "3.5"})), Value::Number(3.5));
    assert_eq!(run_ok("$num(.v)", json!({"v": 2})), Value::Number(2.0));
    assert_eq!(run_ok("$num(.v)", json!({"v": true})), Value::Number(1.0));
    assert_eq!(run_ok("$num(.v)", json!({"v": false})), Value::Number(0.0));
    assert_eq!(run_ok("$num(.v)", json!({"v": null})), Value::Number(0.0));
    assert_eq!(run_ok("$num(.v)", json!({"v": [1]})), Value::Number(0.0));
    // a malformed numeric string fails instead of defaulting
    assert!(run("$num(.v)", json!({"v": "abc"})).is_err());
}

#[test]
fn test_bool_strict() {
    assert_eq!(run_ok("$bool(.v)", json!({"v": "true"})), Value::Bool(true));
    assert_eq!(run_ok("$bool(.v)", json!({"v": "0"})), Value::Bool(false));
    assert_eq!(run_ok("$bool(.v)", json!({"v": false})), Value::Bool(false));
    assert_eq!(run_ok("$bool(.v)", json!({"v": 1})), Value::Null);
    assert_eq!(run_ok("$bool(.v)", json!({"v": null})), Value::Null);
    assert!(run("$bool(.v)", json!({"v": "yes"})).is_err());
}

#[test]
fn test_loose_truthiness() {
    let test_cases = vec![
        (json!({"v": [1]}), true),
        (json!({"v": []}), false),
        (json!({"v": {"k": 1}}), true),
        (json!({"v": {}}), false),
        (json!({"v": "x"}), true),
        (json!({"v": ""}), false),
        (json!({"v": 3}), true),
        (json!({"v": 0}), false),
        (json!({"v": -1}), false),
        (json!({"v": true}), true),
        (json!({"v": null}), false),
    ];

    for (msg, expected) in test_cases {
        assert_eq!(
            run_ok("$~bool(.v)", msg.clone()),
            Value::Bool(expected),
            "Failed for: {}",
            msg
        );
    }
}

// ============================================================================
// Strings and Membership
// ============================================================================

#[test]
fn test_contains() {
    assert_eq!(
        run_ok("$contains(.s, 'ell')", json!({"s": "hello"})),
        Value::Bool(true)
    );
    assert_eq!(
        run_ok("$contains(.s, 'z')", json!({"s": "hello"})),
        Value::Bool(false)
    );
    assert_eq!(run_ok("$contains(.s, 5)", json!({"s": "hello"})), Value::Null);
}

#[test]
fn test_regex() {
    assert_eq!(
        run_ok("$regex(.s, \"^ab\")", json!({"s": "abcd"})),
        Value::Bool(true)
    );
    assert_eq!(
        run_ok("$regex(.s, \"^cd\")", json!({"s": "abcd"})),
        Value::Bool(false)
    );
    // a malformed pattern is an inherent failure
    assert!(run("$regex(.s, \"(\")", json!({"s": "abcd"})).is_err());
}

#[test]
fn test_has() {
    let msg = json!({"xs": [1, "two", true]});
    assert_eq!(run_ok("$has(.xs, 1)", msg.clone()), Value::Bool(true));
    assert_eq!(run_ok("$has(.xs, 'two')", msg.clone()), Value::Bool(true));
    assert_eq!(run_ok("$has(.xs, 2)", msg.clone()), Value::Bool(false));
    // membership never holds across shapes
    assert_eq!(run_ok("$has(.xs, 'true')", msg.clone()), Value::Bool(false));
    assert_eq!(run_ok("$has(.n, 1)", json!({"n": 5})), Value::Null);
}

#[test]
fn test_exists_checks_presence_not_truthiness() {
    assert_eq!(
        run_ok("$exists(., \"k\")", json!({"k": null})),
        Value::Bool(true)
    );
    assert_eq!(
        run_ok("$exists(., \"k\")", json!({"other": 1})),
        Value::Bool(false)
    );
    assert_eq!(run_ok("$exists(.xs, \"k\")", json!({"xs": [1]})), Value::Null);
}

// ============================================================================
// Time
// ============================================================================

#[test]
fn test_now_is_epoch_milliseconds() {
    let result = run_ok("$now()", json!({}));
    match result {
        // well past 2001 in epoch-millis terms, and a whole number
        Value::Number(ms) => {
            assert!(ms > 1.0e12, "implausible $now(): {}", ms);
            assert_eq!(ms.fract(), 0.0);
        }
        other => panic!("expected number, got {:?}", other),
    }
}

#[test]
fn test_parse_time() {
    assert_eq!(
        run_ok(
            "$parseTime(\"%Y-%m-%d\", .d)",
            json!({"d": "1970-01-02"})
        ),
        Value::Number(86_400_000.0)
    );
    assert_eq!(
        run_ok(
            "$parseTime(\"%Y-%m-%d %H:%M:%S\", .d)",
            json!({"d": "1970-01-01 00:01:00"})
        ),
        Value::Number(60_000.0)
    );
    assert!(run(
        "$parseTime(\"%Y-%m-%d\", .d)",
        json!({"d": "not a date"})
    )
    .is_err());
    assert_eq!(
        run_ok("$parseTime(.layout, .d)", json!({"layout": 5, "d": "x"})),
        Value::Null
    );
}

#[test]
fn test_fmt_time() {
    assert_eq!(
        run_ok("$fmtTime(\"%Y-%m-%d\", .ms)", json!({"ms": 0})),
        Value::String("1970-01-01".to_string())
    );
    assert_eq!(
        run_ok("$fmtTime(\"%Y-%m-%dT%H:%M:%S\", .ms)", json!({"ms": 86400000})),
        Value::String("1970-01-02T00:00:00".to_string())
    );
    assert_eq!(
        run_ok("$fmtTime(\"%Y\", .ms)", json!({"ms": "zero"})),
        Value::Null
    );
}

#[test]
fn test_time_round_trip() {
    let result = run_ok(
        "$fmtTime(\"%Y-%m-%d %H:%M:%S\", $parseTime(\"%Y-%m-%d %H:%M:%S\", .d))",
        json!({"d": "2001-02-03 04:05:06"}),
    );
    assert_eq!(result, Value::String("2001-02-03 04:05:06".to_string()));
}

// ============================================================================
// Custom Registries
// ============================================================================

#[test]
fn test_custom_unary_function() {
    let mut registry = Registry::default();
    registry.add_unary("$double", |v| match v {
        Value::Number(n) => Ok(Value::Number(n * 2.0)),
        _ => Ok(Value::Null),
    });

    let ast = compile("$double(.n)").unwrap();
    let msg = Value::from(json!({"n": 21}));
    assert_eq!(eval_with(&registry, &ast, &msg).unwrap(), Value::Number(42.0));
}

#[test]
fn test_custom_binary_function() {
    let mut registry = Registry::default();
    registry.add_binary("$pair", |a, b| Ok(Value::Array(vec![a, b])));

    let ast = compile("$pair(.a, .b)").unwrap();
    let msg = Value::from(json!({"a": 1, "b": "x"}));
    assert_eq!(
        eval_with(&registry, &ast, &msg).unwrap(),
        Value::Array(vec![Value::Number(1.0), Value::String("x".to_string())])
    );
}

#[test]
fn test_custom_function_can_fail() {
    let mut registry = Registry::default();
    registry.add_unary("$reject", |_| {
        Err(EvalError::FunctionError("$reject: always fails".to_string()))
    });

    let ast = compile("$reject(.n)").unwrap();
    let msg = Value::from(json!({"n": 1}));
    assert!(eval_with(&registry, &ast, &msg).is_err());
}

#[test]
fn test_cloned_registries_are_independent() {
    let base = Registry::default();
    let mut extended = base.clone();
    extended.add_unary("$tag", |v| Ok(Value::Array(vec![v])));

    let ast = compile("$tag(.n)").unwrap();
    let msg = Value::from(json!({"n": 1}));

    assert!(eval_with(&extended, &ast, &msg).is_ok());
    assert_eq!(
        eval_with(&base, &ast, &msg),
        Err(EvalError::UnknownFunction("$tag".to_string()))
    );
}

#[test]
fn test_builtins_survive_in_clones() {
    let registry = Registry::default().clone();
    let ast = compile("$sum(.xs)").unwrap();
    let msg = Value::from(json!({"xs": [1, 2]}));
    assert_eq!(eval_with(&registry, &ast, &msg).unwrap(), Value::Number(3.0));
}
