// valison-core/tests/validation_tests.rs
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Result;
use serde_json::{json, Value};
use test_log::test;

use valison_core::{
    evaluate_guards, is_valid, validate, Engine, EngineOptions, FunctionKind, FunctionRegistry, FunctionSource,
    IssueMap, ValisonError, Validity,
};

fn issues(pairs: &[(&str, &str)]) -> IssueMap {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn sanitizes_and_validates_a_form() -> Result<()> {
    let rules = json!({
        "name": ["trim", ["isLength", "Name must be 2-20 characters", 2, 20]],
        "email": ["trim", ["isEmail", "Not an email"]],
    });
    let mut data = json!({"name": "  Mike ", "email": "bad"});

    let found = validate(&rules, &mut data)?;

    assert_eq!(found, issues(&[("email", "Not an email")]));
    assert_eq!(data["name"], json!("Mike"));
    assert_eq!(data["email"], json!("bad"));
    Ok(())
}

#[test]
fn credit_card_is_cleaned_before_checking() -> Result<()> {
    let rules = json!({
        "creditcard": ["trim", ["whitelist", "0123456789"], ["isCreditCard", "Invalid card"]],
    });

    let mut good = json!({"creditcard": "  3782 822 463 10005 "});
    assert!(validate(&rules, &mut good)?.is_empty());
    assert_eq!(good["creditcard"], json!("378282246310005"));

    let mut bad = json!({"creditcard": " 3725 109 222 299999a "});
    let found = validate(&rules, &mut bad)?;
    assert_eq!(found, issues(&[("creditcard", "Invalid card")]));
    assert_eq!(bad["creditcard"], json!(" 3725 109 222 299999a "));
    Ok(())
}

#[test]
fn inverted_validator_flags_missing_value() -> Result<()> {
    let rules = json!({"middleName": [["!isEmpty", "Middle name required"]]});

    let mut missing = json!({});
    assert_eq!(
        validate(&rules, &mut missing)?,
        issues(&[("middleName", "Middle name required")])
    );
    assert_eq!(missing, json!({}));

    let mut present = json!({"middleName": "Q"});
    assert!(validate(&rules, &mut present)?.is_empty());
    Ok(())
}

#[test]
fn unregistered_function_aborts_before_any_mutation() {
    let rules = json!({"name": ["trim"], "x": ["bogusFn"]});
    let mut data = json!({"name": "  a  "});

    let err = validate(&rules, &mut data).unwrap_err();

    assert!(matches!(err, ValisonError::UnregisteredFunction(ref name) if name == "bogusFn"));
    assert_eq!(data, json!({"name": "  a  "}));
}

#[test]
fn default_message_is_the_step_name_as_written() -> Result<()> {
    let mut data = json!({"a": "", "b": "x"});
    let found = validate(&json!({"a": "!isEmpty", "b": ["isEmpty"]}), &mut data)?;
    assert_eq!(found, issues(&[("a", "!isEmpty"), ("b", "isEmpty")]));
    Ok(())
}

#[test]
fn nested_and_quoted_paths() -> Result<()> {
    let rules = json!({
        "address.line1": "trim",
        "meta[\"display name\"]": ["toUpperCase"],
        "items[0].sku": [["isLength", "sku too short", 3]],
    });
    let mut data = json!({
        "address": {"line1": "  1 Main St "},
        "meta": {"display name": "ann"},
        "items": [{"sku": "ab"}],
    });

    let found = validate(&rules, &mut data)?;

    assert_eq!(found, issues(&[("items[0].sku", "sku too short")]));
    assert_eq!(data["address"]["line1"], json!("1 Main St"));
    assert_eq!(data["meta"]["display name"], json!("ANN"));
    Ok(())
}

#[test]
fn clean_data_round_trips_unchanged() -> Result<()> {
    let rules = json!({
        "name": ["trim", ["isLength", null, 1, 20]],
        "email": ["trim", "toLowerCase", "isEmail"],
        "age": [["isInt", "age must be whole"]],
        "nickname": [["isLength", null, 0, 10]],
    });
    let original = json!({"name": "Mike", "email": "mike@example.com", "age": 42});
    let mut data = original.clone();

    assert!(validate(&rules, &mut data)?.is_empty());
    assert_eq!(data, original);
    Ok(())
}

#[test]
fn sanitization_is_idempotent() -> Result<()> {
    let rules = json!({
        "name": ["trim", "toLowerCase"],
        "phone": [["whitelist", "0123456789"]],
    });
    let mut data = json!({"name": "  MiKe ", "phone": "(555) 010-9999"});

    validate(&rules, &mut data)?;
    let once = data.clone();
    validate(&rules, &mut data)?;

    assert_eq!(data, once);
    assert_eq!(once, json!({"name": "mike", "phone": "5550109999"}));
    Ok(())
}

#[test]
fn short_circuits_after_first_failure() -> Result<()> {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);

    let mut registry = FunctionRegistry::builtin();
    registry.register("counted", FunctionKind::Validator, move |_, _| {
        counter.fetch_add(1, Ordering::SeqCst);
        Value::Bool(true)
    })?;
    let engine = Engine::with_registry(&registry);

    let mut data = json!({"code": "x", "other": "y"});
    let found = engine.validate(
        &json!({
            "code": [["isLength", "too short", 3], "counted"],
            "other": ["counted"],
        }),
        &mut data,
    )?;

    assert_eq!(found, issues(&[("code", "too short")]));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    Ok(())
}

#[test]
fn inversion_flips_boolean_verdicts_only() -> Result<()> {
    let mut registry = FunctionRegistry::new();
    registry.register("yes", FunctionKind::Validator, |_, _| Value::Bool(true))?;
    registry.register("no", FunctionKind::Validator, |_, _| Value::Bool(false))?;
    registry.register("shrug", FunctionKind::Validator, |_, _| json!("maybe"))?;
    let engine = Engine::with_registry(&registry);

    let mut data = json!({});
    let found = engine.validate(
        &json!({"a": ["!yes"], "b": ["!no"], "c": ["shrug", "!shrug"], "d": ["no"]}),
        &mut data,
    )?;

    assert_eq!(found, issues(&[("a", "!yes"), ("d", "no")]));
    Ok(())
}

#[test]
fn is_valid_reports_true_or_issues() -> Result<()> {
    let rules = json!({"email": ["trim", ["isEmail", "Not an email"]]});

    let mut good = json!({"email": " a@b.co "});
    assert_eq!(is_valid(&rules, &mut good)?, Validity::Valid);

    let mut bad = json!({"email": "nope"});
    let result = is_valid(&rules, &mut bad)?;
    assert_eq!(result, Validity::Invalid(issues(&[("email", "Not an email")])));
    assert_eq!(serde_json::to_value(&result)?, json!({"email": "Not an email"}));

    let err = is_valid(&json!({"email": "trim"}), &mut good).unwrap_err();
    assert!(matches!(err, ValisonError::MalformedDefinition { .. }));
    Ok(())
}

#[test]
fn array_document_is_not_replaced_by_a_key_rule() -> Result<()> {
    let mut data = json!([1, 2]);
    let found = validate(&json!({"name": ["trim"]}), &mut data)?;
    assert!(found.is_empty());
    assert_eq!(data, json!([1, 2]));
    Ok(())
}

#[test]
fn trimmed_first_name_passes_length_check() -> Result<()> {
    let mut data = json!({"firstName": " Mike "});
    let found = validate(&json!({"firstName": [["trim"], ["isLength", 1, 20]]}), &mut data)?;
    assert!(found.is_empty());
    assert_eq!(data, json!({"firstName": "Mike"}));
    Ok(())
}

#[test]
fn short_address_line_reports_its_message() -> Result<()> {
    let rules = json!({"address.line1": [["!isNull"], ["isLength", "too short", 5, 10]]});
    let mut data = json!({"address": {"line1": "X"}});

    let found = validate(&rules, &mut data)?;

    assert_eq!(found, issues(&[("address.line1", "too short")]));
    assert_eq!(data, json!({"address": {"line1": "X"}}));
    Ok(())
}

#[test]
fn pincode_guard_passes_and_set_uppercases() -> Result<()> {
    let rules = json!({
        "pincode": [
            {"unless": "isString(value)", "msg": "required"},
            {"set": "toUpperCase(value)"},
        ],
    });
    let mut context = json!({"pincode": "ab12"});
    let mut calls = 0;

    evaluate_guards(&rules, &mut context, |_, _| {
        calls += 1;
        ControlFlow::Continue(())
    })?;

    assert_eq!(calls, 0);
    assert_eq!(context, json!({"pincode": "AB12"}));
    Ok(())
}

#[test]
fn deeply_nested_guard_is_rejected_without_crashing() {
    let depth = 1000;
    let source = format!("{}1{}", "(".repeat(depth), ")".repeat(depth));
    let mut data = json!({"a": 1});

    let err = validate(&json!({"a": {"if": source}}), &mut data).unwrap_err();
    assert!(matches!(err, ValisonError::ExpressionSyntax { .. }));

    let err = evaluate_guards(
        &json!({"a": {"unless": format!("{}true", "!".repeat(depth))}}),
        &mut data,
        |_, _| ControlFlow::Continue(()),
    )
    .unwrap_err();
    assert!(matches!(err, ValisonError::ExpressionSyntax { .. }));
    assert_eq!(data, json!({"a": 1}));
}

#[test]
fn guards_report_violations_and_honour_halting() -> Result<()> {
    let rules = json!({
        "age": [
            {"if": "value < 18", "msg": "minor"},
            {"if": "value < 13", "msg": "child"},
        ],
        "name": {"unless": "isLength(value, 1)", "msg": "name required"},
    });

    let mut seen = Vec::new();
    let mut context = json!({"age": 10});
    evaluate_guards(&rules, &mut context, |step, path| {
        seen.push(format!("{}: {}", path, step.issue_message()));
        ControlFlow::Continue(())
    })?;
    assert_eq!(seen, vec!["age: minor", "age: child", "name: name required"]);

    let mut seen = Vec::new();
    evaluate_guards(&rules, &mut context, |step, path| {
        seen.push(format!("{}: {}", path, step.issue_message()));
        ControlFlow::Break(())
    })?;
    assert_eq!(seen, vec!["age: minor", "name: name required"]);
    Ok(())
}

#[test]
fn guard_set_results_feed_later_paths() -> Result<()> {
    let rules = json!({
        "total": {"set": "price * qty"},
        "discounted": [{"set": "total - 5"}, {"if": "value < 0", "msg": "negative"}],
    });
    let mut context = json!({"price": 3, "qty": 4});

    let annotated = evaluate_guards(&rules, &mut context, |_, _| ControlFlow::Continue(()))?;

    assert_eq!(context, json!({"price": 3, "qty": 4, "total": 12, "discounted": 7}));
    assert!(annotated.guard_steps().all(|(_, step)| step.pass == Some(true)));
    Ok(())
}

#[test]
fn marker_messages_can_sit_anywhere() -> Result<()> {
    let options = EngineOptions {
        message_marker: "!!".to_string(),
        positional_messages: false,
    };
    let engine = Engine::new().with_options(options);
    let mut data = json!({"code": "abc"});

    let found = engine.validate(
        &json!({"code": [["matches", "^[0-9]+$", "!!digits only"]]}),
        &mut data,
    )?;

    assert_eq!(found, issues(&[("code", "digits only")]));
    Ok(())
}

struct Shouting;

impl FunctionSource for Shouting {
    fn label(&self) -> &str {
        "shouting"
    }

    fn register_into(&self, registry: &mut FunctionRegistry) -> Result<(), ValisonError> {
        registry.register("shout", FunctionKind::Sanitizer, |v, _| {
            json!(format!("{}!", v.as_str().unwrap_or_default().to_uppercase()))
        })
    }
}

#[test]
fn custom_sources_extend_the_builtins() -> Result<()> {
    let mut registry = FunctionRegistry::builtin();
    registry.extend_from(&Shouting)?;
    let engine = Engine::with_registry(&registry);

    let mut data = json!({"greeting": " hi "});
    engine.validate(&json!({"greeting": ["trim", "shout"]}), &mut data)?;
    assert_eq!(data["greeting"], json!("HI!"));

    let err = registry.extend_from(&Shouting).unwrap_err();
    assert!(matches!(err, ValisonError::DuplicateFunction { .. }));
    Ok(())
}
