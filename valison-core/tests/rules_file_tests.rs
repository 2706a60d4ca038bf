// valison-core/tests/rules_file_tests.rs
use std::io::Write;

use anyhow::Result;
use serde_json::json;
use test_log::test;

use valison_core::{headless_validate_str, Engine, HeadlessMode, RulesFile};

#[test]
fn yaml_rules_drive_validation() -> Result<()> {
    let yaml_content = r#"
rules:
  name:
    - trim
    - [isLength, "Name must be 2-20 characters", 2, 20]
  email: [trim, toLowerCase, [isEmail, "Not an email"]]
  age:
    - unless: "isInt(value) && value >= 18"
      msg: Adults only
"#;
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile()?;
    file.write_all(yaml_content.as_bytes())?;

    let rules = RulesFile::load_from_file(file.path())?;
    assert_eq!(rules.path_count(), 3);

    let mut data = json!({"name": " J ", "email": " A@B.CO ", "age": 20});
    let issues = Engine::new()
        .with_options(rules.options.clone())
        .validate(&rules.rules, &mut data)?;

    assert_eq!(issues.len(), 1);
    assert_eq!(issues["name"], "Name must be 2-20 characters");
    assert_eq!(data["email"], json!("a@b.co"));
    assert_eq!(data["name"], json!(" J "));
    Ok(())
}

#[test]
fn json_rules_with_options() -> Result<()> {
    let json_content = r#"{
        "options": {"message_marker": "error=", "positional_messages": false},
        "rules": {"zip": [["matches", "^[0-9]{5}$", "error=Five digits"]]}
    }"#;
    let mut file = tempfile::Builder::new().suffix(".json").tempfile()?;
    file.write_all(json_content.as_bytes())?;

    let rules = RulesFile::load_from_file(file.path())?;
    assert_eq!(rules.options.message_marker, "error=");

    let report = headless_validate_str(&rules, r#"{"zip": "1234"}"#, HeadlessMode::Check)?;
    assert_eq!(serde_json::to_value(&report.validity)?, json!({"zip": "Five digits"}));

    let report = headless_validate_str(&rules, r#"{"zip": "12345"}"#, HeadlessMode::Check)?;
    assert_eq!(serde_json::to_value(&report.validity)?, json!(true));
    Ok(())
}

#[test]
fn malformed_files_report_context() -> Result<()> {
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile()?;
    file.write_all(b"rules: [not, a, mapping]\n")?;

    let err = RulesFile::load_from_file(file.path()).unwrap_err();
    assert!(format!("{:#}", err).contains("Failed to parse rules file"));
    Ok(())
}
