//! Report validation utilities.

use crate::report::{MinReport, Report};
use crate::schema;
use jsonschema::JSONSchema;
use serde_json::Value;
use thiserror::Error;

/// Validation error type.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Schema validation failed: {0}")]
    SchemaError(String),

    #[error("Group references unknown control: {0}")]
    UnknownGroupControl(String),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Result of report validation.
#[derive(Debug)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.valid = false;
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }

    fn merge(&mut self, other: ValidationResult) {
        for error in other.errors {
            self.add_error(error);
        }
        self.warnings.extend(other.warnings);
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::new()
    }
}

/// Validate a JSON document against a schema.
pub fn validate_against(
    schema_value: &Value,
    document: &Value,
) -> Result<ValidationResult, ValidationError> {
    let mut result = ValidationResult::new();

    let compiled = JSONSchema::compile(schema_value)
        .map_err(|e| ValidationError::SchemaError(e.to_string()))?;

    if let Err(errors) = compiled.validate(document) {
        for error in errors {
            result.add_error(ValidationError::SchemaError(format!(
                "{} at {}",
                error, error.instance_path
            )));
        }
    }

    Ok(result)
}

/// Validate a full report against the exec schema.
pub fn validate_report(report: &Report) -> Result<ValidationResult, ValidationError> {
    let document = serde_json::to_value(report)?;
    let mut result = validate_against(&schema::exec_full_schema(), &document)?;

    // Groups must only reference controls of their own profile
    let mut extra = ValidationResult::new();
    for profile in &report.profiles {
        for group in &profile.groups {
            for id in &group.controls {
                if !profile.controls.iter().any(|c| &c.id == id) {
                    extra.add_error(ValidationError::UnknownGroupControl(id.clone()));
                }
            }
        }
        if profile.controls.is_empty() {
            extra.add_warning(format!("Profile {} has no controls", profile.name));
        }
    }
    result.merge(extra);

    Ok(result)
}

/// Validate a minimal report against the exec-min schema.
pub fn validate_min_report(report: &MinReport) -> Result<ValidationResult, ValidationError> {
    let document = serde_json::to_value(report)?;
    validate_against(&schema::exec_min_schema(), &document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{Control, ControlGroup, ControlResult, Profile, ResultStatus};
    use hostprobe_common::Timestamp;

    fn report() -> Report {
        let mut control = Control::new("x509-/etc/cert.pem", "x509_certificate('/etc/cert.pem')");
        control.results.push(
            ControlResult::new(ResultStatus::Passed, "should be valid", Timestamp::now())
                .with_resource("x509_certificate"),
        );
        control.results.push(
            ControlResult::new(ResultStatus::Skipped, "key_length", Timestamp::now())
                .with_skip_message("key is not RSA"),
        );
        let mut report = Report::new("0.1.0");
        report.profiles.push(Profile {
            name: "adhoc".to_string(),
            controls: vec![control],
            ..Default::default()
        });
        report
    }

    #[test]
    fn test_validate_report() {
        let result = validate_report(&report()).unwrap();
        assert!(result.valid, "Errors: {:?}", result.errors);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_validate_min_report() {
        let result = validate_min_report(&report().to_min()).unwrap();
        assert!(result.valid, "Errors: {:?}", result.errors);
    }

    #[test]
    fn test_validate_report_unknown_field() {
        let mut document = serde_json::to_value(report()).unwrap();
        document["profiles"][0]["controls"][0]["results"][0]["message"] =
            serde_json::json!("extra");

        let result = validate_against(&schema::exec_full_schema(), &document).unwrap();
        assert!(!result.valid);
    }

    #[test]
    fn test_validate_report_missing_field() {
        let document = serde_json::json!({ "profiles": [] });

        let result = validate_against(&schema::exec_full_schema(), &document).unwrap();
        assert!(!result.valid);
    }

    #[test]
    fn test_validate_min_report_bad_status() {
        let mut document = serde_json::to_value(report().to_min()).unwrap();
        document["controls"][0]["status"] = serde_json::json!("error");

        let result = validate_against(&schema::exec_min_schema(), &document).unwrap();
        assert!(!result.valid);
    }

    #[test]
    fn test_group_references_unknown_control() {
        let mut report = report();
        report.profiles[0].groups.push(ControlGroup {
            id: "controls/bridge.rb".to_string(),
            title: None,
            controls: vec!["missing".to_string()],
        });

        let result = validate_report(&report).unwrap();
        assert!(!result.valid);
        assert!(matches!(
            result.errors[0],
            ValidationError::UnknownGroupControl(ref id) if id == "missing"
        ));
    }

    #[test]
    fn test_empty_profile_warns() {
        let mut report = Report::new("0.1.0");
        report.profiles.push(Profile {
            name: "empty".to_string(),
            ..Default::default()
        });

        let result = validate_report(&report).unwrap();
        assert!(result.valid);
        assert_eq!(result.warnings, vec!["Profile empty has no controls"]);
    }
}
