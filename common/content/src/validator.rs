use serde_json::{Map, Value};
use tracing::{debug, warn};
use url::Url;

use crate::mode::ValidationMode;
use crate::report::{FieldIssue, IssueSeverity, ValidationReport};

/// Result of validating a single field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldOutcome<T> {
    Valid(T),
    /// The field was not supplied (or was `null`).
    Absent,
    /// The field was supplied but failed validation.
    Invalid(String),
}

impl<T> FieldOutcome<T> {
    pub fn is_invalid(&self) -> bool {
        matches!(self, FieldOutcome::Invalid(_))
    }

    pub fn map<U, F>(self, f: F) -> FieldOutcome<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            FieldOutcome::Valid(value) => FieldOutcome::Valid(f(value)),
            FieldOutcome::Absent => FieldOutcome::Absent,
            FieldOutcome::Invalid(reason) => FieldOutcome::Invalid(reason),
        }
    }
}

/// Constraints applied by [`FieldValidator::check_integer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntegerBounds {
    pub min: i64,
    pub max: Option<i64>,
    /// Accept floats with an integral value, such as `640.0`.
    pub allow_float: bool,
}

impl IntegerBounds {
    pub const fn at_least(min: i64) -> Self {
        Self {
            min,
            max: None,
            allow_float: false,
        }
    }

    pub const fn with_max(mut self, max: i64) -> Self {
        self.max = Some(max);
        self
    }

    pub const fn allowing_float(mut self) -> Self {
        self.allow_float = true;
        self
    }
}

/// Validates fields of untrusted JSON objects, recording every failure.
///
/// Checks never short-circuit: a caller can run all of them and then report
/// the accumulated [`ValidationReport`] in one go.
#[derive(Debug, Clone, Default)]
pub struct FieldValidator {
    mode: ValidationMode,
    report: ValidationReport,
}

impl FieldValidator {
    pub fn new(mode: ValidationMode) -> Self {
        Self {
            mode,
            report: ValidationReport::new(),
        }
    }

    pub fn strict() -> Self {
        Self::new(ValidationMode::Strict)
    }

    pub fn lenient() -> Self {
        Self::new(ValidationMode::Lenient)
    }

    pub fn mode(&self) -> ValidationMode {
        self.mode
    }

    pub fn is_strict(&self) -> bool {
        self.mode.is_strict()
    }

    pub fn report(&self) -> &ValidationReport {
        &self.report
    }

    pub fn into_report(self) -> ValidationReport {
        self.report
    }

    /// Value must be a string holding an absolute URL with an authority.
    pub fn check_url(
        &mut self,
        container: &Map<String, Value>,
        label: &str,
        field: &str,
        required: bool,
    ) -> FieldOutcome<String> {
        self.check_value(label, field, required, container.get(field), parse_url)
    }

    pub fn check_integer(
        &mut self,
        container: &Map<String, Value>,
        label: &str,
        field: &str,
        required: bool,
        bounds: IntegerBounds,
    ) -> FieldOutcome<i64> {
        self.check_value(label, field, required, container.get(field), |value| {
            parse_integer(value, bounds)
        })
    }

    pub fn check_string(
        &mut self,
        container: &Map<String, Value>,
        label: &str,
        field: &str,
        required: bool,
        allow_empty: bool,
    ) -> FieldOutcome<String> {
        self.check_value(label, field, required, container.get(field), |value| {
            parse_string(value, allow_empty)
        })
    }

    pub fn check_boolean(
        &mut self,
        container: &Map<String, Value>,
        label: &str,
        field: &str,
        required: bool,
    ) -> FieldOutcome<bool> {
        self.check_value(label, field, required, container.get(field), parse_boolean)
    }

    /// Validate an already located value. `null` counts as absent.
    pub fn check_value<T, F>(
        &mut self,
        label: &str,
        field: &str,
        required: bool,
        value: Option<&Value>,
        parse: F,
    ) -> FieldOutcome<T>
    where
        F: FnOnce(&Value) -> Result<T, String>,
    {
        let path = field_path(label, field);
        match value {
            None | Some(Value::Null) => {
                if required {
                    self.record_error(path, "required field is missing");
                }
                FieldOutcome::Absent
            }
            Some(value) => match parse(value) {
                Ok(parsed) => FieldOutcome::Valid(parsed),
                Err(reason) => {
                    if required || self.is_strict() {
                        self.record_error(path, reason.clone());
                    } else {
                        self.record_warning(path, reason.clone());
                    }
                    FieldOutcome::Invalid(reason)
                }
            },
        }
    }

    pub fn record_error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        let issue = FieldIssue::new(path, IssueSeverity::Error, message);
        warn!(path = %issue.path, message = %issue.message, "content validation error");
        self.report.push(issue);
    }

    pub fn record_warning(&mut self, path: impl Into<String>, message: impl Into<String>) {
        let issue = FieldIssue::new(path, IssueSeverity::Warning, message);
        debug!(path = %issue.path, message = %issue.message, "content validation warning");
        self.report.push(issue);
    }
}

pub(crate) fn field_path(label: &str, field: &str) -> String {
    format!("{label}/{field}")
}

pub(crate) fn parse_url(value: &Value) -> Result<String, String> {
    let text = value
        .as_str()
        .ok_or_else(|| format!("expected a URL string, found {}", json_type(value)))?;
    if text.trim().is_empty() {
        return Err("URL must not be empty".to_string());
    }
    let parsed = Url::parse(text).map_err(|err| format!("invalid URL '{text}': {err}"))?;
    if parsed.cannot_be_a_base() || !parsed.has_host() {
        return Err(format!("URL '{text}' must include a scheme and an authority"));
    }
    Ok(text.to_string())
}

pub(crate) fn parse_integer(value: &Value, bounds: IntegerBounds) -> Result<i64, String> {
    let number = match value {
        Value::Number(number) => number,
        other => return Err(format!("expected an integer, found {}", json_type(other))),
    };

    let parsed = if let Some(int) = number.as_i64() {
        int
    } else if number.is_u64() {
        return Err(format!("integer {number} is out of range"));
    } else {
        if !bounds.allow_float {
            return Err(format!("expected an integer, found {number}"));
        }
        let float = number.as_f64().unwrap_or(f64::NAN);
        if !float.is_finite() || float.fract() != 0.0 {
            return Err(format!("expected an integral value, found {number}"));
        }
        if float < i64::MIN as f64 || float >= i64::MAX as f64 {
            return Err(format!("integer {number} is out of range"));
        }
        float as i64
    };

    if parsed < bounds.min {
        return Err(format!("must be at least {}, found {parsed}", bounds.min));
    }
    if let Some(max) = bounds.max {
        if parsed > max {
            return Err(format!("must be at most {max}, found {parsed}"));
        }
    }
    Ok(parsed)
}

pub(crate) fn parse_string(value: &Value, allow_empty: bool) -> Result<String, String> {
    let text = value
        .as_str()
        .ok_or_else(|| format!("expected a string, found {}", json_type(value)))?;
    if !allow_empty && text.trim().is_empty() {
        return Err("must not be empty".to_string());
    }
    Ok(text.to_string())
}

pub(crate) fn parse_boolean(value: &Value) -> Result<bool, String> {
    value
        .as_bool()
        .ok_or_else(|| format!("expected a boolean, found {}", json_type(value)))
}

pub(crate) fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn check_url_accepts_absolute_urls() {
        let container = object(json!({ "url": "https://example.test/img.png?size=2" }));
        let mut validator = FieldValidator::strict();
        let outcome = validator.check_url(&container, "Image", "url", true);
        assert_eq!(
            outcome,
            FieldOutcome::Valid("https://example.test/img.png?size=2".to_string())
        );
        assert!(validator.report().is_empty());
    }

    #[test]
    fn check_url_rejects_relative_and_authorityless_values() {
        let container = object(json!({
            "relative": "/img.png",
            "mail": "mailto:someone@example.test",
            "number": 42,
            "blank": "  "
        }));
        let mut validator = FieldValidator::lenient();
        for field in ["relative", "mail", "number", "blank"] {
            let outcome = validator.check_url(&container, "Image", field, true);
            assert!(outcome.is_invalid(), "{field} should be invalid");
        }
        assert_eq!(validator.report().errors().count(), 4);
        assert!(validator.report().mentions("Image/mail"));
    }

    #[test]
    fn missing_required_field_is_an_error_in_both_modes() {
        let container = Map::new();
        for mode in [ValidationMode::Strict, ValidationMode::Lenient] {
            let mut validator = FieldValidator::new(mode);
            let outcome = validator.check_url(&container, "Image", "url", true);
            assert_eq!(outcome, FieldOutcome::Absent);
            assert!(validator.report().has_errors());
            assert!(validator.report().mentions("Image/url"));
        }
    }

    #[test]
    fn missing_optional_field_is_silent() {
        let container = object(json!({ "width": null }));
        let mut validator = FieldValidator::strict();
        let outcome =
            validator.check_integer(&container, "Image", "width", false, IntegerBounds::at_least(0));
        assert_eq!(outcome, FieldOutcome::Absent);
        assert!(validator.report().is_empty());
    }

    #[test]
    fn optional_failure_severity_follows_mode() {
        let container = object(json!({ "width": -1 }));
        let bounds = IntegerBounds::at_least(0);

        let mut lenient = FieldValidator::lenient();
        assert!(lenient
            .check_integer(&container, "Image", "width", false, bounds)
            .is_invalid());
        assert_eq!(lenient.report().warnings().count(), 1);
        assert!(!lenient.report().has_errors());

        let mut strict = FieldValidator::strict();
        assert!(strict
            .check_integer(&container, "Image", "width", false, bounds)
            .is_invalid());
        assert!(strict.report().has_errors());
    }

    #[test]
    fn check_integer_honours_float_coercion_and_bounds() {
        let container = object(json!({ "whole": 640.0, "fraction": 2.5, "big": 5_000_000_000i64 }));
        let mut validator = FieldValidator::lenient();

        let plain = IntegerBounds::at_least(0);
        assert!(validator
            .check_integer(&container, "Image", "whole", false, plain)
            .is_invalid());
        assert_eq!(
            validator.check_integer(&container, "Image", "whole", false, plain.allowing_float()),
            FieldOutcome::Valid(640)
        );
        assert!(validator
            .check_integer(&container, "Image", "fraction", false, plain.allowing_float())
            .is_invalid());
        assert!(validator
            .check_integer(&container, "Image", "big", false, plain.with_max(u32::MAX as i64))
            .is_invalid());
    }

    #[test]
    fn check_string_and_boolean() {
        let container = object(json!({ "title": "", "flag": "yes", "ok": true }));
        let mut validator = FieldValidator::lenient();
        assert!(validator
            .check_string(&container, "Item", "title", false, false)
            .is_invalid());
        assert_eq!(
            validator.check_string(&container, "Item", "title", false, true),
            FieldOutcome::Valid(String::new())
        );
        assert!(validator.check_boolean(&container, "Item", "flag", false).is_invalid());
        assert_eq!(
            validator.check_boolean(&container, "Item", "ok", true),
            FieldOutcome::Valid(true)
        );
    }

    #[test]
    fn accumulates_issues_across_checks() {
        let container = object(json!({ "width": "wide", "height": -3 }));
        let mut validator = FieldValidator::lenient();
        let bounds = IntegerBounds::at_least(0);
        validator.check_url(&container, "Image", "url", true);
        validator.check_integer(&container, "Image", "width", false, bounds);
        validator.check_integer(&container, "Image", "height", false, bounds);

        let report = validator.into_report();
        let paths: Vec<&str> = report.issues().iter().map(|issue| issue.path.as_str()).collect();
        assert_eq!(paths, vec!["Image/url", "Image/width", "Image/height"]);
    }
}
