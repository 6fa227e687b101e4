//! Attribute validators
//!
//! A validator inspects one value at one path and records warnings and errors. Null and
//! unknown values are never passed in; the schema skips them. Validators compose with
//! [`All`], [`Any`] and [`NoneOf`].

use crate::identifier::ResourceId;
use crate::types::{AttributePath, Diagnostic, Diagnostics, Dynamic};
use std::marker::PhantomData;
use std::sync::Arc;

pub trait Validator: Send + Sync {
    fn validate(&self, value: &Dynamic, path: &AttributePath, diagnostics: &mut Diagnostics);

    /// Short phrase used when the validator is negated, e.g. "be one of [a, b]".
    fn description(&self) -> String {
        "pass validation".to_string()
    }
}

fn add_error(
    diagnostics: &mut Diagnostics,
    path: &AttributePath,
    summary: String,
    detail: impl Into<String>,
) {
    diagnostics.push(Diagnostic::error(summary, detail).with_attribute(path.clone()));
}

/// Runs every validator and accumulates all of their diagnostics.
pub struct All {
    pub validators: Vec<Arc<dyn Validator>>,
}

impl Validator for All {
    fn validate(&self, value: &Dynamic, path: &AttributePath, diagnostics: &mut Diagnostics) {
        for validator in &self.validators {
            validator.validate(value, path, diagnostics);
        }
    }

    fn description(&self) -> String {
        let parts: Vec<String> = self.validators.iter().map(|v| v.description()).collect();
        parts.join(" and ")
    }
}

/// Passes when at least one validator passes; otherwise reports every validator's errors.
pub struct Any {
    pub validators: Vec<Arc<dyn Validator>>,
}

impl Validator for Any {
    fn validate(&self, value: &Dynamic, path: &AttributePath, diagnostics: &mut Diagnostics) {
        let mut failures = Diagnostics::new();
        for validator in &self.validators {
            let mut attempt = Diagnostics::new();
            validator.validate(value, path, &mut attempt);
            if !attempt.has_errors() {
                diagnostics.warnings.extend(attempt.warnings);
                return;
            }
            failures.extend(attempt);
        }
        diagnostics.extend(failures);
    }

    fn description(&self) -> String {
        let parts: Vec<String> = self.validators.iter().map(|v| v.description()).collect();
        parts.join(" or ")
    }
}

/// Fails when any of the validators passes.
pub struct NoneOf {
    pub validators: Vec<Arc<dyn Validator>>,
}

impl Validator for NoneOf {
    fn validate(&self, value: &Dynamic, path: &AttributePath, diagnostics: &mut Diagnostics) {
        for validator in &self.validators {
            let mut attempt = Diagnostics::new();
            validator.validate(value, path, &mut attempt);
            if !attempt.has_errors() {
                add_error(
                    diagnostics,
                    path,
                    format!("{} must not {}", path, validator.description()),
                    "",
                );
            }
        }
    }

    fn description(&self) -> String {
        let parts: Vec<String> = self.validators.iter().map(|v| v.description()).collect();
        format!("not {}", parts.join(" or "))
    }
}

pub struct StringLengthValidator {
    pub min: Option<usize>,
    pub max: Option<usize>,
}

impl Validator for StringLengthValidator {
    fn validate(&self, value: &Dynamic, path: &AttributePath, diagnostics: &mut Diagnostics) {
        if let Some(s) = value.as_str() {
            let length = s.chars().count();
            if let Some(min) = self.min {
                if length < min {
                    add_error(
                        diagnostics,
                        path,
                        format!("{} must have minimum length of {}", path, min),
                        format!("Got length {}", length),
                    );
                }
            }
            if let Some(max) = self.max {
                if length > max {
                    add_error(
                        diagnostics,
                        path,
                        format!("{} must have maximum length of {}", path, max),
                        format!("Got length {}", length),
                    );
                }
            }
        }
    }

    fn description(&self) -> String {
        format!(
            "have a length between {} and {}",
            self.min.unwrap_or(0),
            self.max.map(|m| m.to_string()).unwrap_or_else(|| "any".to_string())
        )
    }
}

/// Requires the value to match a regular expression.
pub struct StringPatternValidator {
    pattern: Result<regex::Regex, regex::Error>,
    pub description: String,
}

impl StringPatternValidator {
    pub fn new(pattern: &str, description: impl Into<String>) -> Self {
        Self {
            pattern: regex::Regex::new(pattern),
            description: description.into(),
        }
    }
}

impl Validator for StringPatternValidator {
    fn validate(&self, value: &Dynamic, path: &AttributePath, diagnostics: &mut Diagnostics) {
        let Some(s) = value.as_str() else { return };
        match &self.pattern {
            Ok(pattern) if pattern.is_match(s) => {}
            Ok(_) => add_error(
                diagnostics,
                path,
                format!("{} must match {}", path, self.description),
                format!("Value '{}' does not match pattern", s),
            ),
            Err(e) => add_error(
                diagnostics,
                path,
                format!("{} has an invalid validation pattern", path),
                e.to_string(),
            ),
        }
    }

    fn description(&self) -> String {
        format!("match {}", self.description)
    }
}

/// Rejects values matching a regular expression. `message` completes "{path} ...".
pub struct StringNotMatchValidator {
    pattern: Result<regex::Regex, regex::Error>,
    pub message: String,
}

impl StringNotMatchValidator {
    pub fn new(pattern: &str, message: impl Into<String>) -> Self {
        Self {
            pattern: regex::Regex::new(pattern),
            message: message.into(),
        }
    }
}

impl Validator for StringNotMatchValidator {
    fn validate(&self, value: &Dynamic, path: &AttributePath, diagnostics: &mut Diagnostics) {
        let Some(s) = value.as_str() else { return };
        match &self.pattern {
            Ok(pattern) if !pattern.is_match(s) => {}
            Ok(_) => add_error(
                diagnostics,
                path,
                format!("{} {}", path, self.message),
                format!("Got '{}'", s),
            ),
            Err(e) => add_error(
                diagnostics,
                path,
                format!("{} has an invalid validation pattern", path),
                e.to_string(),
            ),
        }
    }
}

/// Rejects values containing any of `characters`, and optionally any control character.
pub struct StringDoesNotContainAnyValidator {
    pub characters: String,
    pub control_characters: bool,
}

impl Validator for StringDoesNotContainAnyValidator {
    fn validate(&self, value: &Dynamic, path: &AttributePath, diagnostics: &mut Diagnostics) {
        let Some(s) = value.as_str() else { return };

        let found: Vec<char> = self
            .characters
            .chars()
            .filter(|c| s.contains(*c))
            .collect();
        if !found.is_empty() {
            add_error(
                diagnostics,
                path,
                format!("{} must not contain any of {:?}", path, self.characters),
                format!(
                    "Found {}",
                    found.iter().map(|c| format!("{:?}", c)).collect::<Vec<_>>().join(", ")
                ),
            );
        }

        if self.control_characters && s.chars().any(char::is_control) {
            add_error(
                diagnostics,
                path,
                format!("{} must not contain control characters", path),
                "",
            );
        }
    }
}

pub struct StringInSliceValidator {
    pub values: Vec<String>,
    pub ignore_case: bool,
}

impl StringInSliceValidator {
    fn contains(&self, s: &str) -> bool {
        self.values.iter().any(|v| {
            if self.ignore_case {
                v.eq_ignore_ascii_case(s)
            } else {
                v == s
            }
        })
    }
}

impl Validator for StringInSliceValidator {
    fn validate(&self, value: &Dynamic, path: &AttributePath, diagnostics: &mut Diagnostics) {
        if let Some(s) = value.as_str() {
            if !self.contains(s) {
                add_error(
                    diagnostics,
                    path,
                    format!("expected {} to be one of {:?}", path, self.values),
                    format!("Got '{}'", s),
                );
            }
        }
    }

    fn description(&self) -> String {
        format!("be one of {:?}", self.values)
    }
}

pub struct StringNotInSliceValidator {
    pub values: Vec<String>,
    pub ignore_case: bool,
}

impl Validator for StringNotInSliceValidator {
    fn validate(&self, value: &Dynamic, path: &AttributePath, diagnostics: &mut Diagnostics) {
        let Some(s) = value.as_str() else { return };
        let blocked = self.values.iter().any(|v| {
            if self.ignore_case {
                v.eq_ignore_ascii_case(s)
            } else {
                v == s
            }
        });
        if blocked {
            add_error(
                diagnostics,
                path,
                format!("expected {} not to be any of {:?}", path, self.values),
                format!("Got '{}'", s),
            );
        }
    }

    fn description(&self) -> String {
        format!("not be any of {:?}", self.values)
    }
}

pub struct StringIsNotEmptyValidator;

impl Validator for StringIsNotEmptyValidator {
    fn validate(&self, value: &Dynamic, path: &AttributePath, diagnostics: &mut Diagnostics) {
        match value {
            Dynamic::String(s) if s.is_empty() => add_error(
                diagnostics,
                path,
                format!("expected {} to not be an empty string", path),
                "",
            ),
            Dynamic::String(_) => {}
            other => add_error(
                diagnostics,
                path,
                format!("expected type of {} to be string", path),
                format!("Got {}", other.type_name()),
            ),
        }
    }

    fn description(&self) -> String {
        "be a non-empty string".to_string()
    }
}

pub struct NumberRangeValidator {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl Validator for NumberRangeValidator {
    fn validate(&self, value: &Dynamic, path: &AttributePath, diagnostics: &mut Diagnostics) {
        if let Some(n) = value.as_number() {
            if let Some(min) = self.min {
                if n < min {
                    add_error(
                        diagnostics,
                        path,
                        format!("{} must be at least {}", path, min),
                        format!("Got {}", n),
                    );
                }
            }
            if let Some(max) = self.max {
                if n > max {
                    add_error(
                        diagnostics,
                        path,
                        format!("{} must be at most {}", path, max),
                        format!("Got {}", n),
                    );
                }
            }
        }
    }
}

pub struct ListLengthValidator {
    pub min: Option<usize>,
    pub max: Option<usize>,
}

impl Validator for ListLengthValidator {
    fn validate(&self, value: &Dynamic, path: &AttributePath, diagnostics: &mut Diagnostics) {
        if let Dynamic::List(items) = value {
            if let Some(min) = self.min {
                if items.len() < min {
                    add_error(
                        diagnostics,
                        path,
                        format!("{} must have at least {} items", path, min),
                        format!("Got {} items", items.len()),
                    );
                }
            }
            if let Some(max) = self.max {
                if items.len() > max {
                    add_error(
                        diagnostics,
                        path,
                        format!("{} must have at most {} items", path, max),
                        format!("Got {} items", items.len()),
                    );
                }
            }
        }
    }
}

/// Applies `inner` to every element of a list, addressing each by index.
pub struct ListElementsValidator {
    pub inner: Arc<dyn Validator>,
}

impl Validator for ListElementsValidator {
    fn validate(&self, value: &Dynamic, path: &AttributePath, diagnostics: &mut Diagnostics) {
        if let Dynamic::List(items) = value {
            for (idx, item) in items.iter().enumerate() {
                if item.is_null() || item.is_unknown() {
                    continue;
                }
                self.inner
                    .validate(item, &path.clone().index(idx as i64), diagnostics);
            }
        }
    }
}

pub struct IsUuidValidator;

impl Validator for IsUuidValidator {
    fn validate(&self, value: &Dynamic, path: &AttributePath, diagnostics: &mut Diagnostics) {
        if let Some(s) = value.as_str() {
            if uuid::Uuid::parse_str(s).is_err() {
                add_error(
                    diagnostics,
                    path,
                    format!("expected {} to be a valid UUID", path),
                    format!("Got '{}'", s),
                );
            }
        }
    }

    fn description(&self) -> String {
        "be a UUID".to_string()
    }
}

/// Requires an absolute URL with a host and one of the allowed schemes.
pub struct IsUrlValidator {
    pub schemes: Vec<String>,
}

impl Validator for IsUrlValidator {
    fn validate(&self, value: &Dynamic, path: &AttributePath, diagnostics: &mut Diagnostics) {
        let Some(s) = value.as_str() else { return };
        match url::Url::parse(s) {
            Ok(parsed) if parsed.host_str().is_some_and(|h| !h.is_empty()) => {
                if !self.schemes.iter().any(|scheme| scheme == parsed.scheme()) {
                    add_error(
                        diagnostics,
                        path,
                        format!("expected {} to have a url with schema of: {:?}", path, self.schemes),
                        format!("Got '{}'", s),
                    );
                }
            }
            Ok(_) => add_error(
                diagnostics,
                path,
                format!("expected {} to have a host", path),
                format!("Got '{}'", s),
            ),
            Err(e) => add_error(
                diagnostics,
                path,
                format!("expected {} to be a valid url", path),
                e.to_string(),
            ),
        }
    }
}

/// Requires the value to parse as the resource identifier `T`.
pub struct ResourceIdValidator<T> {
    _id: PhantomData<fn() -> T>,
}

impl<T> Default for ResourceIdValidator<T> {
    fn default() -> Self {
        Self { _id: PhantomData }
    }
}

impl<T: ResourceId> Validator for ResourceIdValidator<T> {
    fn validate(&self, value: &Dynamic, path: &AttributePath, diagnostics: &mut Diagnostics) {
        match value {
            Dynamic::String(s) => {
                if let Err(e) = T::parse(s) {
                    add_error(
                        diagnostics,
                        path,
                        format!("{} is not a valid {}", path, T::kind()),
                        e.to_string(),
                    );
                }
            }
            other => add_error(
                diagnostics,
                path,
                format!("expected type of {} to be string", path),
                format!("Got {}", other.type_name()),
            ),
        }
    }
}

/// Adapts a plain function over string values. Non-string values are reported as type errors.
pub struct StringFuncValidator {
    func: fn(&str, &AttributePath, &mut Diagnostics),
}

impl StringFuncValidator {
    pub fn new(func: fn(&str, &AttributePath, &mut Diagnostics)) -> Self {
        Self { func }
    }
}

impl Validator for StringFuncValidator {
    fn validate(&self, value: &Dynamic, path: &AttributePath, diagnostics: &mut Diagnostics) {
        match value {
            Dynamic::String(s) => (self.func)(s, path, diagnostics),
            other => add_error(
                diagnostics,
                path,
                format!("expected type of {} to be string", path),
                format!("Got {}", other.type_name()),
            ),
        }
    }
}

pub fn all(validators: Vec<Arc<dyn Validator>>) -> All {
    All { validators }
}

pub fn any(validators: Vec<Arc<dyn Validator>>) -> Any {
    Any { validators }
}

pub fn none_of(validators: Vec<Arc<dyn Validator>>) -> NoneOf {
    NoneOf { validators }
}

pub fn string_len_between(min: usize, max: usize) -> StringLengthValidator {
    StringLengthValidator {
        min: Some(min),
        max: Some(max),
    }
}

pub fn string_in_slice(values: &[&str], ignore_case: bool) -> StringInSliceValidator {
    StringInSliceValidator {
        values: values.iter().map(|v| v.to_string()).collect(),
        ignore_case,
    }
}

pub fn string_not_in_slice(values: &[&str], ignore_case: bool) -> StringNotInSliceValidator {
    StringNotInSliceValidator {
        values: values.iter().map(|v| v.to_string()).collect(),
        ignore_case,
    }
}

pub fn int_between(min: i64, max: i64) -> NumberRangeValidator {
    NumberRangeValidator {
        min: Some(min as f64),
        max: Some(max as f64),
    }
}

pub fn is_https_url() -> IsUrlValidator {
    IsUrlValidator {
        schemes: vec!["https".to_string()],
    }
}

pub fn resource_id<T: ResourceId>() -> ResourceIdValidator<T> {
    ResourceIdValidator::default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Diagnostics, Dynamic};

    fn run(validator: &dyn Validator, value: Dynamic) -> Diagnostics {
        let mut diags = Diagnostics::new();
        validator.validate(&value, &AttributePath::new("test_field"), &mut diags);
        diags
    }

    #[test]
    fn string_length_validator_accepts_valid_length() {
        let diags = run(&string_len_between(3, 10), Dynamic::from("hello"));
        assert_eq!(diags.errors.len(), 0);
    }

    #[test]
    fn string_length_validator_rejects_too_short() {
        let validator = StringLengthValidator {
            min: Some(5),
            max: None,
        };

        let diags = run(&validator, Dynamic::from("hi"));

        assert_eq!(diags.errors.len(), 1);
        assert!(diags.errors[0].summary.contains("minimum length"));
        assert_eq!(diags.errors[0].attribute, Some(AttributePath::new("test_field")));
    }

    #[test]
    fn string_length_validator_counts_characters() {
        let diags = run(&string_len_between(1, 2), Dynamic::from("éé"));
        assert!(!diags.has_errors());
    }

    #[test]
    fn string_pattern_validator_rejects_non_matching() {
        let validator = StringPatternValidator::new(r"^\d{3}-\d{3}-\d{4}$", "phone number format");

        assert!(!run(&validator, Dynamic::from("123-456-7890")).has_errors());

        let diags = run(&validator, Dynamic::from("invalid"));
        assert_eq!(diags.errors.len(), 1);
        assert!(diags.errors[0].summary.contains("phone number format"));
    }

    #[test]
    fn invalid_pattern_is_reported_instead_of_panicking() {
        let validator = StringPatternValidator::new(r"([", "broken");
        let diags = run(&validator, Dynamic::from("anything"));
        assert!(diags.errors[0].summary.contains("invalid validation pattern"));
    }

    #[test]
    fn string_not_match_validator_reports_message() {
        let validator = StringNotMatchValidator::new(r"\.$", "must not end with a period");

        assert!(!run(&validator, Dynamic::from("name")).has_errors());

        let diags = run(&validator, Dynamic::from("name."));
        assert_eq!(diags.errors[0].summary, "test_field must not end with a period");
    }

    #[test]
    fn does_not_contain_any_reports_symbols_and_control_characters_separately() {
        let validator = StringDoesNotContainAnyValidator {
            characters: "#$".to_string(),
            control_characters: true,
        };

        let diags = run(&validator, Dynamic::from("a#b\u{7}"));

        assert_eq!(diags.errors.len(), 2);
    }

    #[test]
    fn not_in_slice_ignores_case_when_asked() {
        let sensitive = string_not_in_slice(&["bin"], false);
        let insensitive = string_not_in_slice(&["bin"], true);

        assert!(!run(&sensitive, Dynamic::from("BIN")).has_errors());
        assert!(run(&insensitive, Dynamic::from("BIN")).has_errors());
    }

    #[test]
    fn in_slice_rejects_unknown_value() {
        let validator = string_in_slice(&["Active", "Suspended"], false);

        assert!(!run(&validator, Dynamic::from("Active")).has_errors());
        assert!(run(&validator, Dynamic::from("active")).has_errors());
    }

    #[test]
    fn number_range_validator_rejects_too_small() {
        let validator = NumberRangeValidator {
            min: Some(10.0),
            max: None,
        };

        let diags = run(&validator, Dynamic::Number(5.0));

        assert_eq!(diags.errors.len(), 1);
        assert!(diags.errors[0].summary.contains("at least"));
    }

    #[test]
    fn list_length_validator_accepts_valid_length() {
        let validator = ListLengthValidator {
            min: Some(1),
            max: Some(5),
        };

        let list = Dynamic::List(vec![Dynamic::from("a"), Dynamic::from("b")]);

        assert_eq!(run(&validator, list).errors.len(), 0);
    }

    #[test]
    fn list_elements_validator_addresses_each_element() {
        let validator = ListElementsValidator {
            inner: Arc::new(StringIsNotEmptyValidator),
        };

        let list = Dynamic::List(vec![Dynamic::from("a"), Dynamic::from("")]);
        let diags = run(&validator, list);

        assert_eq!(diags.errors.len(), 1);
        assert_eq!(
            diags.errors[0].attribute,
            Some(AttributePath::new("test_field").index(1))
        );
    }

    #[test]
    fn all_accumulates_every_error() {
        let validator = all(vec![
            Arc::new(string_len_between(5, 10)),
            Arc::new(StringNotMatchValidator::new(r"^_", "must not start with an underscore")),
        ]);

        let diags = run(&validator, Dynamic::from("_a"));

        assert_eq!(diags.errors.len(), 2);
    }

    #[test]
    fn any_passes_when_one_validator_passes() {
        let validator = any(vec![
            Arc::new(IsUuidValidator),
            Arc::new(string_in_slice(&["none"], false)),
        ]);

        assert!(!run(&validator, Dynamic::from("none")).has_errors());
        assert!(!run(
            &validator,
            Dynamic::from("00000000-0000-0000-0000-000000000000")
        )
        .has_errors());
        assert_eq!(run(&validator, Dynamic::from("other")).errors.len(), 2);
    }

    #[test]
    fn none_of_fails_when_a_validator_passes() {
        let validator = none_of(vec![Arc::new(string_in_slice(&["default"], true))]);

        assert!(!run(&validator, Dynamic::from("custom")).has_errors());

        let diags = run(&validator, Dynamic::from("Default"));
        assert_eq!(diags.errors.len(), 1);
        assert!(diags.errors[0].summary.contains("must not be one of"));
    }

    #[test]
    fn is_https_url_requires_scheme_and_host() {
        let validator = is_https_url();

        assert!(!run(&validator, Dynamic::from("https://dev.azure.com/org")).has_errors());
        assert!(run(&validator, Dynamic::from("http://dev.azure.com/org")).has_errors());
        assert!(run(&validator, Dynamic::from("not a url")).has_errors());
    }

    #[test]
    fn string_func_validator_rejects_non_strings() {
        fn never_fails(_: &str, _: &AttributePath, _: &mut Diagnostics) {}

        let validator = StringFuncValidator::new(never_fails);

        assert!(!run(&validator, Dynamic::from("x")).has_errors());
        assert!(run(&validator, Dynamic::Number(1.0)).errors[0]
            .summary
            .contains("to be string"));
    }

    #[test]
    fn custom_validator_runs_custom_logic() {
        struct EvenNumberValidator;

        impl Validator for EvenNumberValidator {
            fn validate(
                &self,
                value: &Dynamic,
                path: &AttributePath,
                diagnostics: &mut Diagnostics,
            ) {
                if let Some(num) = value.as_number() {
                    if num as i64 % 2 != 0 {
                        diagnostics.add_attribute_error(path, format!("{} must be even", path));
                    }
                }
            }
        }

        assert!(!run(&EvenNumberValidator, Dynamic::Number(4.0)).has_errors());
        assert!(run(&EvenNumberValidator, Dynamic::Number(3.0)).has_errors());
    }
}
