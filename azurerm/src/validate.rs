//! Validators and plan modifiers shared by the resources

use regex::{Captures, Regex};
use std::sync::{Arc, LazyLock};
use tfsdk::plan::{PlanModifier, PlanModifyRequest, PlanModifyResponse};
use tfsdk::validator::{
    self, All, StringDoesNotContainAnyValidator, StringFuncValidator, StringNotMatchValidator,
    StringPatternValidator,
};
use tfsdk::{AttributePath, Diagnostics, Dynamic};

use crate::ids::normalize_location;

const MAX_AGENT_LIFETIME_SECONDS: u64 = 7 * 24 * 60 * 60;

/// Names IIS and Windows reserve; Azure DevOps rejects them as project names.
const RESERVED_PROJECT_NAMES: &[&str] = &[
    "App_Browsers",
    "App_code",
    "App_Data",
    "App_GlobalResources",
    "App_LocalResources",
    "App_Themes",
    "App_WebResources",
    "bin",
    "web.config",
    "AUX",
    "CON",
    "NUL",
    "PRN",
    "COM1",
    "COM2",
    "COM3",
    "COM4",
    "COM5",
    "COM6",
    "COM7",
    "COM8",
    "COM9",
    "LPT1",
    "LPT2",
    "LPT3",
    "LPT4",
    "LPT5",
    "LPT6",
    "LPT7",
    "LPT8",
    "LPT9",
];

/// A time span no longer than seven days, written `d.hh:mm:ss` or `hh:mm:ss`.
pub fn agent_lifetime() -> StringFuncValidator {
    StringFuncValidator::new(validate_agent_lifetime)
}

struct TimeSpan {
    days: u64,
    hours: u64,
    minutes: u64,
    seconds: u64,
}

/// `d.hh:mm:ss`
static TIME_SPAN_WITH_DAYS: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^([0-9]+)\.([0-9]{2}):([0-9]{2}):([0-9]{2})$"));

/// `hh:mm:ss`
static TIME_SPAN_WITHOUT_DAYS: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^([0-9]{2}):([0-9]{2}):([0-9]{2})$"));

fn captured(captures: &Captures<'_>, group: usize) -> Option<u64> {
    captures.get(group)?.as_str().parse().ok()
}

fn parse_time_span(value: &str) -> Option<TimeSpan> {
    if let Some(captures) = TIME_SPAN_WITH_DAYS.as_ref().ok()?.captures(value) {
        return Some(TimeSpan {
            // Too many digits to fit is still a (far too long) time span.
            days: captured(&captures, 1).unwrap_or(u64::MAX),
            hours: captured(&captures, 2)?,
            minutes: captured(&captures, 3)?,
            seconds: captured(&captures, 4)?,
        });
    }

    let captures = TIME_SPAN_WITHOUT_DAYS.as_ref().ok()?.captures(value)?;
    Some(TimeSpan {
        days: 0,
        hours: captured(&captures, 1)?,
        minutes: captured(&captures, 2)?,
        seconds: captured(&captures, 3)?,
    })
}

fn validate_agent_lifetime(value: &str, path: &AttributePath, diagnostics: &mut Diagnostics) {
    let Some(span) = parse_time_span(value) else {
        diagnostics.add_attribute_error(
            path,
            format!(
                "{} must be a time span in the format `d.hh:mm:ss` or `hh:mm:ss`, got {:?}",
                path, value
            ),
        );
        return;
    };

    if span.hours > 23 {
        diagnostics.add_attribute_error(path, format!("{}: hours must be between 0 and 23, got {}", path, span.hours));
    }
    if span.minutes > 59 {
        diagnostics.add_attribute_error(path, format!("{}: minutes must be between 0 and 59, got {}", path, span.minutes));
    }
    if span.seconds > 59 {
        diagnostics.add_attribute_error(path, format!("{}: seconds must be between 0 and 59, got {}", path, span.seconds));
    }

    let total = span
        .days
        .saturating_mul(86_400)
        .saturating_add(span.hours * 3_600)
        .saturating_add(span.minutes * 60)
        .saturating_add(span.seconds);
    if total > MAX_AGENT_LIFETIME_SECONDS {
        diagnostics.add_attribute_error(
            path,
            format!("{} must not be longer than 7 days (7.00:00:00), got {}", path, value),
        );
    }
}

/// An Azure DevOps project name. Every rule is checked, so one value can report several.
pub fn project_name() -> All {
    validator::all(vec![
        Arc::new(validator::string_len_between(1, 64)),
        Arc::new(StringNotMatchValidator::new(r"^[_.]", "must not start with '_' or '.'")),
        Arc::new(StringNotMatchValidator::new(r"\.$", "must not end with '.'")),
        Arc::new(StringDoesNotContainAnyValidator {
            characters: r#"\/:*?"'<>;#${},+=[]|"#.to_string(),
            control_characters: true,
        }),
        Arc::new(validator::string_not_in_slice(RESERVED_PROJECT_NAMES, true)),
    ])
}

/// 1-90 characters: letters, digits, `_`, `-`, `.`, `(` and `)`, not ending in `.`.
pub fn resource_group_name() -> All {
    validator::all(vec![
        Arc::new(validator::string_len_between(1, 90)),
        Arc::new(StringPatternValidator::new(
            r"^[-\w._()]+$",
            "letters, digits, underscores, hyphens, periods and parentheses",
        )),
        Arc::new(StringNotMatchValidator::new(r"\.$", "must not end with '.'")),
    ])
}

pub fn connection_name() -> All {
    validator::all(vec![
        Arc::new(validator::StringIsNotEmptyValidator),
        Arc::new(StringNotMatchValidator::new(r"\s", "must not contain whitespace")),
    ])
}

pub fn monitor_name() -> All {
    validator::all(vec![
        Arc::new(validator::string_len_between(1, 50)),
        Arc::new(StringPatternValidator::new(
            r"^[a-zA-Z0-9][a-zA-Z0-9_-]*$",
            "letters, digits, underscores and hyphens, starting with a letter or digit",
        )),
    ])
}

pub fn extension_name() -> All {
    validator::all(vec![
        Arc::new(validator::string_len_between(1, 253)),
        Arc::new(StringPatternValidator::new(
            r"^[a-zA-Z0-9]([a-zA-Z0-9.-]*[a-zA-Z0-9])?$",
            "letters, digits, periods and hyphens, starting and ending with a letter or digit",
        )),
    ])
}

pub fn dns_resolver_name() -> All {
    validator::all(vec![
        Arc::new(validator::string_len_between(1, 80)),
        Arc::new(StringPatternValidator::new(
            r"^[a-zA-Z0-9]([a-zA-Z0-9_-]*[a-zA-Z0-9_])?$",
            "letters, digits, underscores and hyphens, starting with a letter or digit",
        )),
    ])
}

pub fn linker_name() -> StringPatternValidator {
    StringPatternValidator::new(r"^[a-zA-Z0-9._]+$", "letters, digits, periods and underscores")
}

pub fn pool_name() -> All {
    validator::all(vec![
        Arc::new(validator::string_len_between(3, 44)),
        Arc::new(StringPatternValidator::new(
            r"^[a-zA-Z0-9][a-zA-Z0-9.-]*$",
            "letters, digits, periods and hyphens, starting with a letter or digit",
        )),
    ])
}

/// Keeps the prior location when the configured one only differs in case or spacing.
pub struct NormalizedLocation;

impl PlanModifier for NormalizedLocation {
    fn modify_plan(&self, request: PlanModifyRequest) -> PlanModifyResponse {
        let plan_value = match (&request.state, &request.plan) {
            (Dynamic::String(state), Dynamic::String(plan))
                if normalize_location(state) == normalize_location(plan) =>
            {
                request.state.clone()
            }
            _ => request.plan,
        };

        PlanModifyResponse {
            plan_value,
            requires_replace: false,
            diagnostics: Diagnostics::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tfsdk::validator::Validator;

    fn errors(validator: &dyn Validator, value: &str) -> Vec<String> {
        let mut diagnostics = Diagnostics::new();
        validator.validate(
            &Dynamic::from(value),
            &AttributePath::new("value"),
            &mut diagnostics,
        );
        diagnostics.errors.iter().map(|d| d.summary.clone()).collect()
    }

    #[test]
    fn agent_lifetime_boundaries() {
        let v = agent_lifetime();

        assert!(errors(&v, "7.00:00:00").is_empty());
        assert!(errors(&v, "00:00:00").is_empty());
        assert!(errors(&v, "6.23:59:59").is_empty());
        assert!(errors(&v, "23:59:59").is_empty());

        assert_eq!(errors(&v, "7.00:00:01").len(), 1);
        assert_eq!(errors(&v, "24:00:00").len(), 1);
        assert_eq!(errors(&v, "00:60:00").len(), 1);
        assert_eq!(errors(&v, "00:00:60").len(), 1);
    }

    #[test]
    fn agent_lifetime_reports_each_field() {
        let v = agent_lifetime();

        let found = errors(&v, "1.24:60:60");
        assert_eq!(found.len(), 3, "{found:?}");
        assert!(found[0].contains("hours"));
        assert!(found[1].contains("minutes"));
        assert!(found[2].contains("seconds"));

        // out-of-range fields can push the total over the limit too
        assert_eq!(errors(&v, "6.24:00:01").len(), 2);
        assert_eq!(errors(&v, "99999999999999999999999.00:00:00").len(), 1);
    }

    #[test]
    fn agent_lifetime_rejects_other_formats() {
        let v = agent_lifetime();

        for value in ["", "1:00:00", "1.00:00", "a.00:00:00", ".00:00:00", "00:00:00:00", "1h"] {
            assert_eq!(errors(&v, value).len(), 1, "{value:?}");
        }

        let mut diagnostics = Diagnostics::new();
        v.validate(&Dynamic::Bool(true), &AttributePath::new("value"), &mut diagnostics);
        assert!(diagnostics.has_errors());
    }

    #[test]
    fn time_span_reads_both_forms() {
        let span = parse_time_span("3.04:05:06").unwrap();
        assert_eq!((span.days, span.hours, span.minutes, span.seconds), (3, 4, 5, 6));

        let span = parse_time_span("04:05:06").unwrap();
        assert_eq!((span.days, span.hours, span.minutes, span.seconds), (0, 4, 5, 6));

        for value in ["3.4:05:06", "04:05:06.7", "١.00:00:00", "٠٤:05:06", " 04:05:06"] {
            assert!(parse_time_span(value).is_none(), "{value:?}");
        }
    }

    #[test]
    fn project_name_accepts_ordinary_names() {
        let v = project_name();

        let longest = "x".repeat(64);
        for name in ["web", "Fabrikam Fiber", "a", "team-1.api", longest.as_str(), "binaries", "CONTOSO"] {
            assert!(errors(&v, name).is_empty(), "{name:?}");
        }
    }

    #[test]
    fn project_name_rejects_each_rule() {
        let v = project_name();

        assert_eq!(errors(&v, "").len(), 1);
        assert_eq!(errors(&v, &"x".repeat(65)).len(), 1);
        assert_eq!(errors(&v, "_web").len(), 1);
        assert_eq!(errors(&v, ".web").len(), 1);
        assert_eq!(errors(&v, "web.").len(), 1);
        assert_eq!(errors(&v, "we/b").len(), 1);
        assert_eq!(errors(&v, "we$b").len(), 1);
        assert_eq!(errors(&v, "we\tb").len(), 1);
        assert_eq!(errors(&v, "App_Data").len(), 1);
        assert_eq!(errors(&v, "com1").len(), 1);
        assert_eq!(errors(&v, "Web.Config").len(), 1);
    }

    #[test]
    fn project_name_reports_several_reasons() {
        let v = project_name();

        // starts with '.', ends with '.', contains '*'
        assert_eq!(errors(&v, ".a*.").len(), 3);
    }

    #[test]
    fn resource_names() {
        assert!(errors(&resource_group_name(), "my-rg_(1).x").is_empty());
        assert_eq!(errors(&resource_group_name(), "rg.").len(), 1);
        assert_eq!(errors(&resource_group_name(), "r g").len(), 1);

        assert!(errors(&pool_name(), "pool-1").is_empty());
        assert_eq!(errors(&pool_name(), "p").len(), 1);
        assert!(errors(&linker_name(), "conn_1.db").is_empty());
        assert_eq!(errors(&linker_name(), "conn-1").len(), 1);
        assert!(errors(&dns_resolver_name(), "resolver-1").is_empty());
        assert_eq!(errors(&dns_resolver_name(), "-resolver").len(), 1);
        assert!(errors(&monitor_name(), "monitor_1").is_empty());
        assert!(errors(&extension_name(), "flux").is_empty());
        assert_eq!(errors(&extension_name(), "flux-").len(), 1);
        assert_eq!(errors(&connection_name(), "").len(), 1);
    }

    #[test]
    fn location_plan_keeps_equivalent_state() {
        let request = |state: &str, plan: &str| PlanModifyRequest {
            state: Dynamic::from(state),
            plan: Dynamic::from(plan),
            config: Dynamic::from(plan),
            attribute_path: AttributePath::new("location"),
        };

        let kept = NormalizedLocation.modify_plan(request("westeurope", "West Europe"));
        assert_eq!(kept.plan_value, Dynamic::from("westeurope"));

        let changed = NormalizedLocation.modify_plan(request("westeurope", "eastus"));
        assert_eq!(changed.plan_value, Dynamic::from("eastus"));
    }
}
