//! Non-fatal semantic checks for a parsed document.
use super::{Document, RunMode};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;

/// A problem found in an otherwise parseable document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    /// JSON-ish location, e.g. `test_sections.basic.timeout_seconds`.
    pub path: String,
    pub message: String,
}

impl ConfigIssue {
    fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Collect issues that defaults paper over. Never fails.
pub fn validate_document(document: &Document) -> Vec<ConfigIssue> {
    let mut issues = Vec::new();
    let settings = &document.settings;
    if settings.default_timeout_seconds == 0 {
        issues.push(ConfigIssue::new(
            "test_configuration.default_timeout_seconds",
            format!(
                "must be positive; using {}s",
                super::DEFAULT_TIMEOUT_SECONDS
            ),
        ));
    }
    if settings.generate_report && settings.report_filename.trim().is_empty() {
        issues.push(ConfigIssue::new(
            "test_configuration.report_filename",
            "must be non-empty when generate_report is set",
        ));
    }

    for (name, section) in document.sections.iter() {
        let prefix = format!("test_sections.{name}");
        if name.trim().is_empty() {
            issues.push(ConfigIssue::new(&prefix, "section name is empty"));
        }
        if section.timeout_seconds == Some(0) {
            issues.push(ConfigIssue::new(
                format!("{prefix}.timeout_seconds"),
                "must be positive; using the default timeout",
            ));
        }
        let mut seen = BTreeSet::new();
        for test in &section.tests {
            if test.trim().is_empty() {
                issues.push(ConfigIssue::new(
                    format!("{prefix}.tests"),
                    "contains an empty test identifier",
                ));
            } else if !seen.insert(test.as_str()) {
                issues.push(ConfigIssue::new(
                    format!("{prefix}.tests"),
                    format!("lists {test:?} more than once"),
                ));
            }
        }
    }

    let policy = &document.policy;
    if let RunMode::Unknown(raw) = &policy.run_mode {
        issues.push(ConfigIssue::new(
            "test_execution.run_mode",
            format!("unknown run mode {raw:?}"),
        ));
    }
    for name in &policy.selected_sections {
        if !document.sections.contains(name) {
            issues.push(ConfigIssue::new(
                "test_execution.selected_sections",
                format!("names unknown section {name:?}"),
            ));
        }
    }
    if policy.max_parallel_tests == 0 {
        issues.push(ConfigIssue::new(
            "test_execution.max_parallel_tests",
            "must be positive",
        ));
    }
    issues
}

#[derive(Clone, Copy)]
enum Expect {
    Bool,
    Count,
    Text,
    TextList,
}

impl Expect {
    fn matches(self, value: &Value) -> bool {
        match self {
            Expect::Bool => value.is_boolean(),
            Expect::Count => value.is_u64(),
            Expect::Text => value.is_string(),
            Expect::TextList => value
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_string)),
        }
    }

    fn describe(self) -> &'static str {
        match self {
            Expect::Bool => "a boolean",
            Expect::Count => "a non-negative integer",
            Expect::Text => "a string",
            Expect::TextList => "a list of strings",
        }
    }
}

const SETTINGS_FIELDS: &[(&str, Expect)] = &[
    ("verbose_output", Expect::Bool),
    ("stop_on_failure", Expect::Bool),
    ("generate_report", Expect::Bool),
    ("report_filename", Expect::Text),
    ("default_timeout_seconds", Expect::Count),
];

const SECTION_FIELDS: &[(&str, Expect)] = &[
    ("enabled", Expect::Bool),
    ("timeout_seconds", Expect::Count),
    ("description", Expect::Text),
    ("tests", Expect::TextList),
];

const POLICY_FIELDS: &[(&str, Expect)] = &[
    ("run_mode", Expect::Text),
    ("selected_sections", Expect::TextList),
    ("exclude_sections", Expect::TextList),
    ("parallel_execution", Expect::Bool),
    ("max_parallel_tests", Expect::Count),
];

/// Report known fields whose JSON type is wrong; those fields load as defaults.
pub fn type_issues(root: &Value) -> Vec<ConfigIssue> {
    let mut issues = Vec::new();
    if let Some(settings) = region(root, "test_configuration", &mut issues) {
        check_fields(settings, "test_configuration", SETTINGS_FIELDS, false, &mut issues);
    }
    if let Some(sections) = region(root, "test_sections", &mut issues) {
        for (name, section) in sections {
            let prefix = format!("test_sections.{name}");
            match section.as_object() {
                Some(fields) => check_fields(fields, &prefix, SECTION_FIELDS, true, &mut issues),
                None => issues.push(ConfigIssue::new(
                    prefix,
                    "expected an object; section ignored",
                )),
            }
        }
    }
    if let Some(policy) = region(root, "test_execution", &mut issues) {
        check_fields(policy, "test_execution", POLICY_FIELDS, false, &mut issues);
    }
    issues
}

fn region<'a>(
    root: &'a Value,
    key: &str,
    issues: &mut Vec<ConfigIssue>,
) -> Option<&'a serde_json::Map<String, Value>> {
    let value = root.get(key)?;
    let fields = value.as_object();
    if fields.is_none() {
        issues.push(ConfigIssue::new(key, "expected an object; using defaults"));
    }
    fields
}

fn check_fields(
    fields: &serde_json::Map<String, Value>,
    prefix: &str,
    expected: &[(&str, Expect)],
    null_allowed: bool,
    issues: &mut Vec<ConfigIssue>,
) {
    for (key, expect) in expected {
        let Some(value) = fields.get(*key) else {
            continue;
        };
        if (null_allowed && value.is_null()) || expect.matches(value) {
            continue;
        }
        issues.push(ConfigIssue::new(
            format!("{prefix}.{key}"),
            format!("expected {}; using the default", expect.describe()),
        ));
    }
}
