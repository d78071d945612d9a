//! Pre-flight checks run before anything is packaged or written.
//!
//! Each [`ValidationRule`] inspects the form on its own and reports every
//! problem it finds. The [`ValidationGate`] always runs all of its rules, so
//! the operator gets one complete report instead of fixing issues one at a time.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::PublishError;
use crate::form::FormState;
use crate::index::same_identity;
use crate::manifest::{ExtensionType, MANIFEST_FILE_NAME, RefreshPolicy};

/// Which kind of backend a publish targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// The filesystem emulator, reached directly or over HTTP.
    Local,
    /// A hosted repository (GitHub Contents API).
    Remote,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Local => write!(f, "local"),
            BackendKind::Remote => write!(f, "remote"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationIssueType {
    MissingField,
    MissingFile,
    MissingCredential,
    VersionNotBumped,
    MissingManifest,
    MissingIcon,
    IconNameMismatch,
    SelfDependency,
    InvalidValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Form field the issue belongs to.
    pub field: String,
    pub issue_type: ValidationIssueType,
    pub description: String,
}

impl ValidationIssue {
    pub fn new(
        field: impl Into<String>,
        issue_type: ValidationIssueType,
        description: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            issue_type,
            description: description.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.description, self.field)
    }
}

pub trait ValidationRule: Send + Sync {
    fn rule_name(&self) -> &str;

    fn validate(&self, form: &FormState, backend: BackendKind) -> Vec<ValidationIssue>;
}

/// Scalar fields that must be present and not blank.
pub struct RequiredFieldsRule;

impl ValidationRule for RequiredFieldsRule {
    fn rule_name(&self) -> &str {
        "required_fields"
    }

    fn validate(&self, form: &FormState, _backend: BackendKind) -> Vec<ValidationIssue> {
        let mut text_fields = vec![
            ("appId", "App ID", form.app_id.as_str()),
            ("name", "App Name", form.name.as_str()),
            ("version", "Version", form.version.as_str()),
            ("author", "Author", form.author.as_str()),
        ];
        let mut numeric_fields = Vec::new();

        match form.extension_type {
            ExtensionType::Widget => {
                text_fields.push(("widgetClass", "Widget Class", form.widget_class.as_str()));
                numeric_fields.push(("width", "Width", form.width));
                numeric_fields.push(("height", "Height", form.height));
            }
            ExtensionType::Application => {
                text_fields.push(("entryPoint", "Entry Point", form.entry_point.as_str()));
                text_fields.push(("entryClass", "Entry Class", form.entry_class.as_str()));
                text_fields.push(("entryMethod", "Entry Method", form.entry_method.as_str()));
            }
        }

        let missing_text = text_fields
            .into_iter()
            .filter(|(_, _, value)| value.trim().is_empty())
            .map(|(field, label, _)| (field, label));
        let missing_numbers = numeric_fields
            .into_iter()
            .filter(|(_, _, value)| !value.is_some_and(f64::is_finite))
            .map(|(field, label, _)| (field, label));

        missing_text
            .chain(missing_numbers)
            .map(|(field, label)| {
                ValidationIssue::new(field, ValidationIssueType::MissingField, label)
            })
            .collect()
    }
}

/// Icon and source tree must be selected for a fresh publish.
///
/// Terminal-only applications get a default icon. Widgets always need one.
/// In edit mode every file is an optional update.
pub struct RequiredFilesRule;

impl ValidationRule for RequiredFilesRule {
    fn rule_name(&self) -> &str {
        "required_files"
    }

    fn validate(&self, form: &FormState, _backend: BackendKind) -> Vec<ValidationIssue> {
        if form.is_edit_mode() {
            return Vec::new();
        }

        let mut issues = Vec::new();
        let icon_label = match form.extension_type {
            ExtensionType::Widget => Some("Widget Icon"),
            ExtensionType::Application if !form.terminal_only => Some("Package Icon"),
            ExtensionType::Application => None,
        };
        if let (Some(label), None) = (icon_label, &form.icon) {
            issues.push(ValidationIssue::new(
                "icon",
                ValidationIssueType::MissingFile,
                label,
            ));
        }

        if form.source_files.is_empty() {
            issues.push(ValidationIssue::new(
                "source",
                ValidationIssueType::MissingFile,
                "Source Files",
            ));
        }
        issues
    }
}

/// The remote backend needs a token.
pub struct CredentialRule;

impl ValidationRule for CredentialRule {
    fn rule_name(&self) -> &str {
        "credential"
    }

    fn validate(&self, form: &FormState, backend: BackendKind) -> Vec<ValidationIssue> {
        let blank = form
            .credential
            .as_deref()
            .is_none_or(|token| token.trim().is_empty());
        if backend == BackendKind::Remote && blank {
            vec![ValidationIssue::new(
                "token",
                ValidationIssueType::MissingCredential,
                "GitHub Token",
            )]
        } else {
            Vec::new()
        }
    }
}

/// New files in edit mode must ship under a new version.
pub struct VersionBumpRule;

impl ValidationRule for VersionBumpRule {
    fn rule_name(&self) -> &str {
        "version_bump"
    }

    fn validate(&self, form: &FormState, _backend: BackendKind) -> Vec<ValidationIssue> {
        let Some(session) = &form.edit else {
            return Vec::new();
        };
        if form.has_new_files() && form.version.trim() == session.initial_version.trim() {
            vec![ValidationIssue::new(
                "version",
                ValidationIssueType::VersionNotBumped,
                "New version number (files updated)",
            )]
        } else {
            Vec::new()
        }
    }
}

/// A supplied source tree must carry a manifest and, unless terminal-only, an icon.
pub struct SourceTreeRule;

impl SourceTreeRule {
    fn is_manifest(path: &str, file_name: &str) -> bool {
        let path = path.to_lowercase();
        file_name.to_lowercase() == MANIFEST_FILE_NAME
            || path == MANIFEST_FILE_NAME
            || path.ends_with(&format!("/{}", MANIFEST_FILE_NAME))
    }

    /// At most one folder deep: `icon.png` or `MyApp/icon.png`.
    fn is_root_icon(path: &str, expected: &str) -> bool {
        let path = path.to_lowercase();
        let parts: Vec<&str> = path.split('/').collect();
        parts.len() <= 2 && parts.last().is_some_and(|name| *name == expected)
    }
}

impl ValidationRule for SourceTreeRule {
    fn rule_name(&self) -> &str {
        "source_tree"
    }

    fn validate(&self, form: &FormState, _backend: BackendKind) -> Vec<ValidationIssue> {
        if form.source_files.is_empty() {
            return Vec::new();
        }

        let mut issues = Vec::new();
        let has_manifest = form
            .source_files
            .iter()
            .any(|f| Self::is_manifest(&f.normalized_path(), f.file_name()));
        if !has_manifest {
            issues.push(ValidationIssue::new(
                "source",
                ValidationIssueType::MissingManifest,
                "manifest.json (inside folder)",
            ));
        }

        if !form.terminal_only {
            let expected = form.expected_icon_name();
            let in_tree = form
                .source_files
                .iter()
                .any(|f| Self::is_root_icon(&f.normalized_path(), &expected));

            match &form.icon {
                None if !in_tree => issues.push(ValidationIssue::new(
                    "icon",
                    ValidationIssueType::MissingIcon,
                    format!(
                        "App icon '{}' (missing from folder root and manual upload)",
                        expected
                    ),
                )),
                Some(icon) if icon.file_name().to_lowercase() != expected => {
                    issues.push(ValidationIssue::new(
                        "icon",
                        ValidationIssueType::IconNameMismatch,
                        format!(
                            "Manual icon name '{}' does not match manifest icon name '{}'",
                            icon.file_name(),
                            expected
                        ),
                    ))
                }
                _ => {}
            }
        }
        issues
    }
}

pub struct SelfDependencyRule;

impl ValidationRule for SelfDependencyRule {
    fn rule_name(&self) -> &str {
        "self_dependency"
    }

    fn validate(&self, form: &FormState, _backend: BackendKind) -> Vec<ValidationIssue> {
        let app_id = form.app_id.trim();
        if app_id.is_empty() {
            return Vec::new();
        }
        form.dependencies
            .iter()
            .filter(|dep| same_identity(dep.trim(), app_id))
            .map(|dep| {
                ValidationIssue::new(
                    "dependencies",
                    ValidationIssueType::SelfDependency,
                    format!("Package cannot depend on itself ({})", dep),
                )
            })
            .collect()
    }
}

/// Interval-refreshed widgets need a positive interval.
pub struct RefreshIntervalRule;

impl ValidationRule for RefreshIntervalRule {
    fn rule_name(&self) -> &str {
        "refresh_interval"
    }

    fn validate(&self, form: &FormState, _backend: BackendKind) -> Vec<ValidationIssue> {
        let needs_interval = form.extension_type == ExtensionType::Widget
            && form.refresh_policy == RefreshPolicy::Interval;
        if needs_interval && form.interval_ms.unwrap_or(0) == 0 {
            vec![ValidationIssue::new(
                "intervalMs",
                ValidationIssueType::InvalidValue,
                "Refresh Interval (ms)",
            )]
        } else {
            Vec::new()
        }
    }
}

/// Runs every registered rule and collects all issues.
pub struct ValidationGate {
    rules: Vec<Box<dyn ValidationRule>>,
}

impl ValidationGate {
    /// A gate without any rules.
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn add_rule(mut self, rule: Box<dyn ValidationRule>) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.rule_name()).collect()
    }

    /// An empty result means the form may be published.
    pub fn validate(&self, form: &FormState, backend: BackendKind) -> Vec<ValidationIssue> {
        self.rules
            .iter()
            .flat_map(|rule| rule.validate(form, backend))
            .collect()
    }

    pub fn check(&self, form: &FormState, backend: BackendKind) -> Result<(), PublishError> {
        let issues = self.validate(form, backend);
        if issues.is_empty() {
            Ok(())
        } else {
            Err(PublishError::ValidationFailed(issues))
        }
    }
}

impl Default for ValidationGate {
    fn default() -> Self {
        Self::empty()
            .add_rule(Box::new(RequiredFieldsRule))
            .add_rule(Box::new(RequiredFilesRule))
            .add_rule(Box::new(VersionBumpRule))
            .add_rule(Box::new(CredentialRule))
            .add_rule(Box::new(SourceTreeRule))
            .add_rule(Box::new(SelfDependencyRule))
            .add_rule(Box::new(RefreshIntervalRule))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::{EditSession, SelectedFile};

    fn complete_application() -> FormState {
        let mut form = FormState::new();
        form.app_id = "DEMO".to_string();
        form.name = "Demo".to_string();
        form.version = "1.0.0".to_string();
        form.author = "Ada".to_string();
        form.entry_point = "Demo.dll".to_string();
        form.entry_class = "Demo.Program".to_string();
        form.entry_method = "Main".to_string();
        form.icon = Some(SelectedFile::new("icon.png", vec![1u8]));
        form.source_files = vec![
            SelectedFile::new("Demo/manifest.json", b"{}".to_vec()),
            SelectedFile::new("Demo/Demo.dll", vec![0u8; 8]),
        ];
        form
    }

    fn edit_session(version: &str) -> EditSession {
        EditSession {
            app_id: "DEMO".to_string(),
            extension_type: ExtensionType::Application,
            initial_version: version.to_string(),
            document: serde_json::json!({}),
            record: None,
            screenshot_count: 0,
        }
    }

    fn kinds(issues: &[ValidationIssue]) -> Vec<ValidationIssueType> {
        issues.iter().map(|i| i.issue_type).collect()
    }

    #[test]
    fn test_complete_form_passes() {
        let gate = ValidationGate::default();
        assert!(gate.validate(&complete_application(), BackendKind::Local).is_empty());
        assert!(gate.check(&complete_application(), BackendKind::Local).is_ok());
    }

    #[test]
    fn test_errors_accumulate_instead_of_stopping() {
        let mut form = FormState::new();
        form.extension_type = ExtensionType::Widget;
        form.terminal_only = true;
        form.app_id = "CLOCK".to_string();
        form.name = "Clock".to_string();
        form.version = "1.0.0".to_string();
        form.widget_class = "Clock.Widget".to_string();
        form.height = Some(100.0);

        let issues = ValidationGate::default().validate(&form, BackendKind::Local);
        let fields: Vec<&str> = issues.iter().map(|i| i.field.as_str()).collect();
        assert!(fields.contains(&"author"));
        assert!(fields.contains(&"width"));
        assert!(fields.contains(&"icon"), "widgets need an icon even when terminal-only");
        assert!(issues.len() >= 2);
    }

    #[test]
    fn test_terminal_application_needs_no_icon() {
        let mut form = complete_application();
        form.icon = None;
        form.terminal_only = true;
        assert!(ValidationGate::default().validate(&form, BackendKind::Local).is_empty());
    }

    #[test]
    fn test_remote_backend_requires_token() {
        let form = complete_application();
        let issues = ValidationGate::default().validate(&form, BackendKind::Remote);
        assert_eq!(kinds(&issues), vec![ValidationIssueType::MissingCredential]);

        let mut form = complete_application();
        form.credential = Some("ghp_x".to_string());
        assert!(ValidationGate::default().validate(&form, BackendKind::Remote).is_empty());
    }

    #[test]
    fn test_version_guard_in_edit_mode() {
        let mut form = complete_application();
        form.edit = Some(edit_session("1.0.0"));

        let issues = VersionBumpRule.validate(&form, BackendKind::Local);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].field, "version");

        form.version = "1.0.1".to_string();
        assert!(VersionBumpRule.validate(&form, BackendKind::Local).is_empty());
    }

    #[test]
    fn test_metadata_only_edit_keeps_version() {
        let mut form = complete_application();
        form.icon = None;
        form.source_files.clear();
        form.edit = Some(edit_session("1.0.0"));
        assert!(ValidationGate::default().validate(&form, BackendKind::Local).is_empty());
    }

    #[test]
    fn test_source_tree_without_manifest() {
        let mut form = complete_application();
        form.source_files = vec![SelectedFile::new("Demo/Demo.dll", vec![0u8])];
        let issues = SourceTreeRule.validate(&form, BackendKind::Local);
        assert_eq!(kinds(&issues), vec![ValidationIssueType::MissingManifest]);
    }

    #[test]
    fn test_nested_manifest_with_backslashes_is_found() {
        let mut form = complete_application();
        form.source_files = vec![SelectedFile::new("Demo\\Sub\\Manifest.JSON", b"{}".to_vec())];
        assert!(SourceTreeRule.validate(&form, BackendKind::Local).is_empty());
    }

    #[test]
    fn test_icon_found_at_root_of_tree() {
        let mut form = complete_application();
        form.icon = None;
        form.manifest_icon_name = Some("Logo.png".to_string());
        form.source_files.push(SelectedFile::new("Demo/logo.png", vec![1u8]));
        assert!(SourceTreeRule.validate(&form, BackendKind::Local).is_empty());

        form.source_files.pop();
        form.source_files.push(SelectedFile::new("Demo/assets/logo.png", vec![1u8]));
        let issues = SourceTreeRule.validate(&form, BackendKind::Local);
        assert_eq!(kinds(&issues), vec![ValidationIssueType::MissingIcon]);
    }

    #[test]
    fn test_manual_icon_must_match_manifest_name() {
        let mut form = complete_application();
        form.icon = Some(SelectedFile::new("other.png", vec![1u8]));
        let issues = SourceTreeRule.validate(&form, BackendKind::Local);
        assert_eq!(kinds(&issues), vec![ValidationIssueType::IconNameMismatch]);
    }

    #[test]
    fn test_self_dependency_rejected() {
        let mut form = complete_application();
        form.dependencies = vec!["core".to_string(), "demo".to_string()];
        let issues = SelfDependencyRule.validate(&form, BackendKind::Local);
        assert_eq!(kinds(&issues), vec![ValidationIssueType::SelfDependency]);
    }

    #[test]
    fn test_interval_policy_needs_interval() {
        let mut form = FormState::new();
        form.extension_type = ExtensionType::Widget;
        form.refresh_policy = RefreshPolicy::Interval;
        assert_eq!(RefreshIntervalRule.validate(&form, BackendKind::Local).len(), 1);

        form.interval_ms = Some(500);
        assert!(RefreshIntervalRule.validate(&form, BackendKind::Local).is_empty());
    }

    #[test]
    fn test_check_wraps_issues() {
        let form = FormState::new();
        let err = ValidationGate::default()
            .check(&form, BackendKind::Local)
            .unwrap_err();
        assert!(!err.issues().is_empty());
    }
}
