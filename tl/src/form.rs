//! Form schema
//!
//! Each letter ships a `{id}.form.json` describing the questionnaire in
//! SurveyJS style: nested `elements` (optionally grouped into `pages`), each
//! with a `name`, a `type` and flags such as `isRequired`. Only the parts
//! that decide which answers a letter needs are modelled here.

use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use letterrender::FieldValues;
use letterrender::filters::{amount_from_json, parse_date};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;
use tracing::debug;

/// Errors from reading a form schema or validating answers against it
#[derive(Debug, Error)]
pub enum FormError {
    #[error("Failed to read form {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse form {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Please fill in all required fields: {}", format_issues(.0))]
    Invalid(Vec<FieldIssue>),
}

fn format_issues(issues: &[FieldIssue]) -> String {
    issues.iter().map(|i| i.to_string()).collect::<Vec<_>>().join("; ")
}

/// Why an answer was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueKind {
    MissingRequired,
    NotANumber,
    InvalidDate,
}

/// One rejected answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    pub field: String,
    pub kind: IssueKind,
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            IssueKind::MissingRequired => write!(f, "'{}' is required", self.field),
            IssueKind::NotANumber => write!(f, "'{}' must be a number", self.field),
            IssueKind::InvalidDate => write!(f, "'{}' must be a date (YYYY-MM-DD)", self.field),
        }
    }
}

/// A form element: a question, or a panel holding more elements
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormElement {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub is_required: bool,
    #[serde(default)]
    pub input_type: Option<String>,
    /// Display condition; hidden questions are not required
    #[serde(default)]
    pub visible_if: Option<String>,
    #[serde(default)]
    pub elements: Vec<FormElement>,
}

impl FormElement {
    fn is_panel(&self) -> bool {
        matches!(self.kind.as_deref(), Some("panel") | Some("page"))
    }

    fn collect<'a>(&'a self, out: &mut Vec<&'a FormElement>) {
        if self.name.is_some() {
            out.push(self);
        }
        for child in &self.elements {
            child.collect(out);
        }
    }
}

/// Questionnaire description for one letter
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormSchema {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub elements: Vec<FormElement>,
    #[serde(default)]
    pub pages: Vec<FormElement>,
}

impl FormSchema {
    pub fn load(path: &Path) -> Result<Self, FormError> {
        debug!(?path, "FormSchema::load: called");
        let content = fs::read_to_string(path).map_err(|source| FormError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| FormError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Every named element, depth first
    pub fn elements(&self) -> Vec<&FormElement> {
        let mut out = Vec::new();
        for element in self.pages.iter().chain(self.elements.iter()) {
            element.collect(&mut out);
        }
        out
    }

    /// Names of every named element, panels included
    pub fn field_names(&self) -> BTreeSet<String> {
        self.elements().into_iter().filter_map(|e| e.name.clone()).collect()
    }

    /// Check answers against required flags and input types
    ///
    /// Questions with a `visibleIf` condition are skipped for the required
    /// check, since whether they are shown depends on other answers.
    pub fn check(&self, values: &FieldValues) -> Vec<FieldIssue> {
        debug!(fields = values.len(), "FormSchema::check: called");
        let mut issues = Vec::new();
        for element in self.elements() {
            let Some(name) = element.name.as_deref() else {
                continue;
            };
            if element.is_panel() {
                continue;
            }

            if values.is_blank(name) {
                if element.is_required && element.visible_if.is_none() {
                    issues.push(FieldIssue {
                        field: name.to_string(),
                        kind: IssueKind::MissingRequired,
                    });
                }
                continue;
            }

            let Some(value) = values.get(name) else {
                continue;
            };
            if let Some(kind) = type_issue(element.input_type.as_deref(), value) {
                issues.push(FieldIssue {
                    field: name.to_string(),
                    kind,
                });
            }
        }
        debug!(issues = issues.len(), "FormSchema::check: done");
        issues
    }

    /// Validation pass: `Ok` when every answer is acceptable
    pub fn validate(&self, values: &FieldValues) -> Result<(), FormError> {
        let issues = self.check(values);
        if issues.is_empty() {
            Ok(())
        } else {
            Err(FormError::Invalid(issues))
        }
    }
}

fn type_issue(input_type: Option<&str>, value: &JsonValue) -> Option<IssueKind> {
    match input_type {
        Some("number") if amount_from_json(value).is_none() => Some(IssueKind::NotANumber),
        Some("date") if value.as_str().and_then(parse_date).is_none() => Some(IssueKind::InvalidDate),
        _ => None,
    }
}
