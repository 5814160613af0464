//! Template lint
//!
//! Checks a template directory for consistency:
//!
//! - every catalog entry has `id`, `name`, `description` and a numeric `index`
//! - each template has its `.letter.md` and `.form.json`
//! - every variable the letter uses is collected by the form
//! - `.requirements.md` is not newer than the form generated from it

use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use letterrender::TODAY_FIELD;
use regex::Regex;
use tracing::{debug, info};

use crate::catalog::{CatalogEntry, CatalogFile};
use crate::error::CatalogError;
use crate::form::FormSchema;
use crate::store::{form_path, letter_path, requirements_path};
use crate::INDEX_FILE;

/// Variables supplied by the renderer rather than the form
pub const AUTO_INJECTED_VARS: [&str; 1] = [TODAY_FIELD];

/// Words that can follow `if`/`elif` without naming a field
const KEYWORDS: [&str; 5] = ["not", "true", "false", "none", "defined"];

static OUTPUT_VAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{\{-?\s*(\w+)").expect("valid regex"));
static CONDITION_VAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{%-?\s*(?:if|elif)\s+(?:not\s+)?(\w+)").expect("valid regex"));
static FILTER_ARG_VAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\|\s*\w+\(\s*(\w+)").expect("valid regex"));

/// One problem found by the lint pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintProblem {
    pub template_id: String,
    pub message: String,
}

impl fmt::Display for LintProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Template '{}': {}", self.template_id, self.message)
    }
}

/// Outcome of linting a template directory
#[derive(Debug, Clone, Default)]
pub struct LintReport {
    pub template_count: usize,
    pub problems: Vec<LintProblem>,
}

impl LintReport {
    pub fn is_clean(&self) -> bool {
        self.problems.is_empty()
    }

    /// `Checked 3 templates: no errors` style summary line
    pub fn summary(&self) -> String {
        let template_word = if self.template_count == 1 { "template" } else { "templates" };
        if self.is_clean() {
            format!("Checked {} {}: no errors", self.template_count, template_word)
        } else {
            let error_word = if self.problems.len() == 1 { "error" } else { "errors" };
            format!(
                "Checked {} {}: {} {}",
                self.template_count,
                template_word,
                self.problems.len(),
                error_word
            )
        }
    }
}

/// Lint every template in a directory
///
/// Fails only when the catalog itself cannot be read or lists nothing;
/// everything else is reported as a [`LintProblem`].
pub fn lint_templates(dir: &Path) -> Result<LintReport, CatalogError> {
    debug!(?dir, "lint_templates: called");
    let file = CatalogFile::load(dir)?;
    if file.templates.is_empty() {
        return Err(CatalogError::Empty(dir.join(INDEX_FILE)));
    }

    let mut report = LintReport {
        template_count: file.templates.len(),
        problems: Vec::new(),
    };

    let mut seen = BTreeSet::new();
    for entry in &file.templates {
        report.problems.extend(check_attrs(entry));

        let Some(id) = entry.id.as_deref().filter(|id| !id.is_empty()) else {
            continue;
        };
        if !seen.insert(id.to_string()) {
            report.problems.push(problem(id, "duplicate template id".to_string()));
            continue;
        }

        let missing = check_required_files(dir, id);
        let files_present = missing.is_empty();
        report.problems.extend(missing);
        if files_present {
            report.problems.extend(check_variable_coverage(dir, id));
        }
        report.problems.extend(check_requirements_timestamp(dir, id));
    }

    info!("{}", report.summary());
    Ok(report)
}

fn problem(id: &str, message: String) -> LintProblem {
    LintProblem {
        template_id: id.to_string(),
        message,
    }
}

fn check_attrs(entry: &CatalogEntry) -> Vec<LintProblem> {
    entry
        .problems()
        .into_iter()
        .map(|message| problem(entry.display_id(), message))
        .collect()
}

fn check_required_files(dir: &Path, id: &str) -> Vec<LintProblem> {
    let mut problems = Vec::new();
    for path in [form_path(dir, id), letter_path(dir, id)] {
        if !path.exists() {
            let file_name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
            problems.push(problem(id, format!("missing {}", file_name)));
        }
    }
    problems
}

/// Field names a letter template refers to
///
/// Covers `{{ field ... }}`, `{% if field %}`/`{% elif field %}` and the
/// first argument of a filter call such as `depositInterest(start)`.
pub fn letter_variables(source: &str) -> BTreeSet<String> {
    let mut variables = BTreeSet::new();
    for pattern in [&*OUTPUT_VAR, &*CONDITION_VAR, &*FILTER_ARG_VAR] {
        for caps in pattern.captures_iter(source) {
            let name = &caps[1];
            if KEYWORDS.contains(&name) || name.chars().all(|c| c.is_ascii_digit()) {
                continue;
            }
            variables.insert(name.to_string());
        }
    }
    variables
}

fn check_variable_coverage(dir: &Path, id: &str) -> Vec<LintProblem> {
    let letter = match fs::read_to_string(letter_path(dir, id)) {
        Ok(source) => source,
        Err(e) => return vec![problem(id, format!("cannot read letter: {}", e))],
    };
    let form = match FormSchema::load(&form_path(dir, id)) {
        Ok(form) => form,
        Err(e) => return vec![problem(id, e.to_string())],
    };

    let fields = form.field_names();
    letter_variables(&letter)
        .into_iter()
        .filter(|var| !AUTO_INJECTED_VARS.contains(&var.as_str()))
        .filter(|var| !fields.contains(var))
        .map(|var| problem(id, format!("variable '{}' used in letter but not in form", var)))
        .collect()
}

fn check_requirements_timestamp(dir: &Path, id: &str) -> Vec<LintProblem> {
    let modified = |path: &Path| fs::metadata(path).and_then(|m| m.modified()).ok();
    match (
        modified(&requirements_path(dir, id)),
        modified(&form_path(dir, id)),
    ) {
        (Some(requirements), Some(form)) if requirements > form => vec![problem(
            id,
            "requirements.md is newer than form.json (regenerate form?)".to_string(),
        )],
        _ => Vec::new(),
    }
}
