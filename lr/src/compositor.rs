//! Letter Compositor
//!
//! Parses letter templates and runs the render pipeline: inject today's
//! date, substitute fields through the filter library, collapse blank lines,
//! then derive the presentation and plain-text forms from the same text.

use std::fmt::Write;

use chrono::{Local, NaiveDate};
use minijinja::value::{Value, ValueKind};
use minijinja::{AutoEscape, Environment, Error, ErrorKind, Output, State, UndefinedBehavior, escape_formatter};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::LetterError;
use crate::fields::FieldValues;
use crate::filters::{FilterLibrary, format_long_date};
use crate::markup;

/// Field that always holds today's long-form date during a render
pub const TODAY_FIELD: &str = "date";

/// A parsed letter template
///
/// Construction fails on syntax the template engine cannot parse; a template
/// that exists is always renderable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LetterTemplate {
    id: String,
    source: String,
}

impl LetterTemplate {
    pub fn parse(id: impl Into<String>, source: impl Into<String>) -> Result<Self, LetterError> {
        let id = id.into();
        let source = source.into();
        debug!(%id, len = source.len(), "LetterTemplate::parse: called");

        let syntax_error = Environment::new().template_from_named_str(&id, &source).err();
        if let Some(e) = syntax_error {
            debug!(%id, error = %e, "LetterTemplate::parse: syntax error");
            return Err(LetterError::Parse { id, source: e });
        }

        Ok(Self { id, source })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

/// Everything one render depends on besides the template
#[derive(Debug, Clone, PartialEq)]
pub struct RenderRequest {
    fields: FieldValues,
    today: NaiveDate,
}

impl RenderRequest {
    pub fn new(fields: FieldValues, today: NaiveDate) -> Self {
        Self { fields, today }
    }

    /// Request dated with the local calendar day
    pub fn for_today(fields: FieldValues) -> Self {
        Self::new(fields, Local::now().date_naive())
    }

    pub fn fields(&self) -> &FieldValues {
        &self.fields
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }
}

/// Both output forms of one render
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedLetter {
    /// HTML for on-screen display
    pub presentation: String,
    /// Markdown-free text for clipboard and email
    pub plain_text: String,
}

/// Renders letter templates with the filter library available
#[derive(Debug, Clone, Default)]
pub struct Compositor {
    filters: FilterLibrary,
}

impl Compositor {
    pub fn new(filters: FilterLibrary) -> Self {
        Self { filters }
    }

    pub fn filters(&self) -> &FilterLibrary {
        &self.filters
    }

    /// Substitute fields into the template and collapse blank-line runs
    ///
    /// The caller's field values are copied; `date` is overwritten in the
    /// copy only. Unknown fields render as empty strings.
    pub fn substitute(&self, template: &LetterTemplate, request: &RenderRequest) -> Result<String, LetterError> {
        debug!(id = %template.id, today = %request.today, "Compositor::substitute: called");
        let mut fields = request.fields.clone();
        if let Some(previous) = fields.insert(TODAY_FIELD, format_long_date(request.today)) {
            debug!(?previous, "Compositor::substitute: overwrote caller-supplied date");
        }

        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Chainable);
        env.set_auto_escape_callback(|_| AutoEscape::None);
        env.set_formatter(format_field);
        env.set_keep_trailing_newline(true);
        self.filters.register(&mut env, request.today);

        let compiled = env
            .template_from_named_str(&template.id, &template.source)
            .map_err(|e| LetterError::Parse {
                id: template.id.clone(),
                source: e,
            })?;
        let rendered = compiled.render(&fields).map_err(|e| LetterError::Render {
            id: template.id.clone(),
            source: e,
        })?;

        Ok(markup::collapse_blank_lines(&rendered))
    }

    /// Render both output forms of a letter
    pub fn render(&self, template: &LetterTemplate, request: &RenderRequest) -> Result<RenderedLetter, LetterError> {
        let markdown = self.substitute(template, request)?;
        let letter = RenderedLetter {
            presentation: markup::to_html(&markdown),
            plain_text: markup::to_plain_text(&markdown),
        };
        info!(
            "Rendered letter '{}' ({} chars of text)",
            template.id,
            letter.plain_text.len()
        );
        Ok(letter)
    }
}

/// Write a substituted value into the letter
///
/// Null and undefined values write nothing; booleans write `true`/`false`.
fn format_field(out: &mut Output, state: &State, value: &Value) -> Result<(), Error> {
    match value.kind() {
        ValueKind::None | ValueKind::Undefined => Ok(()),
        ValueKind::Bool => out
            .write_str(if value.is_true() { "true" } else { "false" })
            .map_err(|_| Error::new(ErrorKind::WriteFailure, "failed to write boolean field")),
        _ => escape_formatter(out, state, value),
    }
}

/// Parse and render a template with the default filters, dated today
pub fn render_letter(source: &str, fields: FieldValues) -> Result<RenderedLetter, LetterError> {
    let template = LetterTemplate::parse("letter", source)?;
    Compositor::default().render(&template, &RenderRequest::for_today(fields))
}
