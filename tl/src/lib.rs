//! TenantLetters - legal-notice letters for tenants
//!
//! Wraps the [`letterrender`] pipeline with everything around it: a catalog
//! of letter templates on disk, form schemas that declare which answers each
//! letter needs, a lint pass over the template directory, and the `tl` CLI.
//!
//! # Template directory
//!
//! ```text
//! templates/
//! ├── index.yml                     # catalog entries
//! ├── {id}.letter.md                # letter template
//! ├── {id}.form.json                # form schema
//! └── {id}.requirements.md          # optional authoring notes
//! ```
//!
//! # Modules
//!
//! - [`catalog`] - catalog entries and ordering
//! - [`store`] - resolves a template id to its files
//! - [`form`] - form schema and answer validation
//! - [`answers`] - loading answer files
//! - [`lint`] - consistency checks over a template directory
//! - [`config`] - configuration types and loading
//! - [`cli`] - command-line interface

pub mod answers;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod form;
pub mod lint;
pub mod store;

pub use catalog::{Catalog, CatalogEntry, TemplateMeta};
pub use config::Config;
pub use error::CatalogError;
pub use form::{FieldIssue, FormError, FormSchema, IssueKind};
pub use lint::{LintProblem, LintReport, lint_templates};
pub use store::{LoadedTemplate, TemplateStore};

/// Catalog file name inside a template directory
pub const INDEX_FILE: &str = "index.yml";
