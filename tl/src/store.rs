//! Template store
//!
//! Resolves a template id to its letter source and form schema inside a
//! template directory.

use std::fs;
use std::path::{Path, PathBuf};

use letterrender::LetterTemplate;
use tracing::{debug, info};

use crate::catalog::{Catalog, TemplateMeta};
use crate::error::CatalogError;
use crate::form::FormSchema;

/// Everything needed to fill in and render one letter
#[derive(Debug, Clone)]
pub struct LoadedTemplate {
    pub meta: TemplateMeta,
    pub letter: LetterTemplate,
    pub form: FormSchema,
}

/// A template directory with its validated catalog
#[derive(Debug, Clone)]
pub struct TemplateStore {
    dir: PathBuf,
    catalog: Catalog,
}

impl TemplateStore {
    /// Open a template directory, loading `index.yml`
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let dir = dir.as_ref().to_path_buf();
        debug!(?dir, "TemplateStore::open: called");
        let catalog = Catalog::load(&dir)?;
        Ok(Self { dir, catalog })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Load the letter and form for a template id
    pub fn load(&self, id: &str) -> Result<LoadedTemplate, CatalogError> {
        debug!(%id, "TemplateStore::load: called");
        let meta = self
            .catalog
            .find(id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))?;

        let letter_path = letter_path(&self.dir, id);
        let source = fs::read_to_string(&letter_path).map_err(|source| CatalogError::Io {
            path: letter_path.clone(),
            source,
        })?;
        let letter = LetterTemplate::parse(id, source)?;
        let form = FormSchema::load(&form_path(&self.dir, id))?;

        info!("Loaded template '{}' ({} form fields)", id, form.field_names().len());
        Ok(LoadedTemplate { meta, letter, form })
    }
}

pub fn letter_path(dir: &Path, id: &str) -> PathBuf {
    dir.join(format!("{}.letter.md", id))
}

pub fn form_path(dir: &Path, id: &str) -> PathBuf {
    dir.join(format!("{}.form.json", id))
}

pub fn requirements_path(dir: &Path, id: &str) -> PathBuf {
    dir.join(format!("{}.requirements.md", id))
}
