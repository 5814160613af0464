//! Template catalog
//!
//! `index.yml` lists the letters a user can pick from. Entries are read
//! loosely so the lint pass can report every problem; [`Catalog`] only holds
//! entries that passed validation.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::INDEX_FILE;
use crate::error::CatalogError;

/// On-disk shape of `index.yml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub templates: Vec<CatalogEntry>,
}

impl CatalogFile {
    /// Read `index.yml` from a template directory
    pub fn load(dir: &Path) -> Result<Self, CatalogError> {
        let path = dir.join(INDEX_FILE);
        debug!(?path, "CatalogFile::load: called");
        let content = fs::read_to_string(&path).map_err(|source| CatalogError::Io {
            path: path.clone(),
            source,
        })?;
        Self::from_yaml_str(&content).map_err(|source| CatalogError::Yaml { path, source })
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, serde_yaml::Error> {
        // An empty file deserializes as null
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }
}

/// A catalog entry as written, before validation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CatalogEntry {
    pub id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    /// Link to the source document the letter is based on
    pub template_doc_url: Option<String>,
    pub index: Option<serde_yaml::Value>,
}

impl CatalogEntry {
    /// Id for messages, `<unknown>` when missing
    pub fn display_id(&self) -> &str {
        self.id.as_deref().filter(|id| !id.is_empty()).unwrap_or("<unknown>")
    }

    /// Every missing or malformed required attribute
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        let text_attrs = [("id", &self.id), ("name", &self.name), ("description", &self.description)];
        for (attr, value) in text_attrs {
            match value.as_deref() {
                None => problems.push(format!("missing required attribute '{}'", attr)),
                Some(s) if s.trim().is_empty() => problems.push(format!("'{}' is empty", attr)),
                Some(_) => {}
            }
        }
        match &self.index {
            None => problems.push("missing required attribute 'index'".to_string()),
            Some(value) if value.as_u64().is_none() => problems.push("'index' must be a number".to_string()),
            Some(_) => {}
        }
        problems
    }

    /// Validate into a [`TemplateMeta`], reporting the first problem
    pub fn to_meta(&self) -> Result<TemplateMeta, CatalogError> {
        if let Some(problem) = self.problems().into_iter().next() {
            return Err(CatalogError::InvalidEntry {
                id: self.display_id().to_string(),
                problem,
            });
        }
        Ok(TemplateMeta {
            id: self.id.clone().unwrap_or_default(),
            name: self.name.clone().unwrap_or_default(),
            description: self.description.clone().unwrap_or_default(),
            template_doc_url: self.template_doc_url.clone(),
            index: self.index.as_ref().and_then(|v| v.as_u64()).unwrap_or_default(),
        })
    }
}

/// A validated catalog entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct TemplateMeta {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_doc_url: Option<String>,
    pub index: u64,
}

/// Validated templates ordered by `index`
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<TemplateMeta>,
}

impl Catalog {
    /// Load and validate `index.yml` from a template directory
    pub fn load(dir: &Path) -> Result<Self, CatalogError> {
        let file = CatalogFile::load(dir)?;
        if file.templates.is_empty() {
            return Err(CatalogError::Empty(dir.join(INDEX_FILE)));
        }
        let catalog = Self::from_entries(&file.templates)?;
        info!("Loaded {} templates from {}", catalog.len(), dir.display());
        Ok(catalog)
    }

    pub fn from_entries(entries: &[CatalogEntry]) -> Result<Self, CatalogError> {
        debug!(count = entries.len(), "Catalog::from_entries: called");
        let mut seen = HashSet::new();
        let mut metas = Vec::with_capacity(entries.len());
        for entry in entries {
            let meta = entry.to_meta()?;
            if !seen.insert(meta.id.clone()) {
                return Err(CatalogError::DuplicateId(meta.id));
            }
            metas.push(meta);
        }
        metas.sort_by_key(|meta| meta.index);
        Ok(Self { entries: metas })
    }

    pub fn find(&self, id: &str) -> Option<&TemplateMeta> {
        self.entries.iter().find(|meta| meta.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TemplateMeta> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
