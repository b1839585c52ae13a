//! Per-organization template sources.

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use crate::publication::domain::{OrganizationUri, PublicationDomainError};

/// Name of the manifest listing templates inside the template directory.
pub const MANIFEST_FILE: &str = "templates.json";

/// Errors raised while loading templates.
#[derive(Debug, Clone, Error)]
pub enum TemplateLoadError {
    /// A file could not be read.
    #[error("failed to read template file {path}: {source}")]
    Io {
        /// File that failed.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// The manifest is not valid JSON of the expected shape.
    #[error("invalid template manifest: {0}")]
    Manifest(String),

    /// A manifest entry names an invalid organization.
    #[error(transparent)]
    Organization(#[from] PublicationDomainError),
}

#[derive(Debug, Deserialize)]
struct Manifest {
    templates: Vec<ManifestEntry>,
}

#[derive(Debug, Deserialize)]
struct ManifestEntry {
    organization: String,
    file: Utf8PathBuf,
}

/// Template sources keyed by the organization that uses them.
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    templates: HashMap<OrganizationUri, String>,
}

impl TemplateRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the manifest and every template it lists from `dir`.
    ///
    /// The manifest has the shape
    /// `{"templates": [{"organization": "<uri>", "file": "<name>"}]}` with
    /// file names relative to `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateLoadError`] when the directory, manifest or a
    /// listed file cannot be read or parsed.
    pub fn load(dir: &Utf8Path) -> Result<Self, TemplateLoadError> {
        let root = Dir::open_ambient_dir(dir, ambient_authority()).map_err(|err| {
            TemplateLoadError::Io {
                path: dir.to_owned(),
                source: Arc::new(err),
            }
        })?;
        let manifest_raw = read_file(&root, dir, Utf8Path::new(MANIFEST_FILE))?;
        let manifest: Manifest = serde_json::from_str(&manifest_raw)
            .map_err(|err| TemplateLoadError::Manifest(err.to_string()))?;

        let mut registry = Self::new();
        for entry in manifest.templates {
            let organization = OrganizationUri::new(entry.organization)?;
            let source = read_file(&root, dir, &entry.file)?;
            registry.register(organization, source);
        }
        Ok(registry)
    }

    /// Registers or replaces the template for `organization`.
    pub fn register(&mut self, organization: OrganizationUri, source: impl Into<String>) {
        self.templates.insert(organization, source.into());
    }

    /// Returns the template source for `organization`.
    #[must_use]
    pub fn get(&self, organization: &OrganizationUri) -> Option<&str> {
        self.templates.get(organization).map(String::as_str)
    }

    /// Returns the number of registered templates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Returns `true` when no template is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

fn read_file(root: &Dir, dir: &Utf8Path, file: &Utf8Path) -> Result<String, TemplateLoadError> {
    root.read_to_string(file)
        .map_err(|err| TemplateLoadError::Io {
            path: dir.join(file),
            source: Arc::new(err),
        })
}
