//! Receipt templates on disk: every `.docx` file in the template directory.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::receipt::docx::{Docx, TemplateError};

const TEMPLATE_EXTENSION: &str = "docx";

#[derive(Debug, Clone)]
pub struct TemplateLibrary {
    dir: PathBuf,
}

impl TemplateLibrary {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Template file names, sorted. A missing directory lists as empty.
    pub fn list(&self) -> Result<Vec<String>, TemplateError> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        for entry in entries {
            let path = entry?.path();
            let is_docx = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(TEMPLATE_EXTENSION));
            if !is_docx || !path.is_file() {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Loads a template by file name. Names must not reach outside the directory.
    pub fn load(&self, name: &str) -> Result<Docx, TemplateError> {
        if name.is_empty()
            || name.contains(['/', '\\'])
            || name == ".."
            || !name.to_ascii_lowercase().ends_with(".docx")
        {
            return Err(TemplateError::InvalidName(name.to_string()));
        }

        let path = self.dir.join(name);
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(TemplateError::NotFound(name.to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        debug!("Loaded template {} ({} bytes)", path.display(), bytes.len());

        Docx::from_bytes(bytes)
    }
}
