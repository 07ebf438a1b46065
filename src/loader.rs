use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;
use walkdir::WalkDir;

use crate::engine::{CallSite, ClassDecl, DeclTable, Session, TemplateDecl, TypeRef};

/// One translation unit as the front end reports it: the declarations it
/// contains, the template instantiations it performs, and the call sites to
/// resolve. Loaded from one JSON document per unit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranslationUnit {
    /// Label used in reports, usually the source file the unit came from.
    #[serde(default)]
    pub file: String,

    #[serde(default)]
    pub classes: Vec<ClassDecl>,

    #[serde(default)]
    pub templates: Vec<TemplateDecl>,

    /// Instantiations the front end observed in this unit.
    #[serde(default)]
    pub instantiations: Vec<InstantiationRequest>,

    /// Unit-level call sites to resolve.
    #[serde(default)]
    pub calls: Vec<CallSite>,
}

/// A template applied to concrete argument types, as observed in a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstantiationRequest {
    pub template: String,

    #[serde(default)]
    pub args: Vec<TypeRef>,
}

impl InstantiationRequest {
    /// The requested instance as written, e.g. `Box<SimpleClass>`.
    pub fn display(&self) -> String {
        let args: Vec<String> = self.args.iter().map(TypeRef::to_string).collect();
        format!("{}<{}>", self.template, args.join(", "))
    }
}

impl TranslationUnit {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let unit: TranslationUnit =
            serde_json::from_str(&text).map_err(|source| LoadError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        debug!(
            path = %path.display(),
            classes = unit.classes.len(),
            templates = unit.templates.len(),
            calls = unit.calls.len(),
            "loaded translation unit"
        );
        Ok(unit)
    }

    /// Registers every declaration and builds the hierarchy. Requested
    /// instantiations are left to the caller so each can be reported
    /// individually.
    pub fn build_session(&self) -> crate::error::Result<Session> {
        let mut table = DeclTable::new();
        for class in &self.classes {
            table.register_class(class.clone())?;
        }
        for template in &self.templates {
            table.register_template(template.clone())?;
        }
        Session::new(table)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid unit document {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to scan directory {path}: {source}")]
    Scan {
        path: PathBuf,
        source: walkdir::Error,
    },
}

/// Unit documents under `root`: the file itself when `root` is a file,
/// otherwise every `*.json` below it, hidden entries skipped. Sorted so
/// batch runs are deterministic.
pub fn collect_unit_paths(root: &Path) -> Result<Vec<PathBuf>, LoadError> {
    if root.is_file() {
        return Ok(vec![root.to_path_buf()]);
    }

    let mut paths = Vec::new();
    for entry in WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'))
    {
        let entry = entry.map_err(|source| LoadError::Scan {
            path: root.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_file()
            && entry.path().extension().is_some_and(|ext| ext == "json")
        {
            paths.push(entry.into_path());
        }
    }
    paths.sort();
    Ok(paths)
}
