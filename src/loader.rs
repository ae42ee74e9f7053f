use crate::Result;
use crate::error::TemplateError;
use crate::tpl::ast::DocumentNode;
use crate::tpl::parser::parse_document;
use dashmap::DashMap;
use glob::glob;
use log::debug;
use std::fs;
use std::path::Path;
use std::sync::{Arc, OnceLock};

/// Loaded templates, keyed by template name.
pub type DocumentStore = DashMap<String, Arc<DocumentNode>>;

/// Process-wide store
static DOCUMENTS: OnceLock<DocumentStore> = OnceLock::new();

/// Loads every template file matching a glob pattern and returns how many were loaded.
///
/// Each file is registered under its path (`Path::display`).
///
/// # Arguments
/// * `pattern` - file path pattern, e.g. "templates/**/*.smart"
pub fn load(pattern: &str) -> Result<usize> {
    let paths = glob(pattern).map_err(|e| {
        TemplateError::LoadError(format!("invalid glob pattern: {} ({})", pattern, e))
    })?;

    let mut loaded = 0;
    for entry in paths {
        let path = entry.map_err(|e| {
            TemplateError::LoadError(format!("unreadable path: {} ({})", pattern, e))
        })?;
        if path.is_file() {
            load_file(&path)?;
            loaded += 1;
        }
    }

    debug!("Load: pattern={}, files={}", pattern, loaded);
    Ok(loaded)
}

/// Loads embedded templates, each given as `(name, content)`.
pub fn load_assets(assets: Vec<(&str, &str)>) -> Result<()> {
    for (name, content) in assets {
        parse_and_register(content, name)?;
    }
    Ok(())
}

/// Looks up a loaded document by name.
pub fn find_document(name: &str) -> Option<Arc<DocumentNode>> {
    let store = DOCUMENTS.get()?;
    store.get(name).map(|doc| doc.value().clone())
}

/// Removes every loaded document. Mostly for resetting state in tests.
pub fn clear() {
    if let Some(store) = DOCUMENTS.get() {
        store.clear();
    }
}

// --- internals ---

fn load_file(path: &Path) -> Result<()> {
    let content = fs::read_to_string(path).map_err(|e| {
        TemplateError::LoadError(format!("failed to read template file: {} ({})", path.display(), e))
    })?;
    parse_and_register(&content, &path.display().to_string())
}

fn parse_and_register(content: &str, name: &str) -> Result<()> {
    let document = parse_document(content)
        .map_err(|e| TemplateError::LoadError(format!("{} (Source: {})", e, name)))?;

    let store = DOCUMENTS.get_or_init(DashMap::new);

    // reject duplicate names
    let mut inserted = false;
    store.entry(name.to_string()).or_insert_with(|| {
        inserted = true;
        Arc::new(document)
    });
    if !inserted {
        return Err(TemplateError::DuplicateTemplate(name.to_string()));
    }

    debug!("Register: name={}", name);
    Ok(())
}
