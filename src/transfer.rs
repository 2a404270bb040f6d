//! JSON import and export of recipes.
//!
//! Export serializes the current session snapshot (transient serving
//! fields included) to a pretty-printed JSON document named after the
//! recipe title. Import parses such a document, validates it, and opens a
//! new session from it, appending it to the store when it isn't already
//! there.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::models::Recipe;
use crate::session::EditSession;
use crate::storage::StorageError;
use crate::store::{RecipeStore, StoreError};

/// Errors that can occur during recipe import or export.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("No active edit session to export")]
    NoActiveSession,

    #[error("Invalid recipe format: {0}")]
    InvalidFormat(String),

    #[error("Failed to serialize recipe: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("I/O error for {}: {}", .0.display(), .1)]
    Io(PathBuf, #[source] io::Error),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// An exported recipe document, ready to be written wherever the caller
/// wants it.
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeExport {
    pub filename: String,
    pub contents: String,
}

/// Derives the export filename from a recipe title: lowercased, whitespace
/// runs replaced with hyphens, `.json` extension.
pub fn export_filename(title: &str) -> String {
    let slug = title
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase();
    if slug.is_empty() {
        "recipe.json".to_string()
    } else {
        format!("{}.json", slug)
    }
}

/// Serializes the current session snapshot, including the transient
/// serving fields.
pub fn export_session(session: &EditSession) -> Result<RecipeExport, TransferError> {
    let state = session.state().ok_or(TransferError::NoActiveSession)?;
    let contents = serde_json::to_string_pretty(state).map_err(TransferError::Encode)?;

    Ok(RecipeExport {
        filename: export_filename(&state.recipe.title),
        contents,
    })
}

/// Writes the current session snapshot into `dir` and returns the path of
/// the written file.
pub fn write_export(session: &EditSession, dir: &Path) -> Result<PathBuf, TransferError> {
    let export = export_session(session)?;

    fs::create_dir_all(dir).map_err(|e| TransferError::Io(dir.to_path_buf(), e))?;
    let path = dir.join(&export.filename);
    fs::write(&path, &export.contents).map_err(|e| TransferError::Io(path.clone(), e))?;

    debug!(path = %path.display(), "exported recipe");
    Ok(path)
}

/// Parses a JSON document into a recipe and begins a new session from it.
///
/// The document must carry a non-empty title and array-typed ingredient
/// and step lists; anything else fails with
/// [`TransferError::InvalidFormat`], leaving the store and any existing
/// session untouched. A recipe whose id is absent or unknown to the store
/// gets a fresh id and the store's user and is appended to the collection;
/// the session then wraps the stored result so a later commit lands on it.
pub fn import_recipe(
    json: &str,
    store: &mut RecipeStore,
    session: &mut EditSession,
) -> Result<Recipe, TransferError> {
    let recipe: Recipe =
        serde_json::from_str(json).map_err(|e| TransferError::InvalidFormat(e.to_string()))?;

    if recipe.title.trim().is_empty() {
        return Err(TransferError::InvalidFormat(
            "recipe title is missing".to_string(),
        ));
    }

    let known = !recipe.id.is_empty() && store.get(&recipe.id).is_some();
    let recipe = if known {
        recipe
    } else {
        store.insert_imported(recipe)?
    };

    debug!(id = %recipe.id, title = %recipe.title, "imported recipe");
    session.begin(recipe.clone())?;
    Ok(recipe)
}
