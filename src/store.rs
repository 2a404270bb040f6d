//! The durable recipe collection.
//!
//! The store owns every persisted recipe and writes the whole collection
//! through to storage after each mutation, before the operation returns.

use thiserror::Error;
use tracing::{debug, info};

use crate::models::{new_id, Recipe};
use crate::session::EditSession;
use crate::storage::{JsonStorage, RecordKind, StorageError};

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Recipe title cannot be empty")]
    EmptyTitle,

    #[error("Recipe not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// The persisted collection of recipes plus its query and mutation
/// operations. Constructed once at startup.
pub struct RecipeStore {
    storage: JsonStorage,
    recipes: Vec<Recipe>,
    user_id: String,
}

impl RecipeStore {
    /// Opens the store, loading the persisted collection if one exists.
    pub fn open(storage: JsonStorage, user_id: impl Into<String>) -> Result<Self, StoreError> {
        let recipes: Vec<Recipe> = storage.load(RecordKind::Recipes)?.unwrap_or_default();
        info!(count = recipes.len(), "opened recipe store");
        Ok(Self {
            storage,
            recipes,
            user_id: user_id.into(),
        })
    }

    /// The owner id attached to every recipe created through this store.
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }

    /// All recipes, in insertion order.
    pub fn list(&self) -> &[Recipe] {
        &self.recipes
    }

    pub fn get(&self, id: &str) -> Option<&Recipe> {
        self.recipes.iter().find(|r| r.id == id)
    }

    pub fn list_by_owner(&self, user_id: &str) -> Vec<&Recipe> {
        self.recipes.iter().filter(|r| r.user_id == user_id).collect()
    }

    pub fn list_favorites(&self) -> Vec<&Recipe> {
        self.recipes.iter().filter(|r| r.is_favorite).collect()
    }

    /// Case-insensitive substring search over title, cuisine, description,
    /// and tags. An empty query matches everything. Collection order is
    /// preserved.
    pub fn search(&self, query: &str) -> Vec<&Recipe> {
        self.recipes.iter().filter(|r| r.matches(query)).collect()
    }

    /// Adds a draft recipe to the collection.
    ///
    /// The draft's id, owner, and favorite flag are overwritten: a fresh
    /// unique id is assigned, the store's user becomes the owner, and the
    /// favorite flag starts cleared. Returns the recipe as stored.
    pub fn add(&mut self, draft: Recipe) -> Result<Recipe, StoreError> {
        if draft.title.trim().is_empty() {
            return Err(StoreError::EmptyTitle);
        }

        let mut recipe = draft;
        recipe.id = new_id();
        recipe.user_id = self.user_id.clone();
        recipe.is_favorite = false;

        debug!(id = %recipe.id, title = %recipe.title, "adding recipe");
        self.recipes.push(recipe.clone());
        self.persist()?;
        Ok(recipe)
    }

    /// Appends an imported recipe, assigning a fresh id and the store's
    /// user but keeping its favorite flag.
    pub(crate) fn insert_imported(&mut self, mut recipe: Recipe) -> Result<Recipe, StoreError> {
        if recipe.title.trim().is_empty() {
            return Err(StoreError::EmptyTitle);
        }

        recipe.id = new_id();
        recipe.user_id = self.user_id.clone();

        self.recipes.push(recipe.clone());
        self.persist()?;
        Ok(recipe)
    }

    /// Flips the favorite flag on the matching recipe and returns the new
    /// value. When the active edit session wraps the same recipe, its copy
    /// of the flag is flipped in lockstep so the two views never disagree.
    pub fn toggle_favorite(
        &mut self,
        id: &str,
        session: &mut EditSession,
    ) -> Result<bool, StoreError> {
        let recipe = self
            .recipes
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        recipe.is_favorite = !recipe.is_favorite;
        let favorite = recipe.is_favorite;

        self.persist()?;
        session.sync_favorite(id, favorite)?;
        Ok(favorite)
    }

    /// Overwrites the stored recipe with the same id wholesale.
    ///
    /// Returns `Ok(false)` without touching anything when no stored recipe
    /// matches; new recipes go through [`RecipeStore::add`].
    pub fn replace(&mut self, recipe: Recipe) -> Result<bool, StoreError> {
        match self.recipes.iter_mut().find(|r| r.id == recipe.id) {
            Some(stored) => {
                *stored = recipe;
                self.persist()?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn persist(&self) -> Result<(), StorageError> {
        self.storage.save(RecordKind::Recipes, &self.recipes)
    }
}
