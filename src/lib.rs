//! Recipebook Core Library
//!
//! Local-first recipe management: a persisted recipe collection
//! (`RecipeStore`), a single in-progress edit snapshot (`EditSession`)
//! with serving-size scaling, and JSON import/export. All state lives in
//! two JSON records on disk; there is no server.

pub mod config;
pub mod models;
pub mod session;
pub mod storage;
pub mod store;
pub mod transfer;

pub use config::{Config, ConfigError};
pub use models::{Difficulty, Ingredient, Recipe, Step};
pub use session::{EditSession, IngredientUpdate, RecipeField, SessionState};
pub use storage::{JsonStorage, RecordKind, StorageError};
pub use store::{RecipeStore, StoreError};
pub use transfer::{export_session, import_recipe, write_export, RecipeExport, TransferError};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
