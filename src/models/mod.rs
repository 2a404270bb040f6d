mod difficulty;
mod ingredient;
mod recipe;
mod step;

pub use difficulty::Difficulty;
pub use ingredient::Ingredient;
pub use recipe::Recipe;
pub use step::Step;

use uuid::Uuid;

/// Generates a fresh opaque identifier for recipes, ingredients, and steps.
pub(crate) fn new_id() -> String {
    Uuid::new_v4().to_string()
}
