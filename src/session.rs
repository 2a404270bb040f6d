//! The active edit session.
//!
//! At most one recipe is open for viewing/editing at a time. The session
//! wraps a snapshot of that recipe plus the serving counts used for
//! ingredient scaling, and mirrors the snapshot to storage after every
//! mutation so a restart mid-edit does not lose work.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use crate::models::{Difficulty, Ingredient, Recipe, Step};
use crate::storage::{JsonStorage, RecordKind, StorageError};
use crate::store::{RecipeStore, StoreError};

/// The session snapshot: a recipe plus its serving-scale tracking.
///
/// `original_servings` is fixed when the session begins; scaling is always
/// computed against it, never against the previous serving count, so
/// repeated rescales don't compound rounding error. `base_amounts` records
/// each numeric ingredient amount at original-servings scale and is the
/// anchor those rescales multiply from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    #[serde(flatten)]
    pub recipe: Recipe,
    pub original_servings: u32,
    pub current_servings: u32,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    base_amounts: HashMap<String, f64>,
}

/// A typed top-level field replacement for the recipe being edited.
/// Servings go through [`EditSession::set_servings`] and tags through
/// [`EditSession::set_tags`].
#[derive(Debug, Clone)]
pub enum RecipeField {
    Title(String),
    Description(String),
    Image(String),
    Cuisine(String),
    Time(u32),
    Difficulty(Difficulty),
}

/// A partial ingredient edit; unset fields are left as they are.
#[derive(Debug, Clone, Default)]
pub struct IngredientUpdate {
    pub name: Option<String>,
    pub amount: Option<String>,
    pub unit: Option<String>,
}

impl IngredientUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_amount(mut self, amount: impl Into<String>) -> Self {
        self.amount = Some(amount.into());
        self
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }
}

/// The single in-progress editable copy of a recipe.
///
/// Every mutation except [`EditSession::begin`] is a silent no-op while no
/// session is active; callers are expected to only edit while one exists.
pub struct EditSession {
    storage: JsonStorage,
    state: Option<SessionState>,
}

impl EditSession {
    /// Opens the session service, restoring a persisted mid-edit snapshot
    /// when one exists.
    pub fn open(storage: JsonStorage) -> Result<Self, StorageError> {
        let state = storage.load(RecordKind::Session)?;
        Ok(Self { storage, state })
    }

    pub fn is_active(&self) -> bool {
        self.state.is_some()
    }

    pub fn state(&self) -> Option<&SessionState> {
        self.state.as_ref()
    }

    /// The recipe snapshot being edited, when a session is active.
    pub fn recipe(&self) -> Option<&Recipe> {
        self.state.as_ref().map(|s| &s.recipe)
    }

    pub fn original_servings(&self) -> Option<u32> {
        self.state.as_ref().map(|s| s.original_servings)
    }

    pub fn current_servings(&self) -> Option<u32> {
        self.state.as_ref().map(|s| s.current_servings)
    }

    /// Starts a session from a recipe, replacing any previous session.
    pub fn begin(&mut self, recipe: Recipe) -> Result<(), StorageError> {
        let servings = recipe.servings.max(1);
        let base_amounts = recipe
            .ingredients
            .iter()
            .filter_map(|i| i.parsed_amount().map(|v| (i.id.clone(), v)))
            .collect();

        debug!(id = %recipe.id, title = %recipe.title, "beginning edit session");
        self.state = Some(SessionState {
            recipe,
            original_servings: servings,
            current_servings: servings,
            base_amounts,
        });
        self.persist()
    }

    /// Clears the session and removes its persisted mirror.
    pub fn end(&mut self) -> Result<(), StorageError> {
        if self.state.take().is_some() {
            debug!("ending edit session");
        }
        self.storage.remove(RecordKind::Session)
    }

    /// Rescales the recipe to `servings` people (clamped to at least 1).
    ///
    /// Each ingredient with a numeric anchor gets `anchor * servings /
    /// original_servings`, formatted to at most two decimal places with a
    /// trailing `.00`/`.0` stripped. Non-numeric amounts ("a pinch") pass
    /// through untouched.
    pub fn set_servings(&mut self, servings: u32) -> Result<(), StorageError> {
        let Some(state) = self.state.as_mut() else {
            return Ok(());
        };

        let servings = servings.max(1);
        let ratio = f64::from(servings) / f64::from(state.original_servings);

        for ingredient in &mut state.recipe.ingredients {
            if let Some(base) = state.base_amounts.get(&ingredient.id) {
                ingredient.amount = format_scaled(base * ratio);
            }
        }
        state.current_servings = servings;

        self.persist()
    }

    /// Replaces one top-level field of the recipe being edited.
    pub fn set_field(&mut self, field: RecipeField) -> Result<(), StorageError> {
        let Some(state) = self.state.as_mut() else {
            return Ok(());
        };

        match field {
            RecipeField::Title(title) => state.recipe.title = title,
            RecipeField::Description(description) => state.recipe.description = description,
            RecipeField::Image(image) => state.recipe.image = image,
            RecipeField::Cuisine(cuisine) => state.recipe.cuisine = cuisine,
            RecipeField::Time(minutes) => state.recipe.time = minutes,
            RecipeField::Difficulty(difficulty) => state.recipe.difficulty = difficulty,
        }

        self.persist()
    }

    /// Replaces the tag list wholesale.
    pub fn set_tags(&mut self, tags: Vec<String>) -> Result<(), StorageError> {
        let Some(state) = self.state.as_mut() else {
            return Ok(());
        };
        state.recipe.tags = tags;
        self.persist()
    }

    /// Appends an empty ingredient row and returns its id.
    pub fn add_ingredient(&mut self) -> Result<Option<String>, StorageError> {
        let Some(state) = self.state.as_mut() else {
            return Ok(None);
        };

        let ingredient = Ingredient::blank();
        let id = ingredient.id.clone();
        state.recipe.ingredients.push(ingredient);

        self.persist()?;
        Ok(Some(id))
    }

    /// Merges a partial edit into the matching ingredient; unknown ids are
    /// ignored. An amount edit re-anchors that ingredient at the current
    /// scale so later rescales stay proportional to what the user typed.
    pub fn update_ingredient(
        &mut self,
        id: &str,
        update: IngredientUpdate,
    ) -> Result<(), StorageError> {
        let Some(state) = self.state.as_mut() else {
            return Ok(());
        };

        let ratio = f64::from(state.current_servings) / f64::from(state.original_servings);
        let Some(ingredient) = state.recipe.ingredients.iter_mut().find(|i| i.id == id) else {
            return Ok(());
        };

        if let Some(name) = update.name {
            ingredient.name = name;
        }
        if let Some(unit) = update.unit {
            ingredient.unit = unit;
        }
        if let Some(amount) = update.amount {
            ingredient.amount = amount;
            match ingredient.parsed_amount() {
                Some(value) => {
                    state.base_amounts.insert(id.to_string(), value / ratio);
                }
                None => {
                    state.base_amounts.remove(id);
                }
            }
        }

        self.persist()
    }

    /// Deletes the matching ingredient, preserving the order of the rest.
    pub fn remove_ingredient(&mut self, id: &str) -> Result<(), StorageError> {
        let Some(state) = self.state.as_mut() else {
            return Ok(());
        };

        state.recipe.ingredients.retain(|i| i.id != id);
        state.base_amounts.remove(id);

        self.persist()
    }

    /// Appends an empty step and returns its id.
    pub fn add_step(&mut self) -> Result<Option<String>, StorageError> {
        let Some(state) = self.state.as_mut() else {
            return Ok(None);
        };

        let step = Step::blank();
        let id = step.id.clone();
        state.recipe.steps.push(step);

        self.persist()?;
        Ok(Some(id))
    }

    /// Replaces the description of the matching step; unknown ids are
    /// ignored.
    pub fn update_step(&mut self, id: &str, description: impl Into<String>) -> Result<(), StorageError> {
        let Some(state) = self.state.as_mut() else {
            return Ok(());
        };

        if let Some(step) = state.recipe.steps.iter_mut().find(|s| s.id == id) {
            step.description = description.into();
        }

        self.persist()
    }

    /// Deletes the matching step, preserving the order of the rest.
    pub fn remove_step(&mut self, id: &str) -> Result<(), StorageError> {
        let Some(state) = self.state.as_mut() else {
            return Ok(());
        };

        state.recipe.steps.retain(|s| s.id != id);

        self.persist()
    }

    /// Folds the session back into the store: the snapshot's recipe, with
    /// `servings` set to the current count and the transient scale fields
    /// dropped, replaces the stored recipe with the same id.
    ///
    /// Returns `Ok(false)` when no session is active or no stored recipe
    /// matches. A successful commit leaves the session active; ending it
    /// stays the caller's explicit responsibility.
    pub fn commit(&mut self, store: &mut RecipeStore) -> Result<bool, StoreError> {
        let Some(state) = self.state.as_ref() else {
            return Ok(false);
        };

        let mut recipe = state.recipe.clone();
        recipe.servings = state.current_servings;

        debug!(id = %recipe.id, "committing edit session");
        store.replace(recipe)
    }

    /// Keeps the session's favorite flag in lockstep with the store.
    pub(crate) fn sync_favorite(&mut self, id: &str, favorite: bool) -> Result<(), StorageError> {
        let Some(state) = self.state.as_mut() else {
            return Ok(());
        };
        if state.recipe.id != id {
            return Ok(());
        }

        state.recipe.is_favorite = favorite;
        self.persist()
    }

    fn persist(&self) -> Result<(), StorageError> {
        match &self.state {
            Some(state) => self.storage.save(RecordKind::Session, state),
            None => Ok(()),
        }
    }
}

/// Two decimal places, with a whole-number result left bare.
fn format_scaled(value: f64) -> String {
    let formatted = format!("{:.2}", value);
    if let Some(stripped) = formatted.strip_suffix(".00") {
        stripped.to_string()
    } else if let Some(stripped) = formatted.strip_suffix(".0") {
        stripped.to_string()
    } else {
        formatted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct TestContext {
        store: RecipeStore,
        session: EditSession,
        storage: JsonStorage,
        _temp_dir: TempDir,
    }

    fn setup() -> TestContext {
        let temp_dir = TempDir::new().unwrap();
        let storage = JsonStorage::new(temp_dir.path());
        TestContext {
            store: RecipeStore::open(storage.clone(), "user1").unwrap(),
            session: EditSession::open(storage.clone()).unwrap(),
            storage,
            _temp_dir: temp_dir,
        }
    }

    fn scaling_recipe() -> Recipe {
        Recipe::new("Scaling Test").with_servings(4).with_ingredients(vec![
            Ingredient::new("flour", "2", "cups"),
            Ingredient::new("milk", "0.5", "l"),
            Ingredient::new("salt", "a pinch", ""),
        ])
    }

    fn amounts(session: &EditSession) -> Vec<String> {
        session
            .recipe()
            .unwrap()
            .ingredients
            .iter()
            .map(|i| i.amount.clone())
            .collect()
    }

    #[test]
    fn test_format_scaled() {
        assert_eq!(format_scaled(4.0), "4");
        assert_eq!(format_scaled(2.5), "2.50");
        assert_eq!(format_scaled(0.666_666), "0.67");
        assert_eq!(format_scaled(1.25), "1.25");
    }

    #[test]
    fn test_begin_sets_serving_counts() {
        let mut ctx = setup();
        ctx.session.begin(scaling_recipe()).unwrap();

        assert!(ctx.session.is_active());
        assert_eq!(ctx.session.original_servings(), Some(4));
        assert_eq!(ctx.session.current_servings(), Some(4));
    }

    #[test]
    fn test_set_servings_scales_numeric_amounts() {
        let mut ctx = setup();
        ctx.session.begin(scaling_recipe()).unwrap();

        ctx.session.set_servings(8).unwrap();
        assert_eq!(amounts(&ctx.session), vec!["4", "1", "a pinch"]);
        assert_eq!(ctx.session.current_servings(), Some(8));

        ctx.session.set_servings(4).unwrap();
        assert_eq!(amounts(&ctx.session), vec!["2", "0.50", "a pinch"]);
    }

    #[test]
    fn test_set_servings_is_anchored_not_compounded() {
        let mut ctx = setup();
        ctx.session.begin(scaling_recipe()).unwrap();

        // A pathological sequence of rescales must still land exactly on
        // the doubled amounts, because every call scales from the anchor.
        for n in [3, 7, 1, 13, 8] {
            ctx.session.set_servings(n).unwrap();
        }
        assert_eq!(amounts(&ctx.session)[0], "4");

        ctx.session.set_servings(6).unwrap();
        assert_eq!(amounts(&ctx.session)[0], "3");
    }

    #[test]
    fn test_set_servings_clamps_to_one() {
        let mut ctx = setup();
        ctx.session.begin(scaling_recipe()).unwrap();

        ctx.session.set_servings(0).unwrap();
        assert_eq!(ctx.session.current_servings(), Some(1));
        assert_eq!(amounts(&ctx.session)[0], "0.50");
    }

    #[test]
    fn test_set_servings_fractional_rounding() {
        let mut ctx = setup();
        ctx.session
            .begin(
                Recipe::new("Thirds")
                    .with_servings(3)
                    .with_ingredients(vec![Ingredient::new("rice", "1", "cup")]),
            )
            .unwrap();

        ctx.session.set_servings(2).unwrap();
        assert_eq!(amounts(&ctx.session)[0], "0.67");

        // Back to the original count restores the original amount exactly.
        ctx.session.set_servings(3).unwrap();
        assert_eq!(amounts(&ctx.session)[0], "1");
    }

    #[test]
    fn test_set_field_and_tags() {
        let mut ctx = setup();
        ctx.session.begin(scaling_recipe()).unwrap();

        ctx.session
            .set_field(RecipeField::Title("Renamed".into()))
            .unwrap();
        ctx.session.set_field(RecipeField::Time(45)).unwrap();
        ctx.session
            .set_field(RecipeField::Difficulty(Difficulty::Hard))
            .unwrap();
        ctx.session
            .set_tags(vec!["dinner".into(), "baking".into()])
            .unwrap();

        let recipe = ctx.session.recipe().unwrap();
        assert_eq!(recipe.title, "Renamed");
        assert_eq!(recipe.time, 45);
        assert_eq!(recipe.difficulty, Difficulty::Hard);
        assert_eq!(recipe.tags, vec!["dinner", "baking"]);
    }

    #[test]
    fn test_add_and_update_ingredient() {
        let mut ctx = setup();
        ctx.session.begin(scaling_recipe()).unwrap();

        let id = ctx.session.add_ingredient().unwrap().unwrap();
        let added = ctx.session.recipe().unwrap().ingredient(&id).unwrap();
        assert!(added.name.is_empty());
        assert!(added.amount.is_empty());

        ctx.session
            .update_ingredient(
                &id,
                IngredientUpdate::new().with_name("butter").with_amount("3").with_unit("tbsp"),
            )
            .unwrap();

        let updated = ctx.session.recipe().unwrap().ingredient(&id).unwrap();
        assert_eq!(updated.name, "butter");
        assert_eq!(updated.amount, "3");
        assert_eq!(updated.unit, "tbsp");
    }

    #[test]
    fn test_update_ingredient_partial_merge() {
        let mut ctx = setup();
        ctx.session.begin(scaling_recipe()).unwrap();
        let id = ctx.session.recipe().unwrap().ingredients[0].id.clone();

        ctx.session
            .update_ingredient(&id, IngredientUpdate::new().with_name("bread flour"))
            .unwrap();

        let ingredient = ctx.session.recipe().unwrap().ingredient(&id).unwrap();
        assert_eq!(ingredient.name, "bread flour");
        assert_eq!(ingredient.amount, "2"); // untouched
        assert_eq!(ingredient.unit, "cups"); // untouched
    }

    #[test]
    fn test_update_ingredient_unknown_id_is_noop() {
        let mut ctx = setup();
        ctx.session.begin(scaling_recipe()).unwrap();
        let before = ctx.session.recipe().unwrap().clone();

        ctx.session
            .update_ingredient("missing", IngredientUpdate::new().with_name("x"))
            .unwrap();

        assert_eq!(ctx.session.recipe().unwrap(), &before);
    }

    #[test]
    fn test_amount_edit_reanchors_scaling() {
        let mut ctx = setup();
        ctx.session.begin(scaling_recipe()).unwrap();
        let id = ctx.session.recipe().unwrap().ingredients[0].id.clone();

        // At 8 servings the flour reads "4"; the user overrides it to "6".
        ctx.session.set_servings(8).unwrap();
        ctx.session
            .update_ingredient(&id, IngredientUpdate::new().with_amount("6"))
            .unwrap();

        // Dropping back to the original count scales the override, not the
        // stale anchor.
        ctx.session.set_servings(4).unwrap();
        assert_eq!(ctx.session.recipe().unwrap().ingredient(&id).unwrap().amount, "3");
    }

    #[test]
    fn test_non_numeric_amount_edit_opts_out_of_scaling() {
        let mut ctx = setup();
        ctx.session.begin(scaling_recipe()).unwrap();
        let id = ctx.session.recipe().unwrap().ingredients[0].id.clone();

        ctx.session
            .update_ingredient(&id, IngredientUpdate::new().with_amount("to taste"))
            .unwrap();
        ctx.session.set_servings(12).unwrap();

        assert_eq!(
            ctx.session.recipe().unwrap().ingredient(&id).unwrap().amount,
            "to taste"
        );
    }

    #[test]
    fn test_remove_ingredient_preserves_order() {
        let mut ctx = setup();
        ctx.session.begin(scaling_recipe()).unwrap();
        let middle = ctx.session.recipe().unwrap().ingredients[1].id.clone();

        ctx.session.remove_ingredient(&middle).unwrap();

        let names: Vec<_> = ctx
            .session
            .recipe()
            .unwrap()
            .ingredients
            .iter()
            .map(|i| i.name.clone())
            .collect();
        assert_eq!(names, vec!["flour", "salt"]);

        let readded = ctx.session.add_ingredient().unwrap().unwrap();
        let ids: Vec<_> = ctx
            .session
            .recipe()
            .unwrap()
            .ingredients
            .iter()
            .map(|i| i.id.clone())
            .collect();
        assert_eq!(ids[2], readded); // appended at the end
    }

    #[test]
    fn test_step_operations() {
        let mut ctx = setup();
        ctx.session
            .begin(Recipe::new("Steps").with_steps(vec![
                Step::new("First"),
                Step::new("Second"),
                Step::new("Third"),
            ]))
            .unwrap();

        let second = ctx.session.recipe().unwrap().steps[1].id.clone();
        ctx.session.update_step(&second, "Second, revised").unwrap();
        assert_eq!(
            ctx.session.recipe().unwrap().step(&second).unwrap().description,
            "Second, revised"
        );

        ctx.session.remove_step(&second).unwrap();
        let descriptions: Vec<_> = ctx
            .session
            .recipe()
            .unwrap()
            .steps
            .iter()
            .map(|s| s.description.clone())
            .collect();
        assert_eq!(descriptions, vec!["First", "Third"]);

        let added = ctx.session.add_step().unwrap().unwrap();
        assert_eq!(ctx.session.recipe().unwrap().steps[2].id, added);
    }

    #[test]
    fn test_mutations_without_session_are_noops() {
        let mut ctx = setup();

        assert!(!ctx.session.is_active());
        ctx.session.set_servings(8).unwrap();
        ctx.session.set_tags(vec!["x".into()]).unwrap();
        assert_eq!(ctx.session.add_ingredient().unwrap(), None);
        assert_eq!(ctx.session.add_step().unwrap(), None);
        ctx.session.remove_ingredient("any").unwrap();
        assert!(!ctx.session.commit(&mut ctx.store).unwrap());

        assert!(!ctx.session.is_active());
        assert!(!ctx.storage.exists(RecordKind::Session));
    }

    #[test]
    fn test_commit_folds_session_into_store() {
        let mut ctx = setup();
        let created = ctx.store.add(scaling_recipe()).unwrap();

        ctx.session.begin(created.clone()).unwrap();
        ctx.session.set_servings(8).unwrap();
        ctx.session
            .set_field(RecipeField::Title("Doubled".into()))
            .unwrap();

        assert!(ctx.session.commit(&mut ctx.store).unwrap());

        let stored = ctx.store.get(&created.id).unwrap();
        assert_eq!(stored.title, "Doubled");
        assert_eq!(stored.servings, 8);
        assert_eq!(stored.ingredients[0].amount, "4");

        // The session stays active after a successful commit.
        assert!(ctx.session.is_active());
    }

    #[test]
    fn test_commit_unknown_recipe_returns_false() {
        let mut ctx = setup();
        ctx.session.begin(scaling_recipe()).unwrap(); // never stored

        assert!(!ctx.session.commit(&mut ctx.store).unwrap());
        assert!(ctx.store.is_empty());
    }

    #[test]
    fn test_end_clears_snapshot_and_mirror() {
        let mut ctx = setup();
        ctx.session.begin(scaling_recipe()).unwrap();
        assert!(ctx.storage.exists(RecordKind::Session));

        ctx.session.end().unwrap();
        assert!(!ctx.session.is_active());
        assert!(!ctx.storage.exists(RecordKind::Session));
    }

    #[test]
    fn test_session_survives_reopen() {
        let mut ctx = setup();
        ctx.session.begin(scaling_recipe()).unwrap();
        ctx.session.set_servings(8).unwrap();

        // Simulates a process restart mid-edit.
        let mut reopened = EditSession::open(ctx.storage.clone()).unwrap();
        assert!(reopened.is_active());
        assert_eq!(reopened.original_servings(), Some(4));
        assert_eq!(reopened.current_servings(), Some(8));
        assert_eq!(amounts(&reopened), vec!["4", "1", "a pinch"]);

        // Anchoring survives too: rescaling after the restart still lands
        // on the original amounts.
        reopened.set_servings(4).unwrap();
        assert_eq!(amounts(&reopened)[0], "2");
    }

    #[test]
    fn test_begin_clamps_zero_servings() {
        let mut ctx = setup();
        let mut recipe = scaling_recipe();
        recipe.servings = 0; // e.g. a hand-edited stored document

        ctx.session.begin(recipe).unwrap();
        assert_eq!(ctx.session.original_servings(), Some(1));
        assert_eq!(ctx.session.current_servings(), Some(1));
    }

    #[test]
    fn test_session_state_wire_format() {
        let mut ctx = setup();
        ctx.session.begin(scaling_recipe()).unwrap();

        let json = serde_json::to_string(ctx.session.state().unwrap()).unwrap();
        assert!(json.contains("\"originalServings\""));
        assert!(json.contains("\"currentServings\""));
        assert!(json.contains("\"title\""));
    }
}
