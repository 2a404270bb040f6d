use serde::{Deserialize, Serialize};
use std::fmt;

use super::{new_id, Difficulty, Ingredient, Step};

fn default_servings() -> u32 {
    1
}

/// The persisted recipe document.
///
/// Serialized with camelCase keys so stored and exported JSON matches the
/// interchange format described in the project docs. `ingredients` and
/// `steps` are intentionally not defaulted: a document without them is not
/// a recipe (import relies on this).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    #[serde(default)]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub time: u32,
    #[serde(default = "default_servings")]
    pub servings: u32,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub cuisine: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub ingredients: Vec<Ingredient>,
    pub steps: Vec<Step>,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub is_favorite: bool,
}

impl Recipe {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            title: title.into(),
            description: String::new(),
            image: String::new(),
            time: 0,
            servings: 1,
            difficulty: Difficulty::Easy,
            cuisine: String::new(),
            tags: Vec::new(),
            ingredients: Vec::new(),
            steps: Vec::new(),
            user_id: String::new(),
            is_favorite: false,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }

    pub fn with_time(mut self, minutes: u32) -> Self {
        self.time = minutes;
        self
    }

    pub fn with_servings(mut self, servings: u32) -> Self {
        self.servings = servings.max(1);
        self
    }

    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = difficulty;
        self
    }

    pub fn with_cuisine(mut self, cuisine: impl Into<String>) -> Self {
        self.cuisine = cuisine.into();
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_ingredients(mut self, ingredients: Vec<Ingredient>) -> Self {
        self.ingredients = ingredients;
        self
    }

    pub fn with_steps(mut self, steps: Vec<Step>) -> Self {
        self.steps = steps;
        self
    }

    pub fn ingredient(&self, id: &str) -> Option<&Ingredient> {
        self.ingredients.iter().find(|i| i.id == id)
    }

    pub fn step(&self, id: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.id == id)
    }

    /// Case-insensitive substring match against title, cuisine, description,
    /// and every tag. An empty query matches.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.title.to_lowercase().contains(&query)
            || self.cuisine.to_lowercase().contains(&query)
            || self.description.to_lowercase().contains(&query)
            || self.tags.iter().any(|t| t.to_lowercase().contains(&query))
    }
}

impl fmt::Display for Recipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        writeln!(f, "{}", "=".repeat(self.title.len()))?;

        if !self.description.is_empty() {
            writeln!(f, "{}", self.description)?;
        }
        if !self.cuisine.is_empty() {
            writeln!(f, "Cuisine: {}", self.cuisine)?;
        }
        writeln!(f, "Difficulty: {}", self.difficulty)?;
        writeln!(f, "Servings: {}", self.servings)?;
        if self.time > 0 {
            writeln!(f, "Time: {} min", self.time)?;
        }
        if !self.tags.is_empty() {
            writeln!(f, "Tags: {}", self.tags.join(", "))?;
        }

        if !self.ingredients.is_empty() {
            writeln!(f, "\nIngredients:")?;
            for ingredient in &self.ingredients {
                writeln!(f, "  - {}", ingredient)?;
            }
        }

        if !self.steps.is_empty() {
            writeln!(f, "\nSteps:")?;
            for (i, step) in self.steps.iter().enumerate() {
                writeln!(f, "  {}. {}", i + 1, step)?;
            }
        }

        Ok(())
    }
}
