use serde::{Deserialize, Serialize};
use std::fmt;

use super::new_id;

/// One numbered instruction in a recipe. Order within the recipe is the
/// execution order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Step {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub description: String,
}

impl Step {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            description: description.into(),
        }
    }

    /// An empty step, as appended by the session's add-step operation.
    pub fn blank() -> Self {
        Self::new("")
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description)
    }
}
