use serde::{Deserialize, Serialize};
use std::fmt;

use super::new_id;

/// One line of a recipe's ingredient list.
///
/// The amount is free text: "2", "0.5", but also "a pinch". Scaling only
/// touches amounts that parse as a decimal number.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ingredient {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub unit: String,
}

impl Ingredient {
    pub fn new(
        name: impl Into<String>,
        amount: impl Into<String>,
        unit: impl Into<String>,
    ) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            amount: amount.into(),
            unit: unit.into(),
        }
    }

    /// An empty row, as appended by the session's add-ingredient operation.
    pub fn blank() -> Self {
        Self::new("", "", "")
    }

    /// The amount as a number, when it is one.
    pub fn parsed_amount(&self) -> Option<f64> {
        self.amount.trim().parse().ok()
    }
}

impl fmt::Display for Ingredient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.unit.is_empty() {
            write!(f, "{} {}", self.amount, self.name)
        } else {
            write!(f, "{} {} {}", self.amount, self.unit, self.name)
        }
    }
}
