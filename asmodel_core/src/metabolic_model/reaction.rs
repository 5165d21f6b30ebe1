//! This module provides a struct for representing reactions
use std::fmt::{Display, Formatter};

use derive_builder::Builder;
use indexmap::IndexMap;

/// Represents a reaction in the kinetic model
#[derive(Builder, Debug, Clone, PartialEq)]
pub struct Reaction {
    /// Used to identify the reaction
    pub id: String,
    /// Human-readable reaction name
    #[builder(default = "None")]
    pub name: Option<String>,
    /// Consumed components, mapped to their (negative) stoichiometric coefficients
    #[builder(default = "IndexMap::new()")]
    pub reactants: IndexMap<String, f64>,
    /// Produced components, mapped to their (positive) stoichiometric coefficients
    #[builder(default = "IndexMap::new()")]
    pub products: IndexMap<String, f64>,
    /// Rate law kind, when None the default rate law of the model type is used
    #[builder(default = "None")]
    pub kind: Option<String>,
    /// Named kinetic parameters of the rate law
    #[builder(default = "IndexMap::new()")]
    pub parameters: IndexMap<String, f64>,
}

impl Reaction {
    /// Iterate over every (component, signed coefficient) pair, reactants first
    pub fn stoichiometry(&self) -> impl Iterator<Item = (&str, f64)> {
        self.reactants
            .iter()
            .chain(self.products.iter())
            .map(|(id, coef)| (id.as_str(), *coef))
    }

    /// Whether the component with `id` takes part in this reaction
    pub fn references(&self, id: &str) -> bool {
        self.reactants.contains_key(id) || self.products.contains_key(id)
    }

    /// Build the reaction equation, e.g. `2 A + B -> C`
    ///
    /// # Note:
    /// Coefficients of magnitude one are left out
    pub fn equation(&self) -> String {
        format!(
            "{} -> {}",
            Reaction::format_side(&self.reactants),
            Reaction::format_side(&self.products)
        )
    }

    fn format_side(side: &IndexMap<String, f64>) -> String {
        side.iter()
            .map(|(id, coef)| {
                let magnitude = coef.abs();
                if magnitude == 1. {
                    id.clone()
                } else {
                    format!("{} {}", magnitude, id)
                }
            })
            .collect::<Vec<String>>()
            .join(" + ")
    }
}

impl Display for Reaction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.id, self.equation())
    }
}
