//! This module provides the component struct representing a model state variable

use std::fmt::{Display, Formatter};

use derive_builder::Builder;

/// Bound class tag marking a component which is never clamped, and which may start negative
pub const UNBOUNDED_TAG: &str = "unbounded";

/// Represents a component of the model (a metabolite, enzyme, or any other tracked species)
#[derive(Builder, Debug, Clone, PartialEq)]
pub struct Component {
    /// Used to identify the component (must be unique)
    pub id: String,
    /// Human readable description of the component
    #[builder(default = "None")]
    pub description: Option<String>,
    /// Value of the component at the start of the simulation
    #[builder(default = "0.")]
    pub initial: f64,
    /// Tag selecting which bound class (lower/upper clamp pair) applies to this component
    #[builder(default = "None")]
    pub bound_class: Option<String>,
}

impl Component {
    pub fn new(id: &str, initial: f64) -> Self {
        Component {
            id: id.to_string(),
            description: None,
            initial,
            bound_class: None,
        }
    }

    /// Whether the component has been explicitly marked as unbounded
    pub fn is_unbounded(&self) -> bool {
        self.bound_class
            .as_deref()
            .is_some_and(|tag| tag.eq_ignore_ascii_case(UNBOUNDED_TAG))
    }
}

impl Display for Component {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id)
    }
}

#[cfg(test)]
mod component_tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let component = ComponentBuilder::default()
            .id("glc__D_c".to_string())
            .build()
            .unwrap();
        assert_eq!(component.id, "glc__D_c");
        assert_eq!(component.initial, 0.);
        assert!(component.description.is_none());
        assert!(component.bound_class.is_none());
        assert!(!component.is_unbounded());
    }

    #[test]
    fn unbounded_tag() {
        let component = ComponentBuilder::default()
            .id("charge".to_string())
            .initial(-1.)
            .bound_class(Some("Unbounded".to_string()))
            .build()
            .unwrap();
        assert!(component.is_unbounded());
        assert_eq!(format!("{}", component), "charge");
    }
}
