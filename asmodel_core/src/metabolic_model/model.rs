//! This module provides the Model struct for representing an entire kinetic model
use crate::metabolic_model::component::Component;
use crate::metabolic_model::reaction::Reaction;

use indexmap::IndexMap;
use thiserror::Error;

/// Represents a kinetic model of a biochemical system
#[derive(Clone, Debug, PartialEq)]
pub struct Model {
    /// Id associated with the Model
    pub id: Option<String>,
    /// Descriptive identifiers of the model (name, author, ...), in declaration order
    pub identifiers: IndexMap<String, String>,
    /// Tag selecting how the rate equation compiler interprets the rate laws
    pub model_type: String,
    /// Map of component ids to Components, in declaration order
    pub components: IndexMap<String, Component>,
    /// Map of reaction ids to Reactions, in declaration order
    pub reactions: IndexMap<String, Reaction>,
}

impl Model {
    /// Create a model holding no components or reactions
    pub fn new_empty(model_type: &str) -> Self {
        Model {
            id: None,
            identifiers: IndexMap::new(),
            model_type: model_type.to_string(),
            components: IndexMap::new(),
            reactions: IndexMap::new(),
        }
    }

    /// Add a component to the model
    ///
    /// # Parameters
    /// - component: Component to add
    ///
    /// # Examples
    /// ```rust
    /// use asmodel_core::metabolic_model::model::Model;
    /// use asmodel_core::metabolic_model::component::Component;
    /// let mut model = Model::new_empty("mass_action");
    /// model.add_component(Component::new("A", 10.)).unwrap();
    /// ```
    pub fn add_component(&mut self, component: Component) -> Result<(), ModelError> {
        if self.components.contains_key(&component.id) {
            return Err(ModelError::DuplicateComponent(component.id));
        }
        Model::validate_component(&component)?;
        self.components.insert(component.id.clone(), component);
        Ok(())
    }

    /// Add a reaction to the model, all components it references must already be present
    ///
    /// # Examples
    /// ```rust
    /// use indexmap::IndexMap;
    /// use asmodel_core::metabolic_model::model::Model;
    /// use asmodel_core::metabolic_model::component::Component;
    /// use asmodel_core::metabolic_model::reaction::ReactionBuilder;
    /// let mut model = Model::new_empty("mass_action");
    /// model.add_component(Component::new("A", 10.)).unwrap();
    /// let mut reactants = IndexMap::new();
    /// reactants.insert("A".to_string(), -1.);
    /// let decay = ReactionBuilder::default()
    ///     .id("decay".to_string())
    ///     .reactants(reactants)
    ///     .build()
    ///     .unwrap();
    /// model.add_reaction(decay).unwrap();
    /// ```
    pub fn add_reaction(&mut self, reaction: Reaction) -> Result<(), ModelError> {
        if self.reactions.contains_key(&reaction.id) {
            return Err(ModelError::DuplicateReaction(reaction.id));
        }
        self.validate_reaction(&reaction)?;
        self.reactions.insert(reaction.id.clone(), reaction);
        Ok(())
    }

    /// Position of a component in the declaration order (which is also the state vector order)
    pub fn component_index(&self, id: &str) -> Option<usize> {
        self.components.get_index_of(id)
    }

    /// Component ids in declaration order
    pub fn component_ids(&self) -> Vec<String> {
        self.components.keys().cloned().collect()
    }

    /// Initial values of all components in declaration order
    pub fn initial_state(&self) -> Vec<f64> {
        self.components.values().map(|c| c.initial).collect()
    }

    /// Check every invariant of the model
    pub fn validate(&self) -> Result<(), ModelError> {
        for component in self.components.values() {
            Model::validate_component(component)?;
        }
        for reaction in self.reactions.values() {
            self.validate_reaction(reaction)?;
        }
        Ok(())
    }

    fn validate_component(component: &Component) -> Result<(), ModelError> {
        let value = component.initial;
        if !value.is_finite() || (value < 0. && !component.is_unbounded()) {
            return Err(ModelError::InvalidInitialValue {
                component: component.id.clone(),
                value,
            });
        }
        Ok(())
    }

    fn validate_reaction(&self, reaction: &Reaction) -> Result<(), ModelError> {
        let sides = [(&reaction.reactants, -1.), (&reaction.products, 1.)];
        for (side, sign) in sides {
            for (component, &coef) in side {
                if !self.components.contains_key(component) {
                    return Err(ModelError::UnknownComponent {
                        reaction: reaction.id.clone(),
                        component: component.clone(),
                    });
                }
                // Reactants carry negative coefficients, products positive ones
                if !coef.is_finite() || coef * sign <= 0. {
                    return Err(ModelError::InvalidCoefficient {
                        reaction: reaction.id.clone(),
                        component: component.clone(),
                        value: coef,
                    });
                }
            }
        }
        for (parameter, &value) in &reaction.parameters {
            if !value.is_finite() {
                return Err(ModelError::NonFiniteParameter {
                    reaction: reaction.id.clone(),
                    parameter: parameter.clone(),
                    value,
                });
            }
        }
        Ok(())
    }

    /// Create a copy of this model with one kinetic parameter multiplied by `factor`
    pub fn with_scaled_parameter(
        &self,
        reaction: &str,
        parameter: &str,
        factor: f64,
    ) -> Result<Model, ModelError> {
        let mut scaled = self.clone();
        let rxn = scaled
            .reactions
            .get_mut(reaction)
            .ok_or_else(|| ModelError::UnknownReaction(reaction.to_string()))?;
        let value = rxn
            .parameters
            .get_mut(parameter)
            .ok_or_else(|| ModelError::UnknownParameter {
                reaction: reaction.to_string(),
                parameter: parameter.to_string(),
            })?;
        *value *= factor;
        if !value.is_finite() {
            return Err(ModelError::NonFiniteParameter {
                reaction: reaction.to_string(),
                parameter: parameter.to_string(),
                value: *value,
            });
        }
        Ok(scaled)
    }
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum ModelError {
    #[error("Component {0} is defined more than once")]
    DuplicateComponent(String),
    #[error("Reaction {0} is defined more than once")]
    DuplicateReaction(String),
    #[error("Reaction {reaction} references unknown component {component}")]
    UnknownComponent { reaction: String, component: String },
    #[error("Reaction {reaction} has invalid coefficient {value} for component {component}")]
    InvalidCoefficient {
        reaction: String,
        component: String,
        value: f64,
    },
    #[error("Reaction {reaction} has non-finite parameter {parameter} = {value}")]
    NonFiniteParameter {
        reaction: String,
        parameter: String,
        value: f64,
    },
    #[error("Component {component} has invalid initial value {value}")]
    InvalidInitialValue { component: String, value: f64 },
    #[error("Reaction {0} is not present in the model")]
    UnknownReaction(String),
    #[error("Reaction {reaction} has no parameter {parameter}")]
    UnknownParameter { reaction: String, parameter: String },
}

// region Flux Functionality
/// Reactions producing and consuming a component
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ComponentFluxes {
    /// Ids of reactions which produce the component
    pub productions: Vec<String>,
    /// Ids of reactions which consume the component
    pub usages: Vec<String>,
}

impl Model {
    /// Find, for every component, the reactions producing and consuming it
    pub fn fluxes(&self) -> IndexMap<String, ComponentFluxes> {
        let mut fluxes: IndexMap<String, ComponentFluxes> = self
            .components
            .keys()
            .map(|id| (id.clone(), ComponentFluxes::default()))
            .collect();
        for reaction in self.reactions.values() {
            for component in reaction.products.keys() {
                if let Some(entry) = fluxes.get_mut(component) {
                    entry.productions.push(reaction.id.clone());
                }
            }
            for component in reaction.reactants.keys() {
                if let Some(entry) = fluxes.get_mut(component) {
                    entry.usages.push(reaction.id.clone());
                }
            }
        }
        fluxes
    }
}
// endregion Flux Functionality

// region Merge Functionality
impl Model {
    /// Merge several models into one
    ///
    /// Reactions are renumbered `{prefix}1`, `{prefix}2`, ... (in model order, then
    /// declaration order) so that reaction ids can't collide between models. Components
    /// are combined, with later definitions replacing earlier ones.
    pub fn merge(models: &[Model], prefix: &str) -> Result<Model, MergeError> {
        let first = models.first().ok_or(MergeError::NoModels)?;
        if prefix.is_empty() {
            return Err(MergeError::InvalidPrefix(prefix.to_string()));
        }
        let mut merged = Model::new_empty(&first.model_type);
        merged.id = first.id.clone();
        let mut count = 1usize;
        for (model_number, model) in models.iter().enumerate() {
            if model.model_type != merged.model_type {
                return Err(MergeError::ConflictingModelType {
                    expected: merged.model_type.clone(),
                    found: model.model_type.clone(),
                });
            }
            if model.reactions.keys().any(|id| is_renumbered_id(id, prefix)) {
                return Err(MergeError::InvalidPrefix(prefix.to_string()));
            }
            for (key, value) in &model.identifiers {
                let key = if model_number == 0 {
                    key.clone()
                } else {
                    format!("{}_{}", key, model_number)
                };
                merged.identifiers.insert(key, value.clone());
            }
            for (id, component) in &model.components {
                merged.components.insert(id.clone(), component.clone());
            }
            for reaction in model.reactions.values() {
                let mut renumbered = reaction.clone();
                renumbered.id = format!("{}{}", prefix, count);
                log::debug!("Renumbered reaction {} --> {}", reaction.id, renumbered.id);
                count += 1;
                merged.reactions.insert(renumbered.id.clone(), renumbered);
            }
        }
        merged.validate()?;
        Ok(merged)
    }
}

/// Whether `id` has the `{prefix}{n}` shape merge gives renumbered reactions
fn is_renumbered_id(id: &str, prefix: &str) -> bool {
    id.strip_prefix(prefix)
        .is_some_and(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()))
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum MergeError {
    #[error("No models were provided to merge")]
    NoModels,
    #[error("Cannot merge model of type {found} into model of type {expected}")]
    ConflictingModelType { expected: String, found: String },
    #[error("Reaction prefix {0:?} is empty or followed by a number in an existing reaction id")]
    InvalidPrefix(String),
    #[error("Merged model is invalid")]
    InvalidModel(#[from] ModelError),
}
// endregion Merge Functionality

#[cfg(test)]
mod model_tests {
    use super::*;
    use crate::metabolic_model::component::ComponentBuilder;
    use crate::metabolic_model::reaction::ReactionBuilder;

    fn setup_model() -> Model {
        let mut model = Model::new_empty("mass_action");
        model.add_component(Component::new("A", 10.)).unwrap();
        model.add_component(Component::new("B", 0.)).unwrap();
        model.add_component(Component::new("C", 1.)).unwrap();
        let mut reactants = IndexMap::new();
        reactants.insert("A".to_string(), -1.);
        let mut products = IndexMap::new();
        products.insert("B".to_string(), 2.);
        let mut parameters = IndexMap::new();
        parameters.insert("k".to_string(), 0.1);
        let reaction = ReactionBuilder::default()
            .id("R1".to_string())
            .reactants(reactants)
            .products(products)
            .parameters(parameters)
            .build()
            .unwrap();
        model.add_reaction(reaction).unwrap();
        model
    }

    fn reaction_with(id: &str, reactant: &str, coef: f64) -> Reaction {
        let mut reactants = IndexMap::new();
        reactants.insert(reactant.to_string(), coef);
        ReactionBuilder::default()
            .id(id.to_string())
            .reactants(reactants)
            .build()
            .unwrap()
    }

    #[test]
    fn declaration_order() {
        let model = setup_model();
        assert_eq!(model.component_ids(), vec!["A", "B", "C"]);
        assert_eq!(model.component_index("C"), Some(2));
        assert_eq!(model.initial_state(), vec![10., 0., 1.]);
    }

    #[test]
    fn duplicate_component() {
        let mut model = setup_model();
        assert_eq!(
            model.add_component(Component::new("A", 1.)),
            Err(ModelError::DuplicateComponent("A".to_string()))
        );
    }

    #[test]
    fn unknown_component() {
        let mut model = setup_model();
        let err = model.add_reaction(reaction_with("R2", "D", -1.)).unwrap_err();
        assert_eq!(
            err,
            ModelError::UnknownComponent {
                reaction: "R2".to_string(),
                component: "D".to_string()
            }
        );
    }

    #[test]
    fn invalid_coefficient() {
        let mut model = setup_model();
        assert!(matches!(
            model.add_reaction(reaction_with("R2", "A", 0.)),
            Err(ModelError::InvalidCoefficient { .. })
        ));
        // Reactants must carry negative coefficients
        assert!(matches!(
            model.add_reaction(reaction_with("R3", "A", 1.)),
            Err(ModelError::InvalidCoefficient { .. })
        ));
    }

    #[test]
    fn negative_initial_value() {
        let mut model = setup_model();
        assert!(matches!(
            model.add_component(Component::new("D", -1.)),
            Err(ModelError::InvalidInitialValue { .. })
        ));
        let unbounded = ComponentBuilder::default()
            .id("D".to_string())
            .initial(-1.)
            .bound_class(Some("unbounded".to_string()))
            .build()
            .unwrap();
        assert!(model.add_component(unbounded).is_ok());
    }

    #[test]
    fn fluxes() {
        let model = setup_model();
        let fluxes = model.fluxes();
        assert_eq!(fluxes["A"].usages, vec!["R1"]);
        assert!(fluxes["A"].productions.is_empty());
        assert_eq!(fluxes["B"].productions, vec!["R1"]);
        assert!(fluxes["C"].productions.is_empty() && fluxes["C"].usages.is_empty());
    }

    #[test]
    fn scaled_parameter() {
        let model = setup_model();
        let scaled = model.with_scaled_parameter("R1", "k", 100.).unwrap();
        assert!((scaled.reactions["R1"].parameters["k"] - 10.).abs() < 1e-12);
        // The original model is untouched
        assert!((model.reactions["R1"].parameters["k"] - 0.1).abs() < 1e-12);
        assert!(matches!(
            model.with_scaled_parameter("R1", "km", 2.),
            Err(ModelError::UnknownParameter { .. })
        ));
    }

    #[test]
    fn merge_renumbers_reactions() {
        let mut first = setup_model();
        first
            .identifiers
            .insert("name".to_string(), "first".to_string());
        let mut second = Model::new_empty("mass_action");
        second
            .identifiers
            .insert("name".to_string(), "second".to_string());
        second.add_component(Component::new("A", 5.)).unwrap();
        second.add_reaction(reaction_with("R1", "A", -1.)).unwrap();

        let merged = Model::merge(&[first, second], "exp").unwrap();
        let ids: Vec<&String> = merged.reactions.keys().collect();
        assert_eq!(ids, vec!["exp1", "exp2"]);
        assert_eq!(merged.identifiers["name"], "first");
        assert_eq!(merged.identifiers["name_1"], "second");
        // Later component definitions replace earlier ones
        assert_eq!(merged.components["A"].initial, 5.);
        assert_eq!(merged.components.len(), 3);
    }

    #[test]
    fn merge_conflicting_type() {
        let first = setup_model();
        let second = Model::new_empty("michaelis_menten");
        assert!(matches!(
            Model::merge(&[first, second], "exp"),
            Err(MergeError::ConflictingModelType { .. })
        ));
        assert_eq!(Model::merge(&[], "exp"), Err(MergeError::NoModels));
    }

    #[test]
    fn merge_prefix_collision() {
        let model = setup_model();
        assert_eq!(
            Model::merge(&[model], "R"),
            Err(MergeError::InvalidPrefix("R".to_string()))
        );
    }

    #[test]
    fn merge_prefix_only_rejects_numbered_ids() {
        let mut model = Model::new_empty("mass_action");
        model.add_component(Component::new("glc", 1.)).unwrap();
        model
            .add_reaction(reaction_with("export_glc", "glc", -1.))
            .unwrap();
        model.add_reaction(reaction_with("exp", "glc", -1.)).unwrap();
        model.add_reaction(reaction_with("exp1a", "glc", -1.)).unwrap();
        let merged = Model::merge(&[model.clone()], "exp").unwrap();
        let ids: Vec<&String> = merged.reactions.keys().collect();
        assert_eq!(ids, vec!["exp1", "exp2", "exp3"]);

        model.add_reaction(reaction_with("exp12", "glc", -1.)).unwrap();
        assert_eq!(
            Model::merge(&[model], "exp"),
            Err(MergeError::InvalidPrefix("exp".to_string()))
        );
    }
}
