//! Module providing JSON IO for asmodel Models
use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::metabolic_model::component::Component;
use crate::metabolic_model::model::{Model, ModelError};
use crate::metabolic_model::reaction::{Reaction, ReactionBuilder, ReactionBuilderError};

// region JSON Model
/// Represents a JSON serialized model, used for reading and writing models in json format
#[derive(Serialize, Deserialize)]
struct JsonModel {
    id: Option<String>,
    model_type: String,
    #[serde(default)]
    identifiers: IndexMap<String, String>,
    components: Vec<JsonComponent>,
    #[serde(default)]
    reactions: Vec<JsonReaction>,
}

#[derive(Serialize, Deserialize)]
struct JsonComponent {
    id: String,
    description: Option<String>,
    #[serde(default)]
    initial: f64,
    bound_class: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct JsonReaction {
    id: String,
    name: Option<String>,
    /// Consumed components with the magnitude of their coefficients
    #[serde(default)]
    reactants: IndexMap<String, f64>,
    /// Produced components with their coefficients
    #[serde(default)]
    products: IndexMap<String, f64>,
    kind: Option<String>,
    #[serde(default)]
    parameters: IndexMap<String, f64>,
}
// endregion JSON Model

// region Conversions
impl From<JsonComponent> for Component {
    fn from(c: JsonComponent) -> Self {
        Self {
            id: c.id,
            description: c.description,
            initial: c.initial,
            bound_class: c.bound_class,
        }
    }
}

impl From<Component> for JsonComponent {
    fn from(c: Component) -> Self {
        Self {
            id: c.id,
            description: c.description,
            initial: c.initial,
            bound_class: c.bound_class,
        }
    }
}

impl From<Reaction> for JsonReaction {
    fn from(r: Reaction) -> Self {
        // A component may sit on both sides, so the sides are kept apart
        let reactants = r
            .reactants
            .into_iter()
            .map(|(id, coef)| (id, -coef))
            .collect();
        Self {
            id: r.id,
            name: r.name,
            reactants,
            products: r.products,
            kind: r.kind,
            parameters: r.parameters,
        }
    }
}

impl TryFrom<JsonReaction> for Reaction {
    type Error = ReactionBuilderError;

    fn try_from(r: JsonReaction) -> Result<Self, Self::Error> {
        ReactionBuilder::default()
            .id(r.id)
            .name(r.name)
            .reactants(
                r.reactants
                    .into_iter()
                    .map(|(id, coef)| (id, -coef))
                    .collect(),
            )
            .products(r.products)
            .kind(r.kind)
            .parameters(r.parameters)
            .build()
    }
}

impl Model {
    /// Read a model from a JSON file
    pub fn read_json<P: AsRef<Path>>(path: P) -> Result<Model, JsonError> {
        let model_str = match fs::read_to_string(path) {
            Ok(data) => data,
            Err(err) => return Err(JsonError::UnableToRead(format!("{:?}", err))),
        };
        Model::from_json_str(&model_str)
    }

    /// Parse a model from a JSON string
    pub fn from_json_str(json: &str) -> Result<Model, JsonError> {
        let json_model = match serde_json::from_str::<JsonModel>(json) {
            Ok(model) => model,
            Err(err) => return Err(JsonError::UnableToParse(format!("{:?}", err))),
        };
        Model::from_json(json_model)
    }

    /// Write the model to a JSON file
    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<(), JsonError> {
        let model_string = self.to_json_string()?;
        fs::write(path, model_string)?;
        Ok(())
    }

    /// Serialize the model into a JSON string
    pub fn to_json_string(&self) -> Result<String, JsonError> {
        Ok(serde_json::to_string_pretty(&self.to_json())?)
    }

    fn from_json(json_model: JsonModel) -> Result<Self, JsonError> {
        let mut model = Model::new_empty(&json_model.model_type);
        model.id = json_model.id;
        model.identifiers = json_model.identifiers;
        // Components first, so that reactions can be checked against them
        for component in json_model.components {
            model.add_component(component.into())?;
        }
        for rxn in json_model.reactions {
            model.add_reaction(Reaction::try_from(rxn)?)?;
        }
        Ok(model)
    }

    fn to_json(&self) -> JsonModel {
        JsonModel {
            id: self.id.clone(),
            model_type: self.model_type.clone(),
            identifiers: self.identifiers.clone(),
            components: self.components.values().map(|c| c.clone().into()).collect(),
            reactions: self.reactions.values().map(|r| r.clone().into()).collect(),
        }
    }
}

#[derive(Error, Debug)]
pub enum JsonError {
    #[error("Unable to read file due to {0}")]
    UnableToRead(String),
    #[error("Unable to parse json due to {0}")]
    UnableToParse(String),
    #[error("Unable to build reaction")]
    UnableToBuildReaction(#[from] ReactionBuilderError),
    #[error("Invalid model: {0}")]
    InvalidModel(#[from] ModelError),
    #[error("Serde json error")]
    SerdeJsonError(#[from] serde_json::Error),
    #[error("Unable to write to file")]
    UnableToWrite(#[from] std::io::Error),
}

// endregion Conversions

#[cfg(test)]
mod json_tests {
    use super::*;
    use std::path::PathBuf;

    const DATA: &str = r#"{
"id":"decay",
"model_type":"mass_action",
"identifiers":{"name":"two step decay"},
"components":[
{"id":"A","description":"substance A","initial":10.0,"bound_class":null},
{"id":"B","description":null,"initial":0.0,"bound_class":"metabolite"}
],
"reactions":[
{"id":"R1","name":"decay of A","reactants":{"A":1.0},"products":{"B":2.0},"kind":null,"parameters":{"k":0.1}}
]
}"#;

    #[test]
    fn json_reaction() {
        let data = r#"{"id":"R1","name":null,"reactants":{"A":2.0},"products":{"B":1.0},"kind":"mass_action","parameters":{"k":0.5,"kr":0.01}}"#;
        let json_reaction: JsonReaction = serde_json::from_str(data).unwrap();
        let reaction = Reaction::try_from(json_reaction).unwrap();
        assert_eq!(reaction.reactants["A"], -2.);
        assert_eq!(reaction.products["B"], 1.);
        assert_eq!(reaction.kind.as_deref(), Some("mass_action"));
        assert_eq!(reaction.parameters["kr"], 0.01);
    }

    #[test]
    fn from_json_str() {
        let model = Model::from_json_str(DATA).unwrap();
        assert_eq!(model.id.as_deref(), Some("decay"));
        assert_eq!(model.identifiers["name"], "two step decay");
        assert_eq!(model.component_ids(), vec!["A", "B"]);
        assert_eq!(
            model.components["B"].bound_class.as_deref(),
            Some("metabolite")
        );
        let reaction = &model.reactions["R1"];
        assert_eq!(reaction.name.as_deref(), Some("decay of A"));
        assert_eq!(reaction.equation(), "A -> 2 B");
    }

    #[test]
    fn to_json_and_back() {
        let model = Model::from_json_str(DATA).unwrap();
        let text = model.to_json_string().unwrap();
        assert_eq!(Model::from_json_str(&text).unwrap(), model);
    }

    #[test]
    fn component_on_both_sides() {
        let spec = "[Specification]\ntype : mass_action\n[Objects]\nA\n[Initials]\nA : 1\n[Reactions]\nR1 : 2 A -> 3 A | k = 1\n";
        let model = crate::io::asm::parse_asm(spec).unwrap();
        let text = model.to_json_string().unwrap();
        let back = Model::from_json_str(&text).unwrap();
        assert_eq!(back.reactions["R1"].reactants["A"], -2.);
        assert_eq!(back.reactions["R1"].products["A"], 3.);
        assert_eq!(back, model);
    }

    #[test]
    fn invalid_models() {
        let unknown = DATA.replace(r#""B":2.0"#, r#""C":2.0"#);
        assert!(matches!(
            Model::from_json_str(&unknown),
            Err(JsonError::InvalidModel(ModelError::UnknownComponent { .. }))
        ));
        let zero = DATA.replace(r#""B":2.0"#, r#""B":0.0"#);
        assert!(matches!(
            Model::from_json_str(&zero),
            Err(JsonError::InvalidModel(ModelError::InvalidCoefficient { .. }))
        ));
        assert!(matches!(
            Model::from_json_str("{"),
            Err(JsonError::UnableToParse(_))
        ));
    }

    #[test]
    fn read_json() {
        let data_path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("test_data")
            .join("test_models")
            .join("decay.json");
        let model = Model::read_json(data_path).unwrap();
        let asm_path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("test_data")
            .join("test_models")
            .join("decay.modelspec");
        let asm_model = Model::read_asm(asm_path).unwrap();
        // Both encodings of the same model agree
        assert_eq!(model.components, asm_model.components);
        assert_eq!(model.reactions, asm_model.reactions);
        assert_eq!(model.model_type, asm_model.model_type);
    }
}
