//! Module for reading and writing models in the sectioned ASM text format
//!
//! ```text
//! [Specification]
//! type : mass_action
//!
//! [Objects]
//! A : substance A
//!
//! [Initials]
//! A : 10
//!
//! [Variables]
//! k_decay : 0.1
//!
//! [Reactions]
//! R1 : A -> | k = ${Variables:k_decay}
//! ```
use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use thiserror::Error;

use crate::io::asm::lexer::Lexer;
use crate::io::asm::parser::EquationParser;
use crate::io::asm::section::{Entry, Sections};
use crate::metabolic_model::component::ComponentBuilder;
use crate::metabolic_model::model::{Model, ModelError};
use crate::metabolic_model::reaction::ReactionBuilder;

mod lexer;
mod parser;
mod section;
mod token;
mod writer;

/// Parse ASM model specification text into a validated [`Model`]
///
/// # Parameters
/// - `input`: the full text of the specification
///
/// # Returns
/// - `Ok`: the Model, with components and reactions in declaration order
/// - `Err`: [`AsmParseError::MalformedSpecification`] naming the offending line and token
///
/// # Examples
/// ```rust
/// use asmodel_core::io::asm::parse_asm;
/// let spec = "[Specification]\ntype : mass_action\n[Objects]\nA : a\n[Initials]\nA : 10\n[Reactions]\nR1 : A -> | k = 0.1\n";
/// let model = parse_asm(spec).unwrap();
/// assert_eq!(model.components.len(), 1);
/// ```
pub fn parse_asm(input: &str) -> Result<Model, AsmParseError> {
    let sections = Sections::scan(input)?;

    // Model type
    let type_entry = sections.lookup("Specification", "type").ok_or_else(|| {
        AsmParseError::malformed(
            sections.header_line("Specification"),
            "[Specification]",
            "model type is missing (expected `type : <model type>`)",
        )
    })?;
    let model_type = sections.interpolate(&type_entry.value, type_entry.line)?;
    if model_type.is_empty() {
        return Err(AsmParseError::malformed(
            type_entry.line,
            "type",
            "model type is empty",
        ));
    }
    if !sections.contains("Objects") {
        return Err(AsmParseError::malformed(0, "[Objects]", "section is missing"));
    }
    let mut model = Model::new_empty(&model_type);

    for entry in sections.entries("Identifiers") {
        let value = sections.interpolate(&entry.value, entry.line)?;
        if entry.key == "id" {
            model.id = Some(value.clone());
        }
        model.identifiers.insert(entry.key.clone(), value);
    }

    // Components, with their initial values and bound classes
    let initials = component_values(&sections, "Initials")?;
    let bounds = component_values(&sections, "Bounds")?;
    for entry in sections.entries("Objects") {
        let description = sections.interpolate(&entry.value, entry.line)?;
        let initial = match initials.get(&entry.key) {
            Some((text, line)) => parse_number(text, *line)?,
            None => 0.,
        };
        let component = ComponentBuilder::default()
            .id(entry.key.clone())
            .description(if description.is_empty() {
                None
            } else {
                Some(description)
            })
            .initial(initial)
            .bound_class(bounds.get(&entry.key).map(|(tag, _)| tag.clone()))
            .build()
            .map_err(|err| AsmParseError::malformed(entry.line, &entry.key, &err.to_string()))?;
        model
            .add_component(component)
            .map_err(|err| AsmParseError::from_model_error(err, entry.line, &entry.key))?;
    }
    for (key, (_, line)) in initials.iter().chain(bounds.iter()) {
        if !model.components.contains_key(key) {
            return Err(AsmParseError::malformed(
                *line,
                key,
                "value given for a component missing from [Objects]",
            ));
        }
    }

    for entry in sections.entries("Reactions") {
        parse_reaction(&sections, entry, &mut model)?;
    }
    Ok(model)
}

/// Interpolated values of a per-component section, keyed by component id
fn component_values(
    sections: &Sections,
    section: &str,
) -> Result<IndexMap<String, (String, usize)>, AsmParseError> {
    let mut values = IndexMap::new();
    for entry in sections.entries(section) {
        let value = sections.interpolate(&entry.value, entry.line)?;
        values.insert(entry.key.clone(), (value, entry.line));
    }
    Ok(values)
}

/// Parse a reaction entry of the form `equation | [kind |] name = value, ...`
fn parse_reaction(
    sections: &Sections,
    entry: &Entry,
    model: &mut Model,
) -> Result<(), AsmParseError> {
    let value = sections.interpolate(&entry.value, entry.line)?;
    let parts: Vec<&str> = value.split('|').map(|p| p.trim()).collect();
    let (equation, kind, parameters) = match parts.as_slice() {
        [equation] => (*equation, None, ""),
        [equation, rest] => {
            if rest.contains('=') || rest.is_empty() {
                (*equation, None, *rest)
            } else {
                (*equation, Some(*rest), "")
            }
        }
        [equation, kind, parameters] => (*equation, Some(*kind), *parameters),
        _ => {
            return Err(AsmParseError::malformed(
                entry.line,
                &entry.key,
                "reaction has too many `|` separated parts",
            ))
        }
    };
    if let Some(kind) = kind {
        if kind.is_empty() || kind.contains(char::is_whitespace) {
            return Err(AsmParseError::malformed(
                entry.line,
                kind,
                "rate law kind must be a single word",
            ));
        }
    }

    let tokens = Lexer::new(equation)
        .lex()
        .map_err(|err| AsmParseError::malformed(entry.line, equation, &err.to_string()))?;
    let parsed = EquationParser::new(tokens)
        .parse()
        .map_err(|err| AsmParseError::malformed(entry.line, equation, &err.to_string()))?;

    let mut parameter_map = IndexMap::new();
    for pair in parameters.split(',').map(|p| p.trim()).filter(|p| !p.is_empty()) {
        let (name, number) = pair.split_once('=').ok_or_else(|| {
            AsmParseError::malformed(entry.line, pair, "parameter must be `name = value`")
        })?;
        let name = name.trim();
        if name.is_empty() {
            return Err(AsmParseError::malformed(
                entry.line,
                pair,
                "parameter has no name",
            ));
        }
        parameter_map.insert(name.to_string(), parse_number(number.trim(), entry.line)?);
    }

    let reaction = ReactionBuilder::default()
        .id(entry.key.clone())
        .reactants(
            parsed
                .reactants
                .into_iter()
                .map(|(id, coef)| (id, -coef))
                .collect(),
        )
        .products(parsed.products)
        .kind(kind.map(|k| k.to_string()))
        .parameters(parameter_map)
        .build()
        .map_err(|err| AsmParseError::malformed(entry.line, &entry.key, &err.to_string()))?;
    model
        .add_reaction(reaction)
        .map_err(|err| AsmParseError::from_model_error(err, entry.line, &entry.key))
}

/// Parse a finite number
fn parse_number(text: &str, line: usize) -> Result<f64, AsmParseError> {
    match text.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(AsmParseError::malformed(
            line,
            text,
            "expected a finite number",
        )),
    }
}

impl Model {
    /// Read a model from an ASM model specification file
    pub fn read_asm<P: AsRef<Path>>(path: P) -> Result<Model, AsmParseError> {
        let source = match fs::read_to_string(path) {
            Ok(data) => data,
            Err(err) => return Err(AsmParseError::UnableToRead(format!("{:?}", err))),
        };
        parse_asm(&source)
    }

    /// Write the model to a file in the ASM model specification format
    pub fn write_asm<P: AsRef<Path>>(&self, path: P) -> Result<(), AsmParseError> {
        fs::write(path, self.to_asm())
            .map_err(|err| AsmParseError::UnableToWrite(format!("{:?}", err)))
    }
}

/// Enum representing errors while reading or writing ASM specifications
#[derive(Debug, Error, PartialEq, Clone)]
pub enum AsmParseError {
    /// Structural or referential problem with the specification
    ///
    /// `line` is 1-based, a line of 0 refers to the specification as a whole
    #[error("Malformed specification at line {line} near `{token}`: {reason}")]
    MalformedSpecification {
        line: usize,
        token: String,
        reason: String,
    },
    #[error("Unable to read file due to {0}")]
    UnableToRead(String),
    #[error("Unable to write file due to {0}")]
    UnableToWrite(String),
}

impl AsmParseError {
    pub(crate) fn malformed(line: usize, token: &str, reason: &str) -> Self {
        AsmParseError::MalformedSpecification {
            line,
            token: token.to_string(),
            reason: reason.to_string(),
        }
    }

    fn from_model_error(err: ModelError, line: usize, key: &str) -> Self {
        let token = match &err {
            ModelError::UnknownComponent { component, .. }
            | ModelError::InvalidCoefficient { component, .. } => component.clone(),
            ModelError::NonFiniteParameter { parameter, .. } => parameter.clone(),
            _ => key.to_string(),
        };
        AsmParseError::MalformedSpecification {
            line,
            token,
            reason: err.to_string(),
        }
    }
}
