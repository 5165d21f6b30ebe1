//! Compile a [`Model`] into rate equations giving the time derivative of every component
//!
//! For component `i`, `d[x_i]/dt = Σ_r n_{r,i} · rate_r(state)` where `n_{r,i}` is the signed
//! stoichiometric coefficient of `i` in reaction `r`.
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::sync::Arc;

use indexmap::IndexMap;
use nalgebra::DVector;
use thiserror::Error;

use crate::metabolic_model::model::Model;
use crate::metabolic_model::reaction::Reaction;

// region Model Types
/// Family of rate laws used to interpret a model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelType {
    /// Every reaction follows the law of mass action
    MassAction,
    /// Enzymatic reactions follow Michaelis–Menten kinetics, mass action reactions are allowed
    MichaelisMenten,
}

impl ModelType {
    /// Rate law kind used by reactions which don't name one
    pub fn default_kind(&self) -> RateLawKind {
        match self {
            ModelType::MassAction => RateLawKind::MassAction,
            ModelType::MichaelisMenten => RateLawKind::MichaelisMenten,
        }
    }

    /// Whether reactions of this model type may use `kind`
    pub fn allows(&self, kind: RateLawKind) -> bool {
        match self {
            ModelType::MassAction => kind == RateLawKind::MassAction,
            ModelType::MichaelisMenten => true,
        }
    }
}

impl FromStr for ModelType {
    type Err = CompileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "mass_action" | "mass-action" | "MA" => Ok(ModelType::MassAction),
            "michaelis_menten" | "enzymatic" | "MM" => Ok(ModelType::MichaelisMenten),
            other => Err(CompileError::UnsupportedModelType(other.to_string())),
        }
    }
}

impl Display for ModelType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelType::MassAction => write!(f, "mass_action"),
            ModelType::MichaelisMenten => write!(f, "michaelis_menten"),
        }
    }
}

/// Rate law named by a reaction's kind tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateLawKind {
    MassAction,
    MichaelisMenten,
}

impl RateLawKind {
    fn parse(kind: &str) -> Option<RateLawKind> {
        match kind.trim() {
            "mass_action" | "mass-action" | "MA" => Some(RateLawKind::MassAction),
            "michaelis_menten" | "enzymatic" | "MM" => Some(RateLawKind::MichaelisMenten),
            _ => None,
        }
    }
}
// endregion Model Types

// region Rate Laws
/// A factor `x_index ^ order` of a rate law
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Term {
    index: usize,
    order: Order,
}

/// Reaction order of a term, integer orders use `powi`
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Order {
    Integer(i32),
    Real(f64),
}

impl Term {
    fn new(index: usize, coefficient: f64) -> Term {
        let magnitude = coefficient.abs();
        let order = if magnitude.fract() == 0. && magnitude <= i32::MAX as f64 {
            Order::Integer(magnitude as i32)
        } else {
            Order::Real(magnitude)
        };
        Term { index, order }
    }

    fn value(&self, state: &DVector<f64>) -> f64 {
        let x = state[self.index];
        match self.order {
            Order::Integer(1) => x,
            Order::Integer(n) => x.powi(n),
            Order::Real(p) => x.powf(p),
        }
    }
}

fn product(terms: &[Term], state: &DVector<f64>) -> f64 {
    terms.iter().fold(1., |acc, term| acc * term.value(state))
}

/// Rate law with every parameter resolved to a number
#[derive(Debug, Clone, PartialEq)]
pub enum RateLaw {
    /// `k·Π reactants − kr·Π products`, a reaction without reactants is a constant inflow `k`
    MassAction {
        forward: f64,
        reverse: Option<f64>,
        reactants: Vec<Term>,
        products: Vec<Term>,
    },
    /// `capacity·S/(km + S)` with `S = Π reactants` and `capacity = kcat·enzyme` (or `vmax`)
    MichaelisMenten {
        capacity: f64,
        km: f64,
        substrates: Vec<Term>,
    },
}

impl RateLaw {
    /// Rate of the reaction at `state`
    pub fn rate(&self, state: &DVector<f64>) -> f64 {
        match self {
            RateLaw::MassAction {
                forward,
                reverse,
                reactants,
                products,
            } => {
                let rate = forward * product(reactants, state);
                match reverse {
                    Some(kr) => rate - kr * product(products, state),
                    None => rate,
                }
            }
            RateLaw::MichaelisMenten {
                capacity,
                km,
                substrates,
            } => {
                let s = product(substrates, state);
                capacity * s / (km + s)
            }
        }
    }
}
// endregion Rate Laws

// region Rate Equations
#[derive(Debug, PartialEq)]
struct CompiledReaction {
    law: RateLaw,
    /// (component index, signed coefficient) pairs
    stoichiometry: Vec<(usize, f64)>,
}

/// Derivative function of a compiled model
///
/// Holds only component indices and resolved numbers, so it is immutable, `Send + Sync`,
/// and cloning it only bumps a reference count.
#[derive(Debug, Clone, PartialEq)]
pub struct RateEquations {
    model_type: ModelType,
    dimension: usize,
    reactions: Arc<[CompiledReaction]>,
}

impl RateEquations {
    /// Number of state variables
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn model_type(&self) -> ModelType {
        self.model_type
    }

    /// Number of compiled reactions
    pub fn reaction_count(&self) -> usize {
        self.reactions.len()
    }

    /// Rate of every reaction at `state`, in declaration order
    pub fn rates(&self, state: &DVector<f64>) -> Vec<f64> {
        self.reactions.iter().map(|r| r.law.rate(state)).collect()
    }

    /// Write the time derivative at `state` into `derivative`
    ///
    /// The rate equations are autonomous, `_t` is accepted for solvers which expect it.
    pub fn derivative_into(&self, _t: f64, state: &DVector<f64>, derivative: &mut DVector<f64>) {
        derivative.fill(0.);
        for reaction in self.reactions.iter() {
            let rate = reaction.law.rate(state);
            for &(index, coefficient) in &reaction.stoichiometry {
                derivative[index] += coefficient * rate;
            }
        }
    }

    /// Time derivative at `state`
    pub fn derivative(&self, t: f64, state: &DVector<f64>) -> DVector<f64> {
        let mut derivative = DVector::zeros(self.dimension);
        self.derivative_into(t, state, &mut derivative);
        derivative
    }
}
// endregion Rate Equations

// region Compilation
/// Compile `model` into its rate equations
///
/// # Parameters
/// - `model`: the model to compile
/// - `model_type`: model type tag overriding the model's own tag
///
/// # Returns
/// - `Err(CompileError::UnsupportedModelType)` for an unknown tag
/// - `Err(CompileError::UnsupportedRateLaw)` for a reaction kind the model type doesn't allow
/// - `Err(CompileError::MissingParameter)` if a rate law lacks a required parameter
pub fn compile(model: &Model, model_type: Option<&str>) -> Result<RateEquations, CompileError> {
    let model_type: ModelType = model_type.unwrap_or(&model.model_type).parse()?;
    let mut reactions = Vec::with_capacity(model.reactions.len());
    for reaction in model.reactions.values() {
        reactions.push(compile_reaction(model, model_type, reaction)?);
    }
    log::debug!(
        "Compiled {} reactions over {} components as a {} model",
        reactions.len(),
        model.components.len(),
        model_type
    );
    Ok(RateEquations {
        model_type,
        dimension: model.components.len(),
        reactions: reactions.into(),
    })
}

fn compile_reaction(
    model: &Model,
    model_type: ModelType,
    reaction: &Reaction,
) -> Result<CompiledReaction, CompileError> {
    let kind = match &reaction.kind {
        None => model_type.default_kind(),
        Some(tag) => {
            RateLawKind::parse(tag).ok_or_else(|| CompileError::unsupported(reaction, tag, model_type))?
        }
    };
    if !model_type.allows(kind) {
        let tag = reaction.kind.as_deref().unwrap_or_default();
        return Err(CompileError::unsupported(reaction, tag, model_type));
    }

    let reactants = terms(model, reaction, &reaction.reactants)?;
    let law = match kind {
        RateLawKind::MassAction => RateLaw::MassAction {
            forward: required(reaction, "k")?,
            reverse: reaction.parameters.get("kr").copied(),
            reactants,
            products: terms(model, reaction, &reaction.products)?,
        },
        RateLawKind::MichaelisMenten => {
            let capacity = match reaction.parameters.get("vmax") {
                Some(vmax) => *vmax,
                None => required(reaction, "kcat")? * required(reaction, "enzyme")?,
            };
            RateLaw::MichaelisMenten {
                capacity,
                km: required(reaction, "km")?,
                substrates: reactants,
            }
        }
    };

    let mut stoichiometry = Vec::new();
    for (id, coefficient) in reaction.stoichiometry() {
        stoichiometry.push((index_of(model, reaction, id)?, coefficient));
    }
    Ok(CompiledReaction { law, stoichiometry })
}

fn terms(
    model: &Model,
    reaction: &Reaction,
    side: &IndexMap<String, f64>,
) -> Result<Vec<Term>, CompileError> {
    side.iter()
        .map(|(id, coefficient)| Ok(Term::new(index_of(model, reaction, id)?, *coefficient)))
        .collect()
}

fn index_of(model: &Model, reaction: &Reaction, id: &str) -> Result<usize, CompileError> {
    model
        .component_index(id)
        .ok_or_else(|| CompileError::UnknownComponent {
            reaction: reaction.id.clone(),
            component: id.to_string(),
        })
}

fn required(reaction: &Reaction, parameter: &str) -> Result<f64, CompileError> {
    reaction
        .parameters
        .get(parameter)
        .copied()
        .ok_or_else(|| CompileError::MissingParameter {
            reaction: reaction.id.clone(),
            parameter: parameter.to_string(),
        })
}
// endregion Compilation

#[derive(Debug, Error, PartialEq, Clone)]
pub enum CompileError {
    #[error("Unsupported model type {0:?}")]
    UnsupportedModelType(String),
    #[error("Reaction {reaction} uses rate law {kind:?} which {model_type} models don't support")]
    UnsupportedRateLaw {
        reaction: String,
        kind: String,
        model_type: String,
    },
    #[error("Reaction {reaction} is missing required parameter {parameter}")]
    MissingParameter { reaction: String, parameter: String },
    #[error("Reaction {reaction} references unknown component {component}")]
    UnknownComponent { reaction: String, component: String },
}

impl CompileError {
    fn unsupported(reaction: &Reaction, kind: &str, model_type: ModelType) -> CompileError {
        CompileError::UnsupportedRateLaw {
            reaction: reaction.id.clone(),
            kind: kind.to_string(),
            model_type: model_type.to_string(),
        }
    }
}

#[cfg(test)]
mod compiler_tests {
    use super::*;
    use crate::io::asm::parse_asm;

    fn model(spec: &str) -> Model {
        parse_asm(spec).unwrap()
    }

    const MASS_ACTION: &str = "[Specification]\ntype : mass_action\n[Objects]\nA\nB\nC\nD\n[Initials]\nA : 2\nB : 3\nC : 0.5\nD : 7\n[Reactions]\nR1 : 2 A + B -> C | k = 0.5, kr = 0.1\nR2 : -> A | k = 0.25\n";

    #[test]
    fn model_type_tags() {
        assert_eq!("MA".parse::<ModelType>().unwrap(), ModelType::MassAction);
        assert_eq!("mass-action".parse::<ModelType>().unwrap(), ModelType::MassAction);
        assert_eq!("enzymatic".parse::<ModelType>().unwrap(), ModelType::MichaelisMenten);
        assert_eq!(
            "hill".parse::<ModelType>(),
            Err(CompileError::UnsupportedModelType("hill".to_string()))
        );
    }

    #[test]
    fn mass_action_derivative() {
        let model = model(MASS_ACTION);
        let equations = compile(&model, None).unwrap();
        assert_eq!(equations.dimension(), 4);
        let state = DVector::from_vec(model.initial_state());
        // R1 = 0.5 * 2^2 * 3 - 0.1 * 0.5 = 5.95, R2 = 0.25
        let rates = equations.rates(&state);
        assert!((rates[0] - 5.95).abs() < 1e-12);
        assert!((rates[1] - 0.25).abs() < 1e-12);
        let derivative = equations.derivative(0., &state);
        assert!((derivative[0] - (-2. * 5.95 + 0.25)).abs() < 1e-12);
        assert!((derivative[1] + 5.95).abs() < 1e-12);
        assert!((derivative[2] - 5.95).abs() < 1e-12);
        // Unreferenced component
        assert_eq!(derivative[3], 0.);
    }

    #[test]
    fn fractional_order() {
        let spec = "[Specification]\ntype : MA\n[Objects]\nA\nB\n[Initials]\nA : 4\n[Reactions]\nR1 : 0.5 A -> B | k = 2\n";
        let model = model(spec);
        let equations = compile(&model, None).unwrap();
        let state = DVector::from_vec(model.initial_state());
        // 2 * 4^0.5
        assert!((equations.rates(&state)[0] - 4.).abs() < 1e-12);
    }

    #[test]
    fn michaelis_menten_derivative() {
        let spec = "[Specification]\ntype : michaelis_menten\n[Objects]\nS\nP\n[Initials]\nS : 2\n[Reactions]\nR1 : S -> P | kcat = 3, km = 2, enzyme = 0.5\nR2 : P -> S | vmax = 1, km = 1\nR3 : S -> | mass_action | k = 0.1\n";
        let model = model(spec);
        let equations = compile(&model, None).unwrap();
        let state = DVector::from_vec(model.initial_state());
        let rates = equations.rates(&state);
        // 3 * 0.5 * 2 / (2 + 2)
        assert!((rates[0] - 0.75).abs() < 1e-12);
        assert_eq!(rates[1], 0.);
        assert!((rates[2] - 0.2).abs() < 1e-12);
    }

    #[test]
    fn unsupported_model_type() {
        let model = model(MASS_ACTION);
        assert_eq!(
            compile(&model, Some("hill")),
            Err(CompileError::UnsupportedModelType("hill".to_string()))
        );
    }

    #[test]
    fn unsupported_rate_law() {
        let spec = "[Specification]\ntype : mass_action\n[Objects]\nS\n[Reactions]\nR1 : S -> | michaelis_menten | vmax = 1, km = 1\n";
        assert!(matches!(
            compile(&model(spec), None),
            Err(CompileError::UnsupportedRateLaw { .. })
        ));
        let unknown = "[Specification]\ntype : michaelis_menten\n[Objects]\nS\n[Reactions]\nR1 : S -> | hill | k = 1\n";
        assert!(matches!(
            compile(&model(unknown), None),
            Err(CompileError::UnsupportedRateLaw { .. })
        ));
    }

    #[test]
    fn missing_parameter() {
        let spec = "[Specification]\ntype : michaelis_menten\n[Objects]\nS\n[Reactions]\nR1 : S -> | kcat = 1, km = 1\n";
        assert_eq!(
            compile(&model(spec), None),
            Err(CompileError::MissingParameter {
                reaction: "R1".to_string(),
                parameter: "enzyme".to_string()
            })
        );
        // The model type override changes which parameters are required
        let spec = "[Specification]\ntype : michaelis_menten\n[Objects]\nS\n[Reactions]\nR1 : S -> | vmax = 1, km = 1\n";
        assert!(compile(&model(spec), None).is_ok());
        assert_eq!(
            compile(&model(spec), Some("mass_action")),
            Err(CompileError::MissingParameter {
                reaction: "R1".to_string(),
                parameter: "k".to_string()
            })
        );
    }

    #[test]
    fn equations_are_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RateEquations>();
    }
}
