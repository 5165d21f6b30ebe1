//! The ODE system handed to the integrator: initial state, rate equations, and clamp bounds
use nalgebra::DVector;
use thiserror::Error;

use crate::metabolic_model::model::Model;
use crate::simulate::bounds::{component_bounds, BoundVector};
use crate::simulate::compiler::RateEquations;

/// Compiled dynamical system of a model
#[derive(Debug, Clone)]
pub struct OdeSystem {
    initial: DVector<f64>,
    equations: RateEquations,
    /// Clamp interval of each component, None if it is never clamped
    component_bounds: Vec<Option<(f64, f64)>>,
    labels: Vec<String>,
}

impl OdeSystem {
    /// Bundle `model`'s initial state with its compiled `equations`, assigning every
    /// component the clamp interval of its bound class
    pub fn new(
        model: &Model,
        equations: RateEquations,
        bounds: &BoundVector,
    ) -> Result<OdeSystem, OdeError> {
        if equations.dimension() != model.components.len() {
            return Err(OdeError::DimensionMismatch {
                components: model.components.len(),
                equations: equations.dimension(),
            });
        }
        if let Some(component) = model.components.values().find(|c| !c.initial.is_finite()) {
            return Err(OdeError::NonFiniteInitialState(component.id.clone()));
        }
        Ok(OdeSystem {
            initial: DVector::from_vec(model.initial_state()),
            equations,
            component_bounds: model
                .components
                .values()
                .map(|c| component_bounds(c, bounds))
                .collect(),
            labels: model.component_ids(),
        })
    }

    /// State at t = 0
    pub fn initial_state(&self) -> &DVector<f64> {
        &self.initial
    }

    pub fn dimension(&self) -> usize {
        self.initial.len()
    }

    /// Component ids in state order
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn equations(&self) -> &RateEquations {
        &self.equations
    }

    /// Clamp interval of the component at `index`
    pub fn bounds_of(&self, index: usize) -> Option<(f64, f64)> {
        self.component_bounds.get(index).copied().flatten()
    }

    /// Time derivative at `state`
    pub fn evaluate(&self, t: f64, state: &DVector<f64>) -> DVector<f64> {
        self.equations.derivative(t, state)
    }

    pub fn evaluate_into(&self, t: f64, state: &DVector<f64>, derivative: &mut DVector<f64>) {
        self.equations.derivative_into(t, state, derivative)
    }

    /// Clamp every bounded component of `state` into its interval
    ///
    /// NaN values are left as they are so that divergence is still detected.
    pub fn clamp(&self, state: &mut DVector<f64>) {
        for (value, bounds) in state.iter_mut().zip(self.component_bounds.iter()) {
            if let Some((lower, upper)) = bounds {
                if *value < *lower {
                    *value = *lower;
                } else if *value > *upper {
                    *value = *upper;
                }
            }
        }
    }
}

#[derive(Debug, Error, PartialEq, Clone)]
pub enum OdeError {
    #[error("Model has {components} components but the rate equations have {equations}")]
    DimensionMismatch { components: usize, equations: usize },
    #[error("Initial value of component {0} is not finite")]
    NonFiniteInitialState(String),
}

#[cfg(test)]
mod ode_tests {
    use super::*;
    use crate::io::asm::parse_asm;
    use crate::simulate::compiler::compile;

    const SPEC: &str = "[Specification]\ntype : mass_action\n[Objects]\nA\nE\nQ\n[Initials]\nA : 10\nE : 1\nQ : -2\n[Bounds]\nE : enzyme\nQ : unbounded\n[Reactions]\nR1 : A -> | k = 0.1\n";

    fn system() -> OdeSystem {
        let model = parse_asm(SPEC).unwrap();
        let equations = compile(&model, None).unwrap();
        let bounds = BoundVector::new(vec![0., 0.5], vec![5., 2.]).unwrap();
        OdeSystem::new(&model, equations, &bounds).unwrap()
    }

    #[test]
    fn construction() {
        let system = system();
        assert_eq!(system.dimension(), 3);
        assert_eq!(system.labels(), &["A", "E", "Q"]);
        assert_eq!(system.initial_state()[2], -2.);
        assert_eq!(system.bounds_of(0), Some((0., 5.)));
        assert_eq!(system.bounds_of(1), Some((0.5, 2.)));
        assert_eq!(system.bounds_of(2), None);
        let derivative = system.evaluate(0., system.initial_state());
        assert!((derivative[0] + 1.).abs() < 1e-12);
    }

    #[test]
    fn clamp() {
        let system = system();
        let mut state = DVector::from_vec(vec![-1., 3., -100.]);
        system.clamp(&mut state);
        assert_eq!(state.as_slice(), &[0., 2., -100.]);
        // Clamping twice changes nothing
        let once = state.clone();
        system.clamp(&mut state);
        assert_eq!(state, once);

        let mut diverged = DVector::from_vec(vec![f64::NAN, f64::INFINITY, 1.]);
        system.clamp(&mut diverged);
        assert!(diverged[0].is_nan());
        // Infinite values are clamped like any other
        assert_eq!(diverged[1], 2.);
    }

    #[test]
    fn dimension_mismatch() {
        let model = parse_asm(SPEC).unwrap();
        let equations = compile(&model, None).unwrap();
        let mut smaller = model.clone();
        smaller.components.pop();
        let bounds = BoundVector::new(vec![0.], vec![1.]).unwrap();
        assert!(matches!(
            OdeSystem::new(&smaller, equations, &bounds),
            Err(OdeError::DimensionMismatch { .. })
        ));
    }
}
