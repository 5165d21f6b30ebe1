//! Simulation of kinetic models: compilation, integration, and sampling
//!
//! ```rust
//! use asmodel_core::configuration::SimulationConfigBuilder;
//! use asmodel_core::io::asm::parse_asm;
//! use asmodel_core::simulate::simulate;
//!
//! let spec = "[Specification]\ntype : mass_action\n[Objects]\nA\n[Initials]\nA : 10\n[Reactions]\nR1 : A -> | k = 0.1\n";
//! let model = parse_asm(spec).unwrap();
//! let config = SimulationConfigBuilder::default()
//!     .timestep(0.1)
//!     .end_time(10.)
//!     .lower_bound(vec![0.])
//!     .upper_bound(vec![1e6])
//!     .build()
//!     .unwrap();
//! let trajectory = simulate(&model, &config).unwrap();
//! assert_eq!(trajectory.len(), 101);
//! ```
use std::sync::atomic::AtomicBool;

use thiserror::Error;

use crate::configuration::{ConfigError, SimulationConfig};
use crate::metabolic_model::model::{Model, ModelError};
use crate::simulate::compiler::{compile, CompileError};
use crate::simulate::integrator::{IntegrationError, Integrator};
use crate::simulate::ode::{OdeError, OdeSystem};
use crate::simulate::trajectory::Trajectory;

pub mod bounds;
pub mod compiler;
pub mod integrator;
pub mod ode;
pub mod sampler;
pub mod sensitivity;
pub mod solver;
pub mod trajectory;

/// Validate `config`, then compile `model` into an ODE system and its integrator
///
/// Configuration errors are reported before anything is compiled or allocated.
pub fn prepare(
    model: &Model,
    config: &SimulationConfig,
) -> Result<(OdeSystem, Integrator), SimulationError> {
    let steps = config.step_config()?;
    config.sampling_stride()?;
    let bounds = config.bound_vector()?;
    let equations = compile(model, config.model_type.as_deref())?;
    let system = OdeSystem::new(model, equations, &bounds)?;
    Ok((system, Integrator::new(config.solver, steps)))
}

/// Simulate `model` from t = 0 to the configured end time
pub fn simulate(model: &Model, config: &SimulationConfig) -> Result<Trajectory, SimulationError> {
    let (system, integrator) = prepare(model, config)?;
    Ok(integrator.run(&system)?)
}

/// Simulate `model`, stopping at the next step boundary once `cancel` is set
pub fn simulate_with_cancel(
    model: &Model,
    config: &SimulationConfig,
    cancel: &AtomicBool,
) -> Result<Trajectory, SimulationError> {
    let (system, integrator) = prepare(model, config)?;
    Ok(integrator.run_with_cancel(&system, cancel)?)
}

#[derive(Debug, Error, PartialEq, Clone)]
pub enum SimulationError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("Unable to compile model: {0}")]
    Compile(#[from] CompileError),
    #[error("Unable to build ODE system: {0}")]
    System(#[from] OdeError),
    #[error("{0}")]
    Integration(#[from] IntegrationError),
    #[error("Invalid model: {0}")]
    Model(#[from] ModelError),
}

impl SimulationError {
    /// Trajectory computed before a diverged or cancelled integration stopped
    pub fn partial(&self) -> Option<&Trajectory> {
        match self {
            SimulationError::Integration(err) => Some(err.partial()),
            _ => None,
        }
    }
}
