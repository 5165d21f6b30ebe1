//! Fixed-step integration of an [`OdeSystem`]
//!
//! Every step advances the state with the selected explicit Runge–Kutta method and then
//! clamps it into the bounds of each component:
//!
//! ```text
//! k_i     = f(t + c_i·h, y + h·Σ_j a_ij·k_j)
//! y_{n+1} = clamp(y_n + h·Σ_i b_i·k_i)
//! ```
use std::sync::atomic::{AtomicBool, Ordering};

use nalgebra::DVector;
use thiserror::Error;

use crate::configuration::ConfigError;
use crate::simulate::ode::OdeSystem;
use crate::simulate::solver::Solver;
use crate::simulate::trajectory::Trajectory;

/// Tolerance on `end_time / timestep` absorbing representation error (e.g. `0.3 / 0.1`)
const STEP_COUNT_TOLERANCE: f64 = 1e-9;
/// Largest number of steps a single run may take
pub const MAX_STEP_COUNT: usize = 100_000_000;
/// Samples reserved up front, longer runs grow the trajectory as they go
const PREALLOCATED_SAMPLES: usize = 1 << 16;

/// Validated timestep and end time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepConfig {
    timestep: f64,
    end_time: f64,
    step_count: usize,
}

impl StepConfig {
    /// Create a new StepConfig
    ///
    /// Both values must be finite and positive, the timestep no larger than the end time,
    /// and `end_time / timestep` at most [`MAX_STEP_COUNT`].
    pub fn new(timestep: f64, end_time: f64) -> Result<StepConfig, ConfigError> {
        let valid = timestep.is_finite()
            && end_time.is_finite()
            && timestep > 0.
            && end_time > 0.
            && timestep <= end_time;
        let invalid = ConfigError::InvalidStepConfiguration { timestep, end_time };
        if !valid {
            return Err(invalid);
        }
        let steps = (end_time / timestep + STEP_COUNT_TOLERANCE).floor();
        // An underflowing timestep gives an infinite ratio, which fails here too
        if steps > MAX_STEP_COUNT as f64 {
            return Err(invalid);
        }
        Ok(StepConfig {
            timestep,
            end_time,
            step_count: steps as usize,
        })
    }

    pub fn timestep(&self) -> f64 {
        self.timestep
    }

    pub fn end_time(&self) -> f64 {
        self.end_time
    }

    /// Number of steps taken, the trajectory holds one more sample than this
    pub fn step_count(&self) -> usize {
        self.step_count
    }

/// Time of step `index`, computed directly rather than accumulated
    pub fn time_at(&self, index: usize) -> f64 {
        index as f64 * self.timestep
    }
}

/// Fixed-step integrator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Integrator {
    solver: Solver,
    steps: StepConfig,
}

impl Integrator {
    pub fn new(solver: Solver, steps: StepConfig) -> Self {
        Integrator { solver, steps }
    }

    pub fn solver(&self) -> Solver {
        self.solver
    }

    pub fn steps(&self) -> StepConfig {
        self.steps
    }

    /// Integrate `system` from t = 0 to the end time
    ///
    /// # Returns
    /// - `Ok`: trajectory with a sample at `t = i·h` for `i = 0..=N`
    /// - `Err(IntegrationError::NumericalDivergence)`: a value became non-finite, the
    ///   trajectory up to the last finite step is returned with the error
    pub fn run(&self, system: &OdeSystem) -> Result<Trajectory, IntegrationError> {
        self.integrate(system, None)
    }

    /// Integrate `system`, stopping at the next step boundary once `cancel` is set
    pub fn run_with_cancel(
        &self,
        system: &OdeSystem,
        cancel: &AtomicBool,
    ) -> Result<Trajectory, IntegrationError> {
        self.integrate(system, Some(cancel))
    }

    fn integrate(
        &self,
        system: &OdeSystem,
        cancel: Option<&AtomicBool>,
    ) -> Result<Trajectory, IntegrationError> {
        let step_count = self.steps.step_count();
        log::info!(
            "Integrating {} components with {} for {} steps of {}",
            system.dimension(),
            self.solver,
            step_count,
            self.steps.timestep
        );
        let mut trajectory = Trajectory::with_capacity(
            system.labels().to_vec(),
            step_count.saturating_add(1).min(PREALLOCATED_SAMPLES),
        );
        let mut stepper = Stepper::new(self.solver, system.dimension());
        let mut state = system.initial_state().clone();
        trajectory.push(0., state.clone());

        for step in 1..=step_count {
            let t = self.steps.time_at(step - 1);
            state = stepper.step(system, t, &state, self.steps.timestep);
            system.clamp(&mut state);
            let time = self.steps.time_at(step);
            if let Some(index) = state.iter().position(|value| !value.is_finite()) {
                let component = system.labels()[index].clone();
                log::info!("Integration diverged at step {} in component {}", step, component);
                return Err(IntegrationError::NumericalDivergence {
                    partial: trajectory,
                    step,
                    time,
                    component,
                });
            }
            log::trace!("Step {} (t = {})", step, time);
            trajectory.push(time, state.clone());
            if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
                log::info!("Integration cancelled after step {}", step);
                return Err(IntegrationError::Cancelled {
                    partial: trajectory,
                });
            }
        }
        log::info!("Integration finished with {} samples", trajectory.len());
        Ok(trajectory)
    }
}

/// Stage buffers reused between steps
struct Stepper {
    solver: Solver,
    stages: Vec<DVector<f64>>,
}

impl Stepper {
    fn new(solver: Solver, dimension: usize) -> Self {
        Stepper {
            solver,
            stages: vec![DVector::zeros(dimension); solver.tableau().stages()],
        }
    }

    /// Unclamped state one step of size `h` after `state`
    fn step(&mut self, system: &OdeSystem, t: f64, state: &DVector<f64>, h: f64) -> DVector<f64> {
        let tableau = self.solver.tableau();
        for i in 0..tableau.stages() {
            let stage_state = Stepper::combine(state, h, tableau.a[i], &self.stages[..i]);
            system.evaluate_into(t + tableau.c[i] * h, &stage_state, &mut self.stages[i]);
        }
        Stepper::combine(state, h, tableau.b, &self.stages)
    }

    /// `y + h·Σ_j weights_j·k_j`, summed in tableau order
    fn combine(y: &DVector<f64>, h: f64, weights: &[f64], stages: &[DVector<f64>]) -> DVector<f64> {
        let mut sum = DVector::zeros(y.len());
        for (weight, k) in weights.iter().zip(stages) {
            if *weight != 0. {
                sum.axpy(*weight, k, 1.);
            }
        }
        y + sum * h
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum IntegrationError {
    /// A state value became non-finite, `partial` holds every step before it
    #[error("Numerical divergence at step {step} (t = {time}) in component {component}")]
    NumericalDivergence {
        partial: Trajectory,
        step: usize,
        time: f64,
        component: String,
    },
    #[error("Integration cancelled after {} samples", .partial.len())]
    Cancelled { partial: Trajectory },
}

impl IntegrationError {
    /// Trajectory computed before the integration stopped
    pub fn partial(&self) -> &Trajectory {
        match self {
            IntegrationError::NumericalDivergence { partial, .. } => partial,
            IntegrationError::Cancelled { partial } => partial,
        }
    }
}
