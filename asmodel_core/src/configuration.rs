//! Configuration of a simulation run
use std::fs;
use std::path::Path;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::simulate::bounds::BoundVector;
use crate::simulate::integrator::StepConfig;
use crate::simulate::solver::Solver;

/// Settings of one simulation run, passed explicitly to everything that needs them
///
/// Fields missing from a TOML file take their default values:
///
/// ```toml
/// solver = "RK4"
/// timestep = 1.0
/// end_time = 21600.0
/// lower_bound = [0.0, 0.0]
/// upper_bound = [1e-3, 1e-3]
/// sampling = 100
/// ```
#[derive(Builder, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Model type tag overriding the tag of the model
    #[builder(default = "None")]
    pub model_type: Option<String>,
    #[builder(default = "Solver::Rk4")]
    pub solver: Solver,
    #[builder(default = "1.")]
    pub timestep: f64,
    #[builder(default = "21600.")]
    pub end_time: f64,
    /// Lower bound of each bound class
    #[builder(default = "vec![0., 0.]")]
    pub lower_bound: Vec<f64>,
    /// Upper bound of each bound class
    #[builder(default = "vec![1e-3, 1e-3]")]
    pub upper_bound: Vec<f64>,
    /// Every `sampling`-th step is written out, along with the first and last
    #[builder(default = "100")]
    pub sampling: i64,
    /// Worker threads used for sensitivity analysis
    #[builder(default = "1")]
    pub processes: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            model_type: None,
            solver: Solver::Rk4,
            timestep: 1.,
            end_time: 21600.,
            lower_bound: vec![0., 0.],
            upper_bound: vec![1e-3, 1e-3],
            sampling: 100,
            processes: 1,
        }
    }
}

impl SimulationConfig {
    /// Read a configuration from a TOML file
    pub fn read_toml<P: AsRef<Path>>(path: P) -> Result<SimulationConfig, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(data) => data,
            Err(err) => return Err(ConfigError::UnableToRead(format!("{:?}", err))),
        };
        SimulationConfig::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<SimulationConfig, ConfigError> {
        toml::from_str(content).map_err(|err| ConfigError::UnableToParse(err.to_string()))
    }

    pub fn step_config(&self) -> Result<StepConfig, ConfigError> {
        StepConfig::new(self.timestep, self.end_time)
    }

    pub fn bound_vector(&self) -> Result<BoundVector, ConfigError> {
        BoundVector::new(self.lower_bound.clone(), self.upper_bound.clone())
    }

    /// Sampling stride, which must be positive
    pub fn sampling_stride(&self) -> Result<usize, ConfigError> {
        if self.sampling <= 0 {
            return Err(ConfigError::InvalidSamplingStride(self.sampling));
        }
        usize::try_from(self.sampling).map_err(|_| ConfigError::InvalidSamplingStride(self.sampling))
    }

    /// Check every setting, without compiling anything
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.step_config()?;
        self.sampling_stride()?;
        self.bound_vector()?;
        Ok(())
    }
}

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Invalid step configuration: timestep {timestep} and end time {end_time} must be finite and positive with timestep <= end time, taking at most {max} steps", max = crate::simulate::integrator::MAX_STEP_COUNT)]
    InvalidStepConfiguration { timestep: f64, end_time: f64 },
    #[error("Invalid sampling stride {0}, it must be a positive integer")]
    InvalidSamplingStride(i64),
    #[error("Invalid bound configuration: {0}")]
    InvalidBoundConfiguration(String),
    #[error("Unable to read configuration file due to {0}")]
    UnableToRead(String),
    #[error("Unable to parse configuration due to {0}")]
    UnableToParse(String),
}
