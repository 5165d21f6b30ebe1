//! Local one-factor-at-a-time sensitivity analysis
//!
//! The model is simulated once as is (the `original` run) and once for every kinetic
//! parameter of every reaction with only that parameter multiplied by a fixed factor.
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use thiserror::Error;

use crate::configuration::SimulationConfig;
use crate::metabolic_model::model::Model;
use crate::simulate::sampler::sample;
use crate::simulate::{simulate, SimulationError};

/// Parameter label of the unmodified run
pub const BASELINE: &str = "original";

/// Which samples of each run are kept
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Final state only
    #[default]
    Reduced,
    /// Every sampled state
    Full,
}

impl FromStr for OutputFormat {
    type Err = SensitivityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reduced" => Ok(OutputFormat::Reduced),
            "full" => Ok(OutputFormat::Full),
            _ => Err(SensitivityError::UnknownFormat(s.to_string())),
        }
    }
}

impl Display for OutputFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Reduced => write!(f, "reduced"),
            OutputFormat::Full => write!(f, "full"),
        }
    }
}

/// Result of one run of the analysis
#[derive(Debug, Clone, PartialEq)]
pub struct SensitivityRun {
    /// `reaction.parameter` that was scaled, or [`BASELINE`]
    pub parameter: String,
    /// `old --> new` value of the parameter, `None` for the baseline
    pub change: String,
    /// Kept (time, state) samples
    pub rows: Vec<(f64, Vec<f64>)>,
}

/// Runs of a sensitivity analysis, baseline first then in parameter order
#[derive(Debug, Clone, PartialEq)]
pub struct SensitivityAnalysis {
    /// Component ids, one per state entry
    pub labels: Vec<String>,
    pub runs: Vec<SensitivityRun>,
}

/// A model with one parameter scaled, waiting to be simulated
struct Variant {
    parameter: String,
    change: String,
    model: Model,
}

/// Perform a local sensitivity analysis of `model`
///
/// # Parameters
/// - `model`: the model to analyse
/// - `config`: simulation settings shared by every run, `config.processes` runs are simulated at once
/// - `multiple`: factor applied to each parameter in turn
/// - `format`: whether to keep only the final state of each run or every sampled state
///
/// # Returns
/// The runs in a fixed order (baseline, then reactions and their parameters in declaration
/// order), independent of the number of processes.
pub fn local_sensitivity(
    model: &Model,
    config: &SimulationConfig,
    multiple: f64,
    format: OutputFormat,
) -> Result<SensitivityAnalysis, SensitivityError> {
    config.validate().map_err(SimulationError::from)?;
    let stride = config.sampling_stride().map_err(SimulationError::from)?;
    let variants = variants(model, multiple)?;
    log::info!(
        "Running {} sensitivity simulations on {} threads",
        variants.len(),
        config.processes.max(1)
    );

    let run = |variant: &Variant| -> Result<SensitivityRun, SensitivityError> {
        log::debug!("Sensitivity run {}: {}", variant.parameter, variant.change);
        let trajectory =
            simulate(&variant.model, config).map_err(|source| SensitivityError::RunFailed {
                parameter: variant.parameter.clone(),
                source,
            })?;
        let rows: Vec<(f64, Vec<f64>)> = match format {
            OutputFormat::Reduced => trajectory
                .last()
                .map(|(time, state)| vec![(time, state.iter().copied().collect())])
                .unwrap_or_default(),
            OutputFormat::Full => sample(&trajectory, stride)
                .map_err(SimulationError::from)?
                .iter()
                .map(|(time, state)| (time, state.iter().copied().collect()))
                .collect(),
        };
        Ok(SensitivityRun {
            parameter: variant.parameter.clone(),
            change: variant.change.clone(),
            rows,
        })
    };

    let runs = if config.processes > 1 {
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.processes)
            .build()
            .map_err(|err| SensitivityError::ThreadPool(err.to_string()))?;
        pool.install(|| variants.par_iter().map(run).collect::<Result<Vec<_>, _>>())?
    } else {
        variants.iter().map(run).collect::<Result<Vec<_>, _>>()?
    };
    Ok(SensitivityAnalysis {
        labels: model.component_ids(),
        runs,
    })
}

fn variants(model: &Model, multiple: f64) -> Result<Vec<Variant>, SensitivityError> {
    let mut variants = vec![Variant {
        parameter: BASELINE.to_string(),
        change: "None".to_string(),
        model: model.clone(),
    }];
    for reaction in model.reactions.values() {
        for (name, value) in &reaction.parameters {
            let scaled = model
                .with_scaled_parameter(&reaction.id, name, multiple)
                .map_err(SimulationError::from)?;
            let new_value = scaled.reactions[&reaction.id].parameters[name];
            variants.push(Variant {
                parameter: format!("{}.{}", reaction.id, name),
                change: format!("{} --> {}", value, new_value),
                model: scaled,
            });
        }
    }
    Ok(variants)
}

#[derive(Debug, Error)]
pub enum SensitivityError {
    #[error("Sensitivity run {parameter} failed: {source}")]
    RunFailed {
        parameter: String,
        source: SimulationError,
    },
    #[error("{0}")]
    Simulation(#[from] SimulationError),
    #[error("Unknown output format {0:?} (expected reduced or full)")]
    UnknownFormat(String),
    #[error("Unable to start worker threads: {0}")]
    ThreadPool(String),
}
