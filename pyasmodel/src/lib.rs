use std::fmt::Display;
use std::path::PathBuf;

use asmodel_core::configuration::SimulationConfigBuilder;
use asmodel_core::io::asm::parse_asm;
use asmodel_core::io::read_model;
use asmodel_core::io::results::TIME_COLUMN;
use asmodel_core::metabolic_model::model::Model;
use asmodel_core::simulate::sampler::sample;
use asmodel_core::simulate::simulate as simulate_model;
use asmodel_core::simulate::solver::Solver;

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

fn value_error<E: Display>(err: E) -> PyErr {
    PyValueError::new_err(err.to_string())
}

/// A kinetic model, read from ASM or JSON
#[pyclass]
struct PyModel {
    inner: Model,
}

#[pymethods]
impl PyModel {
    #[staticmethod]
    fn from_asm(text: &str) -> PyResult<Self> {
        let inner = parse_asm(text).map_err(value_error)?;
        Ok(PyModel { inner })
    }

    #[staticmethod]
    fn from_json(text: &str) -> PyResult<Self> {
        let inner = Model::from_json_str(text).map_err(value_error)?;
        Ok(PyModel { inner })
    }

    /// Read a model file, JSON if the path ends in `.json` and ASM otherwise
    #[staticmethod]
    fn read(path: PathBuf) -> PyResult<Self> {
        let inner = read_model(path, None).map_err(value_error)?;
        Ok(PyModel { inner })
    }

    fn component_ids(&self) -> Vec<String> {
        self.inner.component_ids()
    }

    fn reaction_ids(&self) -> Vec<String> {
        self.inner.reactions.keys().cloned().collect()
    }

    #[getter]
    fn model_type(&self) -> String {
        self.inner.model_type.clone()
    }

    fn to_asm(&self) -> String {
        self.inner.to_asm()
    }

    fn __repr__(&self) -> String {
        format!(
            "PyModel(type={:?}, components={}, reactions={})",
            self.inner.model_type,
            self.inner.components.len(),
            self.inner.reactions.len()
        )
    }
}

/// Simulate a model, returning the column labels (time first) and the sampled rows
#[pyfunction]
#[pyo3(signature = (model, timestep, end_time, lower, upper, sampling, solver=None, model_type=None))]
#[allow(clippy::too_many_arguments)]
fn simulate(
    py: Python<'_>,
    model: &PyModel,
    timestep: f64,
    end_time: f64,
    lower: Vec<f64>,
    upper: Vec<f64>,
    sampling: i64,
    solver: Option<&str>,
    model_type: Option<String>,
) -> PyResult<(Vec<String>, Vec<Vec<f64>>)> {
    let solver = match solver {
        Some(name) => name.parse::<Solver>().map_err(value_error)?,
        None => Solver::default(),
    };
    let config = SimulationConfigBuilder::default()
        .model_type(model_type)
        .solver(solver)
        .timestep(timestep)
        .end_time(end_time)
        .lower_bound(lower)
        .upper_bound(upper)
        .sampling(sampling)
        .build()
        .map_err(value_error)?;
    let stride = config.sampling_stride().map_err(value_error)?;
    let inner = &model.inner;
    let trajectory = py
        .allow_threads(|| simulate_model(inner, &config))
        .map_err(value_error)?;
    let sampled = sample(&trajectory, stride).map_err(value_error)?;

    let mut labels = vec![TIME_COLUMN.to_string()];
    labels.extend(sampled.labels().iter().cloned());
    let rows = sampled
        .iter()
        .map(|(time, state)| {
            let mut row = Vec::with_capacity(state.len() + 1);
            row.push(time);
            row.extend(state.iter().copied());
            row
        })
        .collect();
    Ok((labels, rows))
}

/// A Python module implemented in Rust. The name of this function must match
/// the `lib.name` setting in the `Cargo.toml`, else Python will not be able to
/// import the module.
#[pymodule]
fn _core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(simulate, m)?)?;
    m.add_class::<PyModel>()?;
    Ok(())
}
