//! Command line interface of asmodel
//!
//! Every subcommand reads one or more model files (ASM, or JSON when the file ends in
//! `.json`). Simulation settings come from an optional TOML file, and flags given on the
//! command line override the values read from it.
use std::error::Error;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Args, Parser, Subcommand};

use asmodel_core::configuration::SimulationConfig;
use asmodel_core::io::results::{write_sensitivity_file, write_trajectory_file};
use asmodel_core::io::sif::write_sif;
use asmodel_core::io::{read_model, write_model, ModelFormat};
use asmodel_core::metabolic_model::model::Model;
use asmodel_core::simulate::bounds::parse_bound_list;
use asmodel_core::simulate::sampler::sample;
use asmodel_core::simulate::sensitivity::{local_sensitivity, OutputFormat};
use asmodel_core::simulate::simulate;

const EXIT_FAILURE: i32 = 1;
/// Suffix appended to the result file when only part of a run could be computed
const PARTIAL_SUFFIX: &str = ".partial";
const EMPTY_FLUX: &str = "NIL";

#[derive(Parser, Debug)]
#[command(author, version, about = "Compile kinetic models into ODEs and simulate them")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Simulate a model and write the sampled trajectory as CSV
    Simulate {
        #[command(flatten)]
        model: ModelArgs,
        #[command(flatten)]
        simulation: SimulationArgs,
        #[arg(long, default_value = "results.csv")]
        resultfile: PathBuf,
    },
    /// Export the reaction network of one or more models as SIF
    Network {
        #[command(flatten)]
        model: ModelArgs,
        #[arg(long, default_value = "network.sif")]
        outputfile: PathBuf,
    },
    /// Merge several models into one, renumbering their reactions
    Merge {
        #[command(flatten)]
        model: ModelArgs,
        #[arg(long)]
        outputfile: PathBuf,
        #[arg(long, default_value = "exp")]
        prefix: String,
    },
    /// List the reactions producing and consuming each component
    Fluxes {
        #[command(flatten)]
        model: ModelArgs,
    },
    /// Print a summary of a model
    Print {
        #[command(flatten)]
        model: ModelArgs,
    },
    /// Rerun a simulation with each kinetic parameter scaled in turn
    Sensitivity {
        #[command(flatten)]
        model: ModelArgs,
        #[command(flatten)]
        simulation: SimulationArgs,
        /// Factor applied to each parameter
        #[arg(long, default_value_t = 100.)]
        multiple: f64,
        /// `reduced` keeps the final state of each run, `full` every sampled state
        #[arg(long, default_value = "reduced")]
        outfmt: String,
        #[arg(long, default_value = "sensitivity.csv")]
        resultfile: PathBuf,
    },
}

#[derive(Args, Debug)]
struct ModelArgs {
    /// Model file, or a semicolon separated list of model files
    #[arg(long)]
    modelfile: String,
    /// Model file format (asm or json), guessed from the extension when missing
    #[arg(long)]
    format: Option<String>,
}

impl ModelArgs {
    fn paths(&self) -> Vec<PathBuf> {
        self.modelfile
            .split(';')
            .map(str::trim)
            .filter(|path| !path.is_empty())
            .map(PathBuf::from)
            .collect()
    }

    fn read_all(&self) -> Result<Vec<Model>, Box<dyn Error>> {
        let format = match &self.format {
            Some(format) => Some(format.parse::<ModelFormat>()?),
            None => None,
        };
        let paths = self.paths();
        if paths.is_empty() {
            return Err("no model file given".into());
        }
        let mut models = Vec::with_capacity(paths.len());
        for path in paths {
            models.push(read_model(&path, format)?);
        }
        Ok(models)
    }

    fn read_one(&self) -> Result<Model, Box<dyn Error>> {
        let mut models = self.read_all()?;
        if models.len() != 1 {
            return Err(format!("expected one model file, got {}", models.len()).into());
        }
        models.pop().ok_or_else(|| "no model file given".into())
    }
}

#[derive(Args, Debug, Default)]
struct SimulationArgs {
    /// TOML file with simulation settings
    #[arg(long)]
    config: Option<PathBuf>,
    /// Model type, overriding the type declared by the model
    #[arg(long)]
    mtype: Option<String>,
    /// Integration method (Euler, Heun, RK3, RK4, RK38)
    #[arg(long)]
    solver: Option<String>,
    #[arg(long)]
    timestep: Option<f64>,
    #[arg(long)]
    endtime: Option<f64>,
    /// Lower bound of each bound class, e.g. "0;0"
    #[arg(long, allow_hyphen_values = true)]
    lowerbound: Option<String>,
    /// Upper bound of each bound class, e.g. "1e-3;1e-3"
    #[arg(long, allow_hyphen_values = true)]
    upperbound: Option<String>,
    /// Write every n-th step (plus the first and last)
    #[arg(long, allow_hyphen_values = true)]
    sampling: Option<i64>,
    /// Worker threads used by the sensitivity analysis
    #[arg(long)]
    processes: Option<usize>,
}

impl SimulationArgs {
    /// Settings from the TOML file (or the defaults), overridden by any flag given
    fn to_config(&self) -> Result<SimulationConfig, Box<dyn Error>> {
        let mut config = match &self.config {
            Some(path) => SimulationConfig::read_toml(path)?,
            None => SimulationConfig::default(),
        };
        if let Some(mtype) = &self.mtype {
            config.model_type = Some(mtype.clone());
        }
        if let Some(solver) = &self.solver {
            config.solver = solver.parse()?;
        }
        if let Some(timestep) = self.timestep {
            config.timestep = timestep;
        }
        if let Some(endtime) = self.endtime {
            config.end_time = endtime;
        }
        if let Some(lower) = &self.lowerbound {
            config.lower_bound = parse_bound_list(lower)?;
        }
        if let Some(upper) = &self.upperbound {
            config.upper_bound = parse_bound_list(upper)?;
        }
        if let Some(sampling) = self.sampling {
            config.sampling = sampling;
        }
        if let Some(processes) = self.processes {
            config.processes = processes;
        }
        Ok(config)
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("error: {}", err);
        process::exit(EXIT_FAILURE);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    match cli.command {
        Command::Simulate {
            model,
            simulation,
            resultfile,
        } => run_simulate(&model, &simulation, &resultfile),
        Command::Network { model, outputfile } => {
            let models = model.read_all()?;
            write_sif(&models, &outputfile)?;
            log::info!("Network written to {}", outputfile.display());
            Ok(())
        }
        Command::Merge {
            model,
            outputfile,
            prefix,
        } => {
            let merged = Model::merge(&model.read_all()?, &prefix)?;
            write_model(&merged, &outputfile, ModelFormat::from_path(&outputfile))?;
            log::info!("Merged model written to {}", outputfile.display());
            Ok(())
        }
        Command::Fluxes { model } => {
            print!("{}", flux_table(&model.read_one()?));
            Ok(())
        }
        Command::Print { model } => {
            print!("{}", summary(&model.read_one()?));
            Ok(())
        }
        Command::Sensitivity {
            model,
            simulation,
            multiple,
            outfmt,
            resultfile,
        } => {
            let model = model.read_one()?;
            let config = simulation.to_config()?;
            let format: OutputFormat = outfmt.parse()?;
            let analysis = local_sensitivity(&model, &config, multiple, format)?;
            write_sensitivity_file(&analysis, &resultfile)?;
            log::info!(
                "{} sensitivity runs written to {}",
                analysis.runs.len(),
                resultfile.display()
            );
            Ok(())
        }
    }
}

fn run_simulate(
    model: &ModelArgs,
    simulation: &SimulationArgs,
    resultfile: &Path,
) -> Result<(), Box<dyn Error>> {
    let model = model.read_one()?;
    let config = simulation.to_config()?;
    let stride = config.sampling_stride()?;
    match simulate(&model, &config) {
        Ok(trajectory) => {
            write_trajectory_file(&sample(&trajectory, stride)?, resultfile)?;
            log::info!("Results written to {}", resultfile.display());
            Ok(())
        }
        Err(err) => {
            if let Some(partial) = err.partial().filter(|partial| !partial.is_empty()) {
                let path = partial_path(resultfile);
                write_trajectory_file(&sample(partial, stride)?, &path)?;
                eprintln!("Partial results written to {}", path.display());
            }
            Err(err.into())
        }
    }
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(PARTIAL_SUFFIX);
    PathBuf::from(name)
}

/// `Name|Productions|Usages` table, `NIL` standing in for an empty list
fn flux_table(model: &Model) -> String {
    let join = |ids: &[String]| {
        if ids.is_empty() {
            EMPTY_FLUX.to_string()
        } else {
            ids.join(",")
        }
    };
    let mut table = String::from("Name|Productions|Usages\n");
    for (id, fluxes) in model.fluxes() {
        table.push_str(&format!(
            "{}|{}|{}\n",
            id,
            join(&fluxes.productions),
            join(&fluxes.usages)
        ));
    }
    table
}

fn summary(model: &Model) -> String {
    let mut out = format!(
        "Model {} ({})\n",
        model.id.as_deref().unwrap_or("<unnamed>"),
        model.model_type
    );
    if !model.identifiers.is_empty() {
        out.push_str("Identifiers:\n");
        for (key, value) in &model.identifiers {
            out.push_str(&format!("  {}: {}\n", key, value));
        }
    }
    out.push_str(&format!("Components ({}):\n", model.components.len()));
    for component in model.components.values() {
        out.push_str(&format!("  {} = {}", component.id, component.initial));
        if let Some(description) = &component.description {
            out.push_str(&format!(" ({})", description));
        }
        if let Some(tag) = &component.bound_class {
            out.push_str(&format!(" [{}]", tag));
        }
        out.push('\n');
    }
    out.push_str(&format!("Reactions ({}):\n", model.reactions.len()));
    for reaction in model.reactions.values() {
        out.push_str(&format!("  {}\n", reaction));
    }
    out
}
