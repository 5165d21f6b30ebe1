//! Write simulation results as CSV
//!
//! Numbers use Rust's shortest round-trip formatting, so reading a value back gives the
//! exact `f64` that was written.
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use thiserror::Error;

use crate::simulate::sampler::SampledTrajectory;
use crate::simulate::sensitivity::SensitivityAnalysis;

/// Name of the first column of every results file
pub const TIME_COLUMN: &str = "time";

/// Write `sampled` as CSV with a `time,<component ids…>` header
pub fn write_trajectory<W: Write>(sampled: &SampledTrajectory, writer: W) -> Result<(), ResultsError> {
    let mut wtr = csv::Writer::from_writer(writer);
    let mut header = vec![TIME_COLUMN.to_string()];
    header.extend(sampled.labels().iter().cloned());
    wtr.write_record(&header)?;
    for (time, state) in sampled.iter() {
        let mut record = Vec::with_capacity(state.len() + 1);
        record.push(time.to_string());
        record.extend(state.iter().map(|value| value.to_string()));
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write `sampled` to a CSV file at `path`
pub fn write_trajectory_file<P: AsRef<Path>>(
    sampled: &SampledTrajectory,
    path: P,
) -> Result<(), ResultsError> {
    write_trajectory(sampled, File::create(path)?)
}

/// Write a sensitivity analysis as CSV with a `Parameter,Change,time,<component ids…>` header
pub fn write_sensitivity<W: Write>(
    analysis: &SensitivityAnalysis,
    writer: W,
) -> Result<(), ResultsError> {
    let mut wtr = csv::Writer::from_writer(writer);
    let mut header = vec![
        "Parameter".to_string(),
        "Change".to_string(),
        TIME_COLUMN.to_string(),
    ];
    header.extend(analysis.labels.iter().cloned());
    wtr.write_record(&header)?;
    for run in &analysis.runs {
        for (time, state) in &run.rows {
            let mut record = Vec::with_capacity(state.len() + 3);
            record.push(run.parameter.clone());
            record.push(run.change.clone());
            record.push(time.to_string());
            record.extend(state.iter().map(|value| value.to_string()));
            wtr.write_record(&record)?;
        }
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_sensitivity_file<P: AsRef<Path>>(
    analysis: &SensitivityAnalysis,
    path: P,
) -> Result<(), ResultsError> {
    write_sensitivity(analysis, File::create(path)?)
}

/// Read a results file written by [`write_trajectory`]
///
/// # Returns
/// The header (starting with `time`) and one row of numbers per sample
pub fn read_trajectory<R: Read>(reader: R) -> Result<(Vec<String>, Vec<Vec<f64>>), ResultsError> {
    let mut rdr = csv::ReaderBuilder::new().from_reader(reader);
    let header: Vec<String> = rdr.headers()?.iter().map(|h| h.to_string()).collect();
    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let row = record
            .iter()
            .map(|field| {
                field
                    .trim()
                    .parse::<f64>()
                    .map_err(|_| ResultsError::InvalidNumber(field.to_string()))
            })
            .collect::<Result<Vec<f64>, ResultsError>>()?;
        rows.push(row);
    }
    Ok((header, rows))
}

#[derive(Error, Debug)]
pub enum ResultsError {
    #[error("Unable to write results file")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Invalid number {0:?} in results file")]
    InvalidNumber(String),
}

#[cfg(test)]
mod results_tests {
    use super::*;
    use crate::configuration::SimulationConfigBuilder;
    use crate::io::asm::parse_asm;
    use crate::simulate::sampler::sample;
    use crate::simulate::sensitivity::{local_sensitivity, OutputFormat};
    use crate::simulate::simulate;

    const SPEC: &str = "[Specification]\ntype : mass_action\n[Objects]\nA\nB\n[Initials]\nA : 10\n[Reactions]\nR1 : A -> B | k = 0.1\n";

    fn config() -> crate::configuration::SimulationConfig {
        SimulationConfigBuilder::default()
            .timestep(0.1)
            .end_time(1.)
            .lower_bound(vec![0.])
            .upper_bound(vec![1e6])
            .sampling(20)
            .build()
            .unwrap()
    }

    #[test]
    fn trajectory_csv() {
        let model = parse_asm(SPEC).unwrap();
        let trajectory = simulate(&model, &config()).unwrap();
        let sampled = sample(&trajectory, 20).unwrap();
        let mut buffer = Vec::new();
        write_trajectory(&sampled, &mut buffer).unwrap();
        let text = String::from_utf8(buffer.clone()).unwrap();
        assert!(text.starts_with("time,A,B\n0,10,0\n"));

        let (header, rows) = read_trajectory(buffer.as_slice()).unwrap();
        assert_eq!(header, vec!["time", "A", "B"]);
        assert_eq!(rows.len(), 2);
        let (_, last) = trajectory.last().unwrap();
        // Shortest round-trip formatting reads back exactly
        assert_eq!(rows[1][1], last[0]);
        assert_eq!(rows[1][2], last[1]);
    }

    #[test]
    fn sensitivity_csv() {
        let model = parse_asm(SPEC).unwrap();
        let analysis = local_sensitivity(&model, &config(), 100., OutputFormat::Reduced).unwrap();
        let mut buffer = Vec::new();
        write_sensitivity(&analysis, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Parameter,Change,time,A,B");
        assert!(lines[1].starts_with("original,None,1,"));
        assert!(lines[2].starts_with("R1.k,0.1 --> 10,1,"));
        assert_eq!(lines.len(), 3);
    }
}
