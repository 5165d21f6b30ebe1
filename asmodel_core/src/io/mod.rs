//! Module for reading and writing Models and simulation results
use std::path::Path;
use std::str::FromStr;

use thiserror::Error;

use crate::io::asm::AsmParseError;
use crate::io::json::JsonError;
use crate::metabolic_model::model::Model;

pub mod asm;
pub mod json;
pub mod results;
pub mod sif;

/// Encoding of a model file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFormat {
    Asm,
    Json,
}

impl ModelFormat {
    /// Guess the format from the file extension, anything but `.json` is ASM
    pub fn from_path<P: AsRef<Path>>(path: P) -> ModelFormat {
        match path.as_ref().extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ModelFormat::Json,
            _ => ModelFormat::Asm,
        }
    }
}

impl FromStr for ModelFormat {
    type Err = IoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asm" => Ok(ModelFormat::Asm),
            "json" => Ok(ModelFormat::Json),
            _ => Err(IoError::UnknownFormat(s.to_string())),
        }
    }
}

/// Read a model file, in `format` or else the format implied by its extension
pub fn read_model<P: AsRef<Path>>(path: P, format: Option<ModelFormat>) -> Result<Model, IoError> {
    let format = format.unwrap_or_else(|| ModelFormat::from_path(&path));
    log::info!("Reading {:?} model from {}", format, path.as_ref().display());
    match format {
        ModelFormat::Asm => Ok(Model::read_asm(path)?),
        ModelFormat::Json => Ok(Model::read_json(path)?),
    }
}

/// Write a model file in `format`
pub fn write_model<P: AsRef<Path>>(model: &Model, path: P, format: ModelFormat) -> Result<(), IoError> {
    match format {
        ModelFormat::Asm => Ok(model.write_asm(path)?),
        ModelFormat::Json => Ok(model.write_json(path)?),
    }
}

#[derive(Error, Debug)]
pub enum IoError {
    #[error("{0}")]
    Asm(#[from] AsmParseError),
    #[error("{0}")]
    Json(#[from] JsonError),
    #[error("Unknown model format {0:?} (expected asm or json)")]
    UnknownFormat(String),
}

#[cfg(test)]
mod io_tests {
    use super::*;
    use std::path::PathBuf;

    fn test_model(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("test_data")
            .join("test_models")
            .join(name)
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(ModelFormat::from_path("a/b.json"), ModelFormat::Json);
        assert_eq!(ModelFormat::from_path("a/b.JSON"), ModelFormat::Json);
        assert_eq!(ModelFormat::from_path("a/b.modelspec"), ModelFormat::Asm);
        assert_eq!(ModelFormat::from_path("model"), ModelFormat::Asm);
        assert_eq!("JSON".parse::<ModelFormat>().unwrap(), ModelFormat::Json);
        assert!("sbml".parse::<ModelFormat>().is_err());
    }

    #[test]
    fn read_either_format() {
        let asm = read_model(test_model("decay.modelspec"), None).unwrap();
        let json = read_model(test_model("decay.json"), None).unwrap();
        assert_eq!(asm.reactions, json.reactions);
        assert!(matches!(
            read_model(test_model("decay.json"), Some(ModelFormat::Asm)),
            Err(IoError::Asm(_))
        ));
    }
}
