//! Scenario file loading
//!
//! `.yaml`/`.yml` files are read with serde-saphyr, `.json` with serde_json.
//! Any other extension is rejected rather than guessed.

use std::fs;
use std::path::Path;

use nestegg_core::Scenario;

#[derive(Debug)]
pub enum ScenarioFileError {
    Io(String),
    Parse(String),
    UnsupportedFormat(String),
}

impl std::fmt::Display for ScenarioFileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScenarioFileError::Io(msg) => write!(f, "IO error: {msg}"),
            ScenarioFileError::Parse(msg) => write!(f, "Parse error: {msg}"),
            ScenarioFileError::UnsupportedFormat(ext) => {
                write!(f, "unsupported scenario format '{ext}' (expected yaml, yml or json)")
            }
        }
    }
}

impl std::error::Error for ScenarioFileError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioFormat {
    Yaml,
    Json,
}

impl ScenarioFormat {
    pub fn from_path(path: &Path) -> Result<Self, ScenarioFileError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "yaml" | "yml" => Ok(ScenarioFormat::Yaml),
            "json" => Ok(ScenarioFormat::Json),
            _ => Err(ScenarioFileError::UnsupportedFormat(ext)),
        }
    }
}

pub fn parse_scenario(content: &str, format: ScenarioFormat) -> Result<Scenario, ScenarioFileError> {
    match format {
        ScenarioFormat::Yaml => {
            serde_saphyr::from_str(content).map_err(|e| ScenarioFileError::Parse(e.to_string()))
        }
        ScenarioFormat::Json => {
            serde_json::from_str(content).map_err(|e| ScenarioFileError::Parse(e.to_string()))
        }
    }
}

pub fn load_scenario(path: &Path) -> Result<Scenario, ScenarioFileError> {
    let format = ScenarioFormat::from_path(path)?;
    let content = fs::read_to_string(path)
        .map_err(|e| ScenarioFileError::Io(format!("{}: {e}", path.display())))?;
    parse_scenario(&content, format)
}
