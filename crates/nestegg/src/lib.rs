//! Command-line shell around `nestegg_core`: load a scenario, run the engine,
//! print the summary as JSON.

pub mod logging;
pub mod scenario_file;

pub use logging::init_logging;
pub use scenario_file::{ScenarioFileError, ScenarioFormat, load_scenario, parse_scenario};
