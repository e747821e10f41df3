//! Retirement Monte Carlo engine
//!
//! Projects a household portfolio forward year by year under randomised
//! market returns and estimates the probability that savings last through
//! the horizon. It provides:
//! - A fixed five-asset universe (stocks, bonds, crypto, CDs, cash)
//! - Correlated return generation with optional fat tails (Student-t body,
//!   Kou double-exponential jumps, log-space safety transform)
//! - Income, spending, flat-rate taxes, one-time inflows and purchases
//! - An optional scripted portfolio shock at a chosen age
//! - Percentile trajectories and a terminal success probability
//!
//! # Example
//!
//! ```no_run
//! use nestegg_core::{Engine, EngineConfig, Scenario};
//!
//! let scenario = Scenario::example();
//! let engine = Engine::new(&scenario, EngineConfig::default().with_seed(42))?;
//! let summary = engine.run()?;
//! println!("success probability: {:.1}%", summary.success_prob * 100.0);
//! # Ok::<(), nestegg_core::error::EngineError>(())
//! ```

#![warn(clippy::all)]

// ============================================================================
// Core modules
// ============================================================================

pub mod cash_flows;
pub mod covariance;
pub mod error;
pub mod returns;
pub mod simulation;
pub mod summary;

// ============================================================================
// Type definition modules
// ============================================================================

pub mod model;

// ============================================================================
// Test modules
// ============================================================================

#[cfg(test)]
mod tests;

// ============================================================================
// Public re-exports for convenience
// ============================================================================

pub use error::{ConfigurationError, EngineError, ValidationError};
pub use model::{Asset, AssetMap, Scenario, SimulationSummary};
pub use simulation::{Engine, EngineConfig, GeneratorKind, SimulationOutput};
