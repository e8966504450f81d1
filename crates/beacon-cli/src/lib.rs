//! Beacon CLI - Result-signing simulation
//!
//! Drives a whole group through the DKG result-signing phase in one process
//! and submits the outcome to the local chain.

pub mod config;
pub mod simulation;

pub use config::{load_or_default, resolve_config_path, CONFIG_ENV, DEFAULT_CONFIG_FILE};
pub use simulation::{run, MemberOutcome, SimulationConfig, SimulationError, SimulationReport};
