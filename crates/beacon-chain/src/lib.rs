//! Beacon Chain - Local ledger stub
//!
//! An in-memory stand-in for the threshold relay contract. It computes the
//! canonical hash of DKG results, accepts result submissions carrying at least
//! `honest_threshold` signatures, and publishes chain events to subscribers.

pub mod config;
pub mod error;
pub mod events;
pub mod local;

pub use config::RelayConfig;
pub use error::{ChainError, Result};
pub use events::{DkgResultSubmission, EventBus, GroupRegistration, Subscription};
pub use local::{LocalChain, LocalGroup, SubmittedResult, SEED_GROUP_PUBLIC_KEY};
