//! # scout-core
//!
//! Core types for Scout, an agent loop that hunts for pricing pages.
//!
//! A run is a plain loop of rounds:
//!
//! - a proposer suggests one candidate URL (or nothing)
//! - the validator probes it over HTTP and updates the [`Session`]
//! - [`should_continue`] decides whether another round is needed
//!
//! All run state lives in an explicit [`Session`] owned by the caller,
//! so runs are independent and easy to test.

pub mod config;
mod error;
pub mod fail_open;
mod session;

pub use config::ScoutConfig;
pub use error::{Result, ScoutError};
pub use session::{
    normalize_url, should_continue, LoopDecision, LoopLimits, ProposerCommand, Session,
    StopReason,
};
