//! # scout-agent
//!
//! Candidate proposers for Scout.
//!
//! - [`Proposer`]: the seam the loop engine calls once per round
//! - [`AnthropicProposer`]: asks Claude for one pricing-page URL per round
//!   through a single `check_website_exists` tool
//!
//! Each round is a fresh request. What the model knows about earlier rounds
//! comes only from the found/tried lists rendered into its prompt.

mod auth;
mod circuit_breaker;
mod client;
mod prompt;
mod proposer;
mod tool;
mod types;

pub use auth::get_auth_token;
pub use circuit_breaker::CircuitBreaker;
pub use client::AnthropicProposer;
pub use prompt::build_proposal_prompt;
pub use proposer::Proposer;
pub use tool::{check_website_tool, parse_command, CHECK_WEBSITE_TOOL};
pub use types::*;
