//! # scout-validation
//!
//! Probes candidate URLs over HTTP and records the outcome in a
//! [`scout_core::Session`].

mod validator;

pub use validator::{UrlValidator, ValidatorConfig, Verdict};
