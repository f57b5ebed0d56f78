//! Authentication for the Anthropic API
//!
//! The key is read from an environment variable whose name comes from
//! configuration (`ANTHROPIC_API_KEY` by default).

use scout_core::{Result, ScoutError};
use std::env;

/// Get the API key from `api_key_env`
pub fn get_auth_token(api_key_env: &str) -> Result<String> {
    match env::var(api_key_env) {
        Ok(key) if !key.trim().is_empty() => {
            tracing::info!("Using {}", api_key_env);
            Ok(key)
        }
        _ => Err(ScoutError::Auth(format!(
            "No authentication found. Set {}=sk-ant-api03-...",
            api_key_env
        ))),
    }
}
