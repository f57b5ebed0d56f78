//! Run state and the stop decision
//!
//! A [`Session`] holds everything a run accumulates: every URL probed, the
//! URLs that passed validation, and the round counter.

use serde::{Deserialize, Serialize};

/// Strip a trailing slash so `/pricing/` and `/pricing` are one entry
pub fn normalize_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

/// What the proposer asks the loop to do this round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposerCommand {
    /// Validate this candidate URL
    ProposeUrl(String),
    /// Plain text answer; the round ends without a probe
    NoAction,
}

/// Accumulated state for a single run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    tried: Vec<String>,
    found: Vec<String>,
    iterations: usize,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every normalized URL probed so far, in order (may repeat)
    pub fn tried(&self) -> &[String] {
        &self.tried
    }

    /// Validated URLs in first-seen order, no duplicates
    pub fn found(&self) -> &[String] {
        &self.found
    }

    /// Rounds started so far
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Start a new round, returning its 1-based number
    pub fn begin_round(&mut self) -> usize {
        self.iterations += 1;
        self.iterations
    }

    /// Append to the tried list. Never deduplicated.
    pub fn record_tried(&mut self, url: impl Into<String>) {
        self.tried.push(url.into());
    }

    pub fn is_found(&self, url: &str) -> bool {
        self.found.iter().any(|u| u == url)
    }

    /// Append to the found list unless already present.
    ///
    /// Returns `false` for a duplicate.
    pub fn record_found(&mut self, url: impl Into<String>) -> bool {
        let url = url.into();
        if self.is_found(&url) {
            return false;
        }
        self.found.push(url);
        true
    }

    /// Hand the found list over for export
    pub fn into_found(self) -> Vec<String> {
        self.found
    }
}

/// Limits that bound a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopLimits {
    /// Stop once `found` holds more than this many URLs
    pub target_count: usize,
    /// Stop once this many rounds have run
    pub max_iterations: usize,
}

/// Why the loop stopped
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    /// Found count went past the target
    TargetExceeded,
    /// Reached maximum iterations
    MaxIterations,
    /// The proposer paused API calls after repeated failed rounds
    ApiPaused,
    /// The proposer failed
    Error(String),
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TargetExceeded => write!(f, "target count exceeded"),
            Self::MaxIterations => write!(f, "max iterations reached"),
            Self::ApiPaused => write!(f, "model API paused after repeated failures"),
            Self::Error(e) => write!(f, "error: {}", e),
        }
    }
}

/// Outcome of the stop check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopDecision {
    Continue,
    Stop(StopReason),
}

/// Decide whether another round should run.
///
/// The found comparison is strict, so a run with `target_count = 2` keeps
/// going until a third URL is found.
pub fn should_continue(session: &Session, limits: &LoopLimits) -> LoopDecision {
    if session.found().len() > limits.target_count {
        return LoopDecision::Stop(StopReason::TargetExceeded);
    }
    if session.iterations() >= limits.max_iterations {
        return LoopDecision::Stop(StopReason::MaxIterations);
    }
    LoopDecision::Continue
}
