//! Loop Engine - propose, validate, decide
//!
//! Each round:
//! 1. Checks the stop condition
//! 2. Asks the proposer for one candidate, passing the found/tried lists
//! 3. Validates the candidate, if any, against the session
//! 4. Logs the round
//!
//! Rounds run strictly one after another. The iteration cap is the only
//! termination guarantee, so it is checked before every proposal.

use crate::activity_logger::ActivityLogger;
use scout_agent::{ProposalRequest, Proposer, Usage};
use scout_core::{
    should_continue, LoopDecision, LoopLimits, ProposerCommand, Result, ScoutError, Session,
    StopReason,
};
use scout_validation::UrlValidator;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Result from running a complete loop
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoopResult {
    pub run_id: Uuid,
    /// Number of rounds run
    pub rounds: usize,
    /// Validated URLs, first-seen order
    pub found: Vec<String>,
    /// Every URL probed, in order
    pub tried: Vec<String>,
    pub total_usage: Usage,
    pub stop_reason: StopReason,
}

/// Loop engine driving one run
pub struct LoopEngine<P: Proposer> {
    proposer: P,
    validator: UrlValidator,
    limits: LoopLimits,
    activity_logger: Option<ActivityLogger>,
}

impl<P: Proposer> LoopEngine<P> {
    pub fn new(proposer: P, validator: UrlValidator, limits: LoopLimits) -> Self {
        Self {
            proposer,
            validator,
            limits,
            activity_logger: None,
        }
    }

    /// Enable activity logging to `<scout_dir>/activity.md`
    pub fn with_activity_logging(mut self, scout_dir: PathBuf) -> Self {
        self.activity_logger = Some(ActivityLogger::new(scout_dir));
        self
    }

    pub fn proposer(&self) -> &P {
        &self.proposer
    }

    pub fn limits(&self) -> &LoopLimits {
        &self.limits
    }

    /// Run rounds until the target is passed or the cap is hit.
    ///
    /// Proposer failures end the run early but still return what was found.
    pub async fn run(&self) -> Result<LoopResult> {
        if self.limits.max_iterations == 0 {
            return Err(ScoutError::Config(
                "max_iterations must be at least 1".to_string(),
            ));
        }

        let run_id = Uuid::new_v4();
        info!(
            "Starting run {} (target > {}, max {} rounds)",
            run_id, self.limits.target_count, self.limits.max_iterations
        );

        if let Some(logger) = &self.activity_logger {
            logger.log_loop_start(run_id, &self.limits).await;
        }

        let mut session = Session::new();
        let mut total_usage = Usage::default();

        let stop_reason = loop {
            if let LoopDecision::Stop(reason) = should_continue(&session, &self.limits) {
                break reason;
            }

            let iteration = session.begin_round();
            info!(
                "=== Round {} of {} ===",
                iteration, self.limits.max_iterations
            );

            if let Some(logger) = &self.activity_logger {
                logger
                    .log_round_start(iteration, self.limits.max_iterations)
                    .await;
            }

            let request = ProposalRequest {
                found: session.found(),
                tried: session.tried(),
                iteration,
                max_iterations: self.limits.max_iterations,
            };

            let proposal = match self.proposer.propose(&request).await {
                Ok(proposal) => proposal,
                Err(e @ ScoutError::CircuitOpen { .. }) => {
                    warn!("Round {} skipped: {}", iteration, e);
                    break StopReason::ApiPaused;
                }
                Err(e) => {
                    error!("Proposer failed in round {}: {}", iteration, e);
                    break StopReason::Error(e.to_string());
                }
            };

            if let Some(usage) = &proposal.usage {
                total_usage.add(usage);
            }

            let verdict = match &proposal.command {
                ProposerCommand::ProposeUrl(url) => {
                    Some(self.validator.validate(url, &mut session).await)
                }
                ProposerCommand::NoAction => {
                    warn!("Round {} ended without a candidate", iteration);
                    None
                }
            };

            info!(
                "Round {} done: {} found, {} tried",
                iteration,
                session.found().len(),
                session.tried().len()
            );

            if let Some(logger) = &self.activity_logger {
                logger
                    .log_round_complete(&proposal, verdict.as_ref(), &session)
                    .await;
            }
        };

        info!(
            "Run {} stopped after {} rounds: {}",
            run_id,
            session.iterations(),
            stop_reason
        );

        let result = LoopResult {
            run_id,
            rounds: session.iterations(),
            tried: session.tried().to_vec(),
            found: session.into_found(),
            total_usage,
            stop_reason,
        };

        if let Some(logger) = &self.activity_logger {
            logger.log_loop_complete(&result).await;
        }

        Ok(result)
    }
}
