//! The proposer seam
//!
//! The loop only needs "given what we have, what should we try next". Any
//! source of candidates implements [`Proposer`]; the production one is
//! [`crate::AnthropicProposer`].

use crate::types::{Proposal, ProposalRequest};
use async_trait::async_trait;
use scout_core::Result;

/// Source of candidate URLs
#[async_trait]
pub trait Proposer: Send + Sync {
    /// Produce this round's command.
    ///
    /// An `Err` ends the run; returning [`scout_core::ProposerCommand::NoAction`]
    /// only skips the probe for this round.
    async fn propose(&self, request: &ProposalRequest<'_>) -> Result<Proposal>;
}
