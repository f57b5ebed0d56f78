//! Activity Logger - Human-readable round log in `.scout/activity.md`
//!
//! Records, per run:
//! - limits and run id
//! - each round's candidate, verdict and list sizes
//! - a final summary with token usage and stop reason
//!
//! Every write is fail-open: a broken log never ends a run.

use crate::loop_engine::LoopResult;
use chrono::Utc;
use scout_agent::Proposal;
use scout_core::fail_open::fail_open;
use scout_core::{LoopLimits, ProposerCommand, Result, Session};
use scout_validation::Verdict;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// Maximum characters of model text kept per round
const ACTIVITY_LOG_PREVIEW_CHARS: usize = 300;

/// Activity logger for loop rounds
pub struct ActivityLogger {
    output_path: PathBuf,
}

impl ActivityLogger {
    pub fn new(scout_dir: PathBuf) -> Self {
        Self {
            output_path: scout_dir.join("activity.md"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.output_path
    }

    /// Start a fresh log for a run (truncates the previous one)
    pub async fn log_loop_start(&self, run_id: Uuid, limits: &LoopLimits) {
        let content = format!(
            "# Scout Activity Log\n\n**Run**: {}\n**Started**: {}\n**Target**: more than {} websites\n**Max Rounds**: {}\n\n---\n\n",
            run_id,
            Utc::now().format("%Y-%m-%d %H:%M:%S UTC"),
            limits.target_count,
            limits.max_iterations
        );

        fail_open("activity_logger::log_loop_start", || self.write_fresh(&content)).await;
    }

    pub async fn log_round_start(&self, iteration: usize, max: usize) {
        let content = format!(
            "### Round {}/{}\n**Time**: {}\n\n",
            iteration,
            max,
            Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
        );

        fail_open("activity_logger::log_round_start", || self.append(&content)).await;
    }

    pub async fn log_round_complete(
        &self,
        proposal: &Proposal,
        verdict: Option<&Verdict>,
        session: &Session,
    ) {
        let mut content = String::new();

        match (&proposal.command, verdict) {
            (ProposerCommand::ProposeUrl(url), Some(verdict)) => {
                content.push_str(&format!("**Candidate**: {}\n", url));
                content.push_str(&format!("**Verdict**: {}\n", verdict));
            }
            _ => content.push_str("**Candidate**: none (no tool call)\n"),
        }

        content.push_str(&format!(
            "**Found**: {} | **Tried**: {}\n\n",
            session.found().len(),
            session.tried().len()
        ));

        let text = proposal.text.trim();
        if !text.is_empty() {
            content.push_str("<details>\n<summary>Model text</summary>\n\n```\n");
            content.push_str(&preview(text));
            content.push_str("\n```\n</details>\n\n");
        }

        content.push_str("---\n\n");

        fail_open("activity_logger::log_round_complete", || self.append(&content)).await;
    }

    pub async fn log_loop_complete(&self, result: &LoopResult) {
        let mut content = format!(
            "## Summary\n\n**Finished**: {}\n**Rounds**: {}\n**Stopped**: {}\n**Tokens**: {} in / {} out\n\n",
            Utc::now().format("%Y-%m-%d %H:%M:%S UTC"),
            result.rounds,
            result.stop_reason,
            result.total_usage.input_tokens,
            result.total_usage.output_tokens
        );

        content.push_str(&format!("**Websites found** ({}):\n", result.found.len()));
        for website in &result.found {
            content.push_str(&format!("- {}\n", website));
        }
        content.push('\n');

        fail_open("activity_logger::log_loop_complete", || self.append(&content)).await;
    }

    async fn write_fresh(&self, content: &str) -> Result<()> {
        if let Some(parent) = self.output_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.output_path)
            .await?;
        file.write_all(content.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    async fn append(&self, content: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.output_path)
            .await?;
        file.write_all(content.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

fn preview(text: &str) -> String {
    if text.chars().count() > ACTIVITY_LOG_PREVIEW_CHARS {
        let truncated: String = text.chars().take(ACTIVITY_LOG_PREVIEW_CHARS).collect();
        format!("{truncated}...")
    } else {
        text.to_string()
    }
}
