//! Anthropic API proposer
//!
//! Each round is a single stateless request: the prompt carries the found and
//! tried lists, and no conversation history is kept between rounds.

use crate::auth;
use crate::circuit_breaker::CircuitBreaker;
use crate::prompt::build_proposal_prompt;
use crate::proposer::Proposer;
use crate::tool::{check_website_tool, parse_command, response_text};
use crate::types::{
    AnthropicMessage, AnthropicRequest, AnthropicResponse, Model, Proposal, ProposalRequest,
};
use async_trait::async_trait;
use chrono::Utc;
use scout_core::{ProposerCommand, Result, ScoutError};
use std::time::Duration;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: usize = 1024;

// Rate limit retry configuration
const MAX_RETRIES: u32 = 5;
const INITIAL_BACKOFF: Duration = Duration::from_secs(30);
const MAX_BACKOFF: Duration = Duration::from_secs(300); // 5 minutes max

/// Double the wait, capped at `max`
fn next_backoff(current: Duration, max: Duration) -> Duration {
    current.saturating_mul(2).min(max)
}

/// Proposer backed by the Anthropic Messages API
pub struct AnthropicProposer {
    model: Model,
    max_tokens: usize,
    api_key: String,
    api_url: String,
    initial_backoff: Duration,
    max_backoff: Duration,
    http: reqwest::Client,
    circuit_breaker: CircuitBreaker,
}

impl AnthropicProposer {
    /// Create a proposer with an explicit API key
    pub fn new(model: Model, api_key: impl Into<String>) -> Self {
        Self {
            model,
            max_tokens: DEFAULT_MAX_TOKENS,
            api_key: api_key.into(),
            api_url: ANTHROPIC_API_URL.to_string(),
            initial_backoff: INITIAL_BACKOFF,
            max_backoff: MAX_BACKOFF,
            http: reqwest::Client::new(),
            circuit_breaker: CircuitBreaker::default(),
        }
    }

    /// Create a proposer reading its key from `api_key_env`
    pub fn from_env(model: Model, api_key_env: &str) -> Result<Self> {
        Ok(Self::new(model, auth::get_auth_token(api_key_env)?))
    }

    /// Set max tokens for responses
    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Point at a different Messages endpoint
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Wait between retries, doubling from `initial` up to `max`
    pub fn with_backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.initial_backoff = initial;
        self.max_backoff = max.max(initial);
        self
    }

    pub fn with_circuit_breaker(mut self, circuit_breaker: CircuitBreaker) -> Self {
        self.circuit_breaker = circuit_breaker;
        self
    }

    pub fn model(&self) -> Model {
        self.model
    }

    /// Send one round's request through the breaker
    async fn send(&self, request: &AnthropicRequest) -> Result<AnthropicResponse> {
        if let Err(retry_in) = self.circuit_breaker.check() {
            return Err(ScoutError::CircuitOpen { retry_in });
        }

        match self.send_with_retries(request).await {
            Ok(response) => {
                self.circuit_breaker.record_success();
                Ok(response)
            }
            Err(e) => {
                if self.circuit_breaker.record_failure() {
                    tracing::error!(
                        "{} failed rounds in a row, pausing API calls",
                        self.circuit_breaker.failed_rounds()
                    );
                } else {
                    tracing::warn!(
                        "Round failed ({} in a row): {}",
                        self.circuit_breaker.failed_rounds(),
                        e
                    );
                }
                Err(e)
            }
        }
    }

    /// Retry rate limits and server errors with exponential backoff
    async fn send_with_retries(&self, request: &AnthropicRequest) -> Result<AnthropicResponse> {
        let mut retries = 0;
        let mut backoff = self.initial_backoff;

        loop {
            tracing::debug!("Sending request to Anthropic API (attempt {})", retries + 1);

            let response = self
                .http
                .post(&self.api_url)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .header("content-type", "application/json")
                .json(request)
                .send()
                .await
                .map_err(|e| ScoutError::Api(format!("Failed to send request: {}", e)))?;

            let status = response.status();

            if status.as_u16() == 429 {
                retries += 1;

                if retries > MAX_RETRIES {
                    let error_text = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Unknown".to_string());
                    return Err(ScoutError::ApiLimit(format!(
                        "Rate limit exceeded after {} retries. Last error: {}",
                        MAX_RETRIES, error_text
                    )));
                }

                // Prefer the server's retry-after over our own backoff
                let wait = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok())
                    .map(Duration::from_secs)
                    .unwrap_or(backoff);

                tracing::warn!(
                    "Rate limited (429). Waiting {:?} before retry {}/{}",
                    wait,
                    retries,
                    MAX_RETRIES
                );

                tokio::time::sleep(wait).await;
                backoff = next_backoff(backoff, self.max_backoff);
                continue;
            }

            if status.is_server_error() && retries < MAX_RETRIES {
                retries += 1;
                tracing::warn!(
                    "Server error ({}). Waiting {:?} before retry {}/{}",
                    status,
                    backoff,
                    retries,
                    MAX_RETRIES
                );
                tokio::time::sleep(backoff).await;
                backoff = next_backoff(backoff, self.max_backoff);
                continue;
            }

            if !status.is_success() {
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown".to_string());
                return Err(ScoutError::Api(format!(
                    "Anthropic API error {}: {}",
                    status, error_text
                )));
            }

            return response
                .json()
                .await
                .map_err(|e| ScoutError::Api(format!("Failed to parse response: {}", e)));
        }
    }
}

#[async_trait]
impl Proposer for AnthropicProposer {
    async fn propose(&self, request: &ProposalRequest<'_>) -> Result<Proposal> {
        tracing::info!(
            "Asking {} for a candidate (round {})",
            self.model,
            request.iteration
        );

        let prompt = build_proposal_prompt(request);
        tracing::debug!("Prompt length: {} chars", prompt.len());

        let api_request = AnthropicRequest {
            model: self.model.api_name().to_string(),
            max_tokens: self.max_tokens,
            messages: vec![AnthropicMessage {
                role: "user".to_string(),
                content: prompt,
            }],
            tools: vec![check_website_tool()],
        };

        let response = self.send(&api_request).await?;

        let command = parse_command(&response.content);
        let text = response_text(&response.content);

        if !text.is_empty() {
            tracing::info!("AI: {}", text);
        }
        match &command {
            ProposerCommand::ProposeUrl(url) => tracing::info!("Tool call: check {}", url),
            ProposerCommand::NoAction => tracing::info!("No tool call this round"),
        }
        if let Some(usage) = &response.usage {
            tracing::debug!(
                "Round {} used {} input / {} output tokens",
                request.iteration,
                usage.input_tokens,
                usage.output_tokens
            );
        }

        Ok(Proposal {
            iteration: request.iteration,
            command,
            text,
            timestamp: Utc::now(),
            usage: response.usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request<'a>() -> ProposalRequest<'a> {
        ProposalRequest {
            found: &[],
            tried: &[],
            iteration: 1,
            max_iterations: 5,
        }
    }

    fn tool_response(url: &str) -> serde_json::Value {
        json!({
            "id": "msg_01",
            "type": "message",
            "role": "assistant",
            "content": [
                {"type": "text", "text": "Checking a project tracker."},
                {"type": "tool_use", "id": "toolu_01", "name": "check_website_exists",
                 "input": {"url": url}}
            ],
            "stop_reason": "tool_use",
            "usage": {"input_tokens": 120, "output_tokens": 40}
        })
    }

    fn proposer_for(server: &MockServer) -> AnthropicProposer {
        AnthropicProposer::new(Model::Haiku, "test-key")
            .with_api_url(format!("{}/v1/messages", server.uri()))
            .with_backoff(Duration::from_millis(1), Duration::from_millis(4))
    }

    #[test]
    fn test_backoff_doubles_up_to_cap() {
        let mut backoff = INITIAL_BACKOFF;
        let mut waits = Vec::new();
        for _ in 0..MAX_RETRIES {
            waits.push(backoff.as_secs());
            backoff = next_backoff(backoff, MAX_BACKOFF);
        }
        assert_eq!(waits, vec![30, 60, 120, 240, 300]);
    }

    #[tokio::test]
    async fn test_server_error_is_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("overloaded"))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(tool_response("https://b.com/pricing")),
            )
            .expect(1)
            .mount(&server)
            .await;

        let proposal = proposer_for(&server).propose(&request()).await.unwrap();
        assert_eq!(
            proposal.command,
            ProposerCommand::ProposeUrl("https://b.com/pricing".to_string())
        );
    }

    #[tokio::test]
    async fn test_rate_limit_retries_exhausted() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .expect(u64::from(MAX_RETRIES) + 1)
            .mount(&server)
            .await;

        let err = proposer_for(&server)
            .propose(&request())
            .await
            .unwrap_err();
        assert!(matches!(err, ScoutError::ApiLimit(_)));
    }

    #[tokio::test]
    async fn test_server_error_retries_exhausted() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .expect(u64::from(MAX_RETRIES) + 1)
            .mount(&server)
            .await;

        let err = proposer_for(&server)
            .propose(&request())
            .await
            .unwrap_err();
        assert!(matches!(err, ScoutError::Api(_)));
    }

    #[test]
    fn test_proposer_builder() {
        let proposer = AnthropicProposer::new(Model::Opus, "k").with_max_tokens(256);
        assert_eq!(proposer.model(), Model::Opus);
        assert_eq!(proposer.max_tokens, 256);
        assert_eq!(proposer.api_url, ANTHROPIC_API_URL);
    }

    #[tokio::test]
    async fn test_tool_call_round_trip() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "test-key"))
            .and(header("anthropic-version", ANTHROPIC_VERSION))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(tool_response("https://linear.app/pricing")),
            )
            .expect(1)
            .mount(&server)
            .await;

        let proposal = proposer_for(&server).propose(&request()).await.unwrap();

        assert_eq!(
            proposal.command,
            ProposerCommand::ProposeUrl("https://linear.app/pricing".to_string())
        );
        assert_eq!(proposal.text, "Checking a project tracker.");
        assert_eq!(proposal.iteration, 1);
        assert_eq!(proposal.usage.unwrap().input_tokens, 120);
    }

    #[tokio::test]
    async fn test_text_only_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "msg_02",
                "content": [{"type": "text", "text": "Out of ideas."}],
                "usage": null
            })))
            .mount(&server)
            .await;

        let proposal = proposer_for(&server).propose(&request()).await.unwrap();
        assert_eq!(proposal.command, ProposerCommand::NoAction);
        assert!(proposal.usage.is_none());
    }

    #[tokio::test]
    async fn test_rate_limit_honors_retry_after() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "0"))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(tool_response("https://a.com/pricing")),
            )
            .mount(&server)
            .await;

        let proposal = proposer_for(&server).propose(&request()).await.unwrap();
        assert_eq!(
            proposal.command,
            ProposerCommand::ProposeUrl("https://a.com/pricing".to_string())
        );
    }

    #[tokio::test]
    async fn test_client_error_opens_circuit() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad request"))
            .expect(3)
            .mount(&server)
            .await;

        let proposer = proposer_for(&server);
        for _ in 0..3 {
            let err = proposer.propose(&request()).await.unwrap_err();
            assert!(matches!(err, ScoutError::Api(_)));
        }

        // Fourth round never reaches the server
        let err = proposer.propose(&request()).await.unwrap_err();
        assert!(matches!(err, ScoutError::CircuitOpen { .. }));
    }

    #[tokio::test]
    async fn test_exhausted_rate_limit_counts_as_failed_round() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429))
            .expect(u64::from(MAX_RETRIES) + 1)
            .mount(&server)
            .await;

        let proposer = proposer_for(&server)
            .with_circuit_breaker(CircuitBreaker::new(1, Duration::from_secs(60)));

        let err = proposer.propose(&request()).await.unwrap_err();
        assert!(matches!(err, ScoutError::ApiLimit(_)));

        match proposer.propose(&request()).await.unwrap_err() {
            ScoutError::CircuitOpen { retry_in } => {
                assert!(retry_in <= Duration::from_secs(60));
            }
            other => panic!("expected open breaker, got {}", other),
        }
    }

    #[tokio::test]
    async fn test_success_resets_failed_rounds() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(tool_response("https://c.com/pricing")),
            )
            .mount(&server)
            .await;

        let proposer = proposer_for(&server);
        assert!(proposer.propose(&request()).await.is_err());
        assert!(proposer.propose(&request()).await.is_err());
        assert!(proposer.propose(&request()).await.is_ok());
        assert_eq!(proposer.circuit_breaker.failed_rounds(), 0);
    }

    #[tokio::test]
    async fn test_unparseable_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = proposer_for(&server)
            .propose(&request())
            .await
            .unwrap_err();
        assert!(matches!(err, ScoutError::Api(_)));
    }
}
