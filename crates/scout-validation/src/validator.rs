//! URL validator
//!
//! A candidate passes when a GET (redirects followed) answers below 400, the
//! final host and port stay as written in the request, and the URL is not
//! already found.
//! Every probe lands in the tried list, whatever the outcome.

use reqwest::header::LOCATION;
use scout_core::config::HttpConfig;
use scout_core::{normalize_url, Result, ScoutError, Session};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Probe settings
#[derive(Debug, Clone)]
pub struct ValidatorConfig {
    /// Per-request timeout, applied to every redirect hop
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self::from(&HttpConfig::default())
    }
}

impl From<&HttpConfig> for ValidatorConfig {
    fn from(http: &HttpConfig) -> Self {
        Self {
            timeout: Duration::from_secs(http.timeout_secs),
            user_agent: http.user_agent.clone(),
        }
    }
}

/// Outcome of validating one candidate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    /// Added to the found list
    Accepted,
    /// Already in the found list
    Duplicate,
    /// Redirects ended on another host
    CrossDomain { final_host: String },
    /// Final response status was 400 or above
    HttpStatus(u16),
    /// Timeout, DNS failure, refused connection and the like
    Network(String),
    /// Could not be parsed or requested as a URL
    InvalidUrl(String),
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted)
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Accepted => write!(f, "accepted"),
            Self::Duplicate => write!(f, "duplicate ignored"),
            Self::CrossDomain { final_host } => {
                write!(f, "redirected to different domain: {}", final_host)
            }
            Self::HttpStatus(code) => write!(f, "HTTP status {}", code),
            Self::Network(e) => write!(f, "network error: {}", e),
            Self::InvalidUrl(e) => write!(f, "invalid URL: {}", e),
        }
    }
}

/// Redirect hops followed before giving up
const MAX_REDIRECTS: usize = 10;

/// Host plus any non-default port, as the url crate normalizes it
fn authority(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    }
}

/// Host and port exactly as written in `url` (userinfo dropped, lowercased).
///
/// `http://x.com:80/p` gives `x.com:80`, where [`authority`] would give
/// `x.com`. `None` for a relative reference with no authority part.
fn written_authority(url: &str) -> Option<String> {
    let rest = match url.split_once("://") {
        Some((_, rest)) => rest,
        None => url.strip_prefix("//")?,
    };
    let end = rest
        .find(|c| matches!(c, '/' | '?' | '#'))
        .unwrap_or(rest.len());
    let netloc = &rest[..end];
    let host_port = netloc.rsplit_once('@').map_or(netloc, |(_, h)| h);
    Some(host_port.to_ascii_lowercase())
}

/// HTTP validator for candidate URLs
pub struct UrlValidator {
    client: reqwest::Client,
}

impl UrlValidator {
    /// Build a validator with its own HTTP client
    pub fn new(config: ValidatorConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| ScoutError::Http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// Validate `url` and record the outcome in `session`.
    ///
    /// Never fails: every problem becomes a rejecting [`Verdict`].
    pub async fn validate(&self, url: &str, session: &mut Session) -> Verdict {
        tracing::info!("Checking url: {}", url);

        let normalized = normalize_url(url);
        session.record_tried(normalized.clone());

        let verdict = self.check(url, &normalized, session).await;
        if verdict.is_accepted() {
            tracing::info!("Found: {}", normalized);
        } else {
            tracing::info!("Rejected {}: {}", normalized, verdict);
        }
        verdict
    }

    async fn check(&self, url: &str, normalized: &str, session: &mut Session) -> Verdict {
        let requested = match Url::parse(url) {
            Ok(parsed) => parsed,
            Err(e) => return Verdict::InvalidUrl(e.to_string()),
        };
        let requested_site = written_authority(url).unwrap_or_else(|| authority(&requested));

        // Redirects are followed here so each hop's Location text is visible
        let mut current = requested;
        let mut site = requested_site.clone();
        let mut hops = 0;

        let response = loop {
            let response = match self.client.get(current.clone()).send().await {
                Ok(response) => response,
                Err(e) if e.is_builder() => return Verdict::InvalidUrl(e.to_string()),
                Err(e) => return Verdict::Network(e.to_string()),
            };

            if !response.status().is_redirection() {
                break response;
            }
            let location = response
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let Some(location) = location else {
                break response;
            };

            if hops == MAX_REDIRECTS {
                return Verdict::Network(format!("more than {} redirects", MAX_REDIRECTS));
            }
            hops += 1;

            current = match current.join(&location) {
                Ok(next) => next,
                Err(e) => {
                    return Verdict::Network(format!("bad redirect to {:?}: {}", location, e))
                }
            };
            if let Some(next_site) = written_authority(&location) {
                site = next_site;
            }
            tracing::debug!("{} redirected to {}", url, current);
        };

        let status = response.status();
        tracing::debug!("{} answered {} from {}", url, status, current);

        if status.as_u16() >= 400 {
            return Verdict::HttpStatus(status.as_u16());
        }

        if site != requested_site {
            return Verdict::CrossDomain { final_host: site };
        }

        if !session.record_found(normalized) {
            return Verdict::Duplicate;
        }

        Verdict::Accepted
    }
}
