// ABOUTME: HTTP client for the identity authority's SSH challenge protocol.
// ABOUTME: Starts challenges, polls for issued certificates, builds approval URLs.

use crate::error::ProtocolError;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Opaque server-issued identifier for one in-flight challenge.
///
/// A token lives inside a single poll loop. Once that loop ends for any
/// reason the token is stale; a new issuance attempt must start a new
/// challenge rather than reuse it.
#[derive(Debug, Clone)]
pub struct ChallengeToken(String);

impl ChallengeToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Certificate blobs returned by the authority.
///
/// The first element is authoritative; later elements are carried but
/// currently unused. Construction guarantees at least one element.
#[derive(Debug, Clone)]
pub struct IssuedCertificate {
    certificates: Vec<String>,
}

impl IssuedCertificate {
    /// The authoritative certificate text (index 0).
    pub fn primary(&self) -> &str {
        &self.certificates[0]
    }

    /// Every blob the authority returned, primary first.
    pub fn all(&self) -> &[String] {
        &self.certificates
    }
}

/// Result of one bounded poll loop.
///
/// Timeout and cancellation are expected outcomes of a human-in-the-loop
/// flow, kept apart from [`ProtocolError`] which marks the challenge itself
/// unusable.
#[derive(Debug)]
pub enum PollOutcome {
    /// The authority issued at least one certificate blob.
    Issued(IssuedCertificate),
    /// The attempt budget ran out with only not-ready responses.
    TimedOut,
    /// The caller cancelled while waiting between attempts.
    Cancelled,
}

/// Bounds for the certificate poll loop.
#[derive(Debug, Clone, Copy)]
pub struct PollPolicy {
    /// Maximum number of status-check requests before giving up.
    pub max_attempts: u32,
    /// Wait between consecutive attempts.
    pub delay: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            delay: Duration::from_secs(3),
        }
    }
}

#[derive(Deserialize)]
struct ChallengeResponse {
    token: Option<String>,
}

#[derive(Deserialize)]
struct CertificatesResponse {
    certificates: Option<Vec<String>>,
}

/// Client for the three-phase challenge protocol.
pub struct ChallengeClient {
    base_url: String,
    http: reqwest::Client,
}

impl ChallengeClient {
    /// Create a client for the authority at `authority_url`.
    ///
    /// The URL is normalized: trailing slashes are stripped, a bare
    /// `host:port` gets `http://`, and anything else without a scheme gets
    /// `https://`.
    ///
    /// # Errors
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(authority_url: &str) -> Result<Self, ProtocolError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            base_url: normalize_authority_url(authority_url),
            http,
        })
    }

    /// The authority root, where the human logs in first.
    pub fn login_url(&self) -> String {
        self.base_url.clone()
    }

    /// The browser URL that lets the human approve the given challenge.
    pub fn approval_url(&self, token: &ChallengeToken) -> String {
        format!(
            "{}/ssh?ssh-token={}",
            self.base_url,
            utf8_percent_encode(token.as_str(), NON_ALPHANUMERIC)
        )
    }

    /// Phase 1: register the public key and obtain a challenge token.
    ///
    /// # Errors
    /// Any non-success status, and a success response without a token, are
    /// terminal protocol errors.
    pub async fn start_challenge(&self, public_key: &str) -> Result<ChallengeToken, ProtocolError> {
        let resp = self
            .http
            .post(format!("{}/ssh/challenge", self.base_url))
            .json(&serde_json::json!({ "public_key": public_key }))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ProtocolError::Status { status, body });
        }

        let body: ChallengeResponse = resp
            .json()
            .await
            .map_err(|_| ProtocolError::Malformed("challenge response was not JSON"))?;

        match body.token {
            Some(token) if !token.is_empty() => {
                tracing::debug!("challenge started");
                Ok(ChallengeToken(token))
            }
            _ => Err(ProtocolError::Malformed("token field missing")),
        }
    }

    /// Phase 3: poll until the authority issues a certificate or the budget
    /// runs out.
    ///
    /// Each status-check response is classified: `205 Reset Content` means
    /// the human has not approved yet (wait and retry), `200 OK` carries the
    /// certificate list, `401`/`404` mean the challenge was rejected or has
    /// expired, and anything else is an unexpected failure. Rejection and
    /// unexpected statuses abort immediately without consuming the remaining
    /// budget.
    ///
    /// # Errors
    /// Terminal protocol failures only; an exhausted budget is
    /// [`PollOutcome::TimedOut`], not an error.
    pub async fn poll_certificate(
        &self,
        token: &ChallengeToken,
        public_key: &str,
        policy: PollPolicy,
        cancel: &CancellationToken,
    ) -> Result<PollOutcome, ProtocolError> {
        let payload = serde_json::json!({
            "public_key": public_key,
            "token": token.as_str(),
        });

        for attempt in 1..=policy.max_attempts {
            let resp = self
                .http
                .put(format!("{}/ssh/challenge", self.base_url))
                .json(&payload)
                .send()
                .await?;

            let status = resp.status();
            match status {
                StatusCode::RESET_CONTENT => {
                    tracing::debug!(attempt, max = policy.max_attempts, "certificate not ready");
                    if attempt == policy.max_attempts {
                        break;
                    }
                    tokio::select! {
                        _ = cancel.cancelled() => return Ok(PollOutcome::Cancelled),
                        _ = tokio::time::sleep(policy.delay) => {}
                    }
                }
                StatusCode::OK => {
                    let body: CertificatesResponse = resp
                        .json()
                        .await
                        .map_err(|_| ProtocolError::Malformed("certificate response was not JSON"))?;

                    let certificates = body.certificates.unwrap_or_default();
                    if certificates.is_empty() {
                        return Err(ProtocolError::Malformed("certificate list empty or missing"));
                    }

                    return Ok(PollOutcome::Issued(IssuedCertificate { certificates }));
                }
                StatusCode::UNAUTHORIZED | StatusCode::NOT_FOUND => {
                    return Err(ProtocolError::Rejected { status });
                }
                _ => {
                    let body = resp.text().await.unwrap_or_default();
                    return Err(ProtocolError::Status { status, body });
                }
            }
        }

        Ok(PollOutcome::TimedOut)
    }
}

/// Normalize an authority URL to a scheme-qualified base with no trailing slash.
fn normalize_authority_url(authority: &str) -> String {
    let url = authority.trim_end_matches('/');

    if url.starts_with("http://") || url.starts_with("https://") {
        return url.to_string();
    }

    // Bare host:port is almost always a local or test deployment
    if url.contains(':') {
        return format!("http://{}", url);
    }

    format!("https://{}", url)
}
