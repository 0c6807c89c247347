// ABOUTME: Issuance orchestrator: inspect, challenge, approve, poll, persist.
// ABOUTME: Maps every way a run can end to a typed Outcome for the caller.

use crate::approval::ApprovalChannel;
use crate::error::ProtocolError;
use crate::inspect::{inspect, CertStatus};
use crate::material::KeyMaterial;
use crate::protocol::{ChallengeClient, PollOutcome, PollPolicy};
use chrono::Utc;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use warrant_ssh::{SshError, ValidityWindow};

/// Configuration for one issuance workflow instance.
#[derive(Debug, Clone)]
pub struct IssueConfig {
    /// Normalized absolute path to the private key. Artifact paths are
    /// derived from it by fixed suffixing.
    pub key_path: PathBuf,
    /// Identity authority base address.
    pub authority: String,
    /// Poll loop bounds.
    pub poll: PollPolicy,
}

/// How one issuance run ended.
#[derive(Debug)]
pub enum Outcome {
    /// The existing certificate artifact is still usable; no network request
    /// was made.
    AlreadyValid(ValidityWindow),
    /// A fresh certificate was issued and persisted at the given path.
    Issued(PathBuf),
    /// The challenge failed terminally; retry requires a brand-new run.
    Rejected(ProtocolError),
    /// The poll budget ran out before the human approved.
    TimedOut,
    /// The caller cancelled mid-poll.
    Cancelled,
    /// Keypair generation or public key reading failed; no network attempted
    /// after the failure.
    KeyMaterialFailure(SshError),
    /// A certificate was issued but could not be written; it is lost and
    /// must be re-issued.
    PersistenceFailure(SshError),
}

/// Drives the issuance workflow end to end.
///
/// Every run reads key and certificate state fresh from the gateway; nothing
/// is cached across runs, and the challenge token never escapes a single
/// [`Issuer::run`] call.
pub struct Issuer<M, A> {
    material: M,
    approval: A,
    client: ChallengeClient,
    config: IssueConfig,
}

impl<M: KeyMaterial, A: ApprovalChannel> Issuer<M, A> {
    /// Create an issuer for the given key location and authority.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(material: M, approval: A, config: IssueConfig) -> Result<Self, ProtocolError> {
        let client = ChallengeClient::new(&config.authority)?;
        Ok(Self {
            material,
            approval,
            client,
            config,
        })
    }

    /// The authority's login page, for callers that want to put the human in
    /// front of a browser session before approval starts.
    pub fn login_url(&self) -> String {
        self.client.login_url()
    }

    /// Run the workflow once: ensure keypair, inspect, and only if the local
    /// certificate is unusable, drive the challenge protocol and persist the
    /// result.
    pub async fn run(&self, cancel: &CancellationToken) -> Outcome {
        if let Err(e) = self.material.ensure_keypair(&self.config.key_path) {
            return Outcome::KeyMaterialFailure(e);
        }

        let cert_path = warrant_ssh::certificate_pub_path(&self.config.key_path);
        match inspect(&self.material, &cert_path, Utc::now()) {
            CertStatus::Valid(window) => {
                tracing::info!(
                    valid_to = %window.valid_to,
                    "certificate still valid, skipping issuance"
                );
                return Outcome::AlreadyValid(window);
            }
            status => {
                tracing::info!(?status, "certificate unusable, requesting a fresh one");
            }
        }

        let public_key = match self.material.read_public_key(&self.config.key_path) {
            Ok(key) => key,
            Err(e) => return Outcome::KeyMaterialFailure(e),
        };

        let token = match self.client.start_challenge(&public_key).await {
            Ok(token) => token,
            Err(e) => return Outcome::Rejected(e),
        };

        // Fire-and-forget: polling starts before the human has approved, and
        // the not-ready handling below absorbs that gap.
        self.approval.open(&self.client.approval_url(&token));

        match self
            .client
            .poll_certificate(&token, &public_key, self.config.poll, cancel)
            .await
        {
            Ok(PollOutcome::Issued(cert)) => {
                match self
                    .material
                    .save_certificate(&self.config.key_path, cert.primary())
                {
                    Ok(path) => {
                        tracing::info!(path = %path.display(), "certificate saved");
                        Outcome::Issued(path)
                    }
                    Err(e) => Outcome::PersistenceFailure(e),
                }
            }
            Ok(PollOutcome::TimedOut) => Outcome::TimedOut,
            Ok(PollOutcome::Cancelled) => Outcome::Cancelled,
            Err(e) => Outcome::Rejected(e),
        }
    }
}
