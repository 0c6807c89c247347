// ABOUTME: Core SSH certificate issuance workflow against an identity authority.
// ABOUTME: Inspects local certificates and drives the browser-assisted challenge protocol.

mod approval;
mod error;
mod inspect;
mod material;
mod orchestrator;
mod protocol;

pub use approval::{ApprovalChannel, BrowserApproval};
pub use error::ProtocolError;
pub use inspect::{inspect, CertStatus};
pub use material::{KeyMaterial, OpenSshKeyMaterial};
pub use orchestrator::{IssueConfig, Issuer, Outcome};
pub use protocol::{
    ChallengeClient, ChallengeToken, IssuedCertificate, PollOutcome, PollPolicy,
};

pub use warrant_ssh::{SshError, ValidityWindow};
