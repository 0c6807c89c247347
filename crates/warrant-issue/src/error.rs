// ABOUTME: Error types for the challenge protocol using thiserror.
// ABOUTME: Distinguishes rejection, malformed responses, and transport failures.

use reqwest::StatusCode;
use thiserror::Error;

/// Terminal failures of the challenge protocol.
///
/// Any of these ends the current issuance run. Retrying is only safe with a
/// brand-new challenge; the token involved in the failed run must be
/// discarded. Timeouts are not represented here; an exhausted poll budget
/// is an expected outcome, not an error.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// HTTP transport failed before a status could be classified.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The authority rejected the challenge (unauthorized or unknown token).
    #[error("challenge rejected by authority ({status})")]
    Rejected { status: StatusCode },

    /// The authority returned a status outside the protocol.
    #[error("authority returned unexpected status {status}: {body}")]
    Status { status: StatusCode, body: String },

    /// A success response was missing an expected field.
    #[error("malformed authority response: {0}")]
    Malformed(&'static str),
}
