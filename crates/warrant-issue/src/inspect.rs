// ABOUTME: Certificate lifecycle classification from artifact state and a clock.
// ABOUTME: Pure given its inputs; recomputed on every check, never cached.

use crate::material::KeyMaterial;
use chrono::{DateTime, Utc};
use std::path::Path;
use warrant_ssh::ValidityWindow;

/// Lifecycle state of the local certificate artifact.
///
/// Derived on every check from the artifact on disk and the current instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CertStatus {
    /// No certificate artifact exists.
    Absent,
    /// An artifact exists but no validity window could be read from it.
    Unreadable,
    /// The current instant falls outside the validity window.
    Expired(ValidityWindow),
    /// The current instant falls inside the validity window (inclusive bounds).
    Valid(ValidityWindow),
}

/// Classify the certificate artifact at `cert_path` against `now`.
///
/// All comparisons happen in UTC; the window is closed on both ends, so
/// `now == valid_from` and `now == valid_to` both count as valid.
pub fn inspect<M: KeyMaterial + ?Sized>(
    material: &M,
    cert_path: &Path,
    now: DateTime<Utc>,
) -> CertStatus {
    if !material.artifact_exists(cert_path) {
        return CertStatus::Absent;
    }

    match material.certificate_window(cert_path) {
        None => CertStatus::Unreadable,
        Some(window) if window.contains(now) => CertStatus::Valid(window),
        Some(window) => CertStatus::Expired(window),
    }
}
