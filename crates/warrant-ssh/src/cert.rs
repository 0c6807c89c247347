// ABOUTME: OpenSSH certificate artifact handling: validity windows and persistence.
// ABOUTME: Parses certificate files and writes issued certificates to derived paths.

use crate::error::{Result, SshError};
use crate::key::append_suffix;
use chrono::{DateTime, Utc};
use ssh_key::Certificate;
use std::path::{Path, PathBuf};

/// The validity window of a certificate artifact, in UTC.
///
/// Invariant: `valid_from <= valid_to`. A window is only produced when both
/// bounds could be read from the artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidityWindow {
    /// Instant the certificate becomes usable.
    pub valid_from: DateTime<Utc>,
    /// Instant the certificate stops being usable.
    pub valid_to: DateTime<Utc>,
}

impl ValidityWindow {
    /// Whether `now` falls inside the window. Both bounds are inclusive.
    pub fn contains(&self, now: DateTime<Utc>) -> bool {
        self.valid_from <= now && now <= self.valid_to
    }
}

/// Get the primary certificate artifact path (`<key>-cert.pub`).
pub fn certificate_pub_path(private_key_path: &Path) -> PathBuf {
    append_suffix(private_key_path, "-cert.pub")
}

/// Get the secondary certificate artifact path (`<key>-cert`).
pub fn certificate_alt_path(private_key_path: &Path) -> PathBuf {
    append_suffix(private_key_path, "-cert")
}

/// Read the validity window from a certificate artifact on disk.
///
/// Returns `None` when the file is absent, is not a parseable OpenSSH
/// certificate, or carries timestamps that cannot be represented. Callers
/// that need to distinguish a missing artifact from a corrupt one check
/// existence themselves.
pub fn certificate_window(cert_path: &Path) -> Option<ValidityWindow> {
    let contents = std::fs::read_to_string(cert_path).ok()?;
    let cert = Certificate::from_openssh(contents.trim()).ok()?;

    let valid_from = DateTime::from_timestamp(i64::try_from(cert.valid_after()).ok()?, 0)?;
    let valid_to = DateTime::from_timestamp(i64::try_from(cert.valid_before()).ok()?, 0)?;

    if valid_from > valid_to {
        return None;
    }

    Some(ValidityWindow {
        valid_from,
        valid_to,
    })
}

/// Persist an issued certificate to both derived artifact paths.
///
/// Writes `cert_text` plus exactly one trailing newline, UTF-8, to
/// `<key>-cert.pub` and `<key>-cert`, overwriting any prior content. Each
/// write goes to a temporary sibling first and is renamed into place, so a
/// failed write never leaves a partially written artifact.
///
/// Returns the primary (`-cert.pub`) path.
///
/// # Errors
/// Returns an error if directory creation or either write fails.
pub fn save_certificate(private_key_path: &Path, cert_text: &str) -> Result<PathBuf> {
    if let Some(parent) = private_key_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| SshError::CreateDirectory {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    let contents = format!("{cert_text}\n");
    let cert_pub = certificate_pub_path(private_key_path);
    let cert_alt = certificate_alt_path(private_key_path);

    write_replacing(&cert_pub, &contents)?;
    write_replacing(&cert_alt, &contents)?;

    Ok(cert_pub)
}

/// Write to a temporary sibling, then rename over the target.
fn write_replacing(path: &Path, contents: &str) -> Result<()> {
    let tmp = append_suffix(path, ".tmp");

    std::fs::write(&tmp, contents.as_bytes()).map_err(|e| SshError::WriteCertificate {
        path: path.to_path_buf(),
        source: e,
    })?;

    std::fs::rename(&tmp, path).map_err(|e| {
        let _ = std::fs::remove_file(&tmp);
        SshError::WriteCertificate {
            path: path.to_path_buf(),
            source: e,
        }
    })
}
