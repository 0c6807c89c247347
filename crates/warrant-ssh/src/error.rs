// ABOUTME: Error types for SSH key material operations using thiserror.
// ABOUTME: Provides typed errors for key generation, reading, and artifact writes.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during SSH key material operations.
#[derive(Error, Debug)]
pub enum SshError {
    /// Failed to generate an SSH key.
    #[error("failed to generate SSH key: {0}")]
    GenerateKey(#[source] ssh_key::Error),

    /// Failed to serialize a key.
    #[error("failed to serialize key: {0}")]
    SerializeKey(#[source] ssh_key::Error),

    /// Failed to write a key file to disk.
    #[error("failed to write key to {path}: {source}")]
    WriteKey {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The public key file is missing.
    #[error("public key not found at {path}")]
    MissingPublicKey { path: PathBuf },

    /// Failed to read the public key file.
    #[error("failed to read public key from {path}: {source}")]
    ReadPublicKey {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse the public key file.
    #[error("failed to parse public key from {path}: {source}")]
    ParsePublicKey {
        path: PathBuf,
        #[source]
        source: ssh_key::Error,
    },

    /// Failed to write a certificate artifact to disk.
    #[error("failed to write certificate to {path}: {source}")]
    WriteCertificate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to create a directory.
    #[error("failed to create directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to set file permissions.
    #[error("failed to set permissions on {path}: {source}")]
    SetPermissions {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias using SshError.
pub type Result<T> = std::result::Result<T, SshError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;
    use std::io;

    #[test]
    fn test_missing_public_key_display() {
        let err = SshError::MissingPublicKey {
            path: PathBuf::from("/home/user/.ssh/id_ed25519.pub"),
        };
        let display = format!("{}", err);
        assert!(display.contains("public key not found"));
        assert!(display.contains("id_ed25519.pub"));
    }

    #[test]
    fn test_write_certificate_display() {
        let err = SshError::WriteCertificate {
            path: PathBuf::from("/home/user/.ssh/id_ed25519-cert.pub"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "access denied"),
        };
        let display = format!("{}", err);
        assert!(display.contains("failed to write certificate"));
        assert!(display.contains("id_ed25519-cert.pub"));
    }

    #[test]
    fn test_generate_key_display() {
        let err = SshError::GenerateKey(ssh_key::Error::AlgorithmUnknown);
        let display = format!("{}", err);
        assert!(display.contains("failed to generate SSH key"));
    }

    #[test]
    fn test_error_sources() {
        let err = SshError::WriteKey {
            path: PathBuf::from("/path"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.source().is_some());

        let err = SshError::MissingPublicKey {
            path: PathBuf::from("/path"),
        };
        assert!(err.source().is_none());
    }
}
