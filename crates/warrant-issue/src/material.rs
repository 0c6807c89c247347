// ABOUTME: Key material contract consumed by the issuance workflow.
// ABOUTME: One production adapter over warrant-ssh and an in-memory fake for tests.

use std::path::{Path, PathBuf};
use warrant_ssh::{SshError, ValidityWindow};

/// The key-material gateway contract the issuance core depends on.
///
/// The core never generates keys or parses certificate formats itself; it
/// goes through this trait so the protocol and lifecycle logic stay testable
/// without touching real key files.
pub trait KeyMaterial {
    /// Ensure a keypair exists at `key_path`. Idempotent: a no-op when both
    /// the private key and its `.pub` counterpart are already present.
    fn ensure_keypair(&self, key_path: &Path) -> Result<(), SshError>;

    /// Read the public key line for the keypair at `key_path`.
    fn read_public_key(&self, key_path: &Path) -> Result<String, SshError>;

    /// Whether a certificate artifact exists at `cert_path`.
    fn artifact_exists(&self, cert_path: &Path) -> bool {
        cert_path.exists()
    }

    /// Read the validity window of the certificate artifact at `cert_path`.
    /// `None` means absent or unparseable; existence is reported separately
    /// by [`KeyMaterial::artifact_exists`].
    fn certificate_window(&self, cert_path: &Path) -> Option<ValidityWindow>;

    /// Persist an issued certificate to both artifact paths derived from
    /// `key_path`, returning the primary one.
    fn save_certificate(&self, key_path: &Path, cert_text: &str) -> Result<PathBuf, SshError>;
}

/// Production adapter backed by the `warrant-ssh` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenSshKeyMaterial;

impl KeyMaterial for OpenSshKeyMaterial {
    fn ensure_keypair(&self, key_path: &Path) -> Result<(), SshError> {
        warrant_ssh::ensure_keypair(key_path)
    }

    fn read_public_key(&self, key_path: &Path) -> Result<String, SshError> {
        warrant_ssh::read_public_key(key_path)
    }

    fn certificate_window(&self, cert_path: &Path) -> Option<ValidityWindow> {
        warrant_ssh::certificate_window(cert_path)
    }

    fn save_certificate(&self, key_path: &Path, cert_text: &str) -> Result<PathBuf, SshError> {
        warrant_ssh::save_certificate(key_path, cert_text)
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use std::io;
    use std::sync::Mutex;

    /// In-memory stand-in for the key material gateway.
    ///
    /// Simulates keypair presence, certificate artifact state, and records
    /// every persisted certificate so tests can assert on write behavior.
    #[derive(Default)]
    pub(crate) struct MemoryKeyMaterial {
        pub(crate) state: Mutex<MemoryState>,
    }

    #[derive(Default)]
    pub(crate) struct MemoryState {
        pub(crate) keypair_exists: bool,
        pub(crate) public_key: String,
        pub(crate) cert_exists: bool,
        pub(crate) window: Option<ValidityWindow>,
        pub(crate) saved: Vec<(PathBuf, String)>,
        pub(crate) fail_ensure: bool,
        pub(crate) fail_save: bool,
    }

    impl MemoryKeyMaterial {
        pub(crate) fn with_state(state: MemoryState) -> Self {
            Self {
                state: Mutex::new(state),
            }
        }

        pub(crate) fn saved(&self) -> Vec<(PathBuf, String)> {
            self.state.lock().unwrap().saved.clone()
        }
    }

    impl KeyMaterial for MemoryKeyMaterial {
        fn ensure_keypair(&self, key_path: &Path) -> Result<(), SshError> {
            let mut state = self.state.lock().unwrap();
            if state.fail_ensure {
                return Err(SshError::WriteKey {
                    path: key_path.to_path_buf(),
                    source: io::Error::new(io::ErrorKind::PermissionDenied, "simulated"),
                });
            }
            state.keypair_exists = true;
            if state.public_key.is_empty() {
                state.public_key = "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAIFAKE test@warrant".into();
            }
            Ok(())
        }

        fn read_public_key(&self, key_path: &Path) -> Result<String, SshError> {
            let state = self.state.lock().unwrap();
            if !state.keypair_exists {
                return Err(SshError::MissingPublicKey {
                    path: key_path.to_path_buf(),
                });
            }
            Ok(state.public_key.clone())
        }

        fn artifact_exists(&self, _cert_path: &Path) -> bool {
            self.state.lock().unwrap().cert_exists
        }

        fn certificate_window(&self, _cert_path: &Path) -> Option<ValidityWindow> {
            self.state.lock().unwrap().window
        }

        fn save_certificate(&self, key_path: &Path, cert_text: &str) -> Result<PathBuf, SshError> {
            let mut state = self.state.lock().unwrap();
            let primary = warrant_ssh::certificate_pub_path(key_path);
            if state.fail_save {
                return Err(SshError::WriteCertificate {
                    path: primary,
                    source: io::Error::new(io::ErrorKind::Other, "simulated"),
                });
            }
            let contents = format!("{cert_text}\n");
            state.saved.push((primary.clone(), contents.clone()));
            state
                .saved
                .push((warrant_ssh::certificate_alt_path(key_path), contents));
            Ok(primary)
        }
    }
}
