// ABOUTME: SSH key material handling for warrant: keypairs and certificate artifacts.
// ABOUTME: Generates ed25519 keypairs and reads OpenSSH certificate validity windows.

mod cert;
mod error;
mod key;

pub use cert::{
    certificate_alt_path, certificate_pub_path, certificate_window, save_certificate,
    ValidityWindow,
};
pub use error::{Result, SshError};
pub use key::{
    compute_fingerprint, default_key_path, ensure_keypair, key_fingerprint, normalize_key_path,
    public_key_path, read_public_key,
};
