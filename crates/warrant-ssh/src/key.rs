// ABOUTME: SSH keypair generation and public key reading.
// ABOUTME: Handles ed25519 key pair creation, path normalization, and fingerprints.

use crate::error::{Result, SshError};
use ssh_key::{Algorithm, HashAlg, LineEnding, PrivateKey, PublicKey};
use std::path::{Path, PathBuf};

/// Get the default private key path (~/.ssh/id_ed25519).
pub fn default_key_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".ssh").join("id_ed25519"))
}

/// Normalize a user-supplied key path: expand a leading `~` and make it absolute.
pub fn normalize_key_path(input: &str) -> PathBuf {
    let expanded = match input.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|h| h.join(rest))
            .unwrap_or_else(|| PathBuf::from(input)),
        None => PathBuf::from(input),
    };

    if expanded.is_absolute() {
        expanded
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(&expanded))
            .unwrap_or(expanded)
    }
}

/// Append a literal suffix to a path without touching its extension.
///
/// The artifact naming convention is suffix-based (`.pub`, `-cert.pub`,
/// `-cert`), so `Path::with_extension` would mangle key names containing dots.
pub(crate) fn append_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(suffix);
    PathBuf::from(os)
}

/// Get the public key path derived from a private key path (`<key>.pub`).
pub fn public_key_path(private_key_path: &Path) -> PathBuf {
    append_suffix(private_key_path, ".pub")
}

/// Ensure an ed25519 keypair exists at the given private key path.
///
/// No-op if both the private key and its `.pub` counterpart already exist.
/// Otherwise generates a fresh ed25519 keypair, creates the parent directory
/// if needed, writes the private key with 0600 permissions on Unix, and
/// writes the public key alongside.
///
/// # Errors
/// Returns an error if directory creation, key generation, or file writing fails.
pub fn ensure_keypair(private_key_path: &Path) -> Result<()> {
    let pub_path = public_key_path(private_key_path);
    if private_key_path.exists() && pub_path.exists() {
        return Ok(());
    }

    tracing::info!(path = %private_key_path.display(), "generating new SSH keypair");

    if let Some(parent) = private_key_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| SshError::CreateDirectory {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    let private_key = PrivateKey::random(&mut rand::thread_rng(), Algorithm::Ed25519)
        .map_err(SshError::GenerateKey)?;

    let private_key_str = private_key
        .to_openssh(LineEnding::LF)
        .map_err(SshError::SerializeKey)?;

    std::fs::write(private_key_path, private_key_str.as_bytes()).map_err(|e| {
        SshError::WriteKey {
            path: private_key_path.to_path_buf(),
            source: e,
        }
    })?;

    // 0600 = rw------- on the private key
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(private_key_path, std::fs::Permissions::from_mode(0o600))
            .map_err(|e| SshError::SetPermissions {
                path: private_key_path.to_path_buf(),
                source: e,
            })?;
    }

    let public_key_str = private_key
        .public_key()
        .to_openssh()
        .map_err(SshError::SerializeKey)?;

    std::fs::write(&pub_path, public_key_str.as_bytes()).map_err(|e| SshError::WriteKey {
        path: pub_path.clone(),
        source: e,
    })?;

    Ok(())
}

/// Read the public key line for the given private key path.
///
/// Returns the trimmed contents of `<path>.pub`.
///
/// # Errors
/// Returns `SshError::MissingPublicKey` if the `.pub` file does not exist.
pub fn read_public_key(private_key_path: &Path) -> Result<String> {
    let pub_path = public_key_path(private_key_path);

    if !pub_path.exists() {
        return Err(SshError::MissingPublicKey { path: pub_path });
    }

    let contents = std::fs::read_to_string(&pub_path).map_err(|e| SshError::ReadPublicKey {
        path: pub_path,
        source: e,
    })?;

    Ok(contents.trim().to_string())
}

/// Compute the SHA256 fingerprint of a public key (`SHA256:<base64>` form).
pub fn compute_fingerprint(public_key: &PublicKey) -> String {
    public_key.fingerprint(HashAlg::Sha256).to_string()
}

/// Fingerprint of the keypair at the given private key path.
///
/// # Errors
/// Returns an error if the `.pub` file is missing or does not parse.
pub fn key_fingerprint(private_key_path: &Path) -> Result<String> {
    let line = read_public_key(private_key_path)?;
    let public_key =
        PublicKey::from_openssh(&line).map_err(|e| SshError::ParsePublicKey {
            path: public_key_path(private_key_path),
            source: e,
        })?;
    Ok(compute_fingerprint(&public_key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_key_path_under_dot_ssh() {
        if let Some(path) = default_key_path() {
            assert!(path.ends_with(".ssh/id_ed25519"));
        }
    }

    #[test]
    fn test_normalize_absolute_path_unchanged() {
        let normalized = normalize_key_path("/etc/keys/id_ed25519");
        assert_eq!(normalized, PathBuf::from("/etc/keys/id_ed25519"));
    }

    #[test]
    fn test_normalize_tilde_expands_to_home() {
        if let Some(home) = dirs::home_dir() {
            let normalized = normalize_key_path("~/.ssh/id_ed25519");
            assert_eq!(normalized, home.join(".ssh/id_ed25519"));
        }
    }

    #[test]
    fn test_normalize_relative_path_is_absolute() {
        let normalized = normalize_key_path("keys/id_ed25519");
        assert!(normalized.is_absolute());
        assert!(normalized.ends_with("keys/id_ed25519"));
    }

    #[test]
    fn test_public_key_path_appends_suffix() {
        let path = public_key_path(Path::new("/home/user/.ssh/id_ed25519"));
        assert_eq!(path, PathBuf::from("/home/user/.ssh/id_ed25519.pub"));
    }

    #[test]
    fn test_public_key_path_preserves_dots() {
        // Suffix appending must not treat an existing dot as an extension.
        let path = public_key_path(Path::new("/keys/server.example.com"));
        assert_eq!(path, PathBuf::from("/keys/server.example.com.pub"));
    }

    #[test]
    fn test_ensure_keypair_creates_both_files() {
        let temp_dir = TempDir::new().expect("should create temp dir");
        let key_path = temp_dir.path().join("new_key");

        ensure_keypair(&key_path).expect("should generate keypair");

        assert!(key_path.exists(), "private key should exist");
        assert!(
            public_key_path(&key_path).exists(),
            "public key should exist"
        );
    }

    #[test]
    fn test_ensure_keypair_creates_parent_directory() {
        let temp_dir = TempDir::new().expect("should create temp dir");
        let key_path = temp_dir.path().join("nested").join("dir").join("key");

        ensure_keypair(&key_path).expect("should generate keypair");
        assert!(key_path.exists());
    }

    #[test]
    fn test_ensure_keypair_is_idempotent() {
        let temp_dir = TempDir::new().expect("should create temp dir");
        let key_path = temp_dir.path().join("stable_key");

        ensure_keypair(&key_path).expect("should generate keypair");
        let first = std::fs::read(&key_path).expect("should read private key");

        ensure_keypair(&key_path).expect("second call should succeed");
        let second = std::fs::read(&key_path).expect("should read private key");

        assert_eq!(first, second, "existing keypair must not be regenerated");
    }

    #[cfg(unix)]
    #[test]
    fn test_private_key_has_restrictive_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().expect("should create temp dir");
        let key_path = temp_dir.path().join("secure_key");

        ensure_keypair(&key_path).expect("should generate keypair");

        let metadata = std::fs::metadata(&key_path).expect("should read metadata");
        let mode = metadata.permissions().mode() & 0o777;
        assert_eq!(mode, 0o600, "private key should have 0600 permissions");
    }

    #[test]
    fn test_read_public_key_returns_trimmed_line() {
        let temp_dir = TempDir::new().expect("should create temp dir");
        let key_path = temp_dir.path().join("read_key");

        ensure_keypair(&key_path).expect("should generate keypair");
        let pubkey = read_public_key(&key_path).expect("should read public key");

        assert!(pubkey.starts_with("ssh-ed25519 "));
        assert_eq!(pubkey, pubkey.trim());
    }

    #[test]
    fn test_read_public_key_missing_file() {
        let temp_dir = TempDir::new().expect("should create temp dir");
        let key_path = temp_dir.path().join("absent_key");

        let result = read_public_key(&key_path);
        assert!(matches!(
            result,
            Err(SshError::MissingPublicKey { .. })
        ));
    }

    #[test]
    fn test_fingerprint_format() {
        let key = PrivateKey::random(&mut rand::thread_rng(), Algorithm::Ed25519)
            .expect("should generate key");
        let fp = compute_fingerprint(key.public_key());

        assert!(fp.starts_with("SHA256:"), "fingerprint should be SHA256 form");
        assert!(fp.len() > "SHA256:".len());
    }

    #[test]
    fn test_key_fingerprint_from_path() {
        let temp_dir = TempDir::new().expect("should create temp dir");
        let key_path = temp_dir.path().join("fp_key");

        ensure_keypair(&key_path).expect("should generate keypair");
        let fp = key_fingerprint(&key_path).expect("should fingerprint");
        assert!(fp.starts_with("SHA256:"));
    }

    #[test]
    fn test_key_fingerprint_rejects_garbage_pub_file() {
        let temp_dir = TempDir::new().expect("should create temp dir");
        let key_path = temp_dir.path().join("bad_key");
        std::fs::write(public_key_path(&key_path), "not a public key").expect("should write");

        let result = key_fingerprint(&key_path);
        assert!(matches!(result, Err(SshError::ParsePublicKey { .. })));
    }

    #[test]
    fn test_fingerprint_deterministic() {
        let key = PrivateKey::random(&mut rand::thread_rng(), Algorithm::Ed25519)
            .expect("should generate key");

        let fp1 = compute_fingerprint(key.public_key());
        let fp2 = compute_fingerprint(key.public_key());
        assert_eq!(fp1, fp2);
    }
}
