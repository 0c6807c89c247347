// ABOUTME: Session launchers for SSH and SFTP targets
// ABOUTME: Expands {user}/{host} templates and spawns the configured commands

use crate::config::{ServerEntry, WarrantConfig};
use anyhow::{Context, Result};
use std::process::{Command, Stdio};
use tracing::info;

/// Kind of session to open against a server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Session {
    Ssh,
    Sftp,
}

/// Expands the `{user}` and `{host}` placeholders in an argument template
/// and splits the result on whitespace.
pub fn expand_args(template: &str, server: &ServerEntry) -> Vec<String> {
    template
        .replace("{user}", &server.user)
        .replace("{host}", &server.host)
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Launches a session to the given server.
///
/// SSH sessions inherit the terminal and block until the session ends.
/// SFTP sessions are spawned detached so the menu stays usable.
///
/// # Errors
///
/// Returns an error if the configured command cannot be spawned.
pub fn launch(config: &WarrantConfig, server: &ServerEntry, session: Session) -> Result<()> {
    let (command, template) = match session {
        Session::Ssh => (&config.ssh_command, &config.ssh_args),
        Session::Sftp => (&config.sftp_command, &config.sftp_args),
    };
    let args = expand_args(template, server);
    info!(command = %command, server = %server.name, "launching session");

    match session {
        Session::Ssh => {
            let status = Command::new(command)
                .args(&args)
                .status()
                .with_context(|| format!("Failed to launch {command}"))?;
            if !status.success() {
                info!(code = ?status.code(), "ssh session exited with non-zero status");
            }
        }
        Session::Sftp => {
            Command::new(command)
                .args(&args)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .spawn()
                .with_context(|| format!("Failed to launch {command}"))?;
        }
    }
    Ok(())
}
