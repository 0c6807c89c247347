// ABOUTME: Entry point for the warrant CLI
// ABOUTME: Certificate status, renewal, and server session commands

mod config;
mod launch;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use config::{ServerEntry, WarrantConfig};
use dialoguer::{theme::ColorfulTheme, Select};
use launch::Session;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use warrant_issue::{
    inspect, ApprovalChannel, BrowserApproval, CertStatus, IssueConfig, Issuer,
    OpenSshKeyMaterial, Outcome, PollPolicy,
};
use warrant_ssh::{certificate_pub_path, default_key_path, key_fingerprint, normalize_key_path};

#[derive(Parser)]
#[command(name = "warrant")]
#[command(about = "SSH certificates from a Pritunl Zero authority", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the current certificate status
    Status,
    /// Request a fresh certificate from the authority
    Renew,
    /// Open an SSH session to a configured server
    Connect {
        /// Server name from the config
        server: String,
    },
    /// Open an SFTP browser to a configured server
    Browse {
        /// Server name from the config
        server: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    warrant_log::init();

    let cli = Cli::parse();
    let Some(config) = WarrantConfig::load_or_init()? else {
        return Ok(());
    };
    if config.servers.is_empty() && cli.command.is_none() {
        bail!("No servers configured; add entries to the config or use a subcommand");
    }

    match cli.command {
        Some(Commands::Status) => show_status(&config),
        Some(Commands::Renew) => renew(&config).await,
        Some(Commands::Connect { server }) => {
            let entry = lookup_server(&config, &server)?.clone();
            ensure_certificate(&config).await?;
            launch::launch(&config, &entry, Session::Ssh)
        }
        Some(Commands::Browse { server }) => {
            let entry = lookup_server(&config, &server)?.clone();
            ensure_certificate(&config).await?;
            launch::launch(&config, &entry, Session::Sftp)
        }
        None => menu(&config).await,
    }
}

fn lookup_server<'a>(config: &'a WarrantConfig, name: &str) -> Result<&'a ServerEntry> {
    config
        .find_server(name)
        .with_context(|| format!("Server '{name}' not found in config"))
}

fn resolve_key_path(config: &WarrantConfig) -> Result<PathBuf> {
    if config.key_path.trim().is_empty() {
        default_key_path().context("Could not determine home directory")
    } else {
        Ok(normalize_key_path(&config.key_path))
    }
}

fn issuer(config: &WarrantConfig) -> Result<Issuer<OpenSshKeyMaterial, BrowserApproval>> {
    let issue = IssueConfig {
        key_path: resolve_key_path(config)?,
        authority: config.authority.clone(),
        poll: PollPolicy::default(),
    };
    Issuer::new(OpenSshKeyMaterial, BrowserApproval, issue)
        .with_context(|| format!("Invalid authority address '{}'", config.authority))
}

fn show_status(config: &WarrantConfig) -> Result<()> {
    let key_path = resolve_key_path(config)?;
    let cert_path = certificate_pub_path(&key_path);

    match key_fingerprint(&key_path) {
        Ok(fingerprint) => println!("Key:         {} ({fingerprint})", key_path.display()),
        Err(err) => {
            debug!(error = %err, "no usable key");
            println!("Key:         {} (not generated yet)", key_path.display());
        }
    }

    match inspect(&OpenSshKeyMaterial, &cert_path, Utc::now()) {
        CertStatus::Absent => println!("Certificate: none"),
        CertStatus::Unreadable => println!("Certificate: unreadable, renewal required"),
        CertStatus::Expired(window) => {
            println!("Certificate: expired at {}", window.valid_to);
        }
        CertStatus::Valid(window) => {
            println!("Certificate: valid until {}", window.valid_to);
        }
    }
    Ok(())
}

/// Runs a full issuance round, opening the login page first.
async fn renew(config: &WarrantConfig) -> Result<()> {
    let issuer = issuer(config)?;

    println!("Opening browser for authority login...");
    BrowserApproval.open(&issuer.login_url());
    print!("Press Enter after you finish login in the browser...");
    io::stdout().flush().ok();
    let mut line = String::new();
    io::stdin().read_line(&mut line).ok();

    run_issuance(issuer).await
}

/// Whether the local certificate needs a fresh issuance round.
fn issuance_required(key_path: &Path) -> bool {
    let cert_path = certificate_pub_path(key_path);
    !matches!(
        inspect(&OpenSshKeyMaterial, &cert_path, Utc::now()),
        CertStatus::Valid(_)
    )
}

/// Makes sure a valid certificate is on disk before launching a session.
///
/// An unusable certificate goes through the same login-then-issue flow as
/// `renew`: the authority wants the browser session authenticated before
/// the approval page is opened.
async fn ensure_certificate(config: &WarrantConfig) -> Result<()> {
    if issuance_required(&resolve_key_path(config)?) {
        return renew(config).await;
    }
    Ok(())
}

async fn run_issuance(issuer: Issuer<OpenSshKeyMaterial, BrowserApproval>) -> Result<()> {
    let cancel = CancellationToken::new();
    let guard = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            guard.cancel();
        }
    });

    match issuer.run(&cancel).await {
        Outcome::AlreadyValid(window) => {
            println!("Certificate already valid until {}", window.valid_to);
            Ok(())
        }
        Outcome::Issued(path) => {
            println!("Certificate saved: {}", path.display());
            Ok(())
        }
        Outcome::Rejected(err) => bail!("Authority rejected the request: {err}"),
        Outcome::TimedOut => bail!("Timed out waiting for approval; try again after logging in"),
        Outcome::Cancelled => {
            warn!("issuance cancelled");
            bail!("Cancelled")
        }
        Outcome::KeyMaterialFailure(err) => Err(err).context("Could not prepare the SSH key"),
        Outcome::PersistenceFailure(err) => Err(err).context("Could not save the certificate"),
    }
}

/// Interactive fallback when no subcommand is given.
async fn menu(config: &WarrantConfig) -> Result<()> {
    loop {
        let mut items: Vec<String> = config
            .servers
            .iter()
            .map(|s| format!("{} ({}@{})", s.name, s.user, s.host))
            .collect();
        items.push("Renew certificate".to_string());
        items.push("Quit".to_string());

        let choice = Select::with_theme(&ColorfulTheme::default())
            .with_prompt("Select a server")
            .items(&items)
            .default(0)
            .interact()?;

        if choice == config.servers.len() {
            renew(config).await?;
            continue;
        }
        if choice == config.servers.len() + 1 {
            return Ok(());
        }

        let server = config.servers[choice].clone();
        let action = Select::with_theme(&ColorfulTheme::default())
            .with_prompt(format!("Session for {}", server.name))
            .items(&["SSH", "SFTP browser", "SSH + SFTP", "Back"])
            .default(0)
            .interact()?;

        match action {
            0 => {
                ensure_certificate(config).await?;
                launch::launch(config, &server, Session::Ssh)?;
            }
            1 => {
                ensure_certificate(config).await?;
                launch::launch(config, &server, Session::Sftp)?;
            }
            2 => {
                ensure_certificate(config).await?;
                launch::launch(config, &server, Session::Sftp)?;
                launch::launch(config, &server, Session::Ssh)?;
            }
            _ => {}
        }
    }
}
