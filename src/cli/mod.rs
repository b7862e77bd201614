//! CLI module — Clap argument parser, output helpers, and command implementations.

pub mod commands;
pub mod output;

use std::path::PathBuf;

use clap::Parser;
use zeroize::Zeroizing;

use crate::errors::{Result, VaultError};
use crate::vault::VaultService;

/// Minimum length for a new master or export password.
const MIN_PASSWORD_LEN: usize = 8;

/// Master password for unlocking the vault.
pub const PASSWORD_ENV: &str = "CREDVAULT_PASSWORD";

/// New master password for `rotate-key`.
pub const NEW_PASSWORD_ENV: &str = "CREDVAULT_NEW_PASSWORD";

/// Password protecting export files.
pub const EXPORT_PASSWORD_ENV: &str = "CREDVAULT_EXPORT_PASSWORD";

/// CredVault CLI: encrypted credential vault.
#[derive(Parser)]
#[command(name = "credvault", about = "Encrypted credential vault", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Base directory holding credvault.toml and the vault (default: current dir)
    #[arg(short = 'C', long, default_value = ".", global = true)]
    pub dir: String,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Create a new vault
    Init,

    /// Store a credential (add or update)
    Set {
        /// Credential identifier (e.g. github)
        identifier: String,
        /// Secret value (omit for stdin or interactive prompt)
        value: Option<String>,
        /// Generate a random secret instead of reading one
        #[arg(short, long, conflicts_with = "value")]
        generate: bool,
        /// Display title
        #[arg(long)]
        title: Option<String>,
        /// Account or user name
        #[arg(short, long)]
        username: Option<String>,
        /// URL or resource the credential belongs to
        #[arg(long)]
        url: Option<String>,
        /// Free-form notes
        #[arg(long)]
        notes: Option<String>,
        /// Category (general, finance, work, personal, social, entertainment, other)
        #[arg(short, long)]
        category: Option<String>,
        /// Tag (repeatable)
        #[arg(short, long = "tag")]
        tags: Vec<String>,
        /// Expire the credential after this many days
        #[arg(long)]
        expires_in_days: Option<u32>,
    },

    /// Print a credential's secret
    Get {
        /// Credential identifier
        identifier: String,
        /// Show all fields instead of only the secret
        #[arg(short, long)]
        details: bool,
    },

    /// List credentials
    List {
        /// Only show this category
        #[arg(short, long)]
        category: Option<String>,
    },

    /// Search identifiers, titles, usernames, URLs and tags
    Search {
        /// Case-insensitive search text
        query: String,
    },

    /// Delete a credential
    Delete {
        /// Credential identifier
        identifier: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Change the vault's master password
    RotateKey,

    /// Export all credentials to an encrypted file
    Export {
        /// Output file path
        output: PathBuf,
    },

    /// Import credentials from an encrypted export file
    Import {
        /// Path to the export file
        file: PathBuf,
    },

    /// Generate a random password
    Generate {
        /// Password length (raised to the configured minimum)
        #[arg(short, long, default_value = "16")]
        length: usize,
        /// Leave out symbols
        #[arg(long)]
        no_special: bool,
        /// Leave out digits
        #[arg(long)]
        no_numbers: bool,
        /// Leave out upper-case letters
        #[arg(long)]
        no_mixed_case: bool,
    },

    /// Rate a password's strength
    Strength {
        /// Password to rate (omit for stdin or interactive prompt)
        password: Option<String>,
    },

    /// List credentials that are due for a change
    Expired,
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Resolve `--dir` against the working directory.
pub fn base_dir(cli: &Cli) -> Result<PathBuf> {
    Ok(std::env::current_dir()?.join(&cli.dir))
}

/// Open the vault configured for `--dir` without unlocking it.
pub fn open_service(cli: &Cli) -> Result<VaultService> {
    VaultService::open(&base_dir(cli)?)
}

/// Open and unlock the vault, asking for the master password.
pub fn unlock_service(cli: &Cli) -> Result<VaultService> {
    let service = open_service(cli)?;
    if !service.is_initialized() {
        output::tip("Run `credvault init` to create a vault.");
        return Err(VaultError::NotInitialized);
    }

    let password = prompt_password()?;
    service.unlock(&password)?;
    Ok(service)
}

/// Get the vault password, trying in order:
/// 1. `CREDVAULT_PASSWORD` env var (CI/CD)
/// 2. Interactive prompt
///
/// Returns `Zeroizing<String>` so the password is wiped from memory on drop.
pub fn prompt_password() -> Result<Zeroizing<String>> {
    read_password(PASSWORD_ENV, "Enter vault password")
}

/// Prompt for a new password with confirmation.
///
/// Also respects `env_var` for scripted/CI usage.
/// Enforces a minimum password length.
pub fn prompt_new_password(env_var: &str, prompt: &str) -> Result<Zeroizing<String>> {
    if let Some(pw) = password_from_env(env_var) {
        if pw.len() < MIN_PASSWORD_LEN {
            return Err(VaultError::CommandFailed(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        return Ok(pw);
    }

    loop {
        let password = dialoguer::Password::new()
            .with_prompt(prompt)
            .with_confirmation("Confirm password", "Passwords do not match, try again")
            .interact()
            .map_err(|e| VaultError::CommandFailed(format!("password prompt: {e}")))?;
        let password = Zeroizing::new(password);

        if password.len() < MIN_PASSWORD_LEN {
            output::warning(&format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters. Try again."
            ));
            continue;
        }

        return Ok(password);
    }
}

/// Read a password from `env_var`, falling back to a hidden prompt.
pub fn read_password(env_var: &str, prompt: &str) -> Result<Zeroizing<String>> {
    if let Some(pw) = password_from_env(env_var) {
        return Ok(pw);
    }

    let pw = dialoguer::Password::new()
        .with_prompt(prompt)
        .interact()
        .map_err(|e| VaultError::CommandFailed(format!("password prompt: {e}")))?;
    Ok(Zeroizing::new(pw))
}

fn password_from_env(env_var: &str) -> Option<Zeroizing<String>> {
    std::env::var(env_var)
        .ok()
        .filter(|pw| !pw.is_empty())
        .map(Zeroizing::new)
}
