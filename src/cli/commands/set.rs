//! `credvault set` — add or update a credential.

use std::io::{self, IsTerminal, Read};

use zeroize::Zeroizing;

use crate::cli::output;
use crate::cli::{unlock_service, Cli};
use crate::crypto::SecureBuffer;
use crate::errors::{Result, VaultError};
use crate::password::Strength;
use crate::vault::record;
use crate::vault::{Category, CredentialRecord, VaultService};

/// Field values given on the command line.  `None` keeps the current
/// value of an existing credential.
pub struct SetOptions<'a> {
    pub value: Option<&'a str>,
    pub generate: bool,
    pub title: Option<&'a str>,
    pub username: Option<&'a str>,
    pub url: Option<&'a str>,
    pub notes: Option<&'a str>,
    pub category: Option<&'a str>,
    pub tags: &'a [String],
    pub expires_in_days: Option<u32>,
}

/// Execute the `set` command.
pub fn execute(cli: &Cli, identifier: &str, opts: &SetOptions<'_>) -> Result<()> {
    // Parse before prompting so typos fail fast.
    let category = opts.category.map(str::parse::<Category>).transpose()?;

    let service = unlock_service(cli)?;
    let secret = read_secret(&service, identifier, opts)?;
    if secret.is_empty() {
        return Err(VaultError::CommandFailed("secret must not be empty".into()));
    }
    let weak = secret
        .as_str()
        .is_some_and(|s| service.evaluate_password_strength(s) < Strength::Medium);

    let existing = service.retrieve_credential(identifier)?;
    let existed = existing.is_some();
    let mut record = existing.unwrap_or_else(|| CredentialRecord::new(SecureBuffer::new()));

    record.secret = secret;
    if let Some(title) = opts.title {
        record.title = title.to_string();
    }
    if let Some(username) = opts.username {
        record.identity = username.to_string();
    }
    if let Some(url) = opts.url {
        record.locator = url.to_string();
    }
    if let Some(notes) = opts.notes {
        record.notes = notes.to_string();
    }
    if let Some(category) = category {
        record.category = category;
    }
    if !opts.tags.is_empty() {
        record.tags = opts.tags.to_vec();
    }
    if let Some(days) = opts.expires_in_days {
        record.expires = Some(record::now() + chrono::Duration::days(i64::from(days)));
    }

    service.store_credential(identifier, record)?;

    let verb = if existed { "updated" } else { "added" };
    output::success(&format!("Credential '{identifier}' {verb}"));
    if weak {
        output::warning("This secret is weak. Consider `credvault set --generate`.");
    }

    Ok(())
}

/// Determine the secret from one of four sources.
fn read_secret(service: &VaultService, identifier: &str, opts: &SetOptions<'_>) -> Result<SecureBuffer> {
    if let Some(value) = opts.value {
        // Source 1: Inline value on the command line.
        output::warning("Value provided on command line; it may appear in shell history.");
        return Ok(SecureBuffer::from(value));
    }

    if opts.generate {
        // Source 2: Freshly generated password.
        let generated = service.generate_password(0, true, true, true)?;
        output::info(&format!("Generated a {}-character password.", generated.len()));
        return Ok(SecureBuffer::from(generated.as_str()));
    }

    if !io::stdin().is_terminal() {
        // Source 3: Piped input (stdin is not a terminal).
        let mut buf = Zeroizing::new(String::new());
        io::stdin().read_to_string(&mut buf)?;
        return Ok(SecureBuffer::from(buf.trim_end()));
    }

    // Source 4: Interactive secure prompt (default).
    let value = dialoguer::Password::new()
        .with_prompt(format!("Enter secret for {identifier}"))
        .interact()
        .map_err(|e| VaultError::CommandFailed(format!("input prompt: {e}")))?;
    Ok(SecureBuffer::from(value))
}
