//! `credvault rotate-key` — change the vault master password.
//!
//! Verifies the current password, writes new vault metadata under a fresh
//! salt, then re-encrypts every credential with the new key.

use crate::cli::output;
use crate::cli::{open_service, prompt_new_password, prompt_password, Cli, NEW_PASSWORD_ENV};
use crate::errors::{Result, VaultError};

/// Execute the `rotate-key` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let service = open_service(cli)?;
    if !service.is_initialized() {
        return Err(VaultError::NotInitialized);
    }

    output::info("Enter your current vault password.");
    let current = prompt_password()?;

    output::info("Choose your new vault password.");
    let new = prompt_new_password(NEW_PASSWORD_ENV, "Choose new vault password")?;

    let report = service.rotate_master_password(&current, &new)?;

    if !report.is_complete() {
        for identifier in &report.failed {
            output::warning(&format!("'{identifier}' could not be re-encrypted"));
        }
        return Err(VaultError::CommandFailed(format!(
            "password rotated, but {} of {} credentials were not re-encrypted",
            report.failed.len(),
            report.migrated + report.failed.len()
        )));
    }

    output::success(&format!(
        "Password rotated ({} credentials re-encrypted)",
        report.migrated
    ));

    Ok(())
}
