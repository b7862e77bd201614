//! `credvault delete` — remove a credential from the vault.

use dialoguer::Confirm;

use crate::cli::output;
use crate::cli::{unlock_service, Cli};
use crate::errors::{Result, VaultError};

/// Execute the `delete` command.
pub fn execute(cli: &Cli, identifier: &str, force: bool) -> Result<()> {
    // Unless --force is set, ask for confirmation before deleting.
    if !force {
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete credential '{identifier}'?"))
            .default(false)
            .interact()
            .map_err(|e| VaultError::CommandFailed(format!("confirm prompt: {e}")))?;

        if !confirmed {
            output::info("Cancelled.");
            return Ok(());
        }
    }

    let service = unlock_service(cli)?;
    service.delete_credential(identifier)?;

    output::success(&format!("Deleted credential '{identifier}'"));

    Ok(())
}
