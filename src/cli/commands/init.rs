//! `credvault init` — create a new vault.

use crate::cli::output;
use crate::cli::{open_service, prompt_new_password, Cli, PASSWORD_ENV};
use crate::config::StorageBackend;
use crate::errors::{Result, VaultError};

/// Execute the `init` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let service = open_service(cli)?;

    if service.is_initialized() {
        output::tip("Use `credvault set` to add credentials to the existing vault.");
        return Err(VaultError::AlreadyInitialized);
    }

    let password = prompt_new_password(PASSWORD_ENV, "Choose vault password")?;
    service.initialize(&password)?;

    let settings = service.settings();
    output::success(&format!(
        "Vault created ({} backend, {} PBKDF2 iterations)",
        match settings.storage_backend {
            StorageBackend::File => "file",
            StorageBackend::Keyring => "keyring",
        },
        settings.key_iterations
    ));
    output::tip("Add a credential: credvault set <IDENTIFIER>");

    Ok(())
}
