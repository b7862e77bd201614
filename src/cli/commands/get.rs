//! `credvault get` — print a single credential.

use crate::cli::output;
use crate::cli::{unlock_service, Cli};
use crate::errors::{Result, VaultError};

/// Execute the `get` command.
pub fn execute(cli: &Cli, identifier: &str, details: bool) -> Result<()> {
    let service = unlock_service(cli)?;

    let record = service.retrieve_credential(identifier)?.ok_or_else(|| {
        VaultError::CommandFailed(format!("credential '{identifier}' not found"))
    })?;

    if details {
        output::print_credential_details(identifier, &record);
    } else {
        // Print the raw secret to stdout so it can be piped.
        let secret = record.secret.as_str().ok_or_else(|| {
            VaultError::CommandFailed(format!("secret of '{identifier}' is not valid UTF-8"))
        })?;
        println!("{secret}");
    }

    Ok(())
}
