//! `credvault export` — write every credential to an encrypted file.
//!
//! The file is sealed under its own password, independent of the master
//! password, so it can be moved to another machine.

use std::path::Path;

use crate::cli::output;
use crate::cli::{prompt_new_password, unlock_service, Cli, EXPORT_PASSWORD_ENV};
use crate::errors::Result;

/// Execute the `export` command.
pub fn execute(cli: &Cli, output_path: &Path) -> Result<()> {
    let service = unlock_service(cli)?;
    let password = prompt_new_password(EXPORT_PASSWORD_ENV, "Choose export password")?;

    let count = service.export_vault(output_path, &password)?;

    output::success(&format!(
        "Exported {count} credentials to {}",
        output_path.display()
    ));

    Ok(())
}
