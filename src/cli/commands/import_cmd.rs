//! `credvault import` — load credentials from an export file.
//!
//! Existing credentials with the same identifier are overwritten.

use std::path::Path;

use crate::cli::output;
use crate::cli::{read_password, unlock_service, Cli, EXPORT_PASSWORD_ENV};
use crate::errors::{Result, VaultError};

/// Execute the `import` command.
pub fn execute(cli: &Cli, source: &Path) -> Result<()> {
    if !source.exists() {
        return Err(VaultError::CommandFailed(format!(
            "import file not found: {}",
            source.display()
        )));
    }

    let service = unlock_service(cli)?;
    let password = read_password(EXPORT_PASSWORD_ENV, "Enter export password")?;

    let report = service.import_vault(source, &password)?;

    if report.skipped > 0 {
        output::warning(&format!("{} credentials skipped", report.skipped));
    }
    output::success(&format!(
        "Imported {} credentials from {}",
        report.imported,
        source.display()
    ));

    Ok(())
}
