//! `credvault list` — display credentials in a table.

use crate::cli::output;
use crate::cli::{unlock_service, Cli};
use crate::errors::Result;
use crate::vault::{Category, CredentialRecord, VaultService};

/// Execute the `list` command.
pub fn execute(cli: &Cli, category: Option<&str>) -> Result<()> {
    let service = unlock_service(cli)?;

    let identifiers = match category {
        Some(name) => service.filter_by_category(name.parse::<Category>()?)?,
        None => service.list_identifiers()?,
    };
    let rows = load_rows(&service, identifiers)?;

    output::info(&format!("{} credential(s)", rows.len()));
    output::print_credentials_table(&rows);

    Ok(())
}

/// Fetch the records behind `identifiers` for display.
pub(crate) fn load_rows(
    service: &VaultService,
    identifiers: Vec<String>,
) -> Result<Vec<(String, CredentialRecord)>> {
    let mut rows = Vec::with_capacity(identifiers.len());
    for identifier in identifiers {
        match service.retrieve_credential(&identifier) {
            Ok(Some(record)) => rows.push((identifier, record)),
            Ok(None) => {}
            Err(e) => output::warning(&format!("Skipping '{identifier}': {e}")),
        }
    }
    Ok(rows)
}
