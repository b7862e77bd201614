//! `credvault search` — find credentials by text.

use crate::cli::commands::list::load_rows;
use crate::cli::output;
use crate::cli::{unlock_service, Cli};
use crate::errors::Result;

/// Execute the `search` command.
pub fn execute(cli: &Cli, query: &str) -> Result<()> {
    let service = unlock_service(cli)?;

    let matches = service.search_credentials(query)?;
    let rows = load_rows(&service, matches)?;

    output::info(&format!("{} match(es) for '{query}'", rows.len()));
    output::print_credentials_table(&rows);

    Ok(())
}
