//! `credvault expired` — list credentials that should be changed.

use crate::cli::commands::list::load_rows;
use crate::cli::output;
use crate::cli::{unlock_service, Cli};
use crate::errors::Result;

/// Execute the `expired` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let service = unlock_service(cli)?;

    let settings = service.settings();
    if !settings.notify_on_password_expiry {
        output::info("Expiry notifications are disabled in credvault.toml.");
        return Ok(());
    }

    let rows = load_rows(&service, service.check_expired_credentials()?)?;
    if rows.is_empty() {
        output::success("No expired credentials.");
        return Ok(());
    }

    output::warning(&format!(
        "{} credential(s) expired or older than {} days",
        rows.len(),
        settings.password_expiry_days
    ));
    output::print_credentials_table(&rows);

    Ok(())
}
