//! `credvault strength` — rate a password without touching the vault.

use std::io::{self, IsTerminal, Read};

use zeroize::Zeroizing;

use crate::cli::output;
use crate::errors::{Result, VaultError};
use crate::password;

/// Execute the `strength` command.
pub fn execute(value: Option<&str>) -> Result<()> {
    let candidate = match value {
        Some(v) => Zeroizing::new(v.to_string()),
        None if !io::stdin().is_terminal() => {
            let mut buf = Zeroizing::new(String::new());
            io::stdin().read_to_string(&mut buf)?;
            Zeroizing::new(buf.trim_end().to_string())
        }
        None => Zeroizing::new(
            dialoguer::Password::new()
                .with_prompt("Password to rate")
                .interact()
                .map_err(|e| VaultError::CommandFailed(format!("password prompt: {e}")))?,
        ),
    };

    output::print_strength(password::evaluate(&candidate));
    Ok(())
}
