//! `credvault generate` — print a random password.

use crate::cli::{unlock_service, Cli};
use crate::errors::Result;

/// Execute the `generate` command.
pub fn execute(cli: &Cli, length: usize, special: bool, numbers: bool, mixed_case: bool) -> Result<()> {
    let service = unlock_service(cli)?;
    let password = service.generate_password(length, special, numbers, mixed_case)?;
    println!("{}", password.as_str());
    Ok(())
}
