//! Colored terminal output helpers.
//!
//! All user-facing output goes through these functions so we get
//! consistent styling across every command.

use comfy_table::{ContentArrangement, Table};
use console::style;

use crate::password::Strength;
use crate::vault::CredentialRecord;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Print a green success message: "check_mark {msg}"
pub fn success(msg: &str) {
    println!("{} {}", style("\u{2713}").green().bold(), msg);
}

/// Print a red error message: "x_mark {msg}"
pub fn error(msg: &str) {
    eprintln!("{} {}", style("\u{2717}").red().bold(), msg);
}

/// Print a yellow warning: "warning_sign {msg}"
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("\u{26a0}").yellow().bold(), msg);
}

/// Print a blue info message: "info_sign {msg}"
pub fn info(msg: &str) {
    println!("{} {}", style("\u{2139}").blue().bold(), msg);
}

/// Print a dim tip/hint: "arrow {msg}"
pub fn tip(msg: &str) {
    println!("{} {}", style("\u{2192}").dim(), style(msg).dim());
}

/// Print a table of credentials (never their secrets).
pub fn print_credentials_table(credentials: &[(String, CredentialRecord)]) {
    if credentials.is_empty() {
        info("No credentials found.");
        tip("Run `credvault set <IDENTIFIER>` to add one.");
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Identifier", "Username", "URL", "Category", "Tags", "Modified"]);

    for (identifier, record) in credentials {
        table.add_row(vec![
            identifier.clone(),
            record.identity.clone(),
            record.locator.clone(),
            record.category.to_string(),
            record.tags.join(", "),
            record.modified.format(TIME_FORMAT).to_string(),
        ]);
    }

    println!("{table}");
}

/// Print every field of one credential.  Protected custom fields and
/// history entries are masked.
pub fn print_credential_details(identifier: &str, record: &CredentialRecord) {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);

    let secret = record.secret.as_str().unwrap_or("<binary>");
    let mut rows = vec![
        ("Identifier", identifier.to_string()),
        ("Title", record.title.clone()),
        ("Secret", secret.to_string()),
        ("Username", record.identity.clone()),
        ("URL", record.locator.clone()),
        ("Notes", record.notes.clone()),
        ("Category", record.category.to_string()),
        ("Tags", record.tags.join(", ")),
        ("Created", record.created.format(TIME_FORMAT).to_string()),
        ("Modified", record.modified.format(TIME_FORMAT).to_string()),
        (
            "Expires",
            record
                .expires
                .map(|t| t.format(TIME_FORMAT).to_string())
                .unwrap_or_else(|| "never".into()),
        ),
        ("Previous secrets", record.history.len().to_string()),
    ];
    for field in &record.custom_fields {
        let value = if field.protected {
            "********".to_string()
        } else {
            field.value.as_str().unwrap_or("<binary>").to_string()
        };
        rows.push(("Field", format!("{}: {value}", field.name)));
    }

    for (name, value) in rows {
        table.add_row(vec![name.to_string(), value]);
    }
    println!("{table}");
}

/// Print a strength rating with a color matching its level.
pub fn print_strength(strength: Strength) {
    let label = strength.to_string();
    let styled = match strength {
        Strength::VeryWeak | Strength::Weak => style(label).red().bold(),
        Strength::Medium => style(label).yellow().bold(),
        Strength::Strong | Strength::VeryStrong => style(label).green().bold(),
    };
    println!("Strength: {styled}");
}
