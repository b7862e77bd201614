use clap::Parser;
use credvault::cli::commands::set::SetOptions;
use credvault::cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

/// Log filter variable; logs go to stderr so piped output stays clean.
const LOG_ENV: &str = "CREDVAULT_LOG";

fn main() {
    init_tracing();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init => credvault::cli::commands::init::execute(&cli),
        Commands::Set {
            ref identifier,
            ref value,
            generate,
            ref title,
            ref username,
            ref url,
            ref notes,
            ref category,
            ref tags,
            expires_in_days,
        } => {
            let opts = SetOptions {
                value: value.as_deref(),
                generate,
                title: title.as_deref(),
                username: username.as_deref(),
                url: url.as_deref(),
                notes: notes.as_deref(),
                category: category.as_deref(),
                tags,
                expires_in_days,
            };
            credvault::cli::commands::set::execute(&cli, identifier, &opts)
        }
        Commands::Get {
            ref identifier,
            details,
        } => credvault::cli::commands::get::execute(&cli, identifier, details),
        Commands::List { ref category } => {
            credvault::cli::commands::list::execute(&cli, category.as_deref())
        }
        Commands::Search { ref query } => credvault::cli::commands::search::execute(&cli, query),
        Commands::Delete {
            ref identifier,
            force,
        } => credvault::cli::commands::delete::execute(&cli, identifier, force),
        Commands::RotateKey => credvault::cli::commands::rotate::execute(&cli),
        Commands::Export { ref output } => credvault::cli::commands::export::execute(&cli, output),
        Commands::Import { ref file } => credvault::cli::commands::import_cmd::execute(&cli, file),
        Commands::Generate {
            length,
            no_special,
            no_numbers,
            no_mixed_case,
        } => credvault::cli::commands::generate::execute(
            &cli,
            length,
            !no_special,
            !no_numbers,
            !no_mixed_case,
        ),
        Commands::Strength { ref password } => {
            credvault::cli::commands::strength::execute(password.as_deref())
        }
        Commands::Expired => credvault::cli::commands::expired::execute(&cli),
    };

    if let Err(e) = result {
        credvault::cli::output::error(&e.to_string());
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}
