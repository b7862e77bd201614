//! One module per subcommand.  Each exposes an `execute` function.

pub mod delete;
pub mod expired;
pub mod export;
pub mod generate;
pub mod get;
pub mod import_cmd;
pub mod init;
pub mod list;
pub mod rotate;
pub mod search;
pub mod set;
pub mod strength;
