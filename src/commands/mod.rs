//! CLI command handlers.

mod run;
mod status;

pub use run::run_mirror_command;
pub use status::run_status_command;
