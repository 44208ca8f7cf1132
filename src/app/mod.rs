pub mod cli;
pub mod commands;
pub mod studio;

pub use cli::Cli;
pub use commands::run_cli;
pub use studio::Studio;
