//! bugsafe CLI library.
//!
//! The `bugsafe` binary is a thin clap front end over these modules; they
//! are exposed so command behavior can be tested without spawning processes.

pub mod capture;
pub mod commands;
pub mod error;
pub mod exit_codes;
pub mod logging;

pub use error::CliError;
pub use exit_codes::ExitCode;
