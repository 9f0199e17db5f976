//! CLI layer - Command-line interface
//!
//! Argument parsing, output formatting, config handling, the `run` process
//! and the control-socket client used by every other subcommand.

pub mod app;
pub mod args;
pub mod config_cmd;
pub mod ipc;
#[cfg(unix)]
pub mod pid_file;
pub mod presenter;
#[cfg(unix)]
pub mod recorder;
#[cfg(unix)]
pub mod remote;
pub mod signals;

pub use app::{EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE_ERROR};
pub use args::{Cli, Commands, ConfigAction};
pub use presenter::Presenter;
#[cfg(unix)]
pub use recorder::run_recorder;
#[cfg(unix)]
pub use remote::handle_remote_command;
