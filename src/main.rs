//! Studio recorder CLI entry point

use std::process::ExitCode;

use clap::Parser;

use studio_recorder::cli::{
    app::{cli_config, init_tracing, load_merged_config, resolve_run_options},
    args::{Cli, Commands},
    config_cmd::handle_config_command,
    presenter::Presenter,
    EXIT_ERROR, EXIT_USAGE_ERROR,
};
#[cfg(unix)]
use studio_recorder::cli::{handle_remote_command, remote::RemoteError, run_recorder};
use studio_recorder::infrastructure::XdgConfigStore;

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    let presenter = Presenter::new();

    match cli.command {
        Commands::Config { action } => {
            let store = XdgConfigStore::new();
            if let Err(e) = handle_config_command(action, &store, &presenter).await {
                presenter.error(&e.to_string());
                return ExitCode::from(EXIT_ERROR);
            }
            ExitCode::SUCCESS
        }
        Commands::Run(args) => {
            let config = load_merged_config(cli_config(&args)).await;
            let options = match resolve_run_options(&config) {
                Ok(options) => options,
                Err(e) => {
                    presenter.error(&e);
                    return ExitCode::from(EXIT_USAGE_ERROR);
                }
            };
            run(options, &presenter).await
        }
        command => remote(&command, &presenter).await,
    }
}

#[cfg(unix)]
async fn run(options: studio_recorder::cli::app::RunOptions, _presenter: &Presenter) -> ExitCode {
    run_recorder(options).await
}

#[cfg(unix)]
async fn remote(command: &Commands, presenter: &Presenter) -> ExitCode {
    match handle_remote_command(command, presenter).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e @ RemoteError::Usage(_)) => {
            presenter.error(&e.to_string());
            ExitCode::from(EXIT_USAGE_ERROR)
        }
        Err(e) => {
            presenter.error(&e.to_string());
            ExitCode::from(EXIT_ERROR)
        }
    }
}

#[cfg(not(unix))]
async fn run(_options: studio_recorder::cli::app::RunOptions, presenter: &Presenter) -> ExitCode {
    presenter.error("The recorder needs an X11 session and only runs on Unix");
    ExitCode::from(EXIT_ERROR)
}

#[cfg(not(unix))]
async fn remote(_command: &Commands, presenter: &Presenter) -> ExitCode {
    presenter.error("Remote control needs a Unix socket and only runs on Unix");
    ExitCode::from(EXIT_ERROR)
}
