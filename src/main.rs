// sanchara-admin - command-line admin console for the Sanchara platform.
// Parses the command, loads configuration, and dispatches to the app.

use std::process::ExitCode;

use clap::Parser;
use tracing::error;

use sanchara_admin::app::App;
use sanchara_admin::cli::Cli;
use sanchara_admin::config::Config;
use sanchara_admin::{Result, logging};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logging::init() {
        eprintln!("{e}");
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "command failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::from_env()?;
    let app = App::new(&config)?;
    app.run(cli.command).await
}
