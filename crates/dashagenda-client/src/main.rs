//! dashagenda CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use tracing::Level;

use dashagenda_client::cli::{Cli, Command, ConfigAction};
use dashagenda_client::commands;
use dashagenda_client::config::ClientConfig;
use dashagenda_client::error::ClientResult;
use dashagenda_client::socket::SocketClient;
use dashagenda_core::tracing::{TracingConfig, TracingOutputFormat, init_tracing};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let tracing_config = if cli.debug {
        TracingConfig::cli_debug()
    } else if cli.is_server() {
        TracingConfig::daemon()
    } else {
        TracingConfig::default()
            .with_level(Level::WARN)
            .with_format(TracingOutputFormat::Compact)
    };
    if let Err(e) = init_tracing(tracing_config) {
        eprintln!("warning: {}", e);
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> ClientResult<()> {
    let config = match cli.config {
        Some(ref path) => ClientConfig::load_from(path)?,
        None => ClientConfig::load()?,
    };

    let client = || {
        SocketClient::new(
            config.socket_path(cli.socket_path.as_deref()),
            config.timeout(cli.timeout),
        )
    };

    match cli.command {
        Command::Server { ref events_dir } => {
            commands::server::run(&cli, &config, events_dir.as_deref()).await
        }
        Command::Get { max_lines } => commands::get::run(&client(), max_lines).await,
        Command::Status => commands::get::status(&client()).await,
        Command::Render {
            ref file,
            max_lines,
        } => commands::render::run(file, max_lines, &config).await,
        Command::Config { ref action } => match action {
            ConfigAction::Dump => commands::config::dump(&config),
            ConfigAction::Validate => commands::config::validate(&config),
            ConfigAction::Path => commands::config::path(),
        },
    }
}
