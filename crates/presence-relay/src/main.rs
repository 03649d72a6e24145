//! presence-relay: bridge a presence sensor to live dashboards.
//!
//! Sensor lines arrive over a serial device, stdin, WebSocket clients or
//! `POST /api/inject`. Each line is classified as presence / no presence;
//! transitions and raw passthrough frames are pushed to every connected
//! WebSocket observer, and the current state is served at `/api/state`.

mod cli;
mod connection;
mod feed;
mod ports;
mod replay;
mod routes;
mod server;

use presence_common::{ConfigError, RelayError};
use presence_config::schema::LogLevel;
use presence_config::RelayConfig;
use tracing_subscriber::EnvFilter;

use crate::cli::{Args, Command, ServeArgs};

/// `RUST_LOG` wins, then `--log-level`, then the config file.
fn init_logging(cli_level: Option<&str>, config_level: Option<LogLevel>) {
    let fallback = match cli_level {
        Some(level) => level.to_string(),
        None => config_level.unwrap_or_default().as_directive(),
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback.into()),
        )
        .init();
}

#[tokio::main]
async fn main() {
    let args = cli::parse();

    let config = presence_config::load_config(args.config.as_deref());
    let config_level = config.as_ref().ok().map(|c| c.logging.level);
    init_logging(args.log_level.as_deref(), config_level);

    if let Err(e) = run(args, config).await {
        tracing::error!(error = %e, "presence-relay failed");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run(args: Args, config: Result<RelayConfig, ConfigError>) -> presence_common::Result<()> {
    match args.command {
        None => serve(ServeArgs::default(), config?).await,
        Some(Command::Serve(serve_args)) => serve(serve_args, config?).await,
        Some(Command::Config) => {
            print!("{}", presence_config::config_to_toml(&config?));
            Ok(())
        }
        Some(Command::Ports) => {
            ports::print_ports(&ports::list_ports()?);
            Ok(())
        }
        Some(Command::Replay(replay_args)) => {
            replay::run(replay_args.into_options()).await?;
            Ok(())
        }
    }
}

async fn serve(overrides: ServeArgs, mut config: RelayConfig) -> presence_common::Result<()> {
    overrides.apply(&mut config);
    presence_config::validation::validate(&config).map_err(RelayError::from)?;
    tracing::debug!(?config, "Effective config");
    server::serve(config).await
}
