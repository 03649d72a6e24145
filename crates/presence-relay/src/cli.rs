use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use presence_config::schema::FeedSource;
use presence_config::RelayConfig;

use crate::replay::ReplayOptions;

/// presence-relay: relay presence sensor events to live dashboards.
#[derive(Parser, Debug)]
#[command(name = "presence-relay", version, about)]
pub struct Args {
    /// Config file path override.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log filter override (e.g. "debug" or "presence_core=trace").
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the relay server (the default).
    Serve(ServeArgs),
    /// Send the lines of a file to a running relay, one per interval.
    Replay(ReplayArgs),
    /// List serial devices a sensor may be attached to.
    Ports,
    /// Print the effective configuration as TOML.
    Config,
}

#[derive(clap::Args, Debug, Default)]
pub struct ServeArgs {
    /// Port to listen on.
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Interface address to bind.
    #[arg(long)]
    pub bind: Option<String>,

    /// Read sensor lines from this serial device.
    #[arg(long)]
    pub device: Option<String>,

    /// Serial baud rate.
    #[arg(long)]
    pub baud: Option<u32>,

    /// Read sensor lines from standard input.
    #[arg(long, conflicts_with = "device")]
    pub stdin: bool,

    /// Dial a sensor's WebSocket server (e.g. ws://192.168.4.1:81).
    #[arg(long, conflicts_with_all = ["device", "stdin"])]
    pub sensor_url: Option<String>,

    /// Serve dashboard assets from this directory.
    #[arg(long)]
    pub static_dir: Option<String>,
}

impl ServeArgs {
    /// Layer command-line overrides on top of the file config.
    pub fn apply(&self, config: &mut RelayConfig) {
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(bind) = &self.bind {
            config.server.bind = bind.clone();
        }
        if let Some(dir) = &self.static_dir {
            config.server.static_dir = Some(dir.clone());
        }
        if let Some(device) = &self.device {
            config.feed.source = FeedSource::Serial;
            config.feed.device = device.clone();
        }
        if let Some(baud) = self.baud {
            config.feed.baud_rate = baud;
        }
        if self.stdin {
            config.feed.source = FeedSource::Stdin;
        }
        if let Some(url) = &self.sensor_url {
            config.feed.source = FeedSource::WebSocket;
            config.feed.url = url.clone();
        }
    }
}

#[derive(clap::Args, Debug)]
pub struct ReplayArgs {
    /// File of sensor lines; blank lines are skipped.
    pub file: PathBuf,

    /// WebSocket URL of the relay.
    #[arg(long, default_value = "ws://localhost:8085/ws")]
    pub url: String,

    /// Sensor id to stamp on each message.
    #[arg(long, default_value = "sensor1")]
    pub sensor_id: String,

    /// Delay between lines in milliseconds.
    #[arg(long, default_value_t = 1000)]
    pub interval_ms: u64,
}

impl ReplayArgs {
    pub fn into_options(self) -> ReplayOptions {
        ReplayOptions {
            url: self.url,
            file: self.file,
            sensor_id: self.sensor_id,
            interval: Duration::from_millis(self.interval_ms),
        }
    }
}

pub fn parse() -> Args {
    Args::parse()
}
