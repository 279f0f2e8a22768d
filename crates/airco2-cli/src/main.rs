//! `airco2`: read a zyTemp-family USB CO2 sensor.
//!
//! Polls the sensor every interval and prints one line per round, as text
//! or JSON. With `--once` a single round is run and the exit status tells
//! whether the sensor was reachable.
//!
//! Usage:
//!   airco2 --interval 10
//!   airco2 --once --json --device /dev/hidraw2
//!   airco2 --simulate obfuscated --log-level debug

mod config;
mod output;

use airco2_hardware::mock::{Dialect, MockDiscovery};
use airco2_hardware::{AnyDiscovery, HidrawDiscovery, Monitor, MonitorUpdate, PollingEngine};
use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use config::{AppConfig, Overrides};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Read CO2, temperature and humidity from a USB CO2 sensor.
#[derive(Parser, Debug)]
#[command(name = "airco2", version, about)]
struct Cli {
    /// JSON configuration file.
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Seconds between polling rounds.
    #[arg(long, short)]
    interval: Option<u64>,

    /// Maximum frames read per round.
    #[arg(long, short)]
    attempts: Option<usize>,

    /// Device node to use instead of scanning hidraw nodes.
    #[arg(long, short)]
    device: Option<PathBuf>,

    /// Run a single round and exit.
    #[arg(long)]
    once: bool,

    /// Print JSON instead of text.
    #[arg(long)]
    json: bool,

    /// Use a simulated sensor speaking the given dialect.
    #[arg(long, value_enum)]
    simulate: Option<SimulatedDialect>,

    /// Log filter; overrides RUST_LOG.
    #[arg(long)]
    log_level: Option<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SimulatedDialect {
    Clear,
    Obfuscated,
}

impl From<SimulatedDialect> for Dialect {
    fn from(dialect: SimulatedDialect) -> Self {
        match dialect {
            SimulatedDialect::Clear => Dialect::Clear,
            SimulatedDialect::Obfuscated => Dialect::Obfuscated,
        }
    }
}

fn init_logging(level: Option<&str>) -> Result<()> {
    let filter = match level {
        Some(level) => EnvFilter::try_new(level).context("Invalid --log-level")?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn print_update(update: &MonitorUpdate, json: bool) -> Result<()> {
    if json {
        println!("{}", output::render_json(update)?);
    } else {
        println!("{}", output::render_text(update));
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref())?;

    let base = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    let config = base.with_overrides(Overrides {
        interval_secs: cli.interval,
        attempts: cli.attempts,
        device: cli.device.clone(),
    })?;

    let discovery = match cli.simulate {
        Some(dialect) => {
            info!("Using a simulated {} sensor", Dialect::from(dialect));
            AnyDiscovery::Mock(MockDiscovery::simulated(dialect.into()).0)
        }
        None => AnyDiscovery::Hidraw(HidrawDiscovery::new(config.hidraw.clone())),
    };
    let mut engine = PollingEngine::new(discovery, config.monitor.poll);

    if cli.once {
        let update = tokio::task::spawn_blocking(move || {
            engine.poll_once();
            MonitorUpdate::from_engine(&engine)
        })
        .await
        .context("Polling round failed")?;

        print_update(&update, cli.json)?;
        if !update.snapshot.available {
            bail!(
                "Sensor unavailable: {}",
                update.last_error.as_deref().unwrap_or("unknown error")
            );
        }
        return Ok(());
    }

    let mut handle = Monitor::new(engine, config.monitor).start();
    loop {
        tokio::select! {
            update = handle.recv() => match update {
                Some(update) => print_update(&update, cli.json)?,
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, shutting down");
                break;
            }
        }
    }

    handle.shutdown().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_flags() {
        let cli = Cli::try_parse_from([
            "airco2",
            "--once",
            "--json",
            "--attempts",
            "5",
            "--simulate",
            "obfuscated",
        ])
        .unwrap();

        assert!(cli.once);
        assert!(cli.json);
        assert_eq!(cli.attempts, Some(5));
        assert!(matches!(cli.simulate, Some(SimulatedDialect::Obfuscated)));
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_parse_rejects_unknown_dialect() {
        assert!(Cli::try_parse_from(["airco2", "--simulate", "binary"]).is_err());
    }
}
