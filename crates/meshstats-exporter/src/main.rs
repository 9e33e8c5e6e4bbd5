//! `meshstats`: Prometheus exporter for MeshCore companion radios.
//!
//! Polls a companion radio over its serial port (and optionally one remote
//! repeater over the mesh) and serves the readings on a Prometheus scrape
//! endpoint. Also carries a `set-region` subcommand for one-shot radio
//! configuration.

use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use meshstats_collector::{Collector, CollectorConfig};
use meshstats_metrics::{FacadeSink, StatsSink};
use meshstats_protocol::{region_by_code, RadioRegion, REGIONS};
use meshstats_radio::{LinkError, RadioLink, SerialConnector};

#[derive(Parser)]
#[command(
    name = "meshstats",
    version,
    about = "Prometheus exporter for MeshCore companion radios"
)]
struct Cli {
    /// Serial device of the companion radio.
    #[arg(long, default_value = "/dev/ttyACM0")]
    port: String,

    /// Serial baud rate.
    #[arg(long, default_value_t = 115_200)]
    baud: u32,

    /// Listen address for the Prometheus scrape endpoint.
    #[arg(long, default_value = "0.0.0.0:9200")]
    listen: SocketAddr,

    /// Seconds between polling ticks.
    #[arg(long, default_value_t = 600)]
    interval: u64,

    /// Name of a repeater to poll over the mesh.
    #[arg(long)]
    repeater: Option<String>,

    /// Password for the repeater login.
    #[arg(long, default_value = "")]
    password: String,

    #[command(subcommand)]
    command: Option<CliCommand>,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Apply a regional radio preset, then exit.
    SetRegion {
        /// Region code. Omit to list the available presets.
        region: Option<String>,

        /// TX power in dBm.
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=22))]
        tx_power: Option<u8>,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(CliCommand::SetRegion { region, tx_power }) => {
            set_region(&cli.port, cli.baud, region.as_deref(), tx_power)
        }
        None => serve(cli),
    }
}

/// Run the exporter daemon until interrupted.
fn serve(cli: Cli) -> ExitCode {
    if let Err(err) = PrometheusBuilder::new()
        .with_http_listener(cli.listen)
        .install()
    {
        error!(listen = %cli.listen, error = %err, "failed to start scrape endpoint");
        return ExitCode::FAILURE;
    }
    meshstats_metrics::describe_metrics();
    info!(listen = %cli.listen, "scrape endpoint up");

    // A port that will not open at startup is a configuration problem and
    // fatal; everything after this point is retried forever.
    let link = match open_link(&cli.port, cli.baud) {
        Ok(link) => Arc::new(link),
        Err(err) => {
            error!(port = %cli.port, error = %err, "cannot open serial port");
            return ExitCode::FAILURE;
        }
    };

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = shutdown.clone();
        if let Err(err) = ctrlc::set_handler(move || {
            info!("shutdown requested");
            shutdown.store(true, Ordering::Relaxed);
        }) {
            error!(error = %err, "failed to install signal handler");
            return ExitCode::FAILURE;
        }
    }

    let config = CollectorConfig {
        interval: Duration::from_secs(cli.interval),
        repeater: cli.repeater,
        password: cli.password,
        ..CollectorConfig::default()
    };
    let sink: Arc<dyn StatsSink> = Arc::new(FacadeSink);
    let mut collector = Collector::new(link, sink, config);
    collector.run(&shutdown);

    ExitCode::SUCCESS
}

/// Apply a regional preset to the radio, or list presets when none given.
fn set_region(port: &str, baud: u32, region: Option<&str>, tx_power: Option<u8>) -> ExitCode {
    let Some(code) = region else {
        println!("available regions:");
        for preset in REGIONS {
            println!("  {}", describe_region(preset));
        }
        return ExitCode::SUCCESS;
    };

    let Some(preset) = region_by_code(code) else {
        error!(region = code, "unknown region; run set-region with no argument to list presets");
        return ExitCode::FAILURE;
    };

    let link = match open_link(port, baud) {
        Ok(link) => link,
        Err(err) => {
            error!(port, error = %err, "cannot open serial port");
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = apply_region(&link, preset, tx_power) {
        error!(region = preset.code, error = %err, "failed to apply region preset");
        return ExitCode::FAILURE;
    }
    info!(region = preset.code, "radio configured: {}", describe_region(preset));
    ExitCode::SUCCESS
}

fn apply_region(
    link: &RadioLink,
    preset: &RadioRegion,
    tx_power: Option<u8>,
) -> Result<(), LinkError> {
    link.app_start()?;
    link.set_radio_params(preset.params)?;
    if let Some(power) = tx_power {
        link.set_radio_tx_power(power)?;
        info!(power, "tx power set");
    }
    Ok(())
}

fn open_link(port: &str, baud: u32) -> Result<RadioLink, LinkError> {
    let connector = SerialConnector::new(port, baud);
    RadioLink::connect(Box::new(connector), Arc::new(FacadeSink))
}

fn describe_region(region: &RadioRegion) -> String {
    format!(
        "{}: {:.3} MHz, {:.1} kHz bandwidth, SF{}, CR{}",
        region.code,
        region.params.freq_khz as f64 / 1000.0,
        region.params.bandwidth_hz as f64 / 1000.0,
        region.params.spreading_factor,
        region.params.coding_rate
    )
}
