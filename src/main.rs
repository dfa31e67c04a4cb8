//! Properties Exporter - Main Entry Point
//!
//! Waits for the configured device on the device network, then dumps its
//! properties to a CSV file at a fixed period.

use anyhow::Context;
use clap::Parser;
use properties_exporter::{
    backend::{NetworkFilter, SimulatedNetwork},
    config::{ConfigSettings, RunSettings},
    pipeline::Application,
    ExporterError,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Dump device properties to CSV at a fixed period
#[derive(Parser, Debug)]
#[command(name = "properties-exporter")]
#[command(version)]
#[command(about = "Find a device on the device network and export its properties to CSV", long_about = None)]
struct Args {
    /// Config file (JSON, or TOML by extension)
    #[arg(long, value_name = "PATH", value_parser = existing_file)]
    config: PathBuf,

    /// Simulated device network description (JSON, or TOML by extension)
    #[arg(long, value_name = "PATH", value_parser = existing_file)]
    network: PathBuf,

    /// Period between dumped samples, ms
    #[arg(long, default_value_t = properties_exporter::config::DEFAULT_PERIOD_MS)]
    period: u64,

    /// Samples count
    #[arg(long = "samplesCount", alias = "samples-count", default_value_t = properties_exporter::config::DEFAULT_SAMPLES_COUNT)]
    samples_count: u64,

    /// Wait device timeout, ms
    #[arg(long = "waitDeviceTimeout", alias = "wait-device-timeout", default_value_t = properties_exporter::config::DEFAULT_WAIT_DEVICE_TIMEOUT_MS)]
    wait_device_timeout: u64,

    /// Print export progress
    #[arg(long)]
    progress: bool,

    /// Enable IP devices in the device network
    #[arg(long = "ipDevices", alias = "ip-devices")]
    ip_devices: bool,

    /// Directory for the output file
    #[arg(long, value_name = "DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Field delimiter of the output file
    #[arg(long, default_value_t = ',', value_parser = ascii_delimiter)]
    delimiter: char,

    /// Also write logs to this directory
    #[arg(long, value_name = "DIR")]
    log_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn run_settings(&self) -> RunSettings {
        RunSettings {
            period_ms: self.period,
            samples_count: self.samples_count,
            wait_device_timeout_ms: self.wait_device_timeout,
            print_progress: self.progress,
            enable_ip_devices: self.ip_devices,
            output_dir: self.output_dir.clone(),
            // Checked by `ascii_delimiter`
            delimiter: self.delimiter as u8,
            ..RunSettings::default()
        }
    }
}

fn existing_file(value: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(value);
    if path.is_file() {
        Ok(path)
    } else {
        Err(format!("file does not exist: {}", value))
    }
}

fn ascii_delimiter(value: &str) -> Result<char, String> {
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii() && c != '"' && c != '\n' => Ok(c),
        _ => Err("delimiter must be a single ASCII character".to_string()),
    }
}

fn init_logging(args: &Args) -> anyhow::Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let default_filter = if args.verbose {
        "info,properties_exporter=trace"
    } else {
        "info,properties_exporter=debug"
    };

    let (file_layer, guard) = match &args.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            let appender = tracing_appender::rolling::never(dir, "properties-exporter.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();

    Ok(guard)
}

fn run(args: &Args) -> anyhow::Result<()> {
    tracing::info!("Config file: {:?}", args.config);
    let config = ConfigSettings::load(&args.config).context("Failed to load config")?;

    let settings = args.run_settings();
    let network = SimulatedNetwork::load(&args.network, NetworkFilter::from_settings(&settings))
        .context("Failed to create device network")?;

    let summary = Application::new(network, config, settings).run()?;
    println!(
        "Exported {} samples from {} to {}",
        summary.export.rows_written,
        summary.node,
        summary.output_path.display()
    );
    Ok(())
}

/// One status line per failure class
fn failure_status(err: &anyhow::Error) -> &'static str {
    match err.downcast_ref::<ExporterError>().map(ExporterError::root) {
        Some(ExporterError::DiscoveryTimeout { .. }) => "Failed to find target device",
        Some(ExporterError::CapabilityMismatch { .. }) => {
            "Target device does not provide the required properties"
        }
        Some(ExporterError::Sink(_)) | Some(ExporterError::Csv(_)) => {
            "Failed to write the output file"
        }
        Some(ExporterError::Config(_)) => "Invalid configuration",
        Some(_) => "Sampling run failed",
        None => "Failed to run application",
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let _guard = match init_logging(&args) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    tracing::info!("Starting properties exporter");

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("{}", failure_status(&e));
            ExitCode::FAILURE
        }
    }
}
