use std::error::Error;
use std::fs::File;
use std::io;
use std::os::unix::fs::FileTypeExt;
use std::sync::mpsc;
use std::time::Duration;

use tracing::{info, warn};

mod app_metrics;
mod config;
mod display;
mod frame_filter;
mod stats;

use app_metrics::{AppMetrics, MetricsLogger};
use config::{AdapterKind, Config};
use display::DisplayHandler;
use frame_filter::should_process_message;
use stats::StatsHandler;

use n2k::{
    ActisensePort, BusCommand, CanUsbPort, FastPacketAssembler, FastPacketRegistry,
    MessageHandler, PgnCatalog, Pipeline, SplitPort,
};

// ========== Logging Setup ==========

fn init_logging(log_config: &config::LogConfig) -> Result<(), Box<dyn Error>> {
    use tracing_appender::rolling;
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    // Create log directory if it doesn't exist
    std::fs::create_dir_all(&log_config.directory)?;

    // Create daily rolling file appender
    let file_appender = rolling::daily(&log_config.directory, &log_config.file_prefix);

    // Build subscriber with both console and file output
    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .with_timer(fmt::time::OffsetTime::local_rfc_3339().unwrap_or_else(|_| {
            fmt::time::OffsetTime::new(
                time::UtcOffset::UTC,
                time::format_description::well_known::Rfc3339,
            )
        }));

    let console_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_timer(fmt::time::OffsetTime::local_rfc_3339().unwrap_or_else(|_| {
            fmt::time::OffsetTime::new(
                time::UtcOffset::UTC,
                time::format_description::well_known::Rfc3339,
            )
        }));

    // Parse log level from config
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_config.level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    Ok(())
}

// ========== Device Handling ==========

type DevicePort = SplitPort<File, Box<dyn io::Write + Send>>;

/// Open the configured device. Character devices (serial ports) get a
/// writable second handle for the transmit path; anything else is treated
/// as a capture file and replayed read-only.
fn open_device(path: &str) -> io::Result<DevicePort> {
    let input = File::open(path)?;
    let is_serial = input.metadata()?.file_type().is_char_device();

    let output: Box<dyn io::Write + Send> = if is_serial {
        Box::new(File::options().write(true).open(path)?)
    } else {
        info!("{} is a file, replaying without a transmit path", path);
        Box::new(io::sink())
    };

    Ok(SplitPort::new(input, output))
}

/// Opens the device with automatic retry on failure
fn open_device_with_retry(path: &str) -> DevicePort {
    loop {
        match open_device(path) {
            Ok(port) => {
                info!("Successfully opened device: {}", path);
                return port;
            }
            Err(e) => {
                warn!("Failed to open device '{}': {}", path, e);
                warn!("Retrying in 10 seconds...");
                std::thread::sleep(Duration::from_secs(10));
            }
        }
    }
}

// ========== Main Application ==========

fn main() -> Result<(), Box<dyn Error>> {
    // Check for command-line arguments
    let args: Vec<String> = std::env::args().collect();

    // Check for help flag
    if args.contains(&"--help".to_string()) || args.contains(&"-h".to_string()) {
        println!("NMEA2000 Gateway");
        println!();
        println!("USAGE:");
        println!("    nmea_gateway [OPTIONS]");
        println!();
        println!("OPTIONS:");
        println!("    --validate-config, --validate, -v    Validate configuration and exit");
        println!("    --help, -h                           Show this help message");
        println!();
        println!("Configuration file: config.json (in current directory)");
        std::process::exit(0);
    }

    let validate_only = args.contains(&"--validate-config".to_string())
        || args.contains(&"--validate".to_string())
        || args.contains(&"-v".to_string());

    // Load configuration
    let config = match Config::from_file("config.json") {
        Ok(cfg) => {
            if validate_only {
                println!("✓ Configuration validation successful");
                println!("  Adapter: {:?} on {}", cfg.adapter.kind, cfg.adapter.device);
                println!("  Preferred address: {}", cfg.adapter.preferred_address);
                println!(
                    "  Reassembly eviction: {} ms / {} pending",
                    cfg.reassembly.max_age_ms, cfg.reassembly.max_pending
                );
                println!(
                    "  PGN source filters: {} entries",
                    cfg.source_filter.pgn_source_map.len()
                );
                std::process::exit(0);
            }
            cfg
        }
        Err(e) => {
            if validate_only {
                eprintln!("✗ Configuration validation failed: {}", e);
                std::process::exit(1);
            }
            eprintln!("Warning: Could not load config.json: {}", e);
            eprintln!("Using default configuration");
            Config::default()
        }
    };

    // Initialize logging
    init_logging(&config.logging)?;
    info!("NMEA2000 Gateway starting...");
    info!("Loaded configuration");

    let catalog = PgnCatalog::standard();
    let (tx, rx) = mpsc::channel();

    // Open the device with retry
    let device = config.adapter.device.clone();
    info!("Opening device: {}", device);
    let port = open_device_with_retry(&device);

    // Build the adapter pipeline and start its read loop
    let reader = match config.adapter.kind {
        AdapterKind::Actisense => {
            let port = ActisensePort::open(port)?;
            let mut pipeline = Pipeline::new(port, catalog, tx);
            for pgn in &config.adapter.startup_requests {
                pipeline.execute(BusCommand::IsoRequest { pgn: *pgn })?;
            }
            std::thread::spawn(move || {
                if let Err(e) = pipeline.run() {
                    warn!("Pipeline stopped on error: {}", e);
                }
            })
        }
        AdapterKind::Canusb => {
            let registry = FastPacketRegistry::from_catalog(&catalog);
            info!("Registered {} fast packet PGNs", registry.len());
            let assembler =
                FastPacketAssembler::with_policy(registry, config.reassembly.eviction_policy());
            let port = CanUsbPort::open(port, config.adapter.preferred_address, assembler)?;
            let mut pipeline = Pipeline::new(port, catalog, tx);
            for pgn in &config.adapter.startup_requests {
                pipeline.execute(BusCommand::IsoRequest { pgn: *pgn })?;
            }
            std::thread::spawn(move || {
                if let Err(e) = pipeline.run() {
                    warn!("Pipeline stopped on error: {}", e);
                }
            })
        }
    };

    info!("Listening for NMEA2000 messages");

    // Consumers fed from the output queue
    let mut display = config
        .display
        .enabled
        .then(|| DisplayHandler::new(&config.display));
    let mut stats = config
        .statistics
        .enabled
        .then(|| StatsHandler::new(config.statistics.interval()));

    // Application metrics tracking
    let mut metrics = AppMetrics::new();
    let mut metrics_logger = MetricsLogger::new(Duration::from_secs(60));

    for message in rx {
        metrics.nmea_messages += 1;
        if message.index == 0 {
            metrics.unknown_pgns += 1;
        }

        if !should_process_message(&config, &message) {
            metrics.filtered_messages += 1;
            continue;
        }

        if let Some(handler) = display.as_mut() {
            handler.handle_message(&message);
        }
        if let Some(handler) = stats.as_mut() {
            handler.handle_message(&message);
            handler.check_and_report();
        }

        // Log metrics periodically
        metrics_logger.check_and_log(&mut metrics);
    }

    reader.join().expect("adapter thread panicked");
    info!("Byte source finished, shutting down");
    Ok(())
}
