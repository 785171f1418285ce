//! VeloBox station entry point.
//!
//! Startup sequence:
//!
//! 1. Parse CLI arguments and load the JSON configuration.
//! 2. Probe GPIO; fall back to the simulated actuator when absent.
//! 3. Open the bearer store and wire the remaining adapters.
//! 4. Run the scan loop on a blocking thread, one line per scan.
//! 5. On interrupt, de-energize the actuator before exiting.

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use velobox_core::adapters::console::ConsolePinEntry;
use velobox_core::adapters::gpio::SysfsGpioDriver;
use velobox_core::adapters::overflow::{JsonBlocklist, JsonOverflowStore};
use velobox_core::adapters::sim::SimulatedDriver;
use velobox_core::adapters::storage::FileIdentityStore;
use velobox_core::adapters::web::HttpProfileFetcher;
use velobox_core::ports::outbound::{ActuatorDriver, SystemTimeSource};
use velobox_core::{
    AccessDecisionEngine, AccessError, ActuatorController, DispatchOutcome, LockerConfig,
    ScanDispatcher, ScanWindow,
};

#[derive(Parser)]
#[command(name = "velobox", about = "Bicycle storage station access control")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(long, default_value = "config.json")]
    config: PathBuf,

    /// Force the simulated actuator even if GPIO is present.
    #[arg(long)]
    simulate: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = LockerConfig::load(&cli.config)
        .with_context(|| format!("loading configuration from {}", cli.config.display()))?;

    let driver = select_driver(&config, cli.simulate);
    let dispatcher = wire(&config, driver.clone())?;

    info!(
        "[runtime] station ready ({}); Ctrl+C to exit",
        if driver.is_available() {
            "hardware"
        } else {
            "simulation"
        }
    );

    let mut scan_task = tokio::task::spawn_blocking(move || scan_loop(dispatcher));

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("[runtime] interrupt received, shutting down");
            // Whatever the station was doing, power must be off before the
            // process dies.
            driver.de_energize();
            info!("[runtime] actuator de-energized");
            // The scan loop may be parked in an uninterruptible stdin read.
            std::process::exit(0);
        }
        result = &mut scan_task => {
            result.context("scan loop panicked")??;
        }
    }

    driver.de_energize();
    Ok(())
}

/// Probe the GPIO tree unless simulation was forced; fall back to the
/// simulated driver when hardware is absent.
fn select_driver(config: &LockerConfig, force_simulation: bool) -> Arc<dyn ActuatorDriver> {
    if force_simulation {
        info!("[runtime] simulation requested, GPIO not probed");
        return Arc::new(SimulatedDriver::new());
    }
    match SysfsGpioDriver::probe(&config.gpio) {
        Ok(driver) => Arc::new(driver),
        Err(err) => {
            warn!("[runtime] {err}; running in simulation");
            Arc::new(SimulatedDriver::new())
        }
    }
}

/// Build the dispatcher with one adapter per port.
fn wire(config: &LockerConfig, driver: Arc<dyn ActuatorDriver>) -> Result<ScanDispatcher> {
    let store = Arc::new(
        FileIdentityStore::open(&config.storage.database_file).with_context(|| {
            format!(
                "opening bearer store {}",
                config.storage.database_file.display()
            )
        })?,
    );
    let overflow = Arc::new(JsonOverflowStore::new(
        config.storage.ineligible_students.clone(),
        config.storage.ineligible_staff.clone(),
    ));
    let blocklist = Arc::new(JsonBlocklist::new(config.storage.blocklist.clone()));
    let fetcher =
        Arc::new(HttpProfileFetcher::new(&config.http).context("building HTTP client")?);
    let time = Arc::new(SystemTimeSource);

    let actuator = ActuatorController::new(
        driver,
        config.actuator.confirm_timeout(),
        config.actuator.poll_interval(),
    );
    let engine = AccessDecisionEngine::new(
        actuator,
        store.clone(),
        overflow,
        Arc::new(ConsolePinEntry::new()),
        time.clone(),
    );
    Ok(ScanDispatcher::new(
        engine,
        store,
        blocklist,
        fetcher,
        time,
        ScanWindow::new(
            config.debounce.window(),
            config.debounce.max_entries,
            Instant::now(),
        ),
    ))
}

/// Read raw scans line by line until end of input, one scan fully processed
/// before the next.
fn scan_loop(mut dispatcher: ScanDispatcher) -> Result<()> {
    let mut line = String::new();
    loop {
        line.clear();
        // Locked per read: PIN entry reads from the same console between
        // scans.
        let read = std::io::stdin()
            .lock()
            .read_line(&mut line)
            .context("reading scan input")?;
        if read == 0 {
            break;
        }
        let raw = line.trim();
        if raw.is_empty() {
            continue;
        }

        match dispatcher.dispatch(raw) {
            Ok(DispatchOutcome::Decided { outcome, .. }) => {
                debug!("[runtime] scan finished: {outcome}");
            }
            Ok(DispatchOutcome::Ineligible) => {
                info!("[runtime] registrant not eligible, nothing stored");
            }
            Ok(DispatchOutcome::Unclassified) => {}
            Err(AccessError::DuplicateScan) => {
                debug!("[runtime] repeated scan ignored");
            }
            Err(err @ AccessError::Blocked { .. }) => {
                info!("[runtime] {err}");
            }
            Err(err) => {
                warn!("[runtime] scan aborted: {err}");
            }
        }
    }

    let tally = dispatcher.tally();
    info!(
        "[runtime] input closed; entries: {} | exits: {}",
        tally.entries(),
        tally.exits()
    );
    Ok(())
}
