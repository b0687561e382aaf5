//! azanbreak - An offline prayer and break alarm daemon.
//!
//! This is the main entry point for azanbreak, which computes the five daily
//! prayer times from solar geometry and rings configurable break windows,
//! entirely offline.
//!
//! # Overview
//!
//! azanbreak arms one deferred trigger per upcoming prayer and two per
//! enabled break (start and end). Triggers are persisted in a durable job
//! table, so a restart recovers everything that was armed, and a daily pass
//! shortly after local midnight arms the next day's triggers.
//!
//! # Features
//!
//! - **Offline Prayer Times**: Fajr, dhuhr, asr, maghrib and isha computed
//!   locally, no network required
//! - **Calculation Conventions**: Umm al-Qura, Muslim World League, Egyptian
//!   and Karachi methods; Shafi or Hanafi asr
//! - **Break Windows**: Recurring daily breaks with per-break sounds and
//!   durations
//! - **Durable Triggers**: Armed triggers survive restarts via an on-disk
//!   job table
//! - **YAML Configuration**: Simple configuration file format with
//!   environment variable support
//!
//! # Configuration
//!
//! Create a `config.yaml` file with your settings:
//!
//! ```yaml
//! timezone: "Asia/Riyadh"
//!
//! prayer:
//!   method: "umm_al_qura"
//!   school: "shafi"
//! ```
//!
//! # Environment Variable Overrides
//!
//! Override any configuration value using environment variables with the
//! `AZANBREAK_` prefix:
//!
//! ```bash
//! export AZANBREAK_TIMEZONE="Europe/Paris"
//! export AZANBREAK_PRAYER__METHOD="muslim_world_league"
//! ```
//!
//! # Usage
//!
//! ```bash
//! azanbreak --config config.yaml --data ./azanbreak-data
//! ```
//!
//! # Architecture
//!
//! The daemon consists of several modules:
//!
//! - [`config`] - YAML configuration structures and loading with environment
//!   variable support
//! - [`daemon`] - Wiring and the recover/arm/re-arm lifecycle
//! - [`dispatch`] - Alert delivery: sounds and notifications with fallbacks
//! - [`prayer`] - Solar geometry prayer time computation
//! - [`scheduler`] - Trigger arming, durable deferred execution and the
//!   re-arm coordinator
//! - [`store`] - Settings and break definition persistence
//!
//! # Environment Variables
//!
//! - `RUST_LOG` - Controls logging level (default: `info`)
//!   - Set to `debug` for verbose output
//!   - Set to `warn` or `error` for minimal logging

use std::path::Path;

use clap::Parser;
use env_logger::Env;
use log::{error, info};

use crate::{config::Config, daemon::Daemon};

mod config;
mod daemon;
mod dispatch;
mod prayer;
mod scheduler;
mod store;

/// Command-line arguments for the azanbreak daemon.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the YAML configuration file.
    ///
    /// All values are optional; an absent file runs with Umm al-Qura times
    /// in the Riyadh timezone. See the [`config`] module for the format.
    #[arg(short, long)]
    config: String,

    /// Path to the directory for storing persistent data.
    ///
    /// This directory will contain:
    /// - `settings.json` - location, sound and break settings
    /// - `jobs.json` - the durable table of armed triggers
    #[arg(short, long)]
    data: String,

    /// Arm a test adhan two seconds after startup.
    #[arg(long)]
    test_adhan: bool,
}

/// Main entry point for the azanbreak daemon.
///
/// Initializes logging, parses arguments, loads the configuration and runs
/// the daemon until interrupted. Configuration errors are logged and exit
/// cleanly instead of panicking.
#[tokio::main]
async fn main() {
    // Put logger at info level by default
    let env = Env::default().filter_or("RUST_LOG", "info");
    env_logger::init_from_env(env);

    info!("Starting azanbreak {}...", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();

    // Load configuration from YAML file with environment variable overrides
    let config: Config = match Config::load(&args.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load config file: {}", e);
            return;
        }
    };

    let daemon = match Daemon::new(config, Path::new(&args.data)) {
        Ok(d) => d,
        Err(e) => {
            error!("Failed to initialize daemon: {}", e);
            return;
        }
    };
    daemon.start(args.test_adhan).await;
}
