use clap::Parser;
use dotenv::dotenv;
use env_logger::Env;
use log::{info, error};
use std::process;

use cactus_bank::cli::{Console, SessionController};
use cactus_bank::config::{self, StorageBackend};
use cactus_bank::BankContext;

/// Cactus Bank - a console banking demo with hashed PINs and CSV audit logging
#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    /// Sets the configuration file
    #[clap(short, long, value_name = "FILE", default_value = "config.toml")]
    config: String,

    /// Turn debugging information on
    #[clap(short, long, action = clap::ArgAction::Count)]
    debug: u8,

    /// Account store backend, overriding the configuration file
    #[clap(long, value_enum)]
    backend: Option<StorageBackend>,

    /// Path of the account store, overriding the configuration file
    #[clap(long, value_name = "FILE")]
    store: Option<String>,

    /// Path of the CSV transaction log, overriding the configuration file
    #[clap(long, value_name = "FILE")]
    log: Option<String>,
}

fn main() {
    // Load environment variables from .env file
    dotenv().ok();

    // Parse command line arguments
    let cli = Cli::parse();

    // Logs go to stderr, warn and above unless -d is given
    let default_level = match cli.debug {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level)).init();

    info!("Starting Cactus Bank");

    let mut config = match config::load_config(&cli.config) {
        Ok(config) => {
            info!("Configuration loaded successfully");
            config
        }
        Err(err) => {
            error!("Failed to load configuration: {:#}", err);
            process::exit(1);
        }
    };

    if let Some(backend) = cli.backend {
        config.storage.backend = backend;
    }
    if let Some(store) = cli.store {
        config.storage.path = store;
    }
    if let Some(log) = cli.log {
        config.audit.log_path = log;
    }

    let ctx = match BankContext::open(&config) {
        Ok(ctx) => ctx,
        Err(err) => {
            error!("Failed to open storage: {}", err);
            eprintln!("Unable to open account storage: {}", err);
            process::exit(1);
        }
    };

    let mut session = SessionController::new(ctx, Console::stdio(), &config.app_name);
    if let Err(err) = session.run() {
        error!("Session ended with an error: {:#}", err);
        process::exit(1);
    }

    info!("Cactus Bank exited cleanly");
}
