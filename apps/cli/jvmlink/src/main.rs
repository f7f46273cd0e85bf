use jvmlink::error::AppError;
use jvmlink::logger::initialize as LoggerInitialize;
use jvmlink::session;

use link_core::config::{default_config_dir, load_dotenv};
use link_core::{JvmLinkClient, LinkConfig};

use common::ErrorLocation;

use std::fs::create_dir_all;
use std::panic::Location;
use std::path::PathBuf;
use std::process::ExitCode;

use log::{error, info, warn};
use tokio::io::{BufReader, stdin, stdout};

const APP_DIR_NAME: &str = "jvmlink";

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), AppError> {
    let log_dir = log_dir()?;
    create_dir_all(&log_dir).map_err(|e| AppError::App {
        message: format!("Failed to create log directory: {e}"),
        location: ErrorLocation::from(Location::caller()),
    })?;

    // Initialize logger FIRST
    LoggerInitialize(&log_dir)?;

    info!("jvmlink starting");
    info!("Log directory: {}", log_dir.display());

    load_dotenv();

    let config_dir = default_config_dir()?;
    let mut config = LinkConfig::load(&config_dir)?;
    if !config_dir.join("jvmlink.toml").exists()
        && let Err(e) = config.save(&config_dir)
    {
        warn!("Could not write default config: {e}");
    }
    config.apply_env_overrides()?;

    let launch = config.peer.launch;
    let mut client = JvmLinkClient::new(config);

    if launch {
        client.start_configured_java().await?;
    } else {
        info!("Attaching to a running peer on port {}", client.port());
    }

    let outcome = match client.establish_connection().await {
        Ok(()) => session::run(&mut client, BufReader::new(stdin()), &mut stdout()).await,
        Err(e) => Err(e.into()),
    };

    if client.owns_peer() {
        client.shut_java().await?;
    } else {
        client.close_connection().await?;
    }

    info!("jvmlink finished");
    outcome
}

#[track_caller]
fn log_dir() -> Result<PathBuf, AppError> {
    dirs::data_local_dir()
        .map(|dir| dir.join(APP_DIR_NAME).join("logs"))
        .ok_or_else(|| AppError::App {
            message: String::from("Platform has no local data directory"),
            location: ErrorLocation::from(Location::caller()),
        })
}
