//! Rekha - tile grid search runner
//!
//! Runs the column-sweep search against the grid simulator:
//!
//! ```text
//! rekha                      # ./rekha.toml if present, else defaults
//! rekha <path>
//! rekha --config <path>
//! ```

use rekha::error::{Error, Result};
use rekha::hardware::ImmediateStart;
use rekha::sim::SimRobot;
use rekha::{AppConfig, MotionController, SearchOutcome, SearchSequencer};
use std::env;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

const DEFAULT_CONFIG_PATH: &str = "rekha.toml";

/// Parse config path from command line arguments.
///
/// Supports `rekha <path>`, `rekha --config <path>` and `rekha -c <path>`.
fn parse_config_path() -> Option<String> {
    let args: Vec<String> = env::args().collect();

    for i in 1..args.len() {
        if (args[i] == "--config" || args[i] == "-c") && i + 1 < args.len() {
            return Some(args[i + 1].clone());
        }
    }

    if args.len() > 1 && !args[1].starts_with('-') {
        return Some(args[1].clone());
    }

    None
}

fn load_config() -> Result<(AppConfig, String)> {
    match parse_config_path() {
        Some(path) => Ok((AppConfig::load(&path)?, path)),
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => Ok((
            AppConfig::load(DEFAULT_CONFIG_PATH)?,
            DEFAULT_CONFIG_PATH.to_string(),
        )),
        None => Ok((AppConfig::default(), "built-in defaults".to_string())),
    }
}

fn main() -> Result<()> {
    let (config, source) = load_config()?;

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .init();

    log::info!("Rekha v{} starting", env!("CARGO_PKG_VERSION"));
    log::info!("Using config: {}", source);

    let interrupt = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&interrupt);
    ctrlc::set_handler(move || {
        log::info!("Received shutdown signal");
        flag.store(true, Ordering::SeqCst);
    })
    .map_err(|e| Error::Other(format!("Error setting Ctrl-C handler: {}", e)))?;

    let robot = SimRobot::new(
        config.simulation.clone(),
        config.search.start_position()?,
        config.search.start_heading()?,
    );
    let controller =
        MotionController::new(&config, robot.light(), robot.peripherals())?.with_interrupt(interrupt);
    let mut sequencer =
        SearchSequencer::new(controller, Box::new(ImmediateStart), config.search.clone());

    let result = sequencer.run();
    let stats = sequencer.controller().stats();
    log::info!(
        "Tiles reached: {}, corrections: {}, timeouts: {}, recoveries: {}, lost move-backs: {}",
        stats.tiles_reached,
        stats.corrections,
        stats.timeouts,
        stats.recoveries,
        stats.move_back_misses
    );

    match result {
        Ok(SearchOutcome::Found {
            object_number,
            position,
        }) => {
            log::info!("Result: object {} at {}", object_number, position);
            Ok(())
        }
        Ok(SearchOutcome::NotFound) => {
            log::info!("Result: not found");
            Ok(())
        }
        Err(Error::Interrupted) => {
            log::warn!("Search interrupted at {}", sequencer.controller().position());
            Ok(())
        }
        Err(e) => {
            log::error!("Search failed: {}", e);
            Err(e)
        }
    }
}
