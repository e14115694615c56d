//! Headless host for the Guildhall core.
//!
//! Wires the orchestrator to a real clock, seeded dice and the AI stand-in,
//! then polls it in real time until the game ends.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `guildhall-config.yaml` (or the path given as
//!    the first argument), falling back to defaults
//! 2. Initialize structured logging (tracing)
//! 3. Assemble the orchestrator and subscribe the event log
//! 4. Start the game and run the driver loop
//! 5. Log the final standings

mod driver;
mod error;
mod event_log;

use std::path::{Path, PathBuf};
use std::time::Duration;

use guildhall_constructs::SeededDice;
use guildhall_core::config::LoggingConfig;
use guildhall_core::{GameConfig, PhaseCycleOrchestrator, RandomDecisionSource, SystemClock};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::driver::DriveOutcome;
use crate::error::EngineError;
use crate::event_log::EventLog;

/// Default configuration file, relative to the working directory.
const CONFIG_FILE: &str = "guildhall-config.yaml";

/// Application entry point for the engine.
///
/// # Errors
///
/// Returns an error if configuration, setup or the driver loop fails.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), EngineError> {
    // 1. Load configuration.
    let (config, loaded_from) = load_config()?;

    // 2. Initialize structured logging.
    init_logging(&config.logging);
    info!("guildhall-engine starting");
    let source = loaded_from
        .as_deref()
        .map_or_else(|| "defaults".to_owned(), |p| p.display().to_string());
    info!(source = %source, "Configuration loaded");
    info!(
        name = config.game.name,
        seed = config.game.seed,
        total_cycles = config.game.total_cycles,
        players = config.game.players.len(),
        map_radius = config.game.map_radius,
        "Game configured"
    );

    // 3. Assemble the orchestrator.
    let mut orchestrator = PhaseCycleOrchestrator::new(
        &config,
        Box::new(SystemClock::new()),
        Box::new(SeededDice::new(config.game.seed)),
    )?;
    orchestrator.bus_mut().subscribe(EventLog::new());
    let mut ai = RandomDecisionSource::new(config.game.seed.rotate_left(32));

    // 4. Run.
    orchestrator.start()?;
    let outcome = driver::run(
        &mut orchestrator,
        &mut ai,
        Duration::from_millis(config.driver.poll_interval_ms),
    )
    .await?;

    // 5. Log results.
    log_standings(&orchestrator, outcome);
    info!(
        ?outcome,
        events = orchestrator.state().bus.published(),
        "guildhall-engine shutdown complete"
    );
    Ok(())
}

/// Load the game configuration. The first command-line argument, when
/// present, replaces the default path.
fn load_config() -> Result<(GameConfig, Option<PathBuf>), EngineError> {
    let path = std::env::args_os()
        .nth(1)
        .map_or_else(|| PathBuf::from(CONFIG_FILE), PathBuf::from);
    if path.exists() {
        let config = GameConfig::from_file(&path)?;
        Ok((config, Some(path)))
    } else if path != Path::new(CONFIG_FILE) {
        Err(EngineError::Config {
            source: guildhall_core::ConfigError::Io {
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("{} does not exist", path.display()),
                ),
            },
        })
    } else {
        let mut config = GameConfig::default();
        config.game.apply_env_overrides();
        config.validate()?;
        Ok((config, None))
    }
}

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.level.as_str()));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn log_standings(orchestrator: &PhaseCycleOrchestrator, outcome: DriveOutcome) {
    if outcome == DriveOutcome::Interrupted {
        warn!(
            cycle = orchestrator.cycle(),
            "Game interrupted; standings are provisional"
        );
    }
    let state = orchestrator.state();
    for standing in state.standings() {
        info!(
            rank = standing.rank,
            player = %standing.name,
            gold = standing.gold,
            resource_value = standing.resource_value,
            territories = standing.territories,
            net_worth = standing.net_worth,
            "Final standing"
        );
    }
    info!(
        guild_revenue = state.ledger.guild_revenue(),
        conservation = ?state.ledger.verify_conservation(),
        "Ledger audit"
    );
}
