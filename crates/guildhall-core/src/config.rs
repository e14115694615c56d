//! Configuration loading and typed config structures for a Guildhall game.
//!
//! The canonical configuration lives in `guildhall-config.yaml` at the
//! project root. Every section and field has a serde default, so a partial
//! file (or an empty one) yields a playable game.

use std::collections::BTreeMap;
use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;

use guildhall_constructs::DEFAULT_INSTALLATION_MS;
use guildhall_market::{
    DEFAULT_AUCTION_SECS, DEFAULT_SCAN_INTERVAL_MS, DEFAULT_TAX_RATE, MarketEventTable,
};
use guildhall_types::{Phase, ResourceKind};
use guildhall_world::{DecayPolicy, WorldError};

/// Environment variable overriding `game.seed`.
pub const SEED_ENV: &str = "GUILDHALL_SEED";

/// Environment variable overriding `game.total_cycles`.
pub const TOTAL_CYCLES_ENV: &str = "GUILDHALL_TOTAL_CYCLES";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The configuration parsed but describes an unplayable game.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// What is wrong.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level game configuration.
///
/// Mirrors the structure of `guildhall-config.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GameConfig {
    /// Name, seed, length, map size and seated players.
    #[serde(default)]
    pub game: GameSection,

    /// Turn time limits and warning marks.
    #[serde(default)]
    pub phases: PhasesConfig,

    /// Auction window and reference prices.
    #[serde(default)]
    pub auction: AuctionConfig,

    /// Starting balances and the guild tax.
    #[serde(default)]
    pub economy: EconomyConfig,

    /// Storage decay.
    #[serde(default)]
    pub decay: DecayConfig,

    /// Construct installation timing.
    #[serde(default)]
    pub installation: InstallationConfig,

    /// Weighted market event table rolled at the end of each cycle.
    #[serde(default = "MarketEventTable::standard")]
    pub market_events: MarketEventTable,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Host driver loop settings.
    #[serde(default)]
    pub driver: DriverConfig,
}

impl GameConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `GUILDHALL_SEED` overrides `game.seed`
    /// - `GUILDHALL_TOTAL_CYCLES` overrides `game.total_cycles`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if the values cannot describe a game.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string, applying environment
    /// overrides.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.game.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Check that the values describe a playable game.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: &str| {
            Err(ConfigError::Invalid {
                reason: reason.to_owned(),
            })
        };
        if self.game.total_cycles == 0 {
            return invalid("game.total_cycles must be at least 1");
        }
        if self.game.players.is_empty() {
            return invalid("game.players must seat at least one player");
        }
        if self.phases.default_time_limit_secs == 0
            || self.phases.time_limits.values().any(|&secs| secs == 0)
        {
            return invalid("phase time limits must be positive");
        }
        if self.auction.duration_secs == 0 {
            return invalid("auction.duration_secs must be positive");
        }
        if self.economy.tax_rate.is_sign_negative() || self.economy.tax_rate > Decimal::ONE {
            return invalid("economy.tax_rate must be between 0 and 1");
        }
        if self.decay.policy().is_err() {
            return invalid("decay rates must be between 0 and 1");
        }
        Ok(())
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            game: GameSection::default(),
            phases: PhasesConfig::default(),
            auction: AuctionConfig::default(),
            economy: EconomyConfig::default(),
            decay: DecayConfig::default(),
            installation: InstallationConfig::default(),
            market_events: MarketEventTable::standard(),
            logging: LoggingConfig::default(),
            driver: DriverConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// game
// ---------------------------------------------------------------------------

/// Game-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GameSection {
    /// Human-readable game name.
    #[serde(default = "default_game_name")]
    pub name: String,

    /// Seed for the map, dice, tie-breaks and market events.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Number of cycles before the game ends.
    #[serde(default = "default_total_cycles")]
    pub total_cycles: u32,

    /// Hex map radius. Radius 3 gives 37 territories.
    #[serde(default = "default_map_radius")]
    pub map_radius: u32,

    /// Seated players, in turn order.
    #[serde(default = "default_players")]
    pub players: Vec<PlayerConfig>,
}

impl GameSection {
    /// Apply `GUILDHALL_SEED` and `GUILDHALL_TOTAL_CYCLES`.
    ///
    /// Values that do not parse are ignored.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary lookup keyed by variable name.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(seed) = lookup(SEED_ENV).and_then(|v| v.trim().parse().ok()) {
            self.seed = seed;
        }
        if let Some(cycles) = lookup(TOTAL_CYCLES_ENV).and_then(|v| v.trim().parse().ok()) {
            self.total_cycles = cycles;
        }
    }
}

impl Default for GameSection {
    fn default() -> Self {
        Self {
            name: default_game_name(),
            seed: default_seed(),
            total_cycles: default_total_cycles(),
            map_radius: default_map_radius(),
            players: default_players(),
        }
    }
}

/// One seat at the table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PlayerConfig {
    /// Display name.
    pub name: String,

    /// Whether the AI stand-in plays this seat.
    #[serde(default = "default_true")]
    pub ai: bool,
}

fn default_game_name() -> String {
    "guildhall".to_owned()
}

const fn default_seed() -> u64 {
    42
}

const fn default_total_cycles() -> u32 {
    10
}

const fn default_map_radius() -> u32 {
    3
}

const fn default_true() -> bool {
    true
}

fn default_players() -> Vec<PlayerConfig> {
    ["Ashford", "Brackenridge", "Coldwater", "Dunmere"]
        .into_iter()
        .map(|name| PlayerConfig {
            name: name.to_owned(),
            ai: true,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// phases
// ---------------------------------------------------------------------------

/// Turn timing for the turn-sequenced phases.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PhasesConfig {
    /// Per-turn limit used when a phase has no entry in `time_limits`.
    #[serde(default = "default_time_limit_secs")]
    pub default_time_limit_secs: u64,

    /// Per-phase overrides of the turn limit.
    #[serde(default)]
    pub time_limits: BTreeMap<Phase, u64>,

    /// Seconds-remaining marks at which `timer.warning` fires.
    #[serde(default = "default_warning_marks")]
    pub warning_marks_secs: Vec<u64>,
}

impl PhasesConfig {
    /// Turn limit for `phase`, in seconds.
    pub fn time_limit_secs(&self, phase: Phase) -> u64 {
        self.time_limits
            .get(&phase)
            .copied()
            .unwrap_or(self.default_time_limit_secs)
    }
}

impl Default for PhasesConfig {
    fn default() -> Self {
        Self {
            default_time_limit_secs: default_time_limit_secs(),
            time_limits: BTreeMap::new(),
            warning_marks_secs: default_warning_marks(),
        }
    }
}

const fn default_time_limit_secs() -> u64 {
    120
}

fn default_warning_marks() -> Vec<u64> {
    vec![30, 15]
}

// ---------------------------------------------------------------------------
// auction
// ---------------------------------------------------------------------------

/// Auction window and reference prices.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuctionConfig {
    /// How long the books stay open.
    #[serde(default = "default_auction_secs")]
    pub duration_secs: u64,

    /// Minimum host time between periodic scans.
    #[serde(default = "default_scan_interval_ms")]
    pub scan_interval_ms: u64,

    /// Base reference price per resource, before market events.
    #[serde(default = "default_reference_prices")]
    pub reference_prices: BTreeMap<ResourceKind, u64>,
}

impl AuctionConfig {
    /// Auction window in milliseconds.
    pub const fn duration_ms(&self) -> u64 {
        self.duration_secs.saturating_mul(1_000)
    }
}

impl Default for AuctionConfig {
    fn default() -> Self {
        Self {
            duration_secs: default_auction_secs(),
            scan_interval_ms: default_scan_interval_ms(),
            reference_prices: default_reference_prices(),
        }
    }
}

const fn default_auction_secs() -> u64 {
    DEFAULT_AUCTION_SECS
}

const fn default_scan_interval_ms() -> u64 {
    DEFAULT_SCAN_INTERVAL_MS
}

fn default_reference_prices() -> BTreeMap<ResourceKind, u64> {
    BTreeMap::from([
        (ResourceKind::Food, 5),
        (ResourceKind::Wood, 8),
        (ResourceKind::Stone, 10),
        (ResourceKind::Ore, 14),
    ])
}

// ---------------------------------------------------------------------------
// economy
// ---------------------------------------------------------------------------

/// Starting balances and the guild tax.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EconomyConfig {
    /// Gold each player starts with.
    #[serde(default = "default_starting_gold")]
    pub starting_gold: u64,

    /// Resources each player starts with.
    #[serde(default = "default_starting_resources")]
    pub starting_resources: BTreeMap<ResourceKind, u64>,

    /// Fraction of every settled trade withheld as guild revenue.
    #[serde(default = "default_tax_rate")]
    pub tax_rate: Decimal,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            starting_gold: default_starting_gold(),
            starting_resources: default_starting_resources(),
            tax_rate: default_tax_rate(),
        }
    }
}

const fn default_starting_gold() -> u64 {
    500
}

fn default_starting_resources() -> BTreeMap<ResourceKind, u64> {
    BTreeMap::from([
        (ResourceKind::Food, 20),
        (ResourceKind::Wood, 10),
        (ResourceKind::Stone, 10),
        (ResourceKind::Ore, 5),
    ])
}

const fn default_tax_rate() -> Decimal {
    DEFAULT_TAX_RATE
}

// ---------------------------------------------------------------------------
// decay
// ---------------------------------------------------------------------------

/// Storage decay applied once per cycle.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DecayConfig {
    /// Fraction of the exposed amount lost per cycle, by resource.
    #[serde(default = "default_decay_rates")]
    pub rates: BTreeMap<ResourceKind, Decimal>,

    /// Units of each resource that never decay.
    #[serde(default = "default_protected_floor")]
    pub protected_floor: u64,
}

impl DecayConfig {
    /// Build the validated decay policy.
    pub fn policy(&self) -> Result<DecayPolicy, WorldError> {
        DecayPolicy::new(self.rates.clone(), self.protected_floor)
    }
}

impl Default for DecayConfig {
    fn default() -> Self {
        Self {
            rates: default_decay_rates(),
            protected_floor: default_protected_floor(),
        }
    }
}

fn default_decay_rates() -> BTreeMap<ResourceKind, Decimal> {
    BTreeMap::from([
        (ResourceKind::Food, Decimal::new(20, 2)),
        (ResourceKind::Wood, Decimal::new(10, 2)),
        (ResourceKind::Stone, Decimal::new(5, 2)),
        (ResourceKind::Ore, Decimal::new(5, 2)),
    ])
}

const fn default_protected_floor() -> u64 {
    10
}

// ---------------------------------------------------------------------------
// installation, logging, driver
// ---------------------------------------------------------------------------

/// Construct installation timing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InstallationConfig {
    /// Host time between starting an installation and rolling its outcome.
    #[serde(default = "default_installation_ms")]
    pub duration_ms: u64,
}

impl Default for InstallationConfig {
    fn default() -> Self {
        Self {
            duration_ms: default_installation_ms(),
        }
    }
}

const fn default_installation_ms() -> u64 {
    DEFAULT_INSTALLATION_MS
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_owned()
}

/// Host driver loop settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DriverConfig {
    /// Real-time milliseconds between polls.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

const fn default_poll_interval_ms() -> u64 {
    100
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = GameConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.game.total_cycles, 10);
        assert_eq!(config.game.players.len(), 4);
        assert_eq!(config.phases.time_limit_secs(Phase::TerritorySelection), 120);
        assert_eq!(config.phases.warning_marks_secs, vec![30, 15]);
        assert_eq!(config.auction.duration_ms(), 60_000);
        assert_eq!(config.economy.tax_rate, dec!(0.05));
        assert_eq!(config.installation.duration_ms, 3_000);
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r"
game:
  name: test-table
  seed: 7
  total_cycles: 3
  map_radius: 1
  players:
    - name: Ada
      ai: false
    - name: Brom
phases:
  default_time_limit_secs: 90
  time_limits:
    construct_outfitting: 180
  warning_marks_secs: [20, 10]
auction:
  duration_secs: 5
  scan_interval_ms: 250
  reference_prices:
    food: 3
economy:
  starting_gold: 1000
  starting_resources:
    ore: 2
  tax_rate: 0.1
decay:
  rates:
    food: 0.5
  protected_floor: 0
installation:
  duration_ms: 10
market_events:
  - name: Glut
    weight: 1
    modifiers:
      food: 0.5
logging:
  level: debug
  json: true
driver:
  poll_interval_ms: 20
";
        let config = GameConfig::parse(yaml).unwrap();
        assert_eq!(config.game.name, "test-table");
        assert_eq!(config.game.map_radius, 1);
        assert_eq!(config.game.players.len(), 2);
        assert!(!config.game.players.first().unwrap().ai);
        assert!(config.game.players.get(1).unwrap().ai);
        assert_eq!(config.phases.time_limit_secs(Phase::TerritorySelection), 90);
        assert_eq!(config.phases.time_limit_secs(Phase::ConstructOutfitting), 180);
        assert_eq!(config.auction.reference_prices.get(&ResourceKind::Food), Some(&3));
        assert_eq!(config.economy.tax_rate, dec!(0.1));
        assert_eq!(config.decay.protected_floor, 0);
        assert_eq!(config.market_events.entries().len(), 1);
        assert!(config.logging.json);
        assert_eq!(config.driver.poll_interval_ms, 20);
    }

    #[test]
    fn parse_minimal_yaml() {
        let config = GameConfig::parse("game:\n  total_cycles: 2\n").unwrap();
        assert_eq!(config.game.total_cycles, 2);
        assert_eq!(config.game.players.len(), 4);
        assert_eq!(config.market_events, MarketEventTable::standard());
    }

    #[test]
    fn parse_empty_yaml() {
        let config = GameConfig::parse("{}").unwrap();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.auction.scan_interval_ms, 1_000);
    }

    #[test]
    fn rejects_unplayable_values() {
        assert!(matches!(
            GameConfig::parse("game:\n  total_cycles: 0\n"),
            Err(ConfigError::Invalid { .. })
        ));
        assert!(matches!(
            GameConfig::parse("game:\n  players: []\n"),
            Err(ConfigError::Invalid { .. })
        ));
        assert!(matches!(
            GameConfig::parse("economy:\n  tax_rate: 1.5\n"),
            Err(ConfigError::Invalid { .. })
        ));
        assert!(matches!(
            GameConfig::parse("decay:\n  rates:\n    food: 2\n"),
            Err(ConfigError::Invalid { .. })
        ));
        assert!(matches!(
            GameConfig::parse("game: [unclosed"),
            Err(ConfigError::Yaml { .. })
        ));
    }

    #[test]
    fn overrides_replace_seed_and_cycles() {
        let mut game = GameSection::default();
        game.apply_overrides(|key| match key {
            SEED_ENV => Some("99".to_owned()),
            TOTAL_CYCLES_ENV => Some(" 4 ".to_owned()),
            _ => None,
        });
        assert_eq!(game.seed, 99);
        assert_eq!(game.total_cycles, 4);

        game.apply_overrides(|_| Some("not-a-number".to_owned()));
        assert_eq!(game.seed, 99);
    }

    #[test]
    fn load_project_config_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../guildhall-config.yaml");
        if path.exists() {
            let config = GameConfig::from_file(&path).unwrap();
            assert!(config.game.total_cycles > 0);
        }
    }
}
