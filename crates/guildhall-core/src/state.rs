//! The complete mutable state of one game.
//!
//! [`GameState`] owns every component. The orchestrator holds it and lends
//! `&mut` borrows to one component operation at a time, so ledger balances
//! and territory ownership only change through their own operations.

use std::cmp::Reverse;

use tracing::info;

use guildhall_constructs::{ConstructRegistry, InstallationEngine};
use guildhall_events::EventBus;
use guildhall_ledger::{LedgerError, ResourceLedger};
use guildhall_market::{AuctionMatcher, MarketEventTable, SettlementError, TransactionSettlement};
use guildhall_types::{Player, PlayerId, PlayerSnapshot, ResourceKind, Standing};
use guildhall_world::{DecayPolicy, TerritoryRegistry, WorldError, build_hex_map};

use crate::config::GameConfig;

/// Errors raised while setting up a game from configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SetupError {
    /// The map or decay policy could not be built.
    #[error("world setup failed: {0}")]
    World(#[from] WorldError),

    /// A starting account could not be opened.
    #[error("ledger setup failed: {0}")]
    Ledger(#[from] LedgerError),

    /// The tax rate was rejected.
    #[error("settlement setup failed: {0}")]
    Settlement(#[from] SettlementError),
}

/// Everything a game holds.
#[derive(Debug)]
pub struct GameState {
    /// Seated players in seat order.
    pub players: Vec<Player>,
    /// Map, ownership and pending claims.
    pub territories: TerritoryRegistry,
    /// Every construct ever bought.
    pub constructs: ConstructRegistry,
    /// In-flight installations.
    pub installations: InstallationEngine,
    /// Balances, guild revenue and the journal.
    pub ledger: ResourceLedger,
    /// Pending and settled transactions.
    pub settlement: TransactionSettlement,
    /// Auction books and reference prices.
    pub auction: AuctionMatcher,
    /// Storage decay rates.
    pub decay: DecayPolicy,
    /// Market events rolled at the end of each cycle.
    pub market_events: MarketEventTable,
    /// The event bus every component publishes to.
    pub bus: EventBus,
    /// Game seed.
    pub seed: u64,
}

impl GameState {
    /// Build the map, seat the players and open their accounts.
    pub fn from_config(config: &GameConfig) -> Result<Self, SetupError> {
        let territories = build_hex_map(config.game.map_radius, config.game.seed)?;
        let mut ledger = ResourceLedger::new();
        let mut players = Vec::with_capacity(config.game.players.len());
        for (seat, seat_config) in (0u32..).zip(&config.game.players) {
            let player = Player {
                id: PlayerId::new(),
                name: seat_config.name.clone(),
                is_ai: seat_config.ai,
                seat,
            };
            ledger.open_account(
                player.id,
                config.economy.starting_gold,
                &config.economy.starting_resources,
            )?;
            players.push(player);
        }

        info!(
            players = players.len(),
            territories = territories.len(),
            seed = config.game.seed,
            "Game state assembled"
        );

        Ok(Self {
            players,
            territories,
            constructs: ConstructRegistry::new(),
            installations: InstallationEngine::new(config.installation.duration_ms),
            ledger,
            settlement: TransactionSettlement::new(config.economy.tax_rate)?,
            auction: AuctionMatcher::new(
                config.auction.reference_prices.clone(),
                config.auction.scan_interval_ms,
            ),
            decay: config.decay.policy()?,
            market_events: config.market_events.clone(),
            bus: EventBus::new(),
            seed: config.game.seed,
        })
    }

    /// Player lookup.
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    /// Player ids in seat order.
    pub fn seat_order(&self) -> Vec<PlayerId> {
        self.players.iter().map(|p| p.id).collect()
    }

    /// Read model of one player.
    pub fn snapshot(&self, id: PlayerId) -> Option<PlayerSnapshot> {
        let player = self.player(id)?;
        let account = self.ledger.account(id)?;
        Some(PlayerSnapshot {
            id,
            name: player.name.clone(),
            is_ai: player.is_ai,
            gold: account.gold(),
            resources: account.resources().clone(),
            constructs: self.constructs.owned_by(id),
            territories: self.territories.owned_by(id),
        })
    }

    /// Read models of every player, in seat order.
    pub fn snapshots(&self) -> Vec<PlayerSnapshot> {
        self.players
            .iter()
            .filter_map(|p| self.snapshot(p.id))
            .collect()
    }

    /// Stored resources valued at the current reference prices.
    pub fn resource_value(&self, id: PlayerId) -> u64 {
        ResourceKind::ALL.iter().fold(0u64, |acc, &kind| {
            let held = self.ledger.resource(id, kind).unwrap_or(0);
            acc.saturating_add(held.saturating_mul(self.auction.reference_price(kind)))
        })
    }

    /// Players ranked by net worth. Ties keep seat order.
    pub fn standings(&self) -> Vec<Standing> {
        let mut rows: Vec<(u32, Standing)> = self
            .players
            .iter()
            .map(|p| {
                let gold = self.ledger.gold(p.id).unwrap_or(0);
                let resource_value = self.resource_value(p.id);
                let territories =
                    u32::try_from(self.territories.owned_by(p.id).len()).unwrap_or(u32::MAX);
                (
                    p.seat,
                    Standing {
                        rank: 0,
                        player: p.id,
                        name: p.name.clone(),
                        gold,
                        resource_value,
                        territories,
                        net_worth: gold.saturating_add(resource_value),
                    },
                )
            })
            .collect();
        rows.sort_by_key(|(seat, s)| (Reverse(s.net_worth), *seat));

        (1u32..)
            .zip(rows)
            .map(|(rank, (_, standing))| Standing { rank, ..standing })
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use guildhall_events::EventBus;

    use super::*;

    fn small_config() -> GameConfig {
        let mut config = GameConfig::default();
        config.game.map_radius = 1;
        config
    }

    #[test]
    fn seats_players_with_starting_balances() {
        let state = GameState::from_config(&small_config()).unwrap();
        assert_eq!(state.players.len(), 4);
        assert_eq!(state.territories.len(), 7);
        for (seat, player) in (0u32..).zip(&state.players) {
            assert_eq!(player.seat, seat);
            let snapshot = state.snapshot(player.id).unwrap();
            assert_eq!(snapshot.gold, 500);
            assert_eq!(snapshot.resources.get(&ResourceKind::Food), Some(&20));
            assert!(snapshot.territories.is_empty());
        }
    }

    #[test]
    fn standings_rank_by_net_worth_then_seat() {
        let mut state = GameState::from_config(&small_config()).unwrap();
        let mut bus = EventBus::new();
        let last = state.players.last().unwrap().id;
        state
            .ledger
            .add_gold(last, 100, "test_grant", None, &mut bus)
            .unwrap();

        let standings = state.standings();
        let first = standings.first().unwrap();
        assert_eq!(first.player, last);
        assert_eq!(first.rank, 1);
        assert_eq!(first.gold, 600);
        // 20*5 + 10*8 + 10*10 + 5*14 = 350
        assert_eq!(first.resource_value, 350);
        assert_eq!(first.net_worth, 950);

        let rest: Vec<PlayerId> = standings.iter().skip(1).map(|s| s.player).collect();
        let seats: Vec<PlayerId> = state.players.iter().take(3).map(|p| p.id).collect();
        assert_eq!(rest, seats);
        let ranks: Vec<u32> = standings.iter().map(|s| s.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3, 4]);
    }
}
