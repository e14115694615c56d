//! Decision sources for AI-controlled seats.
//!
//! The host asks a [`DecisionSource`] for the current player's next
//! [`Action`] while it is their turn, and for auction positions once the
//! books open. Strategy quality is not a goal: [`RandomDecisionSource`] is a
//! stochastic stand-in that keeps games moving, and
//! [`PassingDecisionSource`] forfeits every turn.

use rand::rngs::SmallRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};

use guildhall_constructs::{spec, upgrade_cost};
use guildhall_market::PositionRequest;
use guildhall_types::{
    ConstructStatus, ConstructType, Phase, PlayerId, PositionMode, ResourceKind, TerritoryId,
};

use crate::actions::Action;
use crate::state::GameState;

/// Actions the random source takes per outfitting turn before passing.
const MAX_OUTFIT_ACTIONS: u32 = 3;

/// Holding above which the random source offers half its stock.
const SELL_ABOVE: u64 = 30;

/// Holding below which the random source bids for more.
const BUY_BELOW: u64 = 10;

/// Units the random source bids for.
const BUY_QUANTITY: u64 = 10;

/// Errors that can occur while deciding.
#[derive(Debug, thiserror::Error)]
pub enum DecisionError {
    /// An internal error in the decision source.
    #[error("decision source error: {message}")]
    Internal {
        /// Description of the error.
        message: String,
    },
}

/// What a decision source sees.
#[derive(Debug, Clone, Copy)]
pub struct DecisionContext<'a> {
    /// Current cycle.
    pub cycle: u32,
    /// Current phase.
    pub phase: Phase,
    /// The deciding player.
    pub player: PlayerId,
    /// Read-only game state.
    pub state: &'a GameState,
}

/// A source of player decisions.
pub trait DecisionSource: core::fmt::Debug {
    /// The next action for the current player's turn. Called repeatedly
    /// until it returns [`Action::Pass`] or the turn ends.
    fn next_action(&mut self, ctx: &DecisionContext<'_>) -> Result<Action, DecisionError>;

    /// Positions to set when the auction opens.
    fn auction_positions(
        &mut self,
        ctx: &DecisionContext<'_>,
    ) -> Result<Vec<PositionRequest>, DecisionError>;
}

/// Passes every turn and never trades.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassingDecisionSource;

impl PassingDecisionSource {
    /// Create a passing decision source.
    pub const fn new() -> Self {
        Self
    }
}

impl DecisionSource for PassingDecisionSource {
    fn next_action(&mut self, _ctx: &DecisionContext<'_>) -> Result<Action, DecisionError> {
        Ok(Action::Pass)
    }

    fn auction_positions(
        &mut self,
        _ctx: &DecisionContext<'_>,
    ) -> Result<Vec<PositionRequest>, DecisionError> {
        Ok(Vec::new())
    }
}

/// Seeded random play: claim one territory per selection turn, buy and
/// install constructs on empty land, occasionally upgrade, and trade
/// surpluses near the reference price.
#[derive(Debug, Clone)]
pub struct RandomDecisionSource {
    rng: SmallRng,
    turn: Option<(u32, Phase, PlayerId)>,
    actions_taken: u32,
}

impl RandomDecisionSource {
    /// Create a source from a seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
            turn: None,
            actions_taken: 0,
        }
    }

    fn claim(&mut self, ctx: &DecisionContext<'_>) -> Option<Action> {
        let territories = &ctx.state.territories;
        let open: Vec<TerritoryId> = territories
            .unowned()
            .into_iter()
            .filter(|&t| territories.claim_status(ctx.player, t).is_none())
            .collect();
        open.choose(&mut self.rng)
            .map(|&territory| Action::ClaimTerritory { territory })
    }

    fn outfit(&mut self, ctx: &DecisionContext<'_>) -> Option<Action> {
        let state = ctx.state;
        let gold = state.ledger.gold(ctx.player).unwrap_or(0);
        let empty: Vec<TerritoryId> = state
            .territories
            .owned_by(ctx.player)
            .into_iter()
            .filter(|&t| {
                !state.installations.is_in_flight(t)
                    && state.territories.get(t).is_some_and(|x| x.construct.is_none())
            })
            .collect();
        let inventory = state.constructs.inventory_of(ctx.player);

        if let (Some(&construct), false) = (inventory.first(), empty.is_empty()) {
            let ideal = state
                .constructs
                .get(construct)
                .map(|c| c.construct_type.ideal_terrain());
            let territory = empty
                .iter()
                .copied()
                .find(|&t| state.territories.get(t).map(|x| x.terrain) == ideal)
                .or_else(|| empty.first().copied())?;
            return Some(Action::InstallConstruct {
                construct,
                territory,
            });
        }

        if empty.len() > inventory.len() {
            let target = empty
                .choose(&mut self.rng)
                .and_then(|&t| state.territories.get(t))
                .map(|t| t.terrain);
            let construct_type = ConstructType::ALL
                .iter()
                .copied()
                .find(|c| Some(c.ideal_terrain()) == target)
                .or_else(|| ConstructType::ALL.choose(&mut self.rng).copied())?;
            if gold >= spec(construct_type).price {
                return Some(Action::PurchaseConstruct { construct_type });
            }
        }

        if self.rng.random_bool(0.5) {
            let upgradable = state.constructs.iter().find(|c| {
                c.owner == ctx.player
                    && c.status == ConstructStatus::Active
                    && upgrade_cost(c.construct_type, c.level).is_some_and(|cost| cost <= gold)
            })?;
            return Some(Action::UpgradeConstruct {
                construct: upgradable.id,
            });
        }
        None
    }

    fn scaled(&mut self, price: u64, low_pct: u64, high_pct: u64) -> u64 {
        let pct = self.rng.random_range(low_pct..=high_pct);
        price
            .saturating_mul(pct)
            .checked_div(100)
            .unwrap_or(price)
            .max(1)
    }
}

impl DecisionSource for RandomDecisionSource {
    fn next_action(&mut self, ctx: &DecisionContext<'_>) -> Result<Action, DecisionError> {
        let key = (ctx.cycle, ctx.phase, ctx.player);
        if self.turn != Some(key) {
            self.turn = Some(key);
            self.actions_taken = 0;
        }
        let limit = match ctx.phase {
            Phase::TerritorySelection => 1,
            Phase::ConstructOutfitting => MAX_OUTFIT_ACTIONS,
            _ => 0,
        };
        if self.actions_taken >= limit {
            return Ok(Action::Pass);
        }
        self.actions_taken = self.actions_taken.saturating_add(1);

        let action = match ctx.phase {
            Phase::TerritorySelection => self.claim(ctx),
            Phase::ConstructOutfitting => self.outfit(ctx),
            _ => None,
        };
        Ok(action.unwrap_or(Action::Pass))
    }

    fn auction_positions(
        &mut self,
        ctx: &DecisionContext<'_>,
    ) -> Result<Vec<PositionRequest>, DecisionError> {
        let state = ctx.state;
        let gold = state.ledger.gold(ctx.player).unwrap_or(0);
        let mut positions = Vec::new();
        for resource in ResourceKind::ALL {
            let reference = state.auction.reference_price(resource);
            if reference == 0 {
                continue;
            }
            let held = state.ledger.resource(ctx.player, resource).unwrap_or(0);
            if held > SELL_ABOVE {
                positions.push(PositionRequest {
                    resource,
                    price: self.scaled(reference, 90, 110),
                    quantity: held.checked_div(2).unwrap_or(0),
                    mode: PositionMode::Sell,
                });
            } else if held < BUY_BELOW {
                let price = self.scaled(reference, 95, 120);
                if price.saturating_mul(BUY_QUANTITY).saturating_mul(2) <= gold {
                    positions.push(PositionRequest {
                        resource,
                        price,
                        quantity: BUY_QUANTITY,
                        mode: PositionMode::Buy,
                    });
                }
            }
        }
        Ok(positions)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use guildhall_world::ClaimContext;

    use super::*;
    use crate::config::GameConfig;

    fn state() -> GameState {
        let mut config = GameConfig::default();
        config.game.map_radius = 1;
        GameState::from_config(&config).unwrap()
    }

    fn ctx(state: &GameState, phase: Phase) -> DecisionContext<'_> {
        DecisionContext {
            cycle: 1,
            phase,
            player: state.players.first().unwrap().id,
            state,
        }
    }

    #[test]
    fn passing_source_always_passes() {
        let state = state();
        let mut source = PassingDecisionSource::new();
        let ctx = ctx(&state, Phase::TerritorySelection);
        assert_eq!(source.next_action(&ctx).unwrap(), Action::Pass);
        assert!(source.auction_positions(&ctx).unwrap().is_empty());
    }

    #[test]
    fn random_source_claims_once_per_turn() {
        let state = state();
        let mut source = RandomDecisionSource::new(5);
        let ctx = ctx(&state, Phase::TerritorySelection);
        assert!(matches!(
            source.next_action(&ctx).unwrap(),
            Action::ClaimTerritory { .. }
        ));
        assert_eq!(source.next_action(&ctx).unwrap(), Action::Pass);
    }

    #[test]
    fn random_source_skips_territories_it_already_claimed() {
        let mut state = state();
        let player = state.players.first().unwrap().id;
        let ids: Vec<TerritoryId> = state.territories.iter().map(|t| t.id).collect();
        let claim_ctx = ClaimContext {
            cycle: 1,
            phase: Phase::TerritorySelection,
            now_ms: 0,
        };
        for &id in ids.iter().skip(1) {
            state
                .territories
                .attempt_claim(player, id, claim_ctx, &mut state.bus)
                .unwrap();
        }

        let mut source = RandomDecisionSource::new(1);
        let action = source
            .next_action(&ctx(&state, Phase::TerritorySelection))
            .unwrap();
        assert_eq!(
            action,
            Action::ClaimTerritory {
                territory: ids[0]
            }
        );
    }

    #[test]
    fn random_source_passes_outside_turn_phases() {
        let state = state();
        let mut source = RandomDecisionSource::new(3);
        let action = source.next_action(&ctx(&state, Phase::ResourceDecay)).unwrap();
        assert_eq!(action, Action::Pass);
    }

    #[test]
    fn random_source_bids_for_scarce_resources() {
        let state = state();
        let mut source = RandomDecisionSource::new(9);
        let positions = source
            .auction_positions(&ctx(&state, Phase::AuctionPhase))
            .unwrap();
        // Starting ore (5) is below the buy threshold; nothing exceeds the
        // sell threshold.
        assert_eq!(positions.len(), 1);
        let bid = positions.first().unwrap();
        assert_eq!(bid.resource, ResourceKind::Ore);
        assert_eq!(bid.mode, PositionMode::Buy);
        assert!((13..=16).contains(&bid.price));
    }
}
