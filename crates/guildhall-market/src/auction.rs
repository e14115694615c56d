//! Per-resource auction books and crossing-position matching.
//!
//! Each resource has one book holding at most one position per player.
//! A scan repeatedly pairs the best bid (highest price, earliest
//! submission) with the best ask (lowest price, earliest submission) while
//! the bid is at or above the ask. The trade executes at the ask price for
//! the smaller quantity and is queued with [`TransactionSettlement`] as a
//! pending transaction. Partially filled positions keep their remainder and
//! their time priority.

use std::collections::BTreeMap;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::{debug, info, warn};

use guildhall_events::{
    AuctionClosed, AuctionMatched, AuctionOpened, AuctionPositionUpdated, EventBus, GameEvent,
};
use guildhall_types::{
    AuctionPosition, MarketEvent, PlayerId, PositionMode, ResourceKind, TransactionId,
};

use crate::error::AuctionError;
use crate::settlement::TransactionSettlement;

/// Default auction window.
pub const DEFAULT_AUCTION_SECS: u64 = 60;

/// Default time between periodic scans.
pub const DEFAULT_SCAN_INTERVAL_MS: u64 = 1_000;

/// A position submission, as passed to
/// [`AuctionMatcher::update_player_position`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionRequest {
    /// Resource to trade.
    pub resource: ResourceKind,
    /// Limit price per unit.
    pub price: u64,
    /// Units wanted or offered. Zero withdraws the position.
    pub quantity: u64,
    /// Buy or sell.
    pub mode: PositionMode,
}

/// One executed cross.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuctionMatch {
    /// Resource traded.
    pub resource: ResourceKind,
    /// Buying player.
    pub buyer: PlayerId,
    /// Selling player.
    pub seller: PlayerId,
    /// Execution price, the ask.
    pub price: u64,
    /// Units traded.
    pub quantity: u64,
    /// Pending transaction queued for settlement.
    pub transaction: TransactionId,
}

/// The auction books, open window and reference prices.
#[derive(Debug, Clone)]
pub struct AuctionMatcher {
    books: BTreeMap<ResourceKind, Vec<AuctionPosition>>,
    open_cycle: Option<u32>,
    closes_at_ms: u64,
    last_scan_ms: u64,
    scan_interval_ms: u64,
    next_seq: u64,
    active_resource: ResourceKind,
    reference_prices: BTreeMap<ResourceKind, u64>,
    market_event: Option<MarketEvent>,
}

impl Default for AuctionMatcher {
    fn default() -> Self {
        Self::new(BTreeMap::new(), DEFAULT_SCAN_INTERVAL_MS)
    }
}

impl AuctionMatcher {
    /// Create a closed auction with base reference prices.
    pub const fn new(reference_prices: BTreeMap<ResourceKind, u64>, scan_interval_ms: u64) -> Self {
        Self {
            books: BTreeMap::new(),
            open_cycle: None,
            closes_at_ms: 0,
            last_scan_ms: 0,
            scan_interval_ms,
            next_seq: 0,
            active_resource: ResourceKind::Food,
            reference_prices,
            market_event: None,
        }
    }

    // -------------------------------------------------------------------
    // Window
    // -------------------------------------------------------------------

    /// Open the books for `cycle`, emitting `auction.opened`.
    pub fn open(
        &mut self,
        cycle: u32,
        now_ms: u64,
        duration_ms: u64,
        bus: &mut EventBus,
    ) -> Result<(), AuctionError> {
        if self.open_cycle.is_some() {
            return Err(AuctionError::AlreadyOpen);
        }
        self.open_cycle = Some(cycle);
        self.closes_at_ms = now_ms.saturating_add(duration_ms);
        self.last_scan_ms = now_ms;

        info!(cycle, closes_at_ms = self.closes_at_ms, "Auction opened");
        bus.publish(GameEvent::AuctionOpened(AuctionOpened {
            cycle,
            closes_at_ms: self.closes_at_ms,
        }));
        Ok(())
    }

    /// Whether positions are accepted.
    pub const fn is_open(&self) -> bool {
        self.open_cycle.is_some()
    }

    /// When the open window ends.
    pub const fn closes_at_ms(&self) -> Option<u64> {
        match self.open_cycle {
            Some(_) => Some(self.closes_at_ms),
            None => None,
        }
    }

    /// Whether the open window has run out at `now_ms`.
    pub const fn is_expired(&self, now_ms: u64) -> bool {
        self.open_cycle.is_some() && now_ms >= self.closes_at_ms
    }

    /// Run a final scan over every resource, clear the books and close.
    /// Emits `auction.closed` with the number of unfilled positions cleared.
    pub fn close(
        &mut self,
        now_ms: u64,
        settlement: &mut TransactionSettlement,
        bus: &mut EventBus,
    ) -> Vec<AuctionMatch> {
        let Some(cycle) = self.open_cycle else {
            return Vec::new();
        };
        let matches = self.scan_all(now_ms, settlement, bus);

        let cleared = self.books.values().map(Vec::len).sum::<usize>();
        let cleared = u32::try_from(cleared).unwrap_or(u32::MAX);
        self.books.clear();
        self.open_cycle = None;

        info!(cycle, matched = matches.len(), cleared, "Auction closed");
        bus.publish(GameEvent::AuctionClosed(AuctionClosed { cycle, cleared }));
        matches
    }

    /// Scan the active resource if the scan interval has elapsed.
    pub fn poll(
        &mut self,
        now_ms: u64,
        settlement: &mut TransactionSettlement,
        bus: &mut EventBus,
    ) -> Vec<AuctionMatch> {
        if !self.is_open() || now_ms < self.last_scan_ms.saturating_add(self.scan_interval_ms) {
            return Vec::new();
        }
        self.last_scan_ms = now_ms;
        self.scan(now_ms, settlement, bus)
    }

    // -------------------------------------------------------------------
    // Positions
    // -------------------------------------------------------------------

    /// Set, replace or withdraw `player`'s position, emitting
    /// `auction.position_updated`.
    ///
    /// A new submission replaces the earlier one and its time priority.
    /// Quantity zero withdraws.
    pub fn update_player_position(
        &mut self,
        player: PlayerId,
        request: PositionRequest,
        now_ms: u64,
        bus: &mut EventBus,
    ) -> Result<(), AuctionError> {
        let PositionRequest {
            resource,
            price,
            quantity,
            mode,
        } = request;
        if !self.is_open() {
            return Err(AuctionError::BookClosed { resource });
        }
        if quantity > 0 && price == 0 {
            return Err(AuctionError::ZeroPrice);
        }

        let book = self.books.entry(resource).or_default();
        book.retain(|p| p.player != player);

        let position = AuctionPosition {
            player,
            resource,
            price,
            quantity,
            mode,
            seq: self.next_seq,
            submitted_at_ms: now_ms,
        };
        self.next_seq = self.next_seq.saturating_add(1);

        debug!(?player, %resource, price, quantity, ?mode, "Auction position updated");
        bus.publish(GameEvent::AuctionPositionUpdated(AuctionPositionUpdated::from(
            &position,
        )));
        if quantity > 0 {
            book.push(position);
        }
        Ok(())
    }

    /// `player`'s standing position on `resource`.
    pub fn position(&self, player: PlayerId, resource: ResourceKind) -> Option<&AuctionPosition> {
        self.book(resource).iter().find(|p| p.player == player)
    }

    /// Every standing position on `resource`, in submission order.
    pub fn book(&self, resource: ResourceKind) -> &[AuctionPosition] {
        self.books.get(&resource).map_or(&[], Vec::as_slice)
    }

    // -------------------------------------------------------------------
    // Matching
    // -------------------------------------------------------------------

    /// Resource scanned by [`Self::scan`].
    pub const fn active_resource(&self) -> ResourceKind {
        self.active_resource
    }

    /// Choose the resource scanned by [`Self::scan`].
    pub const fn set_active_resource(&mut self, resource: ResourceKind) {
        self.active_resource = resource;
    }

    /// Match crossing positions on the active resource.
    pub fn scan(
        &mut self,
        now_ms: u64,
        settlement: &mut TransactionSettlement,
        bus: &mut EventBus,
    ) -> Vec<AuctionMatch> {
        self.scan_resource(self.active_resource, now_ms, settlement, bus)
    }

    /// Match crossing positions on every resource.
    pub fn scan_all(
        &mut self,
        now_ms: u64,
        settlement: &mut TransactionSettlement,
        bus: &mut EventBus,
    ) -> Vec<AuctionMatch> {
        ResourceKind::ALL
            .into_iter()
            .flat_map(|resource| self.scan_resource(resource, now_ms, settlement, bus))
            .collect()
    }

    /// Match crossing positions on one resource until no cross remains.
    pub fn scan_resource(
        &mut self,
        resource: ResourceKind,
        now_ms: u64,
        settlement: &mut TransactionSettlement,
        bus: &mut EventBus,
    ) -> Vec<AuctionMatch> {
        let mut matches = Vec::new();
        let Some(book) = self.books.get_mut(&resource) else {
            return matches;
        };

        while let Some((bid_at, ask_at)) = best_cross(book) {
            let (Some(bid), Some(ask)) = (book.get(bid_at), book.get(ask_at)) else {
                break;
            };
            let (buyer, seller, price) = (bid.player, ask.player, ask.price);
            let quantity = bid.quantity.min(ask.quantity);

            let transaction = match settlement
                .create_transaction(buyer, seller, resource, price, quantity, now_ms, bus)
            {
                Ok(id) => id,
                Err(err) => {
                    warn!(%resource, ?buyer, ?seller, error = %err, "Auction cross could not be queued");
                    break;
                }
            };

            for at in [bid_at, ask_at] {
                if let Some(position) = book.get_mut(at) {
                    position.quantity = position.quantity.saturating_sub(quantity);
                }
            }
            book.retain(|p| p.quantity > 0);

            info!(%resource, ?buyer, ?seller, price, quantity, "Auction matched");
            bus.publish(GameEvent::AuctionMatched(AuctionMatched {
                resource,
                buyer,
                seller,
                price,
                quantity,
                transaction: Some(transaction),
            }));
            matches.push(AuctionMatch {
                resource,
                buyer,
                seller,
                price,
                quantity,
                transaction,
            });
        }
        matches
    }

    // -------------------------------------------------------------------
    // Reference prices
    // -------------------------------------------------------------------

    /// Apply a market event's modifiers to displayed reference prices.
    pub fn apply_market_event(&mut self, event: MarketEvent) {
        self.market_event = Some(event);
    }

    /// Drop the current market event.
    pub fn clear_market_event(&mut self) -> Option<MarketEvent> {
        self.market_event.take()
    }

    /// The market event in force.
    pub const fn market_event(&self) -> Option<&MarketEvent> {
        self.market_event.as_ref()
    }

    /// Displayed reference price for `resource`: the base price times the
    /// active market event's modifier, rounded half away from zero.
    pub fn reference_price(&self, resource: ResourceKind) -> u64 {
        let base = self.reference_prices.get(&resource).copied().unwrap_or(0);
        let modifier = self
            .market_event
            .as_ref()
            .and_then(|e| e.modifiers.get(&resource).copied())
            .unwrap_or(Decimal::ONE);
        Decimal::from(base)
            .checked_mul(modifier)
            .map(|v| v.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
            .and_then(|v| v.to_u64())
            .unwrap_or(base)
    }
}

/// Indices of the best bid and best ask when they cross.
fn best_cross(book: &[AuctionPosition]) -> Option<(usize, usize)> {
    let (bid_at, bid) = book
        .iter()
        .enumerate()
        .filter(|(_, p)| p.mode == PositionMode::Buy)
        .min_by(|(_, a), (_, b)| b.price.cmp(&a.price).then(a.seq.cmp(&b.seq)))?;
    let (ask_at, ask) = book
        .iter()
        .enumerate()
        .filter(|(_, p)| p.mode == PositionMode::Sell)
        .min_by(|(_, a), (_, b)| a.price.cmp(&b.price).then(a.seq.cmp(&b.seq)))?;
    (bid.price >= ask.price).then_some((bid_at, ask_at))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use guildhall_events::EventKind;
    use guildhall_types::RejectionReason;
    use rust_decimal_macros::dec;

    use super::*;

    fn buy(price: u64, quantity: u64) -> PositionRequest {
        PositionRequest {
            resource: ResourceKind::Wood,
            price,
            quantity,
            mode: PositionMode::Buy,
        }
    }

    fn sell(price: u64, quantity: u64) -> PositionRequest {
        PositionRequest {
            mode: PositionMode::Sell,
            ..buy(price, quantity)
        }
    }

    fn open_matcher(bus: &mut EventBus) -> AuctionMatcher {
        let mut matcher = AuctionMatcher::default();
        matcher.set_active_resource(ResourceKind::Wood);
        matcher.open(1, 0, 60_000, bus).unwrap();
        matcher
    }

    #[test]
    fn closed_book_rejects_positions() {
        let mut matcher = AuctionMatcher::default();
        let mut bus = EventBus::new();
        let err = matcher
            .update_player_position(PlayerId::new(), buy(10, 1), 0, &mut bus)
            .unwrap_err();
        assert_eq!(err.reason(), RejectionReason::PhaseMismatch);
    }

    #[test]
    fn crossing_positions_trade_at_the_ask() {
        let mut bus = EventBus::new();
        let mut matcher = open_matcher(&mut bus);
        let mut settlement = TransactionSettlement::default();
        let (b, s) = (PlayerId::new(), PlayerId::new());

        matcher.update_player_position(b, buy(60, 5), 1, &mut bus).unwrap();
        matcher.update_player_position(s, sell(50, 5), 2, &mut bus).unwrap();
        let matches = matcher.scan(3, &mut settlement, &mut bus);

        assert_eq!(matches.len(), 1);
        let m = matches.first().unwrap();
        assert_eq!((m.price, m.quantity, m.buyer, m.seller), (50, 5, b, s));
        assert!(matcher.book(ResourceKind::Wood).is_empty());
        assert_eq!(settlement.pending_len(), 1);
        assert_eq!(bus.count_of(EventKind::AuctionMatched), 1);
        assert_eq!(bus.count_of(EventKind::TransactionCreated), 1);
    }

    #[test]
    fn partial_fill_keeps_the_remainder() {
        let mut bus = EventBus::new();
        let mut matcher = open_matcher(&mut bus);
        let mut settlement = TransactionSettlement::default();
        let (b, s) = (PlayerId::new(), PlayerId::new());

        matcher.update_player_position(b, buy(40, 10), 1, &mut bus).unwrap();
        matcher.update_player_position(s, sell(40, 4), 2, &mut bus).unwrap();
        matcher.scan(3, &mut settlement, &mut bus);

        assert_eq!(matcher.position(b, ResourceKind::Wood).unwrap().quantity, 6);
        assert!(matcher.position(s, ResourceKind::Wood).is_none());
    }

    #[test]
    fn earliest_submission_wins_a_price_tie() {
        let mut bus = EventBus::new();
        let mut matcher = open_matcher(&mut bus);
        let mut settlement = TransactionSettlement::default();
        let (first, second, seller) = (PlayerId::new(), PlayerId::new(), PlayerId::new());

        matcher.update_player_position(first, buy(30, 2), 1, &mut bus).unwrap();
        matcher.update_player_position(second, buy(30, 2), 2, &mut bus).unwrap();
        matcher.update_player_position(seller, sell(25, 2), 3, &mut bus).unwrap();
        let matches = matcher.scan(4, &mut settlement, &mut bus);

        assert_eq!(matches.first().unwrap().buyer, first);
        assert!(matcher.position(second, ResourceKind::Wood).is_some());
    }

    #[test]
    fn resubmission_loses_time_priority_and_zero_withdraws() {
        let mut bus = EventBus::new();
        let mut matcher = open_matcher(&mut bus);
        let mut settlement = TransactionSettlement::default();
        let (a, b, seller) = (PlayerId::new(), PlayerId::new(), PlayerId::new());

        matcher.update_player_position(a, buy(30, 2), 1, &mut bus).unwrap();
        matcher.update_player_position(b, buy(30, 2), 2, &mut bus).unwrap();
        matcher.update_player_position(a, buy(30, 2), 3, &mut bus).unwrap();
        matcher.update_player_position(seller, sell(30, 2), 4, &mut bus).unwrap();
        let matches = matcher.scan(5, &mut settlement, &mut bus);
        assert_eq!(matches.first().unwrap().buyer, b);

        matcher.update_player_position(a, buy(30, 0), 6, &mut bus).unwrap();
        assert!(matcher.position(a, ResourceKind::Wood).is_none());
    }

    #[test]
    fn no_cross_no_trade() {
        let mut bus = EventBus::new();
        let mut matcher = open_matcher(&mut bus);
        let mut settlement = TransactionSettlement::default();

        matcher.update_player_position(PlayerId::new(), buy(10, 1), 1, &mut bus).unwrap();
        matcher.update_player_position(PlayerId::new(), sell(11, 1), 2, &mut bus).unwrap();

        assert!(matcher.scan_all(3, &mut settlement, &mut bus).is_empty());
        assert_eq!(matcher.book(ResourceKind::Wood).len(), 2);
    }

    #[test]
    fn close_clears_remaining_positions() {
        let mut bus = EventBus::new();
        let mut matcher = open_matcher(&mut bus);
        let mut settlement = TransactionSettlement::default();
        matcher.update_player_position(PlayerId::new(), buy(10, 1), 1, &mut bus).unwrap();

        matcher.close(2, &mut settlement, &mut bus);

        assert!(!matcher.is_open());
        assert!(matcher.book(ResourceKind::Wood).is_empty());
        let closed: Vec<_> = bus.history_of(EventKind::AuctionClosed).collect();
        assert!(matches!(
            closed.first(),
            Some(GameEvent::AuctionClosed(AuctionClosed { cleared: 1, .. }))
        ));
    }

    #[test]
    fn poll_respects_the_scan_interval() {
        let mut bus = EventBus::new();
        let mut matcher = open_matcher(&mut bus);
        let mut settlement = TransactionSettlement::default();
        matcher.update_player_position(PlayerId::new(), buy(10, 1), 1, &mut bus).unwrap();
        matcher.update_player_position(PlayerId::new(), sell(10, 1), 2, &mut bus).unwrap();

        assert!(matcher.poll(500, &mut settlement, &mut bus).is_empty());
        assert_eq!(matcher.poll(1_000, &mut settlement, &mut bus).len(), 1);
    }

    #[test]
    fn poll_leaves_other_books_for_the_closing_sweep() {
        let mut bus = EventBus::new();
        let mut matcher = open_matcher(&mut bus);
        let mut settlement = TransactionSettlement::default();
        let food = |mode| PositionRequest {
            resource: ResourceKind::Food,
            price: 8,
            quantity: 3,
            mode,
        };
        matcher
            .update_player_position(PlayerId::new(), food(PositionMode::Buy), 1, &mut bus)
            .unwrap();
        matcher
            .update_player_position(PlayerId::new(), food(PositionMode::Sell), 2, &mut bus)
            .unwrap();

        assert!(matcher.poll(1_000, &mut settlement, &mut bus).is_empty());
        assert_eq!(matcher.book(ResourceKind::Food).len(), 2);

        let matches = matcher.close(2_000, &mut settlement, &mut bus);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches.first().unwrap().resource, ResourceKind::Food);
    }

    #[test]
    fn market_events_move_reference_prices_only() {
        let mut matcher = AuctionMatcher::new(BTreeMap::from([(ResourceKind::Food, 20)]), 1_000);
        assert_eq!(matcher.reference_price(ResourceKind::Food), 20);

        matcher.apply_market_event(MarketEvent {
            name: "Famine".to_owned(),
            cycle: 2,
            modifiers: BTreeMap::from([(ResourceKind::Food, dec!(1.5))]),
        });
        assert_eq!(matcher.reference_price(ResourceKind::Food), 30);
        assert_eq!(matcher.reference_price(ResourceKind::Ore), 0);

        matcher.clear_market_event();
        assert_eq!(matcher.reference_price(ResourceKind::Food), 20);
    }
}
