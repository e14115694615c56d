//! FIFO settlement of pending transactions with a guild tax.
//!
//! Creating a transaction moves nothing. Settlement drains the queue in
//! creation order and, for each transaction:
//!
//! ```text
//! total = unit_price * quantity
//! tax   = round_half_away_from_zero(total * tax_rate)
//! net   = total - tax
//! ```
//!
//! The buyer pays `total`, the seller receives `net`, the guild receives
//! `tax`, and the resource moves seller to buyer. All legs apply or none do.
//! Failed transactions stay in history and are never retried.

use std::collections::VecDeque;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::{debug, info, warn};

use guildhall_events::{EventBus, GameEvent, TradeFailed, TradeSettled, TransactionCreated};
use guildhall_ledger::{ResourceLedger, TradeLegs};
use guildhall_types::{PlayerId, ResourceKind, Transaction, TransactionId, TransactionStatus};

use crate::error::SettlementError;

/// Default guild tax: 5%.
pub const DEFAULT_TAX_RATE: Decimal = Decimal::from_parts(5, 0, 0, false, 2);

/// Outcome of one settlement batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Transactions that completed, in settlement order.
    pub succeeded: Vec<TransactionId>,
    /// Transactions that failed, in settlement order.
    pub failed: Vec<TransactionId>,
    /// The error behind each failure.
    pub errors: Vec<(TransactionId, SettlementError)>,
}

/// The pending queue and settled history.
#[derive(Debug, Clone)]
pub struct TransactionSettlement {
    queue: VecDeque<Transaction>,
    history: Vec<Transaction>,
    tax_rate: Decimal,
    next_seq: u64,
}

impl Default for TransactionSettlement {
    fn default() -> Self {
        Self {
            queue: VecDeque::new(),
            history: Vec::new(),
            tax_rate: DEFAULT_TAX_RATE,
            next_seq: 0,
        }
    }
}

impl TransactionSettlement {
    /// Create a settlement queue with the given tax rate.
    pub fn new(tax_rate: Decimal) -> Result<Self, SettlementError> {
        if tax_rate.is_sign_negative() || tax_rate > Decimal::ONE {
            return Err(SettlementError::InvalidTaxRate);
        }
        Ok(Self {
            tax_rate,
            ..Self::default()
        })
    }

    /// Configured tax rate.
    pub const fn tax_rate(&self) -> Decimal {
        self.tax_rate
    }

    /// Guild tax on `total`, rounded half away from zero.
    pub fn guild_tax(&self, total: u64) -> Result<u64, SettlementError> {
        let tax = Decimal::from(total)
            .checked_mul(self.tax_rate)
            .ok_or(SettlementError::ArithmeticOverflow { context: "guild tax" })?
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_u64()
            .ok_or(SettlementError::ArithmeticOverflow { context: "guild tax" })?;
        Ok(tax.min(total))
    }

    /// Queue a pending transaction, emitting `transaction.created`.
    ///
    /// No balances move until [`Self::process_pending_transactions`].
    #[allow(clippy::too_many_arguments)]
    pub fn create_transaction(
        &mut self,
        buyer: PlayerId,
        seller: PlayerId,
        resource: ResourceKind,
        unit_price: u64,
        quantity: u64,
        now_ms: u64,
        bus: &mut EventBus,
    ) -> Result<TransactionId, SettlementError> {
        if buyer == seller {
            return Err(SettlementError::SelfTrade(buyer));
        }
        if quantity == 0 {
            return Err(SettlementError::ZeroQuantity);
        }
        unit_price
            .checked_mul(quantity)
            .ok_or(SettlementError::ArithmeticOverflow { context: "transaction total" })?;

        let tx = Transaction {
            id: TransactionId::new(),
            buyer,
            seller,
            resource,
            unit_price,
            quantity,
            guild_tax: None,
            status: TransactionStatus::Pending,
            failure: None,
            created_at_ms: now_ms,
            seq: self.next_seq,
        };
        self.next_seq = self.next_seq.saturating_add(1);

        debug!(transaction = ?tx.id, ?buyer, ?seller, %resource, unit_price, quantity, "Transaction created");
        bus.publish(GameEvent::TransactionCreated(TransactionCreated::from(&tx)));
        let id = tx.id;
        self.queue.push_back(tx);
        Ok(id)
    }

    /// Pending transactions in settlement order.
    pub fn pending(&self) -> impl Iterator<Item = &Transaction> {
        self.queue.iter()
    }

    /// Number of pending transactions.
    pub fn pending_len(&self) -> usize {
        self.queue.len()
    }

    /// Settled transactions, completed and failed, in settlement order.
    pub fn history(&self) -> &[Transaction] {
        &self.history
    }

    /// A transaction by id, pending or settled.
    pub fn find(&self, id: TransactionId) -> Option<&Transaction> {
        self.queue
            .iter()
            .chain(self.history.iter())
            .find(|tx| tx.id == id)
    }

    /// Drain the queue in FIFO order. Each transaction settles or fails on
    /// its own; one failure never affects the next.
    pub fn process_pending_transactions(
        &mut self,
        ledger: &mut ResourceLedger,
        bus: &mut EventBus,
    ) -> BatchReport {
        let mut report = BatchReport::default();
        while let Some(mut tx) = self.queue.pop_front() {
            match self.settle_one(&tx, ledger) {
                Ok(settled) => {
                    tx.status = TransactionStatus::Completed;
                    tx.guild_tax = Some(settled.guild_tax);
                    info!(
                        transaction = ?tx.id,
                        total = settled.total,
                        guild_tax = settled.guild_tax,
                        net = settled.net,
                        "Trade settled"
                    );
                    bus.publish(GameEvent::TradeSettled(settled));
                    report.succeeded.push(tx.id);
                }
                Err(err) => {
                    let reason = err.reason();
                    tx.status = TransactionStatus::Failed;
                    tx.failure = Some(reason);
                    warn!(transaction = ?tx.id, error = %err, "Trade failed");
                    bus.publish(GameEvent::TradeFailed(TradeFailed {
                        transaction: tx.id,
                        reason,
                    }));
                    report.failed.push(tx.id);
                    report.errors.push((tx.id, err));
                }
            }
            self.history.push(tx);
        }
        report
    }

    fn settle_one(
        &self,
        tx: &Transaction,
        ledger: &mut ResourceLedger,
    ) -> Result<TradeSettled, SettlementError> {
        let total = tx
            .total()
            .ok_or(SettlementError::ArithmeticOverflow { context: "transaction total" })?;
        let tax = self.guild_tax(total)?;
        let receipt = ledger.settle_trade(&TradeLegs {
            transaction: tx.id,
            buyer: tx.buyer,
            seller: tx.seller,
            resource: tx.resource,
            quantity: tx.quantity,
            total,
            tax,
        })?;
        Ok(TradeSettled {
            transaction: tx.id,
            buyer: tx.buyer,
            seller: tx.seller,
            resource: tx.resource,
            quantity: tx.quantity,
            total: receipt.total,
            guild_tax: receipt.tax,
            net: receipt.net,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn tax_rounds_half_away_from_zero() {
        let settlement = TransactionSettlement::default();
        assert_eq!(settlement.guild_tax(100).unwrap(), 5);
        // 10 * 0.05 = 0.5 -> 1
        assert_eq!(settlement.guild_tax(10).unwrap(), 1);
        // 9 * 0.05 = 0.45 -> 0
        assert_eq!(settlement.guild_tax(9).unwrap(), 0);
        assert_eq!(settlement.guild_tax(0).unwrap(), 0);
    }

    #[test]
    fn tax_never_exceeds_total() {
        let settlement = TransactionSettlement::new(Decimal::ONE).unwrap();
        assert_eq!(settlement.guild_tax(7).unwrap(), 7);
        assert!(TransactionSettlement::new(dec!(1.01)).is_err());
        assert!(TransactionSettlement::new(dec!(-0.1)).is_err());
    }

    #[test]
    fn rejects_self_trade_and_zero_quantity() {
        let mut settlement = TransactionSettlement::default();
        let mut bus = EventBus::new();
        let p = PlayerId::new();

        let own = settlement
            .create_transaction(p, p, ResourceKind::Food, 1, 1, 0, &mut bus)
            .unwrap_err();
        assert_eq!(own, SettlementError::SelfTrade(p));

        let empty = settlement
            .create_transaction(p, PlayerId::new(), ResourceKind::Food, 1, 0, 0, &mut bus)
            .unwrap_err();
        assert_eq!(empty, SettlementError::ZeroQuantity);
        assert_eq!(settlement.pending_len(), 0);
        assert_eq!(bus.published(), 0);
    }
}
