//! Property tests: arbitrary sequences of ledger operations keep every
//! balance non-negative and the journal in agreement with live balances.

#![allow(clippy::unwrap_used)]

use std::collections::BTreeMap;

use guildhall_events::EventBus;
use guildhall_ledger::{ConservationResult, ResourceLedger, TradeLegs};
use guildhall_types::{PlayerId, ResourceKind, TransactionId};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Deduct { who: usize, amount: u64 },
    Add { who: usize, amount: u64 },
    Produce { who: usize, kind: usize, amount: u64 },
    Decay { who: usize, kind: usize, amount: u64 },
    Trade { buyer: usize, seller: usize, kind: usize, quantity: u64, price: u64 },
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..3usize, 0..200u64).prop_map(|(who, amount)| Op::Deduct { who, amount }),
        (0..3usize, 0..200u64).prop_map(|(who, amount)| Op::Add { who, amount }),
        (0..3usize, 0..4usize, 0..50u64)
            .prop_map(|(who, kind, amount)| Op::Produce { who, kind, amount }),
        (0..3usize, 0..4usize, 0..50u64)
            .prop_map(|(who, kind, amount)| Op::Decay { who, kind, amount }),
        (0..3usize, 0..3usize, 0..4usize, 0..30u64, 0..20u64).prop_map(
            |(buyer, seller, kind, quantity, price)| Op::Trade {
                buyer,
                seller,
                kind,
                quantity,
                price,
            }
        ),
    ]
}

fn kind(index: usize) -> ResourceKind {
    ResourceKind::ALL
        .get(index)
        .copied()
        .unwrap_or(ResourceKind::Food)
}

proptest! {
    #[test]
    fn any_operation_sequence_conserves(ops in prop::collection::vec(op(), 0..60)) {
        let players = [PlayerId::new(), PlayerId::new(), PlayerId::new()];
        let mut ledger = ResourceLedger::new();
        let mut bus = EventBus::new();
        for p in players {
            ledger
                .open_account(p, 100, &BTreeMap::from([(ResourceKind::Food, 20)]))
                .unwrap();
        }
        let who = |i: usize| players.get(i).copied().unwrap();

        for op in ops {
            // Rejections are expected; they must leave balances untouched.
            let _ = match op {
                Op::Deduct { who: w, amount } => {
                    ledger.deduct_gold(who(w), amount, "purchase", None, &mut bus).map(drop)
                }
                Op::Add { who: w, amount } => {
                    ledger.add_gold(who(w), amount, "bonus", None, &mut bus).map(drop)
                }
                Op::Produce { who: w, kind: k, amount } => {
                    ledger.credit_resource(who(w), kind(k), amount, "production", None).map(drop)
                }
                Op::Decay { who: w, kind: k, amount } => {
                    ledger.apply_decay(who(w), kind(k), amount).map(drop)
                }
                Op::Trade { buyer, seller, kind: k, quantity, price } => {
                    let total = price.saturating_mul(quantity);
                    ledger
                        .settle_trade(&TradeLegs {
                            transaction: TransactionId::new(),
                            buyer: who(buyer),
                            seller: who(seller),
                            resource: kind(k),
                            quantity,
                            total,
                            tax: total.checked_div(20).unwrap_or(0),
                        })
                        .map(drop)
                }
            };
        }

        prop_assert_eq!(ledger.verify_conservation(), ConservationResult::Balanced);
    }

    #[test]
    fn failed_trade_changes_nothing(quantity in 1..50u64, price in 1..50u64) {
        let buyer = PlayerId::new();
        let seller = PlayerId::new();
        let mut ledger = ResourceLedger::new();
        ledger.open_account(buyer, 0, &BTreeMap::new()).unwrap();
        ledger
            .open_account(seller, 0, &BTreeMap::from([(ResourceKind::Ore, quantity)]))
            .unwrap();

        let result = ledger.settle_trade(&TradeLegs {
            transaction: TransactionId::new(),
            buyer,
            seller,
            resource: ResourceKind::Ore,
            quantity,
            total: price.saturating_mul(quantity),
            tax: 0,
        });

        prop_assert!(result.is_err());
        prop_assert_eq!(ledger.gold(seller), Some(0));
        prop_assert_eq!(ledger.resource(seller, ResourceKind::Ore), Some(quantity));
        prop_assert_eq!(ledger.resource(buyer, ResourceKind::Ore), Some(0));
    }
}
