//! Conservation audit for the resource ledger.
//!
//! Gold and resources enter through endowments, grants and production, and
//! leave through spending and decay. Between players they only move. The
//! audit replays the journal from empty accounts and checks that:
//!
//! ```text
//! replayed(player, asset) == live(player, asset)   for every player and asset
//! replayed(guild)         == guild_revenue
//! ```
//!
//! and that no replayed balance ever dips below zero. Any violation produces a
//! [`LedgerAnomaly`].

use std::collections::{BTreeMap, BTreeSet};

use guildhall_types::{Asset, LedgerEntry, PartyKind, PlayerId, ResourceKind};

use crate::LedgerAnomaly;
use crate::ledger::Account;

/// The result of a conservation audit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConservationResult {
    /// Journal and live balances agree.
    Balanced,
    /// One or more balances disagree.
    Anomaly(LedgerAnomaly),
}

/// One disagreeing balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Imbalance {
    /// Account holder, or `None` for guild revenue.
    pub player: Option<PlayerId>,
    /// Asset that disagrees.
    pub asset: Asset,
    /// Balance according to the journal.
    pub journal: u64,
    /// Live balance.
    pub live: u64,
}

/// Replay `entries` and compare with `accounts` and `guild_revenue`.
pub fn verify_conservation(
    entries: &[LedgerEntry],
    accounts: &BTreeMap<PlayerId, Account>,
    guild_revenue: u64,
) -> ConservationResult {
    let mut replayed: BTreeMap<(PlayerId, Asset), u64> = BTreeMap::new();
    let mut guild: u64 = 0;

    for entry in entries {
        if entry.from_kind == PartyKind::Player {
            let Some(player) = entry.from_player else {
                return malformed(entry, "player debit without a player id");
            };
            let slot = replayed.entry((player, entry.asset)).or_insert(0);
            let Some(next) = slot.checked_sub(entry.quantity) else {
                return malformed(entry, "replayed balance went negative");
            };
            *slot = next;
        }

        match entry.to_kind {
            PartyKind::Player => {
                let Some(player) = entry.to_player else {
                    return malformed(entry, "player credit without a player id");
                };
                let slot = replayed.entry((player, entry.asset)).or_insert(0);
                let Some(next) = slot.checked_add(entry.quantity) else {
                    return malformed(entry, "replayed balance overflowed");
                };
                *slot = next;
            }
            PartyKind::Guild => {
                let Some(next) = guild.checked_add(entry.quantity) else {
                    return malformed(entry, "replayed guild revenue overflowed");
                };
                guild = next;
            }
            // Sources and sinks outside the economy.
            PartyKind::World | PartyKind::Void => {}
        }
    }

    let mut keys: BTreeSet<(PlayerId, Asset)> = replayed.keys().copied().collect();
    for (player, account) in accounts {
        keys.insert((*player, Asset::Gold));
        for kind in ResourceKind::ALL {
            keys.insert((*player, Asset::Resource(kind)));
        }
        for kind in account.resources().keys() {
            keys.insert((*player, Asset::Resource(*kind)));
        }
    }

    let mut imbalances = Vec::new();
    for (player, asset) in keys {
        let journal = replayed.get(&(player, asset)).copied().unwrap_or(0);
        let live = accounts.get(&player).map_or(0, |account| match asset {
            Asset::Gold => account.gold(),
            Asset::Resource(kind) => account.resource(kind),
        });
        if journal != live {
            imbalances.push(Imbalance {
                player: Some(player),
                asset,
                journal,
                live,
            });
        }
    }
    if guild != guild_revenue {
        imbalances.push(Imbalance {
            player: None,
            asset: Asset::Gold,
            journal: guild,
            live: guild_revenue,
        });
    }

    if imbalances.is_empty() {
        ConservationResult::Balanced
    } else {
        let count = imbalances.len();
        ConservationResult::Anomaly(LedgerAnomaly {
            imbalances,
            message: format!(
                "LEDGER_ANOMALY: {count} balance(s) disagree with the journal after replay",
            ),
        })
    }
}

fn malformed(entry: &LedgerEntry, what: &str) -> ConservationResult {
    ConservationResult::Anomaly(LedgerAnomaly {
        imbalances: Vec::new(),
        message: format!("LEDGER_ANOMALY at journal entry {}: {what}", entry.seq),
    })
}
