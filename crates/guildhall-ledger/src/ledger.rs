//! Player accounts and guild revenue.
//!
//! The [`ResourceLedger`] is the only owner of player balances. Every
//! operation validates first and applies second: either every balance it
//! touches changes, or none does.
//!
//! # Design
//!
//! - **Unsigned**: gold and resources are `u64`; debits use `checked_sub`.
//! - **Journaled**: every applied change appends to the [`Journal`].
//! - **Atomic trades**: [`ResourceLedger::settle_trade`] applies all five
//!   legs of a settlement after validating both parties.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use guildhall_events::{EventBus, GameEvent, GoldAdded, GoldDeducted};
use guildhall_types::{Asset, LedgerEntryType, PartyKind, PlayerId, ResourceKind, TransactionId};

use crate::conservation::{ConservationResult, verify_conservation};
use crate::journal::{EntryBuilder, Journal};
use crate::LedgerError;

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

/// One player's balances.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    gold: u64,
    resources: BTreeMap<ResourceKind, u64>,
}

impl Account {
    /// Gold balance.
    pub const fn gold(&self) -> u64 {
        self.gold
    }

    /// Stored amount of one resource.
    pub fn resource(&self, kind: ResourceKind) -> u64 {
        self.resources.get(&kind).copied().unwrap_or(0)
    }

    /// Every resource with a non-zero balance.
    pub const fn resources(&self) -> &BTreeMap<ResourceKind, u64> {
        &self.resources
    }

    fn set_resource(&mut self, kind: ResourceKind, amount: u64) {
        if amount == 0 {
            self.resources.remove(&kind);
        } else {
            self.resources.insert(kind, amount);
        }
    }
}

// ---------------------------------------------------------------------------
// Trade settlement parameters
// ---------------------------------------------------------------------------

/// The amounts of one trade settlement, computed by the caller.
///
/// Packs the arguments of [`ResourceLedger::settle_trade`] into one struct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradeLegs {
    /// Transaction being settled, recorded as the journal reference.
    pub transaction: TransactionId,
    /// Pays `total` gold and receives `quantity` units.
    pub buyer: PlayerId,
    /// Delivers `quantity` units and receives `total - tax` gold.
    pub seller: PlayerId,
    /// Resource exchanged.
    pub resource: ResourceKind,
    /// Units exchanged.
    pub quantity: u64,
    /// Gold paid by the buyer.
    pub total: u64,
    /// Gold withheld into guild revenue.
    pub tax: u64,
}

/// Balance deltas applied by a successful settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradeReceipt {
    /// Gold paid by the buyer.
    pub total: u64,
    /// Gold received by the seller.
    pub net: u64,
    /// Gold added to guild revenue.
    pub tax: u64,
}

// ---------------------------------------------------------------------------
// ResourceLedger
// ---------------------------------------------------------------------------

/// Balances for every player plus the aggregate guild revenue.
#[derive(Debug, Default)]
pub struct ResourceLedger {
    accounts: BTreeMap<PlayerId, Account>,
    guild_revenue: u64,
    journal: Journal,
}

impl ResourceLedger {
    /// Create an empty ledger.
    pub const fn new() -> Self {
        Self {
            accounts: BTreeMap::new(),
            guild_revenue: 0,
            journal: Journal::new(),
        }
    }

    /// Open an account with starting balances, journaled as endowments.
    pub fn open_account(
        &mut self,
        player: PlayerId,
        gold: u64,
        resources: &BTreeMap<ResourceKind, u64>,
    ) -> Result<(), LedgerError> {
        if self.accounts.contains_key(&player) {
            return Err(LedgerError::AccountExists(player));
        }

        let mut builders = Vec::new();
        if gold > 0 {
            builders.push(endowment(player, Asset::Gold, gold));
        }
        for (&kind, &amount) in resources {
            if amount > 0 {
                builders.push(endowment(player, Asset::Resource(kind), amount));
            }
        }
        self.journal.record_all(builders)?;

        let mut account = Account {
            gold,
            resources: BTreeMap::new(),
        };
        for (&kind, &amount) in resources {
            account.set_resource(kind, amount);
        }
        self.accounts.insert(player, account);
        debug!(?player, gold, "Account opened");
        Ok(())
    }

    /// Whether an account exists for `player`.
    pub fn has_account(&self, player: PlayerId) -> bool {
        self.accounts.contains_key(&player)
    }

    /// Account lookup.
    pub fn account(&self, player: PlayerId) -> Option<&Account> {
        self.accounts.get(&player)
    }

    /// Every account, in player id order.
    pub fn accounts(&self) -> impl Iterator<Item = (PlayerId, &Account)> {
        self.accounts.iter().map(|(id, account)| (*id, account))
    }

    /// Gold balance, or `None` if the player has no account.
    pub fn gold(&self, player: PlayerId) -> Option<u64> {
        self.accounts.get(&player).map(Account::gold)
    }

    /// Resource balance, or `None` if the player has no account.
    pub fn resource(&self, player: PlayerId, kind: ResourceKind) -> Option<u64> {
        self.accounts.get(&player).map(|a| a.resource(kind))
    }

    /// Aggregate guild tax collected.
    pub const fn guild_revenue(&self) -> u64 {
        self.guild_revenue
    }

    /// The journal of every applied change.
    pub const fn journal(&self) -> &Journal {
        &self.journal
    }

    /// Remove gold from a player, emitting `gold.deducted`.
    ///
    /// Fails with [`LedgerError::InsufficientGold`] if the balance is below
    /// `amount`, in which case nothing changes. Returns the new balance.
    pub fn deduct_gold(
        &mut self,
        player: PlayerId,
        amount: u64,
        reason: &str,
        reference: Option<Uuid>,
        bus: &mut EventBus,
    ) -> Result<u64, LedgerError> {
        let available = self.gold(player).ok_or(LedgerError::UnknownAccount(player))?;
        let balance = available
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientGold {
                player,
                needed: amount,
                available,
            })?;
        if amount == 0 {
            return Ok(balance);
        }

        self.journal.record(
            EntryBuilder::new(LedgerEntryType::Spend, Asset::Gold)
                .from_player(player)
                .to_party(PartyKind::Void)
                .quantity(amount)
                .reason(reason)
                .reference_id(reference),
        )?;
        self.account_mut(player)?.gold = balance;

        debug!(?player, amount, balance, reason, "Gold deducted");
        bus.publish(GameEvent::GoldDeducted(GoldDeducted {
            player,
            amount,
            balance,
            reason: reason.to_owned(),
        }));
        Ok(balance)
    }

    /// Add gold to a player, emitting `gold.added`. Returns the new balance.
    pub fn add_gold(
        &mut self,
        player: PlayerId,
        amount: u64,
        reason: &str,
        reference: Option<Uuid>,
        bus: &mut EventBus,
    ) -> Result<u64, LedgerError> {
        let current = self.gold(player).ok_or(LedgerError::UnknownAccount(player))?;
        let balance = current
            .checked_add(amount)
            .ok_or(LedgerError::Overflow { asset: Asset::Gold })?;
        if amount == 0 {
            return Ok(balance);
        }

        self.journal.record(
            EntryBuilder::new(LedgerEntryType::Grant, Asset::Gold)
                .from_party(PartyKind::World)
                .to_player(player)
                .quantity(amount)
                .reason(reason)
                .reference_id(reference),
        )?;
        self.account_mut(player)?.gold = balance;

        debug!(?player, amount, balance, reason, "Gold added");
        bus.publish(GameEvent::GoldAdded(GoldAdded {
            player,
            amount,
            balance,
            reason: reason.to_owned(),
        }));
        Ok(balance)
    }

    /// Credit produced resources to a player. Returns the new balance.
    pub fn credit_resource(
        &mut self,
        player: PlayerId,
        kind: ResourceKind,
        amount: u64,
        reason: &str,
        reference: Option<Uuid>,
    ) -> Result<u64, LedgerError> {
        let current = self
            .resource(player, kind)
            .ok_or(LedgerError::UnknownAccount(player))?;
        let balance = current.checked_add(amount).ok_or(LedgerError::Overflow {
            asset: Asset::Resource(kind),
        })?;
        if amount == 0 {
            return Ok(balance);
        }

        self.journal.record(
            EntryBuilder::new(LedgerEntryType::Production, Asset::Resource(kind))
                .from_party(PartyKind::World)
                .to_player(player)
                .quantity(amount)
                .reason(reason)
                .reference_id(reference),
        )?;
        self.account_mut(player)?.set_resource(kind, balance);
        Ok(balance)
    }

    /// Remove resources from a player. Fails with
    /// [`LedgerError::InsufficientResource`] if the balance is too low.
    /// Returns the new balance.
    pub fn debit_resource(
        &mut self,
        player: PlayerId,
        kind: ResourceKind,
        amount: u64,
        reason: &str,
        reference: Option<Uuid>,
    ) -> Result<u64, LedgerError> {
        let available = self
            .resource(player, kind)
            .ok_or(LedgerError::UnknownAccount(player))?;
        let balance = available
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientResource {
                player,
                resource: kind,
                needed: amount,
                available,
            })?;
        if amount == 0 {
            return Ok(balance);
        }

        self.journal.record(
            EntryBuilder::new(LedgerEntryType::Spend, Asset::Resource(kind))
                .from_player(player)
                .to_party(PartyKind::Void)
                .quantity(amount)
                .reason(reason)
                .reference_id(reference),
        )?;
        self.account_mut(player)?.set_resource(kind, balance);
        Ok(balance)
    }

    /// Remove up to `amount` of a resource to decay. Never goes below zero.
    /// Returns the units actually removed.
    pub fn apply_decay(
        &mut self,
        player: PlayerId,
        kind: ResourceKind,
        amount: u64,
    ) -> Result<u64, LedgerError> {
        let available = self
            .resource(player, kind)
            .ok_or(LedgerError::UnknownAccount(player))?;
        let removed = amount.min(available);
        if removed == 0 {
            return Ok(0);
        }
        let balance = available.saturating_sub(removed);

        self.journal.record(
            EntryBuilder::new(LedgerEntryType::Decay, Asset::Resource(kind))
                .from_player(player)
                .to_party(PartyKind::Void)
                .quantity(removed)
                .reason("decay"),
        )?;
        self.account_mut(player)?.set_resource(kind, balance);
        Ok(removed)
    }

    /// Apply every leg of a trade, or none of them.
    ///
    /// Buyer gold `-= total`, buyer resource `+= quantity`, seller resource
    /// `-= quantity`, seller gold `+= total - tax`, guild revenue `+= tax`.
    pub fn settle_trade(&mut self, legs: &TradeLegs) -> Result<TradeReceipt, LedgerError> {
        let TradeLegs {
            transaction,
            buyer,
            seller,
            resource,
            quantity,
            total,
            tax,
        } = *legs;

        if buyer == seller {
            return Err(LedgerError::SelfTrade(buyer));
        }
        let net = total
            .checked_sub(tax)
            .ok_or(LedgerError::TaxExceedsTotal { tax, total })?;

        // Validate both sides before touching anything.
        let buyer_account = self
            .accounts
            .get(&buyer)
            .ok_or(LedgerError::UnknownAccount(buyer))?;
        let seller_account = self
            .accounts
            .get(&seller)
            .ok_or(LedgerError::UnknownAccount(seller))?;

        let buyer_gold = buyer_account
            .gold
            .checked_sub(total)
            .ok_or(LedgerError::InsufficientGold {
                player: buyer,
                needed: total,
                available: buyer_account.gold,
            })?;
        let seller_stock = seller_account.resource(resource);
        let seller_resource =
            seller_stock
                .checked_sub(quantity)
                .ok_or(LedgerError::InsufficientResource {
                    player: seller,
                    resource,
                    needed: quantity,
                    available: seller_stock,
                })?;
        let buyer_resource = buyer_account
            .resource(resource)
            .checked_add(quantity)
            .ok_or(LedgerError::Overflow {
                asset: Asset::Resource(resource),
            })?;
        let seller_gold = seller_account
            .gold
            .checked_add(net)
            .ok_or(LedgerError::Overflow { asset: Asset::Gold })?;
        let guild_revenue = self
            .guild_revenue
            .checked_add(tax)
            .ok_or(LedgerError::Overflow { asset: Asset::Gold })?;

        let reference = Some(transaction.into_inner());
        let mut builders = Vec::new();
        if net > 0 {
            builders.push(
                EntryBuilder::new(LedgerEntryType::Trade, Asset::Gold)
                    .from_player(buyer)
                    .to_player(seller)
                    .quantity(net)
                    .reason("trade")
                    .reference_id(reference),
            );
        }
        if tax > 0 {
            builders.push(
                EntryBuilder::new(LedgerEntryType::GuildTax, Asset::Gold)
                    .from_player(buyer)
                    .to_party(PartyKind::Guild)
                    .quantity(tax)
                    .reason("guild_tax")
                    .reference_id(reference),
            );
        }
        if quantity > 0 {
            builders.push(
                EntryBuilder::new(LedgerEntryType::Trade, Asset::Resource(resource))
                    .from_player(seller)
                    .to_player(buyer)
                    .quantity(quantity)
                    .reason("trade")
                    .reference_id(reference),
            );
        }
        self.journal.record_all(builders)?;

        // Apply.
        let buyer_account = self.account_mut(buyer)?;
        buyer_account.gold = buyer_gold;
        buyer_account.set_resource(resource, buyer_resource);
        let seller_account = self.account_mut(seller)?;
        seller_account.gold = seller_gold;
        seller_account.set_resource(resource, seller_resource);
        self.guild_revenue = guild_revenue;

        info!(
            ?transaction,
            ?buyer,
            ?seller,
            %resource,
            quantity,
            total,
            net,
            tax,
            "Trade legs applied"
        );
        Ok(TradeReceipt { total, net, tax })
    }

    /// Replay the journal and compare with live balances.
    pub fn verify_conservation(&self) -> ConservationResult {
        verify_conservation(self.journal.entries(), &self.accounts, self.guild_revenue)
    }

    fn account_mut(&mut self, player: PlayerId) -> Result<&mut Account, LedgerError> {
        self.accounts
            .get_mut(&player)
            .ok_or(LedgerError::UnknownAccount(player))
    }
}

fn endowment(player: PlayerId, asset: Asset, amount: u64) -> EntryBuilder {
    EntryBuilder::new(LedgerEntryType::Endowment, asset)
        .from_party(PartyKind::World)
        .to_player(player)
        .quantity(amount)
        .reason("endowment")
}
