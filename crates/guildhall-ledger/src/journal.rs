//! The append-only journal and its entry builder.
//!
//! Every balance change in [`ResourceLedger`](crate::ResourceLedger) records
//! one [`LedgerEntry`] built through [`EntryBuilder`], which checks that the
//! quantity is positive and that the source and destination party kinds fit
//! the entry type.

use chrono::Utc;
use uuid::Uuid;

use guildhall_types::{Asset, LedgerEntry, LedgerEntryId, LedgerEntryType, PartyKind, PlayerId};

use crate::LedgerError;

/// Builder for validated [`LedgerEntry`] values.
#[derive(Debug)]
pub struct EntryBuilder {
    entry_type: LedgerEntryType,
    asset: Asset,
    from: Option<(PartyKind, Option<PlayerId>)>,
    to: Option<(PartyKind, Option<PlayerId>)>,
    quantity: Option<u64>,
    reason: Option<String>,
    reference_id: Option<Uuid>,
}

impl EntryBuilder {
    /// Start an entry of `entry_type` moving `asset`.
    pub const fn new(entry_type: LedgerEntryType, asset: Asset) -> Self {
        Self {
            entry_type,
            asset,
            from: None,
            to: None,
            quantity: None,
            reason: None,
            reference_id: None,
        }
    }

    /// Debit a player account.
    #[must_use]
    pub const fn from_player(mut self, player: PlayerId) -> Self {
        self.from = Some((PartyKind::Player, Some(player)));
        self
    }

    /// Debit a non-player party.
    #[must_use]
    pub const fn from_party(mut self, kind: PartyKind) -> Self {
        self.from = Some((kind, None));
        self
    }

    /// Credit a player account.
    #[must_use]
    pub const fn to_player(mut self, player: PlayerId) -> Self {
        self.to = Some((PartyKind::Player, Some(player)));
        self
    }

    /// Credit a non-player party.
    #[must_use]
    pub const fn to_party(mut self, kind: PartyKind) -> Self {
        self.to = Some((kind, None));
        self
    }

    /// Quantity moved.
    #[must_use]
    pub const fn quantity(mut self, qty: u64) -> Self {
        self.quantity = Some(qty);
        self
    }

    /// Human-readable reason.
    #[must_use]
    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Related entity such as a transaction or construct.
    #[must_use]
    pub const fn reference_id(mut self, id: Option<Uuid>) -> Self {
        self.reference_id = id;
        self
    }

    /// Validate and produce the entry at journal position `seq`.
    pub fn build(self, seq: u64) -> Result<LedgerEntry, LedgerError> {
        let quantity = self.quantity.ok_or(LedgerError::MissingField("quantity"))?;
        let reason = self.reason.ok_or(LedgerError::MissingField("reason"))?;
        let (from_kind, from_player) = self.from.ok_or(LedgerError::MissingField("from"))?;
        let (to_kind, to_player) = self.to.ok_or(LedgerError::MissingField("to"))?;

        if quantity == 0 {
            return Err(LedgerError::ZeroQuantity);
        }

        let (expected_from, expected_to) = expected_parties(self.entry_type);
        if from_kind != expected_from {
            return Err(LedgerError::InvalidParty {
                entry_type: self.entry_type,
                side: "from",
                expected: expected_from,
                actual: from_kind,
            });
        }
        if to_kind != expected_to {
            return Err(LedgerError::InvalidParty {
                entry_type: self.entry_type,
                side: "to",
                expected: expected_to,
                actual: to_kind,
            });
        }

        Ok(LedgerEntry {
            id: LedgerEntryId::new(),
            seq,
            entry_type: self.entry_type,
            from_kind,
            from_player,
            to_kind,
            to_player,
            asset: self.asset,
            quantity,
            reason,
            reference_id: self.reference_id,
            created_at: Utc::now(),
        })
    }
}

/// Expected (from, to) party kinds for each entry type.
const fn expected_parties(entry_type: LedgerEntryType) -> (PartyKind, PartyKind) {
    match entry_type {
        LedgerEntryType::Endowment | LedgerEntryType::Grant | LedgerEntryType::Production => {
            (PartyKind::World, PartyKind::Player)
        }
        LedgerEntryType::Spend | LedgerEntryType::Decay => (PartyKind::Player, PartyKind::Void),
        LedgerEntryType::Trade => (PartyKind::Player, PartyKind::Player),
        LedgerEntryType::GuildTax => (PartyKind::Player, PartyKind::Guild),
    }
}

/// Append-only list of ledger entries.
#[derive(Debug, Default)]
pub struct Journal {
    entries: Vec<LedgerEntry>,
}

impl Journal {
    /// Create an empty journal.
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Build and append an entry.
    pub fn record(&mut self, builder: EntryBuilder) -> Result<&LedgerEntry, LedgerError> {
        let seq = u64::try_from(self.entries.len()).map_err(|_overflow| LedgerError::Overflow {
            asset: builder.asset,
        })?;
        let entry = builder.build(seq)?;
        self.entries.push(entry);
        self.entries
            .last()
            .ok_or(LedgerError::InternalError("failed to retrieve entry after append"))
    }

    /// Build every entry, then append them together. Nothing is appended
    /// if any entry fails validation.
    pub fn record_all(
        &mut self,
        builders: impl IntoIterator<Item = EntryBuilder>,
    ) -> Result<usize, LedgerError> {
        let mut built = Vec::new();
        let mut seq = u64::try_from(self.entries.len())
            .map_err(|_overflow| LedgerError::InternalError("journal length exceeds u64"))?;
        for builder in builders {
            built.push(builder.build(seq)?);
            seq = seq
                .checked_add(1)
                .ok_or(LedgerError::InternalError("journal sequence overflow"))?;
        }
        let count = built.len();
        self.entries.extend(built);
        Ok(count)
    }

    /// All entries in insertion order.
    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    /// Number of entries.
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been recorded.
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use guildhall_types::ResourceKind;

    use super::*;

    #[test]
    fn builds_valid_trade_entry() {
        let entry = EntryBuilder::new(LedgerEntryType::Trade, Asset::Gold)
            .from_player(PlayerId::new())
            .to_player(PlayerId::new())
            .quantity(95)
            .reason("trade")
            .build(0)
            .unwrap();
        assert_eq!(entry.quantity, 95);
        assert_eq!(entry.from_kind, PartyKind::Player);
    }

    #[test]
    fn rejects_zero_quantity() {
        let result = EntryBuilder::new(LedgerEntryType::Grant, Asset::Gold)
            .from_party(PartyKind::World)
            .to_player(PlayerId::new())
            .quantity(0)
            .reason("grant")
            .build(0);
        assert_eq!(result, Err(LedgerError::ZeroQuantity));
    }

    #[test]
    fn rejects_wrong_party_for_type() {
        let result = EntryBuilder::new(LedgerEntryType::Decay, Asset::Resource(ResourceKind::Food))
            .from_player(PlayerId::new())
            .to_party(PartyKind::Guild)
            .quantity(3)
            .reason("decay")
            .build(0);
        assert!(matches!(
            result,
            Err(LedgerError::InvalidParty { side: "to", .. })
        ));
    }

    #[test]
    fn journal_assigns_sequential_positions() {
        let mut journal = Journal::new();
        let player = PlayerId::new();
        for _ in 0..3 {
            journal
                .record(
                    EntryBuilder::new(LedgerEntryType::Grant, Asset::Gold)
                        .from_party(PartyKind::World)
                        .to_player(player)
                        .quantity(1)
                        .reason("grant"),
                )
                .unwrap();
        }
        let seqs: Vec<u64> = journal.entries().iter().map(|e| e.seq).collect();
        assert_eq!(seqs, vec![0, 1, 2]);
    }
}
