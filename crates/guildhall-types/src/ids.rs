//! Type-safe identifier wrappers around [`Uuid`].
//!
//! Every entity in the game has a strongly-typed ID so a territory id can
//! never be passed where a construct id is expected. All IDs use UUID v7
//! (time-ordered), which keeps `BTreeMap` iteration roughly in creation order.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }

            /// Fold the identifier into 64 bits, for seeding deterministic
            /// pseudo-random draws keyed on this entity.
            pub fn fold_u64(self) -> u64 {
                let (hi, lo) = self.0.as_u64_pair();
                hi ^ lo
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for a player (human or AI).
    PlayerId
}

define_id! {
    /// Unique identifier for a territory hex on the map.
    TerritoryId
}

define_id! {
    /// Unique identifier for a purchased construct.
    ConstructId
}

define_id! {
    /// Unique identifier for a two-party trade transaction.
    TransactionId
}

define_id! {
    /// Unique identifier for an in-flight construct installation.
    InstallationId
}

define_id! {
    /// Unique identifier for a ledger journal entry.
    LedgerEntryId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_distinct_types() {
        let player = PlayerId::new();
        let territory = TerritoryId::new();
        assert_ne!(player.into_inner(), Uuid::nil());
        assert_ne!(territory.into_inner(), Uuid::nil());
    }

    #[test]
    fn id_roundtrip_serde() {
        let original = ConstructId::new();
        let json = serde_json::to_string(&original).ok();
        assert!(json.is_some());
        let restored: Result<ConstructId, _> =
            serde_json::from_str(json.as_deref().unwrap_or(""));
        assert_eq!(restored.ok(), Some(original));
    }

    #[test]
    fn fold_is_stable_for_the_same_id() {
        let id = TerritoryId::from(Uuid::from_u64_pair(0xF0, 0x0F));
        assert_eq!(id.fold_u64(), 0xFF);
        assert_eq!(id.fold_u64(), id.fold_u64());
    }
}
