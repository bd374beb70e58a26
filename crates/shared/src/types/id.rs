//! Typed IDs for type-safe entity references.
//!
//! Server-issued identifiers (preview ids, bank line ids, ledger entry ids) are
//! opaque strings; only identifiers minted on this side get a typed wrapper.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Declares a UUID v7 newtype.
///
/// IDs are minted client-side, so `new` is time-ordered and `Default` mints a
/// fresh one.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Mints a fresh time-ordered ID.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Wraps a UUID received from elsewhere.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the wrapped UUID.
            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse().map(Self)
            }
        }
    };
}

typed_id!(SessionId, "Unique identifier for a bookkeeping session.");
typed_id!(
    BankAccountId,
    "Unique identifier for a bank account whose lines are reconciled."
);
