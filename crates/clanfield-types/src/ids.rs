//! Type-safe identifier wrappers.
//!
//! Clans are identified by small integers assigned at initialization and
//! never reused within a run. Wrapping them in a newtype keeps clan ids from
//! being mixed up with sizes, ticks, or grid coordinates at compile time.

use serde::{Deserialize, Serialize};

/// Generates a newtype wrapper around an unsigned integer with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident($inner:ty)
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub $inner);

        impl $name {
            /// Create an identifier from its raw value.
            pub const fn new(raw: $inner) -> Self {
                Self(raw)
            }

            /// Return the inner raw value.
            pub const fn into_inner(self) -> $inner {
                self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<$inner> for $name {
            fn from(raw: $inner) -> Self {
                Self(raw)
            }
        }

        impl From<$name> for $inner {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique, immutable identifier for a clan.
    ClanId(u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_display_matches_raw_value() {
        let id = ClanId::new(7);
        assert_eq!(id.to_string(), "7");
        assert_eq!(u32::from(id), 7);
    }

    #[test]
    fn id_serializes_transparently() {
        let json = serde_json::to_string(&ClanId::new(12)).ok();
        assert_eq!(json.as_deref(), Some("12"));
        let restored: Result<ClanId, _> = serde_json::from_str("12");
        assert_eq!(restored.ok(), Some(ClanId::new(12)));
    }

    #[test]
    fn ids_order_by_raw_value() {
        assert!(ClanId::new(1) < ClanId::new(2));
    }
}
