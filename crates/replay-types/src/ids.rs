//! Type-safe identifier wrappers around the opaque string ids used by the
//! upstream game service.
//!
//! Game and entity ids arrive on the message bus as plain strings (the game
//! id is the trailing token of the NATS subject). Wrapping them prevents
//! accidental mixing of identifiers at compile time. Both ids are `Ord` so
//! they can key `BTreeMap`s with deterministic iteration order.

use serde::{Deserialize, Serialize};

/// Generates a newtype wrapper around [`String`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Create a new identifier from anything string-like.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Return the inner string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }
    };
}

define_id! {
    /// Unique identifier for a game session. Events are ordered and the
    /// single-writer discipline is enforced per game id.
    GameId
}

define_id! {
    /// Unique identifier for an entity (player, food item) within a game.
    EntityId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn game_id_serializes_as_plain_string() {
        let id = GameId::new("match-42");
        let json = serde_json::to_string(&id).unwrap_or_default();
        assert_eq!(json, "\"match-42\"");
    }

    #[test]
    fn ids_round_trip_through_display() {
        let id = EntityId::from("alice");
        assert_eq!(id.to_string(), "alice");
        assert_eq!(id.as_str(), "alice");
    }
}
