//! Navigation Identifiers
//!
//! Every navigation node is identified by a 128-bit uuid. The lowest ids are
//! reserved for well-known nodes (the user root, home, bookmarks, tags) and
//! are never produced by random generation nor accepted from untrusted input.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// First id that is available to user-created nodes
const LOWER_BOUND: Uuid = Uuid::from_u128(0x10);

/// Errors produced when validating an external id
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidNavigationId {
    /// The id is inside the reserved well-known range
    #[error("Navigation id '{0}' is reserved")]
    Reserved(Uuid),

    /// The input is not a uuid
    #[error("Malformed navigation id '{input}': {reason}")]
    Malformed { input: String, reason: String },
}

/// Opaque, immutable identity of a navigation node
///
/// Serialization writes any id, reserved ones included, but deserialization
/// and [`FromStr`] only accept assignable ids. Use
/// [`parse_reference`](Self::parse_reference) where the root may be named.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Uuid", into = "Uuid")]
pub struct NavigationId(Uuid);

impl NavigationId {
    pub const EMPTY: NavigationId = NavigationId(Uuid::nil());
    pub const USER_ROOT: NavigationId = NavigationId(Uuid::from_u128(0x01));
    pub const HOME: NavigationId = NavigationId(Uuid::from_u128(0x08));
    pub const BOOKMARKS: NavigationId = NavigationId(Uuid::from_u128(0x09));
    pub const TAGS: NavigationId = NavigationId(Uuid::from_u128(0x0a));

    /// Generate a fresh random id outside the reserved range
    pub fn new() -> Self {
        loop {
            let id = Uuid::new_v4();
            if Self::is_assignable(&id) {
                return Self(id);
            }
        }
    }

    /// Whether `id` may be used for a user-created node
    pub fn is_assignable(id: &Uuid) -> bool {
        *id >= LOWER_BOUND
    }

    /// Whether this id belongs to the reserved well-known range
    pub fn is_reserved(&self) -> bool {
        !Self::is_assignable(&self.0)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Parse an id that refers to an existing node: any assignable id, or
    /// the user root
    pub fn parse_reference(s: &str) -> Result<Self, InvalidNavigationId> {
        match s.parse::<Self>() {
            Err(InvalidNavigationId::Reserved(id)) if id == Self::USER_ROOT.0 => Ok(Self::USER_ROOT),
            other => other,
        }
    }
}

impl Default for NavigationId {
    fn default() -> Self {
        Self::new()
    }
}

impl TryFrom<Uuid> for NavigationId {
    type Error = InvalidNavigationId;

    fn try_from(id: Uuid) -> Result<Self, Self::Error> {
        if Self::is_assignable(&id) {
            Ok(Self(id))
        } else {
            Err(InvalidNavigationId::Reserved(id))
        }
    }
}

impl From<NavigationId> for Uuid {
    fn from(id: NavigationId) -> Self {
        id.0
    }
}

impl FromStr for NavigationId {
    type Err = InvalidNavigationId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = Uuid::parse_str(s).map_err(|e| InvalidNavigationId::Malformed {
            input: s.to_string(),
            reason: e.to_string(),
        })?;
        Self::try_from(id)
    }
}

impl fmt::Display for NavigationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_ids_are_never_reserved() {
        for _ in 0..1000 {
            assert!(!NavigationId::new().is_reserved());
        }
    }

    #[test]
    fn test_well_known_ids_are_reserved() {
        for id in [
            NavigationId::EMPTY,
            NavigationId::USER_ROOT,
            NavigationId::HOME,
            NavigationId::BOOKMARKS,
            NavigationId::TAGS,
        ] {
            assert!(id.is_reserved(), "{} should be reserved", id);
        }
    }

    #[test]
    fn test_parse_rejects_reserved_range() {
        let err = "00000000-0000-0000-0000-00000000000f"
            .parse::<NavigationId>()
            .unwrap_err();
        assert!(matches!(err, InvalidNavigationId::Reserved(_)));

        let ok = "00000000-0000-0000-0000-000000000010".parse::<NavigationId>();
        assert!(ok.is_ok());
    }

    #[test]
    fn test_parse_reference_accepts_only_the_root_among_reserved() {
        let root = NavigationId::USER_ROOT.to_string();
        assert!(root.parse::<NavigationId>().is_err());
        assert_eq!(
            NavigationId::parse_reference(&root).unwrap(),
            NavigationId::USER_ROOT
        );

        let home = NavigationId::HOME.to_string();
        assert!(matches!(
            NavigationId::parse_reference(&home),
            Err(InvalidNavigationId::Reserved(_))
        ));

        let id = NavigationId::new();
        assert_eq!(NavigationId::parse_reference(&id.to_string()).unwrap(), id);
        assert!(NavigationId::parse_reference("nope").is_err());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = "not-a-uuid".parse::<NavigationId>().unwrap_err();
        assert!(matches!(err, InvalidNavigationId::Malformed { .. }));
    }

    #[test]
    fn test_display_round_trips_through_from_str() {
        let id = NavigationId::new();
        let parsed: NavigationId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_serde_uses_plain_uuid_string() {
        let id = NavigationId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id));

        let reserved = format!("\"{}\"", NavigationId::HOME.as_uuid());
        assert!(serde_json::from_str::<NavigationId>(&reserved).is_err());
    }
}
