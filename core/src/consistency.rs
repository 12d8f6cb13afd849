//! Tunable consistency levels.
//!
//! The names follow the store's own string enum so configuration files can use
//! the values operators already know (`ONE`, `QUORUM`, `LOCAL_QUORUM`, ...).

use crate::error::RegistryError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How many replicas must acknowledge a read or write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConsistencyLevel {
    /// Any node, including a hinted handoff.
    Any,
    /// One replica.
    #[default]
    One,
    /// Two replicas.
    Two,
    /// Three replicas.
    Three,
    /// Majority of replicas.
    Quorum,
    /// Every replica.
    All,
    /// One replica in the local datacenter.
    LocalOne,
    /// Majority of replicas in the local datacenter.
    LocalQuorum,
    /// Majority of replicas in every datacenter.
    EachQuorum,
}

impl ConsistencyLevel {
    /// Wire name of the level.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Any => "ANY",
            Self::One => "ONE",
            Self::Two => "TWO",
            Self::Three => "THREE",
            Self::Quorum => "QUORUM",
            Self::All => "ALL",
            Self::LocalOne => "LOCAL_ONE",
            Self::LocalQuorum => "LOCAL_QUORUM",
            Self::EachQuorum => "EACH_QUORUM",
        }
    }

    /// Nodes that must acknowledge, out of `total_nodes`.
    ///
    /// Fixed counts are not clamped: asking for `THREE` on a two-node cluster
    /// returns 3 and the store reports the shortfall.
    ///
    /// # Examples
    ///
    /// ```
    /// # use ticket_registry_core::ConsistencyLevel;
    /// assert_eq!(ConsistencyLevel::One.required_acks(3), 1);
    /// assert_eq!(ConsistencyLevel::Quorum.required_acks(3), 2);
    /// assert_eq!(ConsistencyLevel::Quorum.required_acks(4), 3);
    /// assert_eq!(ConsistencyLevel::All.required_acks(3), 3);
    /// ```
    #[must_use]
    pub const fn required_acks(self, total_nodes: usize) -> usize {
        match self {
            Self::Any | Self::One | Self::LocalOne => 1,
            Self::Two => 2,
            Self::Three => 3,
            Self::Quorum | Self::LocalQuorum | Self::EachQuorum => total_nodes / 2 + 1,
            Self::All => total_nodes,
        }
    }
}

impl fmt::Display for ConsistencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConsistencyLevel {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let level = match s.trim().to_ascii_uppercase().as_str() {
            "ANY" => Self::Any,
            "ONE" => Self::One,
            "TWO" => Self::Two,
            "THREE" => Self::Three,
            "QUORUM" => Self::Quorum,
            "ALL" => Self::All,
            "LOCAL_ONE" => Self::LocalOne,
            "LOCAL_QUORUM" => Self::LocalQuorum,
            "EACH_QUORUM" => Self::EachQuorum,
            other => {
                return Err(RegistryError::InvalidConfig(format!(
                    "unknown consistency level {other:?}"
                )));
            }
        };
        Ok(level)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("quorum".parse::<ConsistencyLevel>().unwrap(), ConsistencyLevel::Quorum);
        assert_eq!(" LOCAL_QUORUM ".parse::<ConsistencyLevel>().unwrap(), ConsistencyLevel::LocalQuorum);
    }

    #[test]
    fn rejects_unknown_level() {
        let error = "MOST".parse::<ConsistencyLevel>().unwrap_err();
        assert!(matches!(error, RegistryError::InvalidConfig(_)));
    }

    #[test]
    fn display_round_trips_through_from_str() {
        for level in [
            ConsistencyLevel::Any,
            ConsistencyLevel::Three,
            ConsistencyLevel::EachQuorum,
        ] {
            assert_eq!(level.to_string().parse::<ConsistencyLevel>().unwrap(), level);
        }
    }

    #[test]
    fn serde_uses_wire_names() {
        let json = serde_json::to_string(&ConsistencyLevel::LocalOne).unwrap();
        assert_eq!(json, "\"LOCAL_ONE\"");
    }

    #[test]
    fn default_is_one() {
        assert_eq!(ConsistencyLevel::default(), ConsistencyLevel::One);
    }
}
