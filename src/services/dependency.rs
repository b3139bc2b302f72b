//! Guarded dependency identities.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// An external dependency guarded by its own circuit breaker.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Dependency {
    Database = 0,
    Ai = 1,
    Payment = 2,
    Storage = 3,
    Vendor = 4,
    Telephony = 5,
}

impl Dependency {
    /// Every dependency, in discriminant order.
    pub const ALL: [Dependency; 6] = [
        Dependency::Database,
        Dependency::Ai,
        Dependency::Payment,
        Dependency::Storage,
        Dependency::Vendor,
        Dependency::Telephony,
    ];

    /// Stable name used for breaker lookup, logs and metric labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            Dependency::Database => "database",
            Dependency::Ai => "ai",
            Dependency::Payment => "payment",
            Dependency::Storage => "storage",
            Dependency::Vendor => "vendor",
            Dependency::Telephony => "telephony",
        }
    }

    /// Whether a failure may be replaced by a fallback value.
    ///
    /// Payment and telephony failures always reach the caller: money and
    /// customer communication must never silently degrade.
    pub fn allows_fallback(&self) -> bool {
        !matches!(self, Dependency::Payment | Dependency::Telephony)
    }

    /// Whether an open breaker makes the whole service unhealthy rather
    /// than degraded.
    pub fn is_essential(&self) -> bool {
        matches!(self, Dependency::Database)
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unrecognized dependency name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown dependency '{0}'")]
pub struct UnknownDependency(pub String);

impl FromStr for Dependency {
    type Err = UnknownDependency;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Dependency::ALL
            .into_iter()
            .find(|dependency| dependency.as_str() == s)
            .ok_or_else(|| UnknownDependency(s.to_string()))
    }
}
