//! Credential slots and the indicator secret that names the active one.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// One of the two parallel database identities.
///
/// The rotation process rewrites one slot while the other keeps serving
/// traffic, then promotes the freshly written slot in the indicator secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Slot {
    One,
    Two,
}

impl Slot {
    /// The other slot.
    pub fn flip(self) -> Self {
        match self {
            Slot::One => Slot::Two,
            Slot::Two => Slot::One,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Slot::One => "one",
            Slot::Two => "two",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Slot {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "one" => Ok(Slot::One),
            "two" => Ok(Slot::Two),
            other => Err(format!("unknown slot '{}', expected 'one' or 'two'", other)),
        }
    }
}

/// Contents of the indicator secret.
///
/// Written only by the external rotation process; this crate reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveSlotSecret {
    /// Slot most recently promoted to active.
    #[serde(alias = "activeUser")]
    pub active_slot: Slot,

    /// When the promotion happened, in epoch milliseconds.
    #[serde(deserialize_with = "epoch_millis")]
    pub timestamp: i64,
}

/// Accepts integer or fractional epoch milliseconds; fractions are truncated.
fn epoch_millis<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Millis {
        Whole(i64),
        Fractional(f64),
    }

    match Millis::deserialize(deserializer)? {
        Millis::Whole(ms) => Ok(ms),
        Millis::Fractional(ms) if ms.is_finite() => Ok(ms.trunc() as i64),
        Millis::Fractional(ms) => {
            Err(serde::de::Error::custom(format!("timestamp {ms} is not a finite number")))
        }
    }
}

impl ActiveSlotSecret {
    pub fn new(active_slot: Slot, promoted_at: DateTime<Utc>) -> Self {
        Self { active_slot, timestamp: promoted_at.timestamp_millis() }
    }

    /// Promotion time, or `None` when the millisecond value is out of chrono's range.
    pub fn promoted_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp)
    }
}
