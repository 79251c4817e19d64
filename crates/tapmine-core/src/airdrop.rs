//! Airdrop campaign and its eligibility criteria.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::estimate::format_airdrop_countdown;
use crate::timestamp::Timestamp;
use crate::wire::lenient_u64;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Airdrop {
    #[serde(default, deserialize_with = "lenient_u64")]
    pub id: u64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub ends_at: Option<Timestamp>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Airdrop {
    /// `Xd Yh Zm` until the end, or `None` when no end date is set.
    pub fn countdown(&self, now: Timestamp) -> Option<String> {
        self.ends_at.map(|end| format_airdrop_countdown(end, now))
    }

    pub fn has_ended(&self, now: Timestamp) -> bool {
        self.ends_at.is_some_and(|end| now >= end)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AirdropCriterion {
    #[serde(default, deserialize_with = "lenient_u64")]
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
