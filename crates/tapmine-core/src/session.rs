//! Mining session model and the payloads of the three mining endpoints.

use serde::{Deserialize, Serialize};

use crate::timestamp::Timestamp;
use crate::user::UserBalances;
use crate::wire::{lenient_bool, lenient_opt_u64, lenient_u64};

/// Message shown when a diamond drops and the server did not word it.
pub const DEFAULT_BONUS_MESSAGE: &str = "You earned a Diamond!";

/// Client mirror of the server-owned mining session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MiningSession {
    /// Whether a session is running (or finished but not collected).
    pub is_mining: bool,
    /// When the session started.
    pub started_at: Option<Timestamp>,
    /// When the session becomes collectible.
    pub ends_at: Option<Timestamp>,
    /// Server-reported pending reward.
    pub pending_coins: u64,
}

/// Where a session stands at a given moment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MiningPhase {
    Idle,
    Mining,
    Collectible,
}

impl MiningSession {
    /// Phase at `now`.
    ///
    /// `Mining -> Collectible` is purely a function of the clock; the
    /// session itself does not change.
    pub fn phase(&self, now: Timestamp) -> MiningPhase {
        if !self.is_mining {
            return MiningPhase::Idle;
        }

        match self.ends_at {
            Some(ends_at) if now >= ends_at => MiningPhase::Collectible,
            _ => MiningPhase::Mining,
        }
    }

    /// Convenience for `phase(now) == Collectible`.
    pub fn can_collect(&self, now: Timestamp) -> bool {
        self.phase(now) == MiningPhase::Collectible
    }

    /// Replace every field with the server's view.
    pub fn adopt_status(&mut self, status: MiningStatus) {
        self.is_mining = status.is_mining;
        self.started_at = status.started_at;
        self.ends_at = status.ends_at;
        self.pending_coins = status.pending_coins;
    }

    /// Enter the mining state using whatever timestamps the server returned.
    pub fn adopt_start(&mut self, started: StartResponse) {
        self.is_mining = true;
        if let Some(started_at) = started.started_at {
            self.started_at = Some(started_at);
        }
        if let Some(ends_at) = started.ends_at {
            self.ends_at = Some(ends_at);
        }
        self.pending_coins = 0;
    }

    /// Back to idle.
    pub fn reset(&mut self) {
        *self = MiningSession::default();
    }
}

/// `GET /mining/status`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MiningStatus {
    #[serde(rename = "isMining", alias = "is_mining", default, deserialize_with = "lenient_bool")]
    pub is_mining: bool,
    #[serde(default)]
    pub started_at: Option<Timestamp>,
    #[serde(default)]
    pub ends_at: Option<Timestamp>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub pending_coins: u64,
}

/// `POST /mining/start`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartResponse {
    #[serde(default)]
    pub started_at: Option<Timestamp>,
    #[serde(default)]
    pub ends_at: Option<Timestamp>,
}

/// `POST /mining/collect`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectResponse {
    #[serde(default)]
    pub user: Option<UserBalances>,
    #[serde(default, deserialize_with = "lenient_opt_u64")]
    pub diamonds_earned: Option<u64>,
    #[serde(default)]
    pub message: Option<String>,
}

/// What a successful collect hands back to the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CollectOutcome {
    /// Server totals after the payout, if the response carried them.
    pub user: Option<UserBalances>,
    /// Rare bonus currency awarded with this collection.
    pub diamonds_earned: u64,
    /// Server message accompanying the payout.
    pub message: Option<String>,
}

impl From<CollectResponse> for CollectOutcome {
    fn from(resp: CollectResponse) -> Self {
        CollectOutcome {
            user: resp.user,
            diamonds_earned: resp.diamonds_earned.unwrap_or(0),
            message: resp.message,
        }
    }
}

impl CollectOutcome {
    /// Text to announce a bonus, only when diamonds were actually earned.
    pub fn bonus_message(&self) -> Option<String> {
        if self.diamonds_earned == 0 {
            return None;
        }

        Some(
            self.message
                .clone()
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| DEFAULT_BONUS_MESSAGE.to_string()),
        )
    }
}
