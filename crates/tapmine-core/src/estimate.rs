//! Display-only projections of mining progress, plus number formatting.
//!
//! Nothing here is authoritative. The payout is always whatever the server
//! returns from collect; these values only drive the countdown and the
//! "+N" counter while a session runs.

use serde::Serialize;

use crate::session::MiningSession;
use crate::timestamp::Timestamp;

/// Seconds per hour, the PPH divisor.
pub const SECS_PER_HOUR: f64 = 3600.0;

/// Maximum elapsed seconds counted toward the projection.
pub const DEFAULT_SESSION_CAP_SECS: u64 = 60;

/// Values at or above this are shown in billions.
const BILLIONS_DISPLAY_FROM: u64 = 100_000_000_000;

/// Whole seconds elapsed since `started_at`, never negative.
pub fn elapsed_secs(started_at: Timestamp, now: Timestamp) -> u64 {
    let millis = started_at.millis_until(now);
    if millis <= 0 {
        0
    } else {
        (millis / 1000) as u64
    }
}

/// Projected coins for `elapsed` seconds at `pph`, capped at `cap_secs`.
///
/// Absent, zero, negative or non-finite rates project nothing.
pub fn pending_coins(pph: f64, elapsed: u64, cap_secs: u64) -> u64 {
    if !pph.is_finite() || pph <= 0.0 {
        return 0;
    }

    // multiply first: whole-number rates stay exact
    let counted = elapsed.min(cap_secs) as f64;
    (pph * counted / SECS_PER_HOUR).floor() as u64
}

/// Seconds left until `ends_at`, rounded up; exactly 0 once it has passed.
pub fn remaining_secs(ends_at: Timestamp, now: Timestamp) -> u64 {
    let millis = now.millis_until(ends_at);
    if millis <= 0 {
        0
    } else {
        (millis as u64).div_ceil(1000)
    }
}

/// Format seconds as `m:ss`.
pub fn format_countdown(secs: u64) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// Format a coin balance for the header.
///
/// Large balances collapse to billions with one decimal (`123.5B`, `100B`);
/// everything else gets comma separators.
pub fn format_coins(value: u64) -> String {
    if value >= BILLIONS_DISPLAY_FROM {
        let billions = format!("{:.1}", value as f64 / 1_000_000_000.0);
        let trimmed = billions.strip_suffix(".0").unwrap_or(&billions);
        return format!("{trimmed}B");
    }

    group_thousands(value)
}

/// Insert `,` between groups of three digits.
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }

    out
}

/// Airdrop countdown in `Xd Yh Zm` form.
pub fn format_airdrop_countdown(ends_at: Timestamp, now: Timestamp) -> String {
    let diff = now.millis_until(ends_at);
    if diff <= 0 {
        return "Airdrop Ended".to_string();
    }

    let days = diff / 86_400_000;
    let hours = (diff / 3_600_000) % 24;
    let minutes = (diff / 60_000) % 60;

    format!("{days}d {hours}h {minutes}m")
}

/// Per-tick view of a mining session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayEstimate {
    /// Projected coins so far.
    pub pending_coins: u64,
    /// Seconds until the session can be collected.
    pub time_remaining_secs: u64,
    /// Whether the collect control should be enabled.
    pub can_collect: bool,
    /// `time_remaining_secs` as `m:ss`.
    pub countdown: String,
}

impl DisplayEstimate {
    /// Project `session` at `now`.
    ///
    /// An idle session, or one missing either timestamp, projects to zero
    /// with collect disabled.
    pub fn compute(session: &MiningSession, pph: f64, now: Timestamp, cap_secs: u64) -> Self {
        let (Some(started_at), Some(ends_at)) = (session.started_at, session.ends_at) else {
            return Self::idle();
        };
        if !session.is_mining {
            return Self::idle();
        }

        let remaining = remaining_secs(ends_at, now);
        DisplayEstimate {
            pending_coins: pending_coins(pph, elapsed_secs(started_at, now), cap_secs),
            time_remaining_secs: remaining,
            can_collect: remaining == 0,
            countdown: format_countdown(remaining),
        }
    }

    fn idle() -> Self {
        DisplayEstimate {
            countdown: format_countdown(0),
            ..Default::default()
        }
    }
}
