//! Client-side core of the tapmine Telegram mini-app.
//!
//! This crate provides pure Rust implementations of:
//! - The mining session mirror and its idle/mining/collectible phases
//! - Display-only reward projection and countdown math
//! - User, task, category, airdrop and wallet records with lenient decoding
//! - Explicit application stores mutated through command handlers
//! - A typed balance-change notifier for independent views
//! - The REST API contract, over a pluggable [`api::Transport`]
//!
//! The server is authoritative for every balance and payout; nothing here
//! computes a value that is written back.

pub mod airdrop;
pub mod api;
pub mod app;
pub mod category;
pub mod config;
pub mod error;
pub mod estimate;
pub mod notify;
pub mod session;
pub mod store;
pub mod task;
pub mod timestamp;
pub mod user;
pub mod wallet;
pub mod wire;

pub use api::{ApiRequest, Body, GameApi, Method, Transport};
pub use app::App;
pub use config::ClientConfig;
pub use error::ApiError;
pub use estimate::DisplayEstimate;
pub use notify::{BalanceNotifier, SubscriptionId, MINING_COLLECTED_EVENT};
pub use session::{CollectOutcome, MiningPhase, MiningSession};
pub use timestamp::Timestamp;
pub use user::{HeaderView, TelegramIdentity, User, UserBalances};
