//! WebAssembly bindings for the tapmine Telegram mini-app.
//!
//! This crate provides JavaScript-accessible APIs for:
//! - Signing in with the Telegram WebApp identity
//! - Starting and collecting mining sessions
//! - A once-per-second mining display timer
//! - Admin CRUD for users, tasks and task categories
//! - Airdrop and wallet screens
//!
//! Balance changes are re-emitted on `window` as `mining:collected`.

use wasm_bindgen::prelude::*;

pub mod api;
pub mod bindings;
pub mod events;
pub mod log;
pub mod telegram;
pub mod timer;

// Re-export main types for JS access
pub use api::FetchApi;
pub use bindings::TapMine;
pub use timer::MiningTimer;

/// Initialize the WASM module with better panic messages.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Get the library version.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
