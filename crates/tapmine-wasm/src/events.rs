//! Bridge from the Rust balance notifier to `window` DOM events.
//!
//! Views written in JS listen for `mining:collected` and read
//! `event.detail.user`; Rust views subscribe to the notifier directly.

use serde::Serialize;
use tapmine_core::{UserBalances, MINING_COLLECTED_EVENT};
use wasm_bindgen::prelude::*;
use web_sys::{CustomEvent, CustomEventInit};

use crate::bindings::to_js;

#[derive(Serialize)]
struct CollectedDetail<'a> {
    user: &'a UserBalances,
}

/// Dispatch `mining:collected` on `window` with `{ user }` as detail.
pub fn dispatch_mining_collected(balances: &UserBalances) -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("No window"))?;

    let init = CustomEventInit::new();
    init.set_detail(&to_js(&CollectedDetail { user: balances })?);

    let event = CustomEvent::new_with_event_init_dict(MINING_COLLECTED_EVENT, &init)?;
    window.dispatch_event(&event)?;
    Ok(())
}

/// Read the balances back out of a `mining:collected` event.
pub fn collected_balances(event: &CustomEvent) -> Option<UserBalances> {
    let user = js_sys::Reflect::get(&event.detail(), &JsValue::from_str("user")).ok()?;
    if user.is_undefined() || user.is_null() {
        return None;
    }
    serde_wasm_bindgen::from_value(user).ok()
}
