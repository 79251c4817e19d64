//! Access to the `Telegram.WebApp` object injected by the Telegram client.

use js_sys::{Function, Reflect};
use tapmine_core::TelegramIdentity;
use wasm_bindgen::prelude::*;

fn get(target: &JsValue, key: &str) -> Option<JsValue> {
    Reflect::get(target, &JsValue::from_str(key))
        .ok()
        .filter(|v| !v.is_undefined() && !v.is_null())
}

fn get_string(target: &JsValue, key: &str) -> Option<String> {
    let value = get(target, key)?;
    // ids arrive as numbers
    value
        .as_string()
        .or_else(|| value.as_f64().map(|n| format!("{}", n as i64)))
        .filter(|s| !s.is_empty())
}

/// `window.Telegram.WebApp`, if the page runs inside Telegram.
pub fn web_app() -> Option<JsValue> {
    let window = web_sys::window()?;
    let telegram = get(&window, "Telegram")?;
    get(&telegram, "WebApp")
}

/// Tell Telegram the app has rendered.
pub fn ready(web_app: &JsValue) {
    if let Some(ready) = get(web_app, "ready").and_then(|f| f.dyn_into::<Function>().ok()) {
        if let Err(err) = ready.call0(web_app) {
            crate::console_warn!("Telegram.WebApp.ready failed: {:?}", err);
        }
    }
}

/// Build the auth identity from `initDataUnsafe.user`.
pub fn identity_from(web_app: &JsValue) -> Result<TelegramIdentity, JsValue> {
    let user = get(web_app, "initDataUnsafe")
        .and_then(|init| get(&init, "user"))
        .ok_or_else(|| JsValue::from_str("Telegram user not found"))?;

    let telegram_id =
        get_string(&user, "id").ok_or_else(|| JsValue::from_str("Telegram user not found"))?;

    Ok(TelegramIdentity {
        telegram_id,
        username: get_string(&user, "username"),
        first_name: get_string(&user, "first_name"),
        last_name: get_string(&user, "last_name"),
        language_code: get_string(&user, "language_code"),
        photo_url: get_string(&user, "photo_url"),
    })
}

/// Detect the WebApp, mark it ready and read the user.
pub fn current_identity() -> Result<TelegramIdentity, JsValue> {
    let web_app = web_app().ok_or_else(|| JsValue::from_str("Telegram WebApp not detected"))?;
    ready(&web_app);
    identity_from(&web_app)
}
