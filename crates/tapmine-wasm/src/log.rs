//! Browser console logging.

use wasm_bindgen::prelude::*;

/// `format!`-style logging to `console.log`.
#[macro_export]
macro_rules! console_log {
    ($($t:tt)*) => {
        $crate::log::log(&format!($($t)*))
    };
}

/// `format!`-style logging to `console.warn`.
#[macro_export]
macro_rules! console_warn {
    ($($t:tt)*) => {
        $crate::log::warn(&format!($($t)*))
    };
}

/// Log to the browser console.
#[wasm_bindgen(js_name = consoleLog)]
pub fn log(message: &str) {
    web_sys::console::log_1(&JsValue::from_str(message));
}

/// Warn on the browser console.
pub fn warn(message: &str) {
    web_sys::console::warn_1(&JsValue::from_str(message));
}
