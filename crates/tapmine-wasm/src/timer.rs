//! One-second ticker behind the mining display.

use std::cell::Cell;
use std::rc::Rc;

use tapmine_core::{App, Timestamp, Transport};
use wasm_bindgen::prelude::*;

use crate::bindings::to_js;

/// Milliseconds between display refreshes.
pub const TICK_MS: i32 = 1000;

/// Current wall-clock time.
pub fn now() -> Timestamp {
    Timestamp::from_millis(js_sys::Date::now() as i64)
}

/// Recomputes the display estimate every second and hands it to a JS
/// callback.
///
/// The interval is cleared when the session stops mining, on [`stop`],
/// and on drop, so exactly one handle is live per timer.
///
/// [`stop`]: MiningTimer::stop
pub struct MiningTimer {
    window: web_sys::Window,
    handle: Rc<Cell<Option<i32>>>,
    _tick: Closure<dyn FnMut()>,
}

impl MiningTimer {
    /// Start ticking. The callback runs once immediately so an already
    /// finished session shows as collectible without waiting a second.
    pub fn start<T: Transport + 'static>(
        app: Rc<App<T>>,
        callback: js_sys::Function,
    ) -> Result<MiningTimer, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("No window"))?;
        let handle: Rc<Cell<Option<i32>>> = Rc::new(Cell::new(None));

        let tick = {
            let window = window.clone();
            let handle = Rc::clone(&handle);
            Closure::wrap(Box::new(move || {
                if !tick_once(&app, &callback) {
                    if let Some(id) = handle.take() {
                        window.clear_interval_with_handle(id);
                    }
                }
            }) as Box<dyn FnMut()>)
        };

        let id = window.set_interval_with_callback_and_timeout_and_arguments_0(
            tick.as_ref().unchecked_ref(),
            TICK_MS,
        )?;
        handle.set(Some(id));

        // first frame right away
        let first: &js_sys::Function = tick.as_ref().unchecked_ref();
        first.call0(&JsValue::NULL)?;

        Ok(MiningTimer {
            window,
            handle,
            _tick: tick,
        })
    }

    /// Whether the interval is still scheduled.
    pub fn is_running(&self) -> bool {
        self.handle.get().is_some()
    }

    /// Cancel the interval. Safe to call more than once.
    pub fn stop(&self) {
        if let Some(id) = self.handle.take() {
            self.window.clear_interval_with_handle(id);
        }
    }
}

impl Drop for MiningTimer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Push one estimate to JS. Returns whether the timer should keep going.
fn tick_once<T: Transport>(app: &App<T>, callback: &js_sys::Function) -> bool {
    let estimate = app.mining_estimate(now());

    match to_js(&estimate) {
        Ok(value) => {
            if let Err(err) = callback.call1(&JsValue::NULL, &value) {
                crate::console_warn!("mining timer callback failed: {:?}", err);
            }
        }
        Err(err) => crate::console_warn!("mining estimate not serializable: {:?}", err),
    }

    app.mining().session.is_mining
}
