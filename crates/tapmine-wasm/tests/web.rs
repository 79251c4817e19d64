//! Browser tests, run with `wasm-pack test --headless --firefox`.

#![cfg(target_arch = "wasm32")]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use js_sys::{Function, Promise, Reflect};
use tapmine_core::{Transport, UserBalances, MINING_COLLECTED_EVENT};
use tapmine_wasm::events::{collected_balances, dispatch_mining_collected};
use tapmine_wasm::{FetchApi, TapMine};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn test_version() {
    assert_eq!(tapmine_wasm::version(), env!("CARGO_PKG_VERSION"));
}

#[wasm_bindgen_test]
fn test_bearer_token_toggles() {
    let api = FetchApi::new();
    assert!(!api.has_token());
    api.set_bearer_token(Some("abc".into()));
    assert!(api.has_token());
    api.set_bearer_token(None);
    assert!(!api.has_token());
}

#[wasm_bindgen_test]
fn test_collected_event_reaches_window_listener() {
    let window = web_sys::window().unwrap();
    let seen: Rc<RefCell<Option<UserBalances>>> = Rc::new(RefCell::new(None));

    let sink = Rc::clone(&seen);
    let listener = Closure::wrap(Box::new(move |event: web_sys::Event| {
        let event: web_sys::CustomEvent = event.dyn_into().unwrap();
        *sink.borrow_mut() = collected_balances(&event);
    }) as Box<dyn FnMut(web_sys::Event)>);

    window
        .add_event_listener_with_callback(MINING_COLLECTED_EVENT, listener.as_ref().unchecked_ref())
        .unwrap();

    let balances = UserBalances { total_coins: 160, total_gems: 2, total_diamonds: 1, pph: 3600.0 };
    dispatch_mining_collected(&balances).unwrap();

    window
        .remove_event_listener_with_callback(MINING_COLLECTED_EVENT, listener.as_ref().unchecked_ref())
        .unwrap();

    // dispatchEvent is synchronous
    assert_eq!(seen.borrow().as_ref(), Some(&balances));
}

#[wasm_bindgen_test]
fn test_defaults_when_config_missing() {
    let client = TapMine::new(JsValue::UNDEFINED).unwrap();
    let config = client.config().unwrap();
    let cap = js_sys::Reflect::get(&config, &JsValue::from_str("sessionCapSecs")).unwrap();
    assert_eq!(cap.as_f64(), Some(60.0));
}

#[wasm_bindgen_test]
fn test_idle_client_estimate() {
    let client = TapMine::new(JsValue::UNDEFINED).unwrap();
    assert_eq!(client.mining_phase().unwrap().as_string().as_deref(), Some("idle"));

    let estimate = client.mining_estimate().unwrap();
    let can_collect = js_sys::Reflect::get(&estimate, &JsValue::from_str("canCollect")).unwrap();
    assert_eq!(can_collect.as_bool(), Some(false));
}

#[wasm_bindgen_test]
fn test_timer_stops_when_not_mining() {
    let client = TapMine::new(JsValue::UNDEFINED).unwrap();
    let callback = js_sys::Function::new_no_args("");
    client.start_timer(callback).unwrap();
    // the immediate tick sees an idle session
    assert!(!client.timer_running());
}

async fn sleep(ms: i32) {
    let promise = Promise::new(&mut |resolve, _| {
        web_sys::window()
            .unwrap()
            .set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, ms)
            .unwrap();
    });
    JsFuture::from(promise).await.unwrap();
}

/// A client whose last status fetch reported a session ending in a minute.
async fn mining_client() -> TapMine {
    let window = web_sys::window().unwrap();
    let fetch_key = JsValue::from_str("fetch");
    let real_fetch = Reflect::get(&window, &fetch_key).unwrap();
    let fake_fetch = Function::new_no_args(
        r#"
        const now = Math.floor(Date.now() / 1000);
        const body = JSON.stringify({ isMining: true, started_at: now, ends_at: now + 60, pending_coins: 0 });
        return Promise.resolve(new Response(body, { status: 200 }));
        "#,
    );
    Reflect::set(&window, &fetch_key, &fake_fetch).unwrap();

    let client = TapMine::new(JsValue::UNDEFINED).unwrap();
    let result = JsFuture::from(client.fetch_mining_status()).await;
    Reflect::set(&window, &fetch_key, &real_fetch).unwrap();
    result.unwrap();

    client
}

#[wasm_bindgen_test]
async fn test_timer_stop_restart_and_replace() {
    let client = mining_client().await;
    assert_eq!(client.mining_phase().unwrap().as_string().as_deref(), Some("mining"));

    let ticks = Rc::new(Cell::new(0u32));
    let t = Rc::clone(&ticks);
    let on_tick = Closure::wrap(Box::new(move |_estimate: JsValue| t.set(t.get() + 1)) as Box<dyn FnMut(JsValue)>);
    let callback: Function = on_tick.as_ref().unchecked_ref::<Function>().clone();

    client.start_timer(callback.clone()).unwrap();
    assert!(client.timer_running());
    assert_eq!(ticks.get(), 1);

    client.stop_timer();
    assert!(!client.timer_running());
    client.stop_timer();
    assert!(!client.timer_running());

    client.start_timer(callback.clone()).unwrap();
    assert!(client.timer_running());

    // the replaced timer must not keep ticking
    client.start_timer(callback).unwrap();
    assert!(client.timer_running());
    ticks.set(0);
    sleep(1500).await;
    assert_eq!(ticks.get(), 1);

    client.stop_timer();
    assert!(!client.timer_running());
    ticks.set(0);
    sleep(1200).await;
    assert_eq!(ticks.get(), 0);
}

#[wasm_bindgen_test]
async fn test_dropping_client_clears_interval() {
    let client = mining_client().await;

    let ticks = Rc::new(Cell::new(0u32));
    let t = Rc::clone(&ticks);
    let on_tick = Closure::wrap(Box::new(move |_estimate: JsValue| t.set(t.get() + 1)) as Box<dyn FnMut(JsValue)>);
    client.start_timer(on_tick.as_ref().unchecked_ref::<Function>().clone()).unwrap();
    assert!(client.timer_running());

    drop(client);
    ticks.set(0);
    sleep(1200).await;
    assert_eq!(ticks.get(), 0);
}
