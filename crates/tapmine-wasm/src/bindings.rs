//! The `TapMine` object exposed to JavaScript.
//!
//! Async operations return promises that resolve with plain JS objects and
//! reject with the error message as a string.

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::Promise;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tapmine_core::category::CategoryDraft;
use tapmine_core::store::{AirdropStore, Collection, MiningStore, WalletStore};
use tapmine_core::task::TaskDraft;
use tapmine_core::{ApiError, App, ClientConfig, SubscriptionId, TelegramIdentity, User};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;

use crate::api::FetchApi;
use crate::events::dispatch_mining_collected;
use crate::telegram;
use crate::timer::{now, MiningTimer};

/// Convert to a plain JS value. Maps become objects, not `Map`s.
pub fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {:?}", e)))
}

/// Read a JS object into a Rust value.
pub fn from_js<T: DeserializeOwned>(value: JsValue) -> Result<T, JsValue> {
    serde_wasm_bindgen::from_value(value).map_err(|e| JsValue::from_str(&format!("Invalid input: {}", e)))
}

fn reject(err: ApiError) -> JsValue {
    JsValue::from_str(&err.message())
}

/// List/detail view of a record store.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ListSnapshot<'a, T> {
    list: &'a [T],
    selected: Option<&'a T>,
    loading: bool,
    error: Option<String>,
    success: bool,
}

impl<'a, T> From<&'a Collection<T>> for ListSnapshot<'a, T> {
    fn from(store: &'a Collection<T>) -> Self {
        ListSnapshot {
            list: &store.list,
            selected: store.selected.as_ref(),
            loading: store.loading,
            error: store.error.as_ref().map(ApiError::message),
            success: store.success,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MiningSnapshot<'a> {
    is_mining: bool,
    started_at: Option<String>,
    ends_at: Option<String>,
    pending_coins: u64,
    phase: tapmine_core::MiningPhase,
    loading: bool,
    error: Option<String>,
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    in_flight: Option<&'a str>,
}

impl<'a> MiningSnapshot<'a> {
    fn new(store: &'a MiningStore) -> Self {
        let session = &store.session;
        MiningSnapshot {
            is_mining: session.is_mining,
            started_at: session.started_at.and_then(|t| t.to_rfc3339()),
            ends_at: session.ends_at.and_then(|t| t.to_rfc3339()),
            pending_coins: session.pending_coins,
            phase: session.phase(now()),
            loading: store.loading(),
            error: store.error.as_ref().map(ApiError::message),
            success: store.success,
            in_flight: store.in_flight().map(|op| match op {
                tapmine_core::store::MiningOp::Status => "status",
                tapmine_core::store::MiningOp::Start => "start",
                tapmine_core::store::MiningOp::Collect => "collect",
            }),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HeaderSnapshot {
    display_name: String,
    avatar_url: String,
    coins: u64,
    gems: u64,
    diamonds: u64,
    coins_display: String,
    gems_display: String,
    diamonds_display: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AirdropSnapshot<'a> {
    active: Option<&'a tapmine_core::airdrop::Airdrop>,
    countdown: Option<String>,
    criteria: &'a [tapmine_core::airdrop::AirdropCriterion],
    loading: bool,
    error: Option<String>,
}

impl<'a> From<&'a AirdropStore> for AirdropSnapshot<'a> {
    fn from(store: &'a AirdropStore) -> Self {
        AirdropSnapshot {
            active: store.active.as_ref(),
            countdown: store.active.as_ref().and_then(|a| a.countdown(now())),
            criteria: &store.criteria,
            loading: store.loading,
            error: store.error.as_ref().map(ApiError::message),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WalletSnapshot<'a> {
    connected: bool,
    data: Option<&'a serde_json::Value>,
    loading: bool,
    error: Option<String>,
}

impl<'a> From<&'a WalletStore> for WalletSnapshot<'a> {
    fn from(store: &'a WalletStore) -> Self {
        WalletSnapshot {
            connected: store.is_connected(),
            data: store.data.as_ref(),
            loading: store.loading,
            error: store.error.as_ref().map(ApiError::message),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CollectResult {
    message: Option<String>,
    diamonds_earned: u64,
    bonus_message: Option<String>,
    user: Option<tapmine_core::UserBalances>,
}

/// Client state and API access for the mini-app.
#[wasm_bindgen]
pub struct TapMine {
    app: Rc<App<FetchApi>>,
    timer: RefCell<Option<MiningTimer>>,
    bridge: SubscriptionId,
}

#[wasm_bindgen]
impl TapMine {
    /// Create a client. `config` may be `undefined` or a partial
    /// `{ apiUrl, imageUrl, sessionCapSecs }` object.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<TapMine, JsValue> {
        let config = if config.is_undefined() || config.is_null() {
            ClientConfig::default()
        } else {
            let parsed: ClientConfig = from_js(config)?;
            let cap = parsed.session_cap_secs;
            parsed.with_session_cap_secs(cap)
        };

        let app = Rc::new(App::new(FetchApi::new(), config));

        // forward every balance change to JS listeners
        let bridge = app.subscribe_balances(|balances| {
            crate::console_log!("received mining update: {} coins", balances.total_coins);
            if let Err(err) = dispatch_mining_collected(balances) {
                crate::console_warn!("could not dispatch balance event: {:?}", err);
            }
        });

        Ok(TapMine {
            app,
            timer: RefCell::new(None),
            bridge,
        })
    }

    /// Active configuration.
    pub fn config(&self) -> Result<JsValue, JsValue> {
        to_js(self.app.config())
    }

    // ---- auth ----

    /// Read the Telegram user and sign in with it.
    pub fn sign_in_with_telegram(&self) -> Promise {
        let app = Rc::clone(&self.app);
        future_to_promise(async move {
            let identity = telegram::current_identity()?;
            let user = app.sign_in(&identity).await.map_err(reject)?;
            to_js(&user)
        })
    }

    /// Sign in with an explicit identity, e.g. outside Telegram.
    pub fn sign_in(&self, identity: JsValue) -> Promise {
        let app = Rc::clone(&self.app);
        future_to_promise(async move {
            let identity: TelegramIdentity = from_js(identity)?;
            let user = app.sign_in(&identity).await.map_err(reject)?;
            to_js(&user)
        })
    }

    pub fn sign_out(&self) {
        self.stop_timer();
        self.app.sign_out();
    }

    pub fn refresh_current_user(&self) -> Promise {
        let app = Rc::clone(&self.app);
        future_to_promise(async move {
            let user = app.refresh_current_user().await.map_err(reject)?;
            to_js(&user)
        })
    }

    pub fn current_user(&self) -> Result<JsValue, JsValue> {
        to_js(&self.app.users().selected)
    }

    /// Header model: name, avatar and formatted balances.
    pub fn header(&self) -> Result<JsValue, JsValue> {
        let view = self.app.header_view();
        to_js(&HeaderSnapshot {
            coins_display: view.coins_display(),
            gems_display: view.gems_display(),
            diamonds_display: view.diamonds_display(),
            display_name: view.display_name,
            avatar_url: view.avatar_url,
            coins: view.coins,
            gems: view.gems,
            diamonds: view.diamonds,
        })
    }

    /// Totals from the most recent balance broadcast.
    pub fn last_balances(&self) -> Result<JsValue, JsValue> {
        to_js(&self.app.notifier().last())
    }

    pub fn update_pph(&self, pph: f64) {
        self.app.update_pph(pph);
    }

    // ---- mining ----

    pub fn fetch_mining_status(&self) -> Promise {
        let app = Rc::clone(&self.app);
        future_to_promise(async move {
            app.fetch_mining_status().await.map_err(reject)?;
            Ok(JsValue::UNDEFINED)
        })
    }

    pub fn start_mining(&self) -> Promise {
        let app = Rc::clone(&self.app);
        future_to_promise(async move {
            app.start_mining().await.map_err(reject)?;
            Ok(JsValue::UNDEFINED)
        })
    }

    /// Resolves with `{ message, diamondsEarned, bonusMessage, user }`.
    pub fn collect_mining(&self) -> Promise {
        let app = Rc::clone(&self.app);
        future_to_promise(async move {
            let outcome = app.collect_mining().await.map_err(reject)?;
            to_js(&CollectResult {
                bonus_message: outcome.bonus_message(),
                message: outcome.message,
                diamonds_earned: outcome.diamonds_earned,
                user: outcome.user,
            })
        })
    }

    /// Session mirror plus request flags.
    pub fn mining_state(&self) -> Result<JsValue, JsValue> {
        to_js(&MiningSnapshot::new(&self.app.mining()))
    }

    /// Display projection for right now.
    pub fn mining_estimate(&self) -> Result<JsValue, JsValue> {
        to_js(&self.app.mining_estimate(now()))
    }

    /// `"idle"`, `"mining"` or `"collectible"`.
    pub fn mining_phase(&self) -> Result<JsValue, JsValue> {
        to_js(&self.app.mining_phase(now()))
    }

    pub fn clear_mining_state(&self) {
        self.app.clear_mining_state();
    }

    /// Call `callback(estimate)` now and every second while mining.
    /// Replaces any running timer.
    pub fn start_timer(&self, callback: js_sys::Function) -> Result<(), JsValue> {
        let timer = MiningTimer::start(Rc::clone(&self.app), callback)?;
        *self.timer.borrow_mut() = Some(timer);
        Ok(())
    }

    pub fn stop_timer(&self) {
        if let Some(timer) = self.timer.borrow_mut().take() {
            timer.stop();
        }
    }

    pub fn timer_running(&self) -> bool {
        self.timer.borrow().as_ref().map_or(false, MiningTimer::is_running)
    }

    // ---- users ----

    pub fn load_users(&self) -> Promise {
        let app = Rc::clone(&self.app);
        future_to_promise(async move {
            app.load_users().await.map_err(reject)?;
            Ok(JsValue::UNDEFINED)
        })
    }

    pub fn load_user(&self, id: u32) -> Promise {
        let app = Rc::clone(&self.app);
        future_to_promise(async move {
            let user = app.load_user(u64::from(id)).await.map_err(reject)?;
            to_js(&user)
        })
    }

    pub fn create_user(&self, user: JsValue) -> Promise {
        let app = Rc::clone(&self.app);
        future_to_promise(async move {
            let user: User = from_js(user)?;
            app.create_user(&user).await.map_err(reject)?;
            Ok(JsValue::UNDEFINED)
        })
    }

    pub fn update_user(&self, id: u32, user: JsValue) -> Promise {
        let app = Rc::clone(&self.app);
        future_to_promise(async move {
            let user: User = from_js(user)?;
            app.update_user(u64::from(id), &user).await.map_err(reject)?;
            Ok(JsValue::UNDEFINED)
        })
    }

    pub fn delete_user(&self, id: u32) -> Promise {
        let app = Rc::clone(&self.app);
        future_to_promise(async move {
            app.delete_user(u64::from(id)).await.map_err(reject)?;
            Ok(JsValue::UNDEFINED)
        })
    }

    pub fn users(&self) -> Result<JsValue, JsValue> {
        to_js(&ListSnapshot::from(&*self.app.users()))
    }

    // ---- tasks ----

    pub fn load_tasks(&self) -> Promise {
        let app = Rc::clone(&self.app);
        future_to_promise(async move {
            app.load_tasks().await.map_err(reject)?;
            Ok(JsValue::UNDEFINED)
        })
    }

    pub fn load_task(&self, id: u32) -> Promise {
        let app = Rc::clone(&self.app);
        future_to_promise(async move {
            app.load_task(u64::from(id)).await.map_err(reject)?;
            Ok(JsValue::UNDEFINED)
        })
    }

    pub fn create_task(&self, draft: JsValue) -> Promise {
        let app = Rc::clone(&self.app);
        future_to_promise(async move {
            let draft: TaskDraft = from_js(draft)?;
            app.create_task(&draft).await.map_err(reject)?;
            Ok(JsValue::UNDEFINED)
        })
    }

    pub fn update_task(&self, id: u32, draft: JsValue) -> Promise {
        let app = Rc::clone(&self.app);
        future_to_promise(async move {
            let draft: TaskDraft = from_js(draft)?;
            app.update_task(u64::from(id), &draft).await.map_err(reject)?;
            Ok(JsValue::UNDEFINED)
        })
    }

    pub fn delete_task(&self, id: u32) -> Promise {
        let app = Rc::clone(&self.app);
        future_to_promise(async move {
            app.delete_task(u64::from(id)).await.map_err(reject)?;
            Ok(JsValue::UNDEFINED)
        })
    }

    pub fn tasks(&self) -> Result<JsValue, JsValue> {
        to_js(&ListSnapshot::from(&*self.app.tasks()))
    }

    // ---- task categories ----

    pub fn load_categories(&self) -> Promise {
        let app = Rc::clone(&self.app);
        future_to_promise(async move {
            app.load_categories().await.map_err(reject)?;
            Ok(JsValue::UNDEFINED)
        })
    }

    pub fn load_category(&self, id: u32) -> Promise {
        let app = Rc::clone(&self.app);
        future_to_promise(async move {
            app.load_category(u64::from(id)).await.map_err(reject)?;
            Ok(JsValue::UNDEFINED)
        })
    }

    pub fn create_category(&self, draft: JsValue) -> Promise {
        let app = Rc::clone(&self.app);
        future_to_promise(async move {
            let draft: CategoryDraft = from_js(draft)?;
            app.create_category(&draft).await.map_err(reject)?;
            Ok(JsValue::UNDEFINED)
        })
    }

    pub fn update_category(&self, id: u32, draft: JsValue) -> Promise {
        let app = Rc::clone(&self.app);
        future_to_promise(async move {
            let draft: CategoryDraft = from_js(draft)?;
            app.update_category(u64::from(id), &draft).await.map_err(reject)?;
            Ok(JsValue::UNDEFINED)
        })
    }

    pub fn delete_category(&self, id: u32) -> Promise {
        let app = Rc::clone(&self.app);
        future_to_promise(async move {
            app.delete_category(u64::from(id)).await.map_err(reject)?;
            Ok(JsValue::UNDEFINED)
        })
    }

    pub fn categories(&self) -> Result<JsValue, JsValue> {
        to_js(&ListSnapshot::from(&*self.app.categories()))
    }

    // ---- airdrop & wallet ----

    pub fn load_airdrop(&self) -> Promise {
        let app = Rc::clone(&self.app);
        future_to_promise(async move {
            app.load_airdrop().await.map_err(reject)?;
            Ok(JsValue::UNDEFINED)
        })
    }

    pub fn load_airdrop_criteria(&self) -> Promise {
        let app = Rc::clone(&self.app);
        future_to_promise(async move {
            app.load_airdrop_criteria().await.map_err(reject)?;
            Ok(JsValue::UNDEFINED)
        })
    }

    /// Active airdrop with its live countdown, plus criteria.
    pub fn airdrop(&self) -> Result<JsValue, JsValue> {
        to_js(&AirdropSnapshot::from(&*self.app.airdrop()))
    }

    pub fn connect_wallet(&self, address: String) -> Promise {
        let app = Rc::clone(&self.app);
        future_to_promise(async move {
            app.connect_wallet(&address).await.map_err(reject)?;
            Ok(JsValue::UNDEFINED)
        })
    }

    pub fn wallet(&self) -> Result<JsValue, JsValue> {
        to_js(&WalletSnapshot::from(&*self.app.wallet()))
    }
}

impl Drop for TapMine {
    fn drop(&mut self) {
        self.stop_timer();
        self.app.unsubscribe_balances(self.bridge);
    }
}
