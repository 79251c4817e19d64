//! Application state owner and the flows that span several stores.

use std::cell::{Ref, RefCell};

use crate::api::{GameApi, Transport};
use crate::category::{CategoryDraft, TaskCategory};
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::estimate::DisplayEstimate;
use crate::notify::{BalanceNotifier, SubscriptionId};
use crate::session::{CollectOutcome, MiningPhase};
use crate::store::{
    AirdropStore, CategoryStore, MiningOp, MiningStore, TaskStore, UsersStore, WalletStore,
};
use crate::task::{Task, TaskDraft};
use crate::timestamp::Timestamp;
use crate::user::{HeaderView, TelegramIdentity, User, UserBalances};
use crate::wallet::WalletConnection;

/// All client state plus the API it is synchronised with.
///
/// Everything runs on one thread. Store borrows are always released before
/// an `.await`, so a timer tick can read state while a request is pending.
pub struct App<T> {
    api: GameApi<T>,
    mining: RefCell<MiningStore>,
    users: RefCell<UsersStore>,
    tasks: RefCell<TaskStore>,
    categories: RefCell<CategoryStore>,
    airdrop: RefCell<AirdropStore>,
    wallet: RefCell<WalletStore>,
    notifier: BalanceNotifier,
}

impl<T: Transport> App<T> {
    pub fn new(transport: T, config: ClientConfig) -> Self {
        App {
            api: GameApi::new(transport, config),
            mining: RefCell::default(),
            users: RefCell::default(),
            tasks: RefCell::default(),
            categories: RefCell::default(),
            airdrop: RefCell::default(),
            wallet: RefCell::default(),
            notifier: BalanceNotifier::new(),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        self.api.config()
    }

    pub fn transport(&self) -> &T {
        self.api.transport()
    }

    pub fn mining(&self) -> Ref<'_, MiningStore> {
        self.mining.borrow()
    }

    pub fn users(&self) -> Ref<'_, UsersStore> {
        self.users.borrow()
    }

    pub fn tasks(&self) -> Ref<'_, TaskStore> {
        self.tasks.borrow()
    }

    pub fn categories(&self) -> Ref<'_, CategoryStore> {
        self.categories.borrow()
    }

    pub fn airdrop(&self) -> Ref<'_, AirdropStore> {
        self.airdrop.borrow()
    }

    pub fn wallet(&self) -> Ref<'_, WalletStore> {
        self.wallet.borrow()
    }

    pub fn notifier(&self) -> &BalanceNotifier {
        &self.notifier
    }

    /// Receive every balance change from now on.
    pub fn subscribe_balances(&self, callback: impl Fn(&UserBalances) + 'static) -> SubscriptionId {
        self.notifier.subscribe(callback)
    }

    pub fn unsubscribe_balances(&self, id: SubscriptionId) -> bool {
        self.notifier.unsubscribe(id)
    }

    // ---- auth ----

    /// Exchange a Telegram identity for a token and load the full profile.
    ///
    /// Only the token exchange can fail the sign-in. A failed profile load
    /// is recorded on the users store and the user from the auth response
    /// is returned.
    pub async fn sign_in(&self, identity: &TelegramIdentity) -> Result<User, ApiError> {
        self.users.borrow_mut().begin();
        let result = self.api.telegram_auth(identity).await;

        let user = match result {
            Ok(user) => user,
            Err(err) => {
                self.users.borrow_mut().fail(err.clone());
                return Err(err);
            }
        };

        self.api.transport().set_bearer_token(user.token.clone());
        self.users.borrow_mut().set_selected(user);

        if let Ok(fresh) = self.refresh_current_user().await {
            return Ok(fresh);
        }
        self.users.borrow().selected.clone().ok_or(ApiError::NotAuthenticated)
    }

    /// Drop the token and every cached record.
    pub fn sign_out(&self) {
        self.api.transport().set_bearer_token(None);
        *self.users.borrow_mut() = UsersStore::default();
        *self.mining.borrow_mut() = MiningStore::default();
        *self.tasks.borrow_mut() = TaskStore::default();
        *self.categories.borrow_mut() = CategoryStore::default();
        self.airdrop.borrow_mut().clear();
        *self.wallet.borrow_mut() = WalletStore::default();
    }

    /// Re-read the signed-in user from the server and broadcast its totals.
    pub async fn refresh_current_user(&self) -> Result<User, ApiError> {
        let id = self.users.borrow().current_user_id().ok_or(ApiError::NotAuthenticated)?;

        self.users.borrow_mut().begin();
        match self.api.fetch_user(id).await {
            Ok(user) => {
                self.users.borrow_mut().refresh_selected(user);
                let fresh = self.users.borrow().selected.clone().ok_or(ApiError::NotAuthenticated)?;
                self.notifier.publish(&fresh.balances);
                Ok(fresh)
            }
            Err(err) => {
                self.users.borrow_mut().fail(err.clone());
                Err(err)
            }
        }
    }

    // ---- mining ----

    pub async fn fetch_mining_status(&self) -> Result<(), ApiError> {
        self.mining.borrow_mut().begin(MiningOp::Status)?;
        let result = self.api.mining_status().await;
        self.mining.borrow_mut().finish_status(result)
    }

    pub async fn start_mining(&self) -> Result<(), ApiError> {
        self.mining.borrow_mut().begin(MiningOp::Start)?;
        let result = self.api.start_mining().await;
        self.mining.borrow_mut().finish_start(result)
    }

    /// Collect the finished session.
    ///
    /// The returned totals are applied and broadcast straight away. The full
    /// user record is then re-fetched, since the server may have applied
    /// adjustments the collect response does not show. A failed re-fetch is
    /// recorded on the users store but does not fail the collect.
    ///
    /// A collect that completes after sign-out neither touches the users
    /// store nor broadcasts.
    pub async fn collect_mining(&self) -> Result<CollectOutcome, ApiError> {
        self.mining.borrow_mut().begin(MiningOp::Collect)?;
        let result = self.api.collect_mining().await;
        let outcome = self.mining.borrow_mut().finish_collect(result)?;

        if self.users.borrow().current_user_id().is_none() {
            return Ok(outcome);
        }

        if let Some(balances) = &outcome.user {
            self.users.borrow_mut().apply_balances(balances);
            self.notifier.publish(balances);
        }
        let _ = self.refresh_current_user().await;

        Ok(outcome)
    }

    /// Display projection of the current session at `now`.
    pub fn mining_estimate(&self, now: Timestamp) -> DisplayEstimate {
        let pph = self.users.borrow().pph();
        DisplayEstimate::compute(&self.mining.borrow().session, pph, now, self.config().session_cap_secs)
    }

    pub fn mining_phase(&self, now: Timestamp) -> MiningPhase {
        self.mining.borrow().session.phase(now)
    }

    pub fn clear_mining_state(&self) {
        self.mining.borrow_mut().clear();
    }

    /// Header model built from the signed-in user.
    pub fn header_view(&self) -> HeaderView {
        HeaderView::from_user(self.users.borrow().selected.as_ref(), &self.config().image_url)
    }

    pub fn update_pph(&self, pph: f64) {
        self.users.borrow_mut().update_pph(pph);
    }

    // ---- users (admin) ----

    pub async fn load_users(&self) -> Result<(), ApiError> {
        self.users.borrow_mut().begin();
        let result = self.api.fetch_users().await;
        settle(&self.users, result, |store, list| store.set_list(list))
    }

    /// Load a user into the detail slot without touching the session.
    pub async fn load_user(&self, id: u64) -> Result<User, ApiError> {
        self.users.borrow_mut().begin();
        let result = self.api.fetch_user(id).await;
        settle(&self.users, result, |store, user: User| {
            store.loading = false;
            user
        })
    }

    pub async fn create_user(&self, user: &User) -> Result<(), ApiError> {
        self.users.borrow_mut().begin();
        let result = self.api.create_user(user).await;
        settle(&self.users, result, |store, created| match created {
            Some(created) => store.insert_front(created),
            None => mark_success(store),
        })
    }

    pub async fn update_user(&self, id: u64, user: &User) -> Result<(), ApiError> {
        self.users.borrow_mut().begin();
        let result = self.api.update_user(id, user).await;
        settle(&self.users, result, |store, updated| match updated {
            Some(updated) => {
                store.replace(updated);
            }
            None => mark_success(store),
        })
    }

    pub async fn delete_user(&self, id: u64) -> Result<(), ApiError> {
        self.users.borrow_mut().begin();
        let result = self.api.delete_user(id).await;
        settle(&self.users, result, |store, ()| {
            store.remove(id);
        })
    }

    // ---- tasks ----

    pub async fn load_tasks(&self) -> Result<(), ApiError> {
        self.tasks.borrow_mut().begin();
        let result = self.api.fetch_tasks().await;
        settle(&self.tasks, result, |store, list| store.set_list(list))
    }

    pub async fn load_task(&self, id: u64) -> Result<(), ApiError> {
        self.tasks.borrow_mut().begin();
        let result = self.api.fetch_task(id).await;
        settle(&self.tasks, result, |store, task| store.set_selected(task))
    }

    pub async fn create_task(&self, draft: &TaskDraft) -> Result<(), ApiError> {
        draft
            .validate()
            .map_err(|msg| ApiError::Http { status: 422, message: msg.to_string() })?;

        self.tasks.borrow_mut().begin();
        let result = self.api.create_task(draft).await;
        settle(&self.tasks, result, |store, created: Option<Task>| match created {
            Some(created) => store.insert_front(created),
            None => mark_success(store),
        })
    }

    pub async fn update_task(&self, id: u64, draft: &TaskDraft) -> Result<(), ApiError> {
        self.tasks.borrow_mut().begin();
        let result = self.api.update_task(id, draft).await;
        settle(&self.tasks, result, |store, updated: Option<Task>| match updated {
            Some(updated) => {
                store.replace(updated);
            }
            None => mark_success(store),
        })
    }

    pub async fn delete_task(&self, id: u64) -> Result<(), ApiError> {
        self.tasks.borrow_mut().begin();
        let result = self.api.delete_task(id).await;
        settle(&self.tasks, result, |store, ()| {
            store.remove(id);
        })
    }

    // ---- task categories ----

    pub async fn load_categories(&self) -> Result<(), ApiError> {
        self.categories.borrow_mut().begin();
        let result = self.api.fetch_categories().await;
        settle(&self.categories, result, |store, list| store.set_list(list))
    }

    pub async fn load_category(&self, id: u64) -> Result<(), ApiError> {
        self.categories.borrow_mut().begin();
        let result = self.api.fetch_category(id).await;
        settle(&self.categories, result, |store, category| store.set_selected(category))
    }

    pub async fn create_category(&self, draft: &CategoryDraft) -> Result<(), ApiError> {
        self.categories.borrow_mut().begin();
        let result = self.api.create_category(draft).await;
        settle(&self.categories, result, |store, created: Option<TaskCategory>| match created {
            Some(created) => store.insert_front(created),
            None => mark_success(store),
        })
    }

    pub async fn update_category(&self, id: u64, draft: &CategoryDraft) -> Result<(), ApiError> {
        self.categories.borrow_mut().begin();
        let result = self.api.update_category(id, draft).await;
        settle(&self.categories, result, |store, updated: Option<TaskCategory>| match updated {
            Some(updated) => {
                store.replace(updated);
            }
            None => mark_success(store),
        })
    }

    pub async fn delete_category(&self, id: u64) -> Result<(), ApiError> {
        self.categories.borrow_mut().begin();
        let result = self.api.delete_category(id).await;
        settle(&self.categories, result, |store, ()| {
            store.remove(id);
        })
    }

    // ---- airdrop & wallet ----

    pub async fn load_airdrop(&self) -> Result<(), ApiError> {
        self.airdrop.borrow_mut().begin();
        let result = self.api.active_airdrop().await;
        settle(&self.airdrop, result, |store, active| store.set_active(active))
    }

    pub async fn load_airdrop_criteria(&self) -> Result<(), ApiError> {
        self.airdrop.borrow_mut().begin();
        let result = self.api.airdrop_criteria().await;
        settle(&self.airdrop, result, |store, criteria| store.set_criteria(criteria))
    }

    pub async fn connect_wallet(&self, address: &str) -> Result<(), ApiError> {
        let mut wallet = WalletConnection::new(address);
        if let Some(id) = self.users.borrow().current_user_id() {
            wallet = wallet.with_user(id);
        }

        self.wallet.borrow_mut().begin();
        let result = self.api.connect_wallet(&wallet).await;
        settle(&self.wallet, result, |store, data| store.saved(data))
    }
}

/// Stores that can record a failed request.
trait Fallible {
    fn record_failure(&mut self, err: ApiError);
}

impl<R: crate::store::Record> Fallible for crate::store::Collection<R> {
    fn record_failure(&mut self, err: ApiError) {
        self.fail(err);
    }
}

impl Fallible for AirdropStore {
    fn record_failure(&mut self, err: ApiError) {
        self.fail(err);
    }
}

impl Fallible for WalletStore {
    fn record_failure(&mut self, err: ApiError) {
        self.fail(err);
    }
}

/// Apply a request result to `store`: `on_ok` on success, the error otherwise.
fn settle<S: Fallible, V, R>(
    store: &RefCell<S>,
    result: Result<V, ApiError>,
    on_ok: impl FnOnce(&mut S, V) -> R,
) -> Result<R, ApiError> {
    let mut store = store.borrow_mut();
    match result {
        Ok(value) => Ok(on_ok(&mut store, value)),
        Err(err) => {
            store.record_failure(err.clone());
            Err(err)
        }
    }
}

fn mark_success<R>(store: &mut crate::store::Collection<R>) {
    store.loading = false;
    store.success = true;
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use futures::executor::block_on;

    use super::*;
    use crate::api::mock::MockTransport;
    use crate::api::Method;

    const USER: &str = r#"{"id": 5, "first_name": "Ada", "total_coins": 100, "total_gems": 1, "PPH": 3600}"#;

    fn signed_in_app() -> App<MockTransport> {
        let app = App::new(MockTransport::default(), ClientConfig::new().with_api_url("https://api.test"));
        app.transport()
            .reply(r#"{"user": {"id": 5, "first_name": "Ada"}, "token": "secret"}"#)
            .reply(USER);
        block_on(app.sign_in(&TelegramIdentity { telegram_id: "77".into(), ..Default::default() })).unwrap();
        app
    }

    #[test]
    fn test_sign_in_sets_token_and_loads_profile() {
        let app = signed_in_app();
        assert_eq!(app.transport().token.borrow().as_deref(), Some("secret"));
        assert_eq!(app.users().token(), Some("secret"));
        assert_eq!(app.users().pph(), 3600.0);
        assert_eq!(
            app.transport().urls(),
            vec![
                (Method::Post, "https://api.test/admin/auth/telegram".to_string()),
                (Method::Get, "https://api.test/users/5".to_string()),
            ]
        );
    }

    #[test]
    fn test_failed_sign_in_recorded() {
        let app = App::new(MockTransport::default(), ClientConfig::new());
        app.transport().fail(ApiError::Http { status: 401, message: "Auth failed".into() });
        assert!(block_on(app.sign_in(&TelegramIdentity::default())).is_err());
        assert!(app.users().error.is_some());
        assert!(app.transport().token.borrow().is_none());
    }

    #[test]
    fn test_profile_failure_keeps_sign_in() {
        let app = App::new(MockTransport::default(), ClientConfig::new());
        app.transport()
            .reply(r#"{"user": {"id": 5, "first_name": "Ada"}, "token": "secret"}"#)
            .fail(ApiError::Network("offline".into()));

        let user = block_on(app.sign_in(&TelegramIdentity { telegram_id: "77".into(), ..Default::default() })).unwrap();
        assert_eq!(user.id, 5);
        assert_eq!(user.token.as_deref(), Some("secret"));
        assert_eq!(app.users().token(), Some("secret"));
        assert_eq!(app.users().error, Some(ApiError::Network("offline".into())));
        assert!(!app.users().loading);
    }

    #[test]
    fn test_half_minute_estimate() {
        let app = signed_in_app();
        app.transport().reply(r#"{"isMining": true, "started_at": 1000, "ends_at": 1060, "pending_coins": 0}"#);
        block_on(app.fetch_mining_status()).unwrap();

        let est = app.mining_estimate(Timestamp::from_secs(1030));
        assert_eq!(est.pending_coins, 30);
        assert!(!est.can_collect);
        assert_eq!(app.mining_phase(Timestamp::from_secs(1060)), MiningPhase::Collectible);
    }

    #[test]
    fn test_ended_session_collectible_on_load() {
        let app = signed_in_app();
        app.transport().reply(r#"{"isMining": true, "started_at": 900, "ends_at": 990, "pending_coins": 60}"#);
        block_on(app.fetch_mining_status()).unwrap();

        let est = app.mining_estimate(Timestamp::from_secs(1000));
        assert_eq!(est.time_remaining_secs, 0);
        assert!(est.can_collect);
    }

    #[test]
    fn test_collect_updates_balances_and_notifies() {
        let app = signed_in_app();
        let header = Rc::new(RefCell::new(app.header_view()));
        let h = Rc::clone(&header);
        app.subscribe_balances(move |b| h.borrow_mut().apply(b));

        app.transport()
            .reply(r#"{"isMining": true, "started_at": 1, "ends_at": 61, "pending_coins": 60}"#)
            .reply(r#"{"user": {"total_coins": 160, "total_gems": 1, "total_diamonds": 1}, "diamonds_earned": 1}"#)
            .reply(r#"{"id": 5, "first_name": "Ada", "total_coins": 165, "total_gems": 1, "total_diamonds": 1, "PPH": 3600}"#);

        block_on(app.fetch_mining_status()).unwrap();
        let outcome = block_on(app.collect_mining()).unwrap();

        assert_eq!(outcome.bonus_message().as_deref(), Some("You earned a Diamond!"));
        assert!(!app.mining().session.is_mining);
        assert_eq!(app.mining().session.started_at, None);

        // the refresh wins over the collect snapshot
        let users = app.users();
        let user = users.selected.as_ref().unwrap();
        assert_eq!(user.balances.total_coins, 165);
        assert_eq!(user.token.as_deref(), Some("secret"));
        assert_eq!(header.borrow().coins, 165);
        assert_eq!(header.borrow().diamonds, 1);
    }

    #[test]
    fn test_collect_without_diamonds() {
        let app = signed_in_app();
        app.transport()
            .reply(r#"{"user": {"total_coins": 130, "total_gems": 2}}"#)
            .reply(r#"{"id": 5, "total_coins": 130, "total_gems": 2}"#);

        let outcome = block_on(app.collect_mining()).unwrap();
        assert_eq!(outcome.bonus_message(), None);
        assert_eq!(app.users().selected.as_ref().unwrap().balances.total_coins, 130);
    }

    #[test]
    fn test_refresh_failure_does_not_fail_collect() {
        let app = signed_in_app();
        app.transport()
            .reply(r#"{"user": {"total_coins": 130}}"#)
            .fail(ApiError::Network("offline".into()));

        assert!(block_on(app.collect_mining()).is_ok());
        assert_eq!(app.users().selected.as_ref().unwrap().balances.total_coins, 130);
        assert_eq!(app.users().error, Some(ApiError::Network("offline".into())));
    }

    #[test]
    fn test_collect_after_sign_out_is_silent() {
        let app = signed_in_app();
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        app.subscribe_balances(move |_| h.set(h.get() + 1));
        app.sign_out();

        app.transport().reply(r#"{"user": {"total_coins": 130}}"#);
        let sent_before = app.transport().requests.borrow().len();
        let outcome = block_on(app.collect_mining()).unwrap();

        assert_eq!(outcome.user.map(|b| b.total_coins), Some(130));
        assert_eq!(hits.get(), 0);
        assert!(app.users().selected.is_none());
        // no profile refresh either
        assert_eq!(app.transport().requests.borrow().len(), sent_before + 1);
    }

    #[test]
    fn test_rejected_collect_keeps_session() {
        let app = signed_in_app();
        app.transport()
            .reply(r#"{"isMining": true, "started_at": 1, "ends_at": 61}"#)
            .fail(ApiError::Http { status: 400, message: "Mining not finished".into() });
        block_on(app.fetch_mining_status()).unwrap();

        let err = block_on(app.collect_mining()).unwrap_err();
        assert_eq!(err.message(), "Mining not finished");
        assert!(app.mining().session.is_mining);
        assert_eq!(app.mining().error, Some(err));
    }

    #[test]
    fn test_double_collect_sends_one_request() {
        let app = signed_in_app();
        let sent_before = app.transport().requests.borrow().len();

        app.mining.borrow_mut().begin(MiningOp::Collect).unwrap();
        assert_eq!(block_on(app.collect_mining()), Err(ApiError::Busy));
        assert_eq!(block_on(app.start_mining()), Err(ApiError::Busy));
        assert_eq!(app.transport().requests.borrow().len(), sent_before);
    }

    #[test]
    fn test_start_then_estimate_resets() {
        let app = signed_in_app();
        app.transport().reply(r#"{"started_at": 2000, "ends_at": "1970-01-01T00:34:20Z"}"#);
        block_on(app.start_mining()).unwrap();

        let mining = app.mining();
        assert!(mining.session.is_mining);
        assert_eq!(mining.session.ends_at, Some(Timestamp::from_secs(2060)));
        assert_eq!(mining.session.pending_coins, 0);
        assert!(mining.success);
    }

    #[test]
    fn test_category_crud() {
        let app = signed_in_app();
        app.transport()
            .reply(r#"[{"id": 1, "label": "Social"}, {"id": 2, "label": "Video"}]"#)
            .reply(r#"{"id": 3, "label": "Games"}"#)
            .reply(r#"{"data": {"id": 1, "label": "Socials"}}"#)
            .reply("");

        block_on(app.load_categories()).unwrap();
        block_on(app.create_category(&CategoryDraft { label: "Games".into(), ..Default::default() })).unwrap();
        block_on(app.update_category(1, &CategoryDraft { label: "Socials".into(), ..Default::default() })).unwrap();
        block_on(app.delete_category(2)).unwrap();

        let labels: Vec<String> = app.categories().list.iter().map(|c| c.label.clone()).collect();
        assert_eq!(labels, vec!["Games".to_string(), "Socials".to_string()]);
    }

    #[test]
    fn test_task_without_label_never_sent() {
        let app = signed_in_app();
        let sent_before = app.transport().requests.borrow().len();
        let err = block_on(app.create_task(&TaskDraft::default())).unwrap_err();
        assert_eq!(err.message(), "Task label is required");
        assert_eq!(app.transport().requests.borrow().len(), sent_before);
    }

    #[test]
    fn test_task_delete_failure_keeps_list() {
        let app = signed_in_app();
        app.transport()
            .reply(r#"{"data": [{"id": 1, "label": "a"}]}"#)
            .fail(ApiError::Http { status: 403, message: "Forbidden".into() });
        block_on(app.load_tasks()).unwrap();
        assert!(block_on(app.delete_task(1)).is_err());
        assert_eq!(app.tasks().list.len(), 1);
        assert!(app.tasks().error.is_some());
    }

    #[test]
    fn test_wallet_connect_includes_user() {
        let app = signed_in_app();
        app.transport().reply(r#"{"connected": true}"#);
        block_on(app.connect_wallet("UQxyz")).unwrap();
        assert!(app.wallet().is_connected());

        let requests = app.transport().requests.borrow();
        let crate::api::Body::Json(body) = &requests.last().unwrap().body else {
            panic!("expected json body")
        };
        assert!(body.contains(r#""user_id":5"#));
    }

    #[test]
    fn test_sign_out_clears_everything() {
        let app = signed_in_app();
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        app.subscribe_balances(move |_| h.set(h.get() + 1));

        app.sign_out();
        assert!(app.users().selected.is_none());
        assert!(app.transport().token.borrow().is_none());
        assert_eq!(block_on(app.refresh_current_user()), Err(ApiError::NotAuthenticated));
        assert_eq!(hits.get(), 0);
    }
}
