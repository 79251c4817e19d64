//! Application state, one struct per concern.
//!
//! Stores never perform I/O. [`crate::app::App`] issues the requests and
//! feeds results in through the command handlers below, so every mutation
//! goes through a named method.

pub mod airdrop;
pub mod mining;
pub mod users;
pub mod wallet;

pub use airdrop::AirdropStore;
pub use mining::{MiningOp, MiningStore};
pub use users::UsersStore;
pub use wallet::WalletStore;

use crate::category::TaskCategory;
use crate::error::ApiError;
use crate::task::Task;

/// Anything addressed by a numeric id on the server.
pub trait Record {
    fn record_id(&self) -> u64;
}

/// List/detail cache for a CRUD resource.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection<T> {
    /// Everything the last list fetch returned, plus local adds.
    pub list: Vec<T>,
    /// The record opened in a detail view.
    pub selected: Option<T>,
    pub loading: bool,
    pub error: Option<ApiError>,
    /// Set by a successful create or update.
    pub success: bool,
}

pub type TaskStore = Collection<Task>;
pub type CategoryStore = Collection<TaskCategory>;

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Collection {
            list: Vec::new(),
            selected: None,
            loading: false,
            error: None,
            success: false,
        }
    }
}

impl<T: Record> Collection<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// A request is about to go out.
    pub fn begin(&mut self) {
        self.loading = true;
        self.error = None;
        self.success = false;
    }

    /// The request failed; cached data is left as it was.
    pub fn fail(&mut self, err: ApiError) {
        self.loading = false;
        self.error = Some(err);
    }

    pub fn set_list(&mut self, list: Vec<T>) {
        self.loading = false;
        self.list = list;
    }

    pub fn set_selected(&mut self, item: T) {
        self.loading = false;
        self.selected = Some(item);
    }

    /// A created record goes to the front of the list.
    pub fn insert_front(&mut self, item: T) {
        self.loading = false;
        self.success = true;
        self.list.insert(0, item);
    }

    /// Swap in an updated record. Returns false if it was not listed.
    pub fn replace(&mut self, item: T) -> bool {
        self.loading = false;
        self.success = true;

        let id = item.record_id();
        match self.list.iter_mut().find(|existing| existing.record_id() == id) {
            Some(slot) => {
                *slot = item;
                true
            }
            None => false,
        }
    }

    /// Drop a deleted record from the list.
    pub fn remove(&mut self, id: u64) -> Option<T> {
        self.loading = false;
        let pos = self.list.iter().position(|item| item.record_id() == id)?;
        Some(self.list.remove(pos))
    }

    pub fn get(&self, id: u64) -> Option<&T> {
        self.list.iter().find(|item| item.record_id() == id)
    }

    /// Reset the request flags, keeping cached records.
    pub fn clear_flags(&mut self) {
        self.loading = false;
        self.error = None;
        self.success = false;
    }

    pub fn clear_selected(&mut self) {
        self.selected = None;
    }
}
