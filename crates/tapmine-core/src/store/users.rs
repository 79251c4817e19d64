//! Users: the admin list and the signed-in user's cached record.

use super::{Collection, Record};
use crate::user::{User, UserBalances};

/// `selected` holds the signed-in user; `list` is the admin user table.
pub type UsersStore = Collection<User>;

impl Record for User {
    fn record_id(&self) -> u64 {
        self.id
    }
}

impl Collection<User> {
    /// Id of the signed-in user, if any.
    pub fn current_user_id(&self) -> Option<u64> {
        self.selected.as_ref().map(|u| u.id).filter(|id| *id != 0)
    }

    /// Bearer token of the signed-in user, if any.
    pub fn token(&self) -> Option<&str> {
        self.selected.as_ref().and_then(|u| u.token.as_deref())
    }

    /// Replace the signed-in user with a fresh server copy.
    ///
    /// `/users/{id}` does not echo the token, so the current one is carried
    /// over when the refresh lacks it.
    pub fn refresh_selected(&mut self, mut fresh: User) {
        if fresh.token.is_none() {
            fresh.token = self.selected.as_ref().and_then(|u| u.token.clone());
        }
        self.set_selected(fresh);
    }

    /// Overwrite the signed-in user's currency totals.
    pub fn apply_balances(&mut self, balances: &UserBalances) {
        if let Some(user) = self.selected.as_mut() {
            user.apply_balances(balances);
        }
    }

    /// Set the signed-in user's payout rate after an upgrade.
    pub fn update_pph(&mut self, pph: f64) {
        if let Some(user) = self.selected.as_mut() {
            user.balances.pph = pph;
        }
    }

    /// Payout rate used by the mining display; 0 when signed out.
    pub fn pph(&self) -> f64 {
        self.selected.as_ref().map_or(0.0, |u| u.balances.pph)
    }
}
