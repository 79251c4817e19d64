//! User records, cached balances and the header view model.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::estimate::{format_coins, group_thousands};
use crate::wire::{lenient_f64, lenient_opt_string, lenient_opt_u64, lenient_u64};

/// Role value the backend uses for administrators.
pub const ADMIN_ROLE: u64 = 1;

/// Avatar shown when a user has none.
pub const DEFAULT_AVATAR: &str = "default-avatar.jpg";

/// Server-owned balances. The client only ever replaces these wholesale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserBalances {
    #[serde(default, deserialize_with = "lenient_u64")]
    pub total_coins: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub total_gems: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub total_diamonds: u64,
    /// Payout per hour.
    #[serde(rename = "PPH", default, deserialize_with = "lenient_f64")]
    pub pph: f64,
}

/// Full user record as returned by `/users/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default, deserialize_with = "lenient_u64")]
    pub id: u64,
    #[serde(default, deserialize_with = "lenient_opt_string", skip_serializing_if = "Option::is_none")]
    pub telegram_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telegram_username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub role: u64,
    #[serde(default, deserialize_with = "lenient_opt_u64", skip_serializing_if = "Option::is_none")]
    pub level: Option<u64>,
    #[serde(flatten)]
    pub balances: UserBalances,
    /// Bearer token, present only on the record returned by auth.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Fields this client does not model, kept so admin edits round-trip.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == ADMIN_ROLE
    }

    /// Level with the backend's implicit default of 1.
    pub fn level(&self) -> u64 {
        self.level.unwrap_or(1)
    }

    /// Overwrite the three currency totals, leaving PPH alone.
    pub fn apply_balances(&mut self, balances: &UserBalances) {
        self.balances.total_coins = balances.total_coins;
        self.balances.total_gems = balances.total_gems;
        self.balances.total_diamonds = balances.total_diamonds;
    }

    /// Name for the header: first name, then either username, then "User".
    pub fn display_name(&self) -> String {
        [&self.first_name, &self.telegram_username, &self.username]
            .into_iter()
            .filter_map(|n| n.as_deref())
            .find(|n| !n.is_empty())
            .unwrap_or("User")
            .to_string()
    }

    /// Absolute avatar URL; relative paths are resolved against `image_base`.
    pub fn avatar_url(&self, image_base: &str) -> String {
        let path = self
            .photo_url
            .as_deref()
            .or(self.avatar.as_deref())
            .filter(|p| !p.is_empty())
            .unwrap_or(DEFAULT_AVATAR);

        if path.starts_with("http") {
            path.to_string()
        } else {
            format!("{image_base}{path}")
        }
    }
}

/// Identity read from the Telegram WebApp and exchanged for a token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelegramIdentity {
    pub telegram_id: String,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub language_code: Option<String>,
    pub photo_url: Option<String>,
}

/// `POST /admin/auth/telegram`
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
}

impl AuthResponse {
    /// The signed-in user with its token attached.
    pub fn into_user(self) -> User {
        let mut user = self.user;
        user.token = Some(self.token);
        user
    }
}

/// View model behind the persistent header.
///
/// It never derives totals; each balance broadcast replaces them verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HeaderView {
    pub display_name: String,
    pub avatar_url: String,
    pub coins: u64,
    pub gems: u64,
    pub diamonds: u64,
}

impl HeaderView {
    pub fn from_user(user: Option<&User>, image_base: &str) -> Self {
        match user {
            Some(user) => HeaderView {
                display_name: user.display_name(),
                avatar_url: user.avatar_url(image_base),
                coins: user.balances.total_coins,
                gems: user.balances.total_gems,
                diamonds: user.balances.total_diamonds,
            },
            None => HeaderView {
                display_name: "User".to_string(),
                avatar_url: format!("{image_base}{DEFAULT_AVATAR}"),
                ..Default::default()
            },
        }
    }

    /// Last write wins.
    pub fn apply(&mut self, balances: &UserBalances) {
        self.coins = balances.total_coins;
        self.gems = balances.total_gems;
        self.diamonds = balances.total_diamonds;
    }

    pub fn coins_display(&self) -> String {
        format_coins(self.coins)
    }

    pub fn gems_display(&self) -> String {
        group_thousands(self.gems)
    }

    /// Diamonds are only shown once the user has some.
    pub fn diamonds_display(&self) -> Option<String> {
        (self.diamonds > 0).then(|| group_thousands(self.diamonds))
    }
}
