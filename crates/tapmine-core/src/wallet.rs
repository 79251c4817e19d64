//! TON wallet connection payload.

use serde::{Deserialize, Serialize};

/// Body of `POST /wallets/connect`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletConnection {
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wallet_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<u64>,
}

impl WalletConnection {
    pub fn new(address: impl Into<String>) -> Self {
        WalletConnection {
            address: address.into(),
            wallet_type: Some("ton".to_string()),
            user_id: None,
        }
    }

    pub fn with_user(mut self, user_id: u64) -> Self {
        self.user_id = Some(user_id);
        self
    }

    /// Abbreviated address for display, e.g. `UQAb…x9Zk`.
    pub fn short_address(&self) -> String {
        let chars: Vec<char> = self.address.chars().collect();
        if chars.len() <= 10 {
            return self.address.clone();
        }
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}…{tail}")
    }
}
