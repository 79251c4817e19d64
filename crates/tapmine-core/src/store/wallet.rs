//! Connected wallet as acknowledged by the server.

use serde_json::Value;

use crate::error::ApiError;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WalletStore {
    /// Raw response of the last successful connect.
    pub data: Option<Value>,
    pub loading: bool,
    pub error: Option<ApiError>,
}

impl WalletStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self) {
        self.loading = true;
        self.error = None;
    }

    pub fn fail(&mut self, err: ApiError) {
        self.loading = false;
        self.error = Some(err);
    }

    pub fn saved(&mut self, data: Value) {
        self.loading = false;
        self.data = Some(data);
    }

    pub fn is_connected(&self) -> bool {
        self.data.is_some()
    }
}
