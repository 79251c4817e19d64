//! Active airdrop and its criteria.

use crate::airdrop::{Airdrop, AirdropCriterion};
use crate::error::ApiError;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AirdropStore {
    pub active: Option<Airdrop>,
    pub criteria: Vec<AirdropCriterion>,
    pub loading: bool,
    pub error: Option<ApiError>,
}

impl AirdropStore {
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

    pub fn set_active(&mut self, active: Option<Airdrop>) {
        self.loading = false;
        self.active = active;
    }

    pub fn set_criteria(&mut self, criteria: Vec<AirdropCriterion>) {
        self.loading = false;
        self.criteria = criteria;
    }

    /// Forget everything, e.g. on sign-out.
    pub fn clear(&mut self) {
        *self = AirdropStore::default();
    }
}
