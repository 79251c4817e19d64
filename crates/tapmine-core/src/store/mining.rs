//! Last known server-side mining session, plus request bookkeeping.

use crate::error::ApiError;
use crate::session::{CollectOutcome, CollectResponse, MiningSession, MiningStatus, StartResponse};

/// The three mining requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MiningOp {
    Status,
    Start,
    Collect,
}

impl MiningOp {
    /// Start and collect change server state; status only reads it.
    pub fn is_write(self) -> bool {
        !matches!(self, MiningOp::Status)
    }

    /// Error text used when the server body has none.
    pub fn fallback_message(self) -> &'static str {
        match self {
            MiningOp::Status => "Failed to fetch mining status",
            MiningOp::Start => "Failed to start mining",
            MiningOp::Collect => "Failed to collect mining reward",
        }
    }
}

/// Mirror of the server's mining session.
///
/// Usage is always `begin(op)`, then the request, then the matching
/// `finish_*` with its result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MiningStore {
    pub session: MiningSession,
    pub error: Option<ApiError>,
    /// Set by a successful start or collect.
    pub success: bool,
    status_pending: bool,
    in_flight: Option<MiningOp>,
}

impl MiningStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any request is outstanding.
    pub fn loading(&self) -> bool {
        self.status_pending || self.in_flight.is_some()
    }

    /// The start or collect currently awaiting a response.
    pub fn in_flight(&self) -> Option<MiningOp> {
        self.in_flight
    }

    /// Mark `op` as started.
    ///
    /// Only one start/collect may be outstanding; a second one is refused
    /// with [`ApiError::Busy`] and leaves the store untouched.
    pub fn begin(&mut self, op: MiningOp) -> Result<(), ApiError> {
        if op.is_write() {
            if self.in_flight.is_some() {
                return Err(ApiError::Busy);
            }
            self.in_flight = Some(op);
            self.success = false;
        } else {
            self.status_pending = true;
        }

        self.error = None;
        Ok(())
    }

    pub fn finish_status(&mut self, result: Result<MiningStatus, ApiError>) -> Result<(), ApiError> {
        self.status_pending = false;
        let status = self.record(result)?;
        self.session.adopt_status(status);
        Ok(())
    }

    pub fn finish_start(&mut self, result: Result<StartResponse, ApiError>) -> Result<(), ApiError> {
        self.in_flight = None;
        let started = self.record(result)?;
        self.session.adopt_start(started);
        self.success = true;
        Ok(())
    }

    /// On success the session goes back to idle whatever it held before.
    pub fn finish_collect(
        &mut self,
        result: Result<CollectResponse, ApiError>,
    ) -> Result<CollectOutcome, ApiError> {
        self.in_flight = None;
        let collected = self.record(result)?;
        self.session.reset();
        self.success = true;
        Ok(collected.into())
    }

    /// Reset request flags without touching the session.
    pub fn clear(&mut self) {
        self.error = None;
        self.success = false;
    }

    fn record<T>(&mut self, result: Result<T, ApiError>) -> Result<T, ApiError> {
        result.map_err(|err| {
            self.error = Some(err.clone());
            err
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timestamp::Timestamp;
    use crate::user::UserBalances;

    fn active_store() -> MiningStore {
        let mut store = MiningStore::new();
        store.begin(MiningOp::Status).unwrap();
        store
            .finish_status(Ok(MiningStatus {
                is_mining: true,
                started_at: Some(Timestamp::from_secs(100)),
                ends_at: Some(Timestamp::from_secs(160)),
                pending_coins: 12,
            }))
            .unwrap();
        store
    }

    #[test]
    fn test_status_replaces_session() {
        let store = active_store();
        assert!(store.session.is_mining);
        assert_eq!(store.session.pending_coins, 12);
        assert!(!store.loading());
    }

    #[test]
    fn test_failed_status_keeps_session() {
        let mut store = active_store();
        let before = store.session.clone();
        store.begin(MiningOp::Status).unwrap();
        let err = ApiError::Network("offline".into());
        assert_eq!(store.finish_status(Err(err.clone())), Err(err.clone()));
        assert_eq!(store.session, before);
        assert_eq!(store.error, Some(err));
    }

    #[test]
    fn test_rejected_start_keeps_timestamps() {
        let mut store = active_store();
        store.begin(MiningOp::Start).unwrap();
        let err = ApiError::Http { status: 409, message: "Mining already active".into() };
        assert!(store.finish_start(Err(err)).is_err());
        assert_eq!(store.session.started_at, Some(Timestamp::from_secs(100)));
        assert_eq!(store.session.ends_at, Some(Timestamp::from_secs(160)));
        assert!(!store.success);
    }

    #[test]
    fn test_start_adopts_server_times() {
        let mut store = MiningStore::new();
        store.begin(MiningOp::Start).unwrap();
        store
            .finish_start(Ok(StartResponse {
                started_at: Some(Timestamp::from_secs(500)),
                ends_at: Some(Timestamp::from_secs(560)),
            }))
            .unwrap();
        assert!(store.session.is_mining);
        assert_eq!(store.session.pending_coins, 0);
        assert!(store.success);
        assert_eq!(store.in_flight(), None);
    }

    #[test]
    fn test_collect_resets_regardless_of_pending() {
        for pending in [0, 1, 999_999] {
            let mut store = active_store();
            store.session.pending_coins = pending;
            store.begin(MiningOp::Collect).unwrap();
            let outcome = store
                .finish_collect(Ok(CollectResponse {
                    user: Some(UserBalances { total_coins: 10, ..Default::default() }),
                    ..Default::default()
                }))
                .unwrap();
            assert_eq!(store.session, MiningSession::default());
            assert_eq!(outcome.user.map(|u| u.total_coins), Some(10));
        }
    }

    #[test]
    fn test_second_write_is_busy() {
        let mut store = active_store();
        store.begin(MiningOp::Collect).unwrap();
        assert_eq!(store.begin(MiningOp::Collect), Err(ApiError::Busy));
        assert_eq!(store.begin(MiningOp::Start), Err(ApiError::Busy));
        assert!(store.error.is_none());

        // status reads are never blocked
        assert!(store.begin(MiningOp::Status).is_ok());
        store.finish_status(Ok(MiningStatus::default())).unwrap();
        assert!(store.loading());

        store.finish_collect(Ok(CollectResponse::default())).unwrap();
        assert!(!store.loading());
        assert!(store.begin(MiningOp::Start).is_ok());
    }

    #[test]
    fn test_clear_keeps_session() {
        let mut store = active_store();
        store.error = Some(ApiError::Busy);
        store.success = true;
        store.clear();
        assert!(store.error.is_none());
        assert!(!store.success);
        assert!(store.session.is_mining);
    }
}
