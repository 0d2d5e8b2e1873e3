//! Threaded interface for submitting and controlling mining requests.
//!
//! Mining itself is synchronous. This module runs requests on background threads
//! over a shared, read-only [`TransactionSet`] and hands back a handle per request.
//! Cancellation is cooperative via an `Arc<AtomicBool>` and is observed between
//! lattice levels (or between header items of the pattern tree).

use std::collections::HashMap;
use std::sync::{Arc, Mutex, atomic::{AtomicBool, Ordering}};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::error::{MiningError, Result};
use crate::miner::Miner;
use crate::normalize::MiningResult;
use crate::settings::MinerConfig;
use crate::transaction::TransactionSet;

/// Cancellation token shared with the worker thread.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);
impl CancelToken {
    pub fn new() -> Self { Self::default() }
    pub fn cancel(&self) { self.0.store(true, Ordering::SeqCst); }
    pub fn is_cancelled(&self) -> bool { self.0.load(Ordering::Relaxed) }
}

/// Checked by the miners at their natural boundaries.
#[derive(Debug, Clone, Default)]
pub struct Guard {
    cancel: Option<CancelToken>,
    deadline: Option<Instant>,
}
impl Guard {
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }
    pub fn check(&self) -> Result<()> {
        let cancelled = self.cancel.as_ref().is_some_and(CancelToken::is_cancelled);
        let expired = self.deadline.is_some_and(|d| Instant::now() >= d);
        if cancelled || expired {
            debug!(cancelled, expired, "mining interrupted");
            return Err(MiningError::Cancelled);
        }
        Ok(())
    }
}

/// Opaque request identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MiningId(u64);

/// Handle to a running or completed mining request.
pub struct MiningHandle {
    pub id: MiningId,
    cancel: CancelToken,
    started: Instant,
    join: JoinHandle<Result<MiningResult>>,
}
impl MiningHandle {
    /// Request cancellation (cooperative). The worker stops at its next level boundary.
    pub fn cancel(&self) { self.cancel.cancel(); }
    /// Wait for the request to finish.
    pub fn join(self) -> Result<MiningResult> {
        self.join
            .join()
            .map_err(|_| MiningError::Invariant("mining thread panicked".into()))?
    }
    /// Elapsed time since start.
    pub fn elapsed(&self) -> Duration { self.started.elapsed() }
}

/// Submission options.
#[derive(Debug, Clone, Default)]
pub struct MiningOptions {
    pub timeout: Option<Duration>,
}

/// Registry managing mining request lifecycles over one shared corpus.
pub struct MiningInterface {
    transactions: Arc<TransactionSet>,
    next_id: Mutex<u64>,
    active: Arc<Mutex<HashMap<MiningId, CancelToken>>>, // for external cancellation
}

impl MiningInterface {
    pub fn new(transactions: Arc<TransactionSet>) -> Self {
        Self {
            transactions,
            next_id: Mutex::new(0),
            active: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn transactions(&self) -> Arc<TransactionSet> {
        Arc::clone(&self.transactions)
    }

    fn allocate_id(&self) -> Result<MiningId> {
        let mut g = self.next_id.lock().map_err(|e| MiningError::Lock(e.to_string()))?;
        *g += 1;
        Ok(MiningId(*g))
    }

    /// Validates the configuration, then mines on a background thread.
    pub fn start(&self, config: MinerConfig, options: MiningOptions) -> Result<MiningHandle> {
        let miner = Miner::new(config)?;
        let id = self.allocate_id()?;
        let cancel = CancelToken::new();
        self.active
            .lock()
            .map_err(|e| MiningError::Lock(e.to_string()))?
            .insert(id, cancel.clone());

        let mut guard = Guard::default().with_cancel(cancel.clone());
        if let Some(timeout) = options.timeout {
            guard = guard.with_timeout(timeout);
        }
        let transactions = Arc::clone(&self.transactions);
        let active = Arc::clone(&self.active);
        let join = std::thread::spawn(move || {
            let outcome = miner.with_guard(guard).mine(&transactions);
            if let Ok(mut active) = active.lock() {
                active.remove(&id);
            }
            outcome
        });
        info!(id = id.0, "mining started");
        Ok(MiningHandle { id, cancel, started: Instant::now(), join })
    }

    /// Mine on the current thread.
    pub fn run_sync(&self, config: MinerConfig) -> Result<MiningResult> {
        Miner::new(config)?.mine(&self.transactions)
    }

    /// Cancel a request by id. Returns false when it is unknown or already finished.
    pub fn cancel(&self, id: MiningId) -> bool {
        match self.active.lock() {
            Ok(active) => match active.get(&id) {
                Some(token) => {
                    token.cancel();
                    true
                }
                None => false,
            },
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_trips_on_cancel_and_deadline() {
        assert!(Guard::default().check().is_ok());
        let token = CancelToken::new();
        let guard = Guard::default().with_cancel(token.clone());
        assert!(guard.check().is_ok());
        token.cancel();
        assert_eq!(guard.check(), Err(MiningError::Cancelled));
        let expired = Guard::default().with_deadline(Instant::now() - Duration::from_millis(1));
        assert_eq!(expired.check(), Err(MiningError::Cancelled));
    }
}
