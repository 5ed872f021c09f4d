//! Shared account state for cross-instrument live routing.
//!
//! Several instruments may run their own lifecycle managers against one
//! account. All equity mutations go through a single mutex: the router
//! holding the guard is the single writer for the duration of a bar, and
//! readers take cloned snapshots that are possibly stale but never torn.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::domain::AccountState;

/// Account state behind a single-writer serialization boundary.
#[derive(Debug, Clone)]
pub struct SharedAccount {
    inner: Arc<Mutex<AccountState>>,
}

impl SharedAccount {
    pub fn new(initial_equity: f64) -> Self {
        Self {
            inner: Arc::new(Mutex::new(AccountState::new(initial_equity))),
        }
    }

    /// Exclusive access for a mutation region (one bar's worth of updates).
    ///
    /// A poisoned lock is recovered rather than propagated: the account
    /// state is plain data and remains internally consistent after any
    /// panic in an unrelated holder.
    pub fn lock(&self) -> MutexGuard<'_, AccountState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// A committed snapshot for triage reads. May lag the writer, but can
    /// never observe a partially applied update.
    pub fn snapshot(&self) -> AccountState {
        self.lock().clone()
    }
}
