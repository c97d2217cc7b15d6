//! In-process store used by tests and `--memory-store` runs.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;

use super::SignalStore;
use crate::ingest::NormalizedSignal;
use crate::utils::error::{Error, Result};

#[derive(Debug, Clone)]
enum Failure {
    Unavailable(String),
    Rejected(String),
}

/// HashMap-backed store; a batch is applied under one write lock.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, String>>,
    batches: AtomicUsize,
    failure: RwLock<Option<Failure>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `set_batch` calls.
    pub fn batch_count(&self) -> usize {
        self.batches.load(Ordering::SeqCst)
    }

    /// Copy of every record.
    pub fn snapshot(&self) -> HashMap<String, String> {
        self.records.read().unwrap_or_else(|p| p.into_inner()).clone()
    }

    /// Make subsequent writes fail as if the server rejected them.
    pub fn fail_writes(&self, reason: impl Into<String>) {
        self.set_failure(Some(Failure::Rejected(reason.into())));
    }

    /// Make subsequent writes fail as if the connection dropped.
    pub fn disconnect(&self, reason: impl Into<String>) {
        self.set_failure(Some(Failure::Unavailable(reason.into())));
    }

    /// Clear any injected failure.
    pub fn recover(&self) {
        self.set_failure(None);
    }

    fn set_failure(&self, failure: Option<Failure>) {
        *self.failure.write().unwrap_or_else(|p| p.into_inner()) = failure;
    }
}

#[async_trait]
impl SignalStore for MemoryStore {
    async fn set_batch(&self, signals: &[NormalizedSignal]) -> Result<()> {
        let failure = self.failure.read().unwrap_or_else(|p| p.into_inner()).clone();
        match failure {
            | Some(Failure::Unavailable(reason)) => return Err(Error::StoreUnavailable(reason)),
            | Some(Failure::Rejected(reason)) => return Err(Error::StoreError(reason)),
            | None => {}
        }

        let mut records = self.records.write().unwrap_or_else(|p| p.into_inner());
        for signal in signals {
            records.insert(signal.ticker.clone(), signal.color.clone());
        }
        self.batches.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn get(&self, ticker: &str) -> Result<Option<String>> {
        Ok(self.records.read().unwrap_or_else(|p| p.into_inner()).get(ticker).cloned())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
