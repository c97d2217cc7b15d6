//! Key-value store abstraction
//!
//! The ingestor only needs "write this batch atomically"; keeping that behind a
//! trait lets the HTTP layer run against Redis in production and against the
//! in-memory backend in tests.

use crate::config::StoreConfig;
use crate::ingest::NormalizedSignal;
use crate::utils::error::{Error, Result};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

pub mod memory;
pub mod redis;

pub use self::memory::MemoryStore;
pub use self::redis::RedisStore;

#[async_trait]
pub trait SignalStore: Send + Sync {
    /// Set every `ticker -> color` pair in one round trip, applied in slice
    /// order so a later duplicate ticker overwrites an earlier one.
    async fn set_batch(&self, signals: &[NormalizedSignal]) -> Result<()>;

    /// Current color for `ticker`, if any.
    async fn get(&self, ticker: &str) -> Result<Option<String>>;

    /// Short backend name for logs.
    fn backend(&self) -> &'static str;
}

/// The store as seen by request handlers: either usable, or unavailable with
/// the reason captured at startup.
#[derive(Clone)]
pub enum StoreState {
    Ready(Arc<dyn SignalStore>),
    Unavailable(String),
}

impl StoreState {
    pub fn ready<S: SignalStore + 'static>(store: Arc<S>) -> Self {
        StoreState::Ready(store)
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        StoreState::Unavailable(reason.into())
    }

    /// Connect to the configured Redis. Never fails: a missing or unparsable URL
    /// yields [`StoreState::Unavailable`] so the service keeps running. A server
    /// that is down at startup still yields `Ready`; the connection is retried on
    /// each write until it succeeds.
    pub async fn connect(config: &StoreConfig) -> Self {
        let Some(url) = config.url.as_deref() else {
            log::error!("REDIS_URL is not set; webhooks will be answered with STORE_UNAVAILABLE");
            return StoreState::unavailable("REDIS_URL is not set");
        };

        let store = match RedisStore::new(url, config.connect_timeout()) {
            | Ok(store) => store,
            | Err(e) => {
                log::error!("Cannot use Redis URL {}: {}", redact_url(url), e);
                return StoreState::unavailable(unavailable_reason(e));
            }
        };

        match store.connection().await {
            | Ok(_) => log::info!("Successfully connected to Redis at {}", redact_url(url)),
            | Err(e) => log::error!(
                "Error connecting to Redis at {}: {}; retrying on next write",
                redact_url(url),
                e
            ),
        }
        StoreState::ready(Arc::new(store))
    }

    /// The usable store, or [`Error::StoreUnavailable`].
    pub fn store(&self) -> Result<&Arc<dyn SignalStore>> {
        match self {
            | StoreState::Ready(store) => Ok(store),
            | StoreState::Unavailable(reason) => Err(Error::StoreUnavailable(reason.clone())),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, StoreState::Ready(_))
    }
}

impl fmt::Debug for StoreState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            | StoreState::Ready(store) => f.debug_tuple("Ready").field(&store.backend()).finish(),
            | StoreState::Unavailable(reason) => f.debug_tuple("Unavailable").field(reason).finish(),
        }
    }
}

fn unavailable_reason(err: Error) -> String {
    match err {
        | Error::StoreUnavailable(reason) => reason,
        | other => other.to_string(),
    }
}

/// Hide credentials in a connection string before logging it.
pub fn redact_url(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };
    match rest.rsplit_once('@') {
        | Some((_, host)) => format!("{}://***@{}", scheme, host),
        | None => url.to_string(),
    }
}
