//! Redis backend built on `redis::aio::ConnectionManager`.
//!
//! The manager is created on first use and then shared: it multiplexes one
//! connection, is cheap to clone per request and reconnects on its own. Until
//! the first connect succeeds every call retries it, so the service recovers
//! when Redis comes up after the receiver.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, Pipeline};
use tokio::sync::OnceCell;

use super::SignalStore;
use crate::ingest::NormalizedSignal;
use crate::utils::error::{Error, Result};

pub struct RedisStore {
    client: Client,
    manager: OnceCell<ConnectionManager>,
    connect_timeout: Duration,
}

impl RedisStore {
    /// Parse `url` without touching the network.
    pub fn new(url: &str, connect_timeout: Duration) -> Result<Self> {
        let client = Client::open(url)
            .map_err(|e| Error::StoreUnavailable(format!("invalid Redis URL: {}", e)))?;
        Ok(Self { client, manager: OnceCell::new(), connect_timeout })
    }

    pub fn is_connected(&self) -> bool {
        self.manager.initialized()
    }

    /// Shared connection, establishing it (`PING`-checked, bounded by the
    /// connect timeout) if no attempt has succeeded yet.
    pub async fn connection(&self) -> Result<ConnectionManager> {
        let manager = self
            .manager
            .get_or_try_init(|| open_manager(self.client.clone(), self.connect_timeout))
            .await?;
        Ok(manager.clone())
    }
}

async fn open_manager(client: Client, timeout: Duration) -> Result<ConnectionManager> {
    let handshake = async {
        let manager = ConnectionManager::new(client).await?;
        let mut conn = manager.clone();
        redis::cmd("PING").query_async::<_, String>(&mut conn).await?;
        Ok::<_, redis::RedisError>(manager)
    };

    tokio::time::timeout(timeout, handshake)
        .await
        .map_err(|_| {
            Error::StoreUnavailable(format!("timed out connecting after {} ms", timeout.as_millis()))
        })?
        .map_err(|e| Error::StoreUnavailable(e.to_string()))
}

/// `MULTI`, one `SET` per signal in order, `EXEC`: sent as a single round trip.
pub(crate) fn batch_pipeline(signals: &[NormalizedSignal]) -> Pipeline {
    let mut pipe = redis::pipe();
    pipe.atomic();
    for signal in signals {
        pipe.set(&signal.ticker, &signal.color).ignore();
    }
    pipe
}

#[async_trait]
impl SignalStore for RedisStore {
    async fn set_batch(&self, signals: &[NormalizedSignal]) -> Result<()> {
        if signals.is_empty() {
            return Ok(());
        }

        let pipe = batch_pipeline(signals);
        let mut conn = self.connection().await?;
        pipe.query_async::<_, ()>(&mut conn).await?;
        Ok(())
    }

    async fn get(&self, ticker: &str) -> Result<Option<String>> {
        let mut conn = self.connection().await?;
        let value: Option<String> = conn.get(ticker).await?;
        Ok(value)
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}
