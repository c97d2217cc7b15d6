//! # Signal Receiver
//! Webhook receiver that records the latest ticker/color signal in Redis.
//!
//! A `POST /webhook` body such as `{"IDX:BUMI": "red", "IDX:DEWA": "GREEN"}`
//! becomes the records `BUMI = Red` and `DEWA = Green`, written as one
//! atomic batch. Downstream consumers read the keys directly from Redis.

pub use crate::utils::error::{Error, Result};

pub mod config;
pub mod ingest;
pub mod metrics;
pub mod server;
pub mod store;
pub mod utils;

pub use crate::config::{Config, ValuePolicy};
pub use crate::ingest::{IngestError, IngestReport, NormalizedSignal, SignalBatch, SignalIngestor};
pub use crate::server::{create_router, AppState};
pub use crate::store::{MemoryStore, RedisStore, SignalStore, StoreState};
