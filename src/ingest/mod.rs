//! Webhook payload ingestion.
//!
//! A payload is a flat JSON object mapping `EXCHANGE:TICKER` keys to free-form
//! color labels. [`parse_payload`] turns the raw body into an ordered
//! [`SignalBatch`]; [`SignalIngestor`] validates it and writes the whole batch
//! to the configured store in one round trip.
//!
//! Entries are processed in document order. When two keys reduce to the same
//! simple ticker (`IDX:BUMI` and `OTHER:BUMI`) the later one wins, because the
//! batch is applied in order and every write is an overwrite.

pub mod error;
pub mod normalize;

pub use error::IngestError;
pub use normalize::{normalize_color, simple_ticker};

use crate::config::{Config, ValuePolicy};
use crate::store::StoreState;
use log::{debug, error, info, warn};
use metrics::{counter, histogram};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::{Duration, Instant};

/// Longest slice of a rejected payload echoed into the logs
const MAX_LOGGED_PAYLOAD: usize = 512;

/// One ticker/color pair, ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedSignal {
    pub ticker: String,
    pub color: String,
}

impl NormalizedSignal {
    /// Normalize a raw payload entry.
    pub fn from_raw(raw_key: &str, raw_color: &str) -> Self {
        Self {
            ticker: simple_ticker(raw_key).to_string(),
            color: normalize_color(raw_color),
        }
    }
}

/// All signals derived from one request, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignalBatch {
    pub signals: Vec<NormalizedSignal>,
    /// Entries dropped under [`ValuePolicy::Skip`]
    pub skipped: Vec<String>,
}

impl SignalBatch {
    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }
}

/// Parse and normalize a raw request body.
///
/// Checks, in order: non-empty body, valid UTF-8 JSON, object at the top
/// level, then string values (subject to `policy`).
pub fn parse_payload(body: &[u8], policy: ValuePolicy) -> Result<SignalBatch, IngestError> {
    if body.is_empty() {
        return Err(IngestError::EmptyRequest);
    }

    let value: Value =
        serde_json::from_slice(body).map_err(|e| IngestError::MalformedJson(e.to_string()))?;

    let entries = match value {
        | Value::Object(map) => map,
        | other => {
            return Err(IngestError::MalformedJson(format!(
                "top-level value must be an object, got {}",
                json_kind(&other)
            )))
        }
    };

    let mut batch = SignalBatch { signals: Vec::with_capacity(entries.len()), skipped: Vec::new() };
    for (raw_key, raw_value) in entries {
        match raw_value {
            | Value::String(color) => batch.signals.push(NormalizedSignal::from_raw(&raw_key, &color)),
            | other => match policy {
                | ValuePolicy::Reject => {
                    return Err(IngestError::MalformedJson(format!(
                        "value for {:?} must be a string, got {}",
                        raw_key,
                        json_kind(&other)
                    )))
                }
                | ValuePolicy::Skip => {
                    warn!("Skipping {:?}: value is {}, not a string", raw_key, json_kind(&other));
                    batch.skipped.push(raw_key);
                }
            },
        }
    }

    Ok(batch)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        | Value::Null => "null",
        | Value::Bool(_) => "a boolean",
        | Value::Number(_) => "a number",
        | Value::String(_) => "a string",
        | Value::Array(_) => "an array",
        | Value::Object(_) => "an object",
    }
}

/// Lossy, truncated rendering of a body for diagnostics
pub(crate) fn payload_preview(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    if text.chars().count() <= MAX_LOGGED_PAYLOAD {
        return text.into_owned();
    }
    let mut preview: String = text.chars().take(MAX_LOGGED_PAYLOAD).collect();
    preview.push_str("...");
    preview
}

/// Summary of a successful ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub written: usize,
    pub skipped: usize,
}

/// Turns webhook bodies into batched store writes.
#[derive(Clone, Debug)]
pub struct SignalIngestor {
    store: StoreState,
    policy: ValuePolicy,
    write_timeout: Duration,
}

impl SignalIngestor {
    pub fn new(store: StoreState, policy: ValuePolicy, write_timeout: Duration) -> Self {
        Self { store, policy, write_timeout }
    }

    pub fn from_config(store: StoreState, config: &Config) -> Self {
        Self::new(store, config.ingest.non_string_values, config.store.write_timeout())
    }

    /// Handle one webhook body end to end and record the outcome.
    pub async fn ingest(&self, body: &[u8]) -> Result<IngestReport, IngestError> {
        let result = self.process(body).await;
        match &result {
            | Ok(report) => {
                counter!("webhook_requests_total", 1, "outcome" => "ok");
                counter!("signals_written_total", report.written as u64);
                if report.skipped > 0 {
                    counter!("signals_skipped_total", report.skipped as u64);
                }
            }
            | Err(e) => {
                counter!("webhook_requests_total", 1, "outcome" => e.outcome());
                match e {
                    | IngestError::EmptyRequest | IngestError::MalformedJson(_) => {
                        warn!("Rejected webhook ({}): payload={}", e, payload_preview(body))
                    }
                    | _ => error!("Failed to record webhook ({}): payload={}", e, payload_preview(body)),
                }
            }
        }
        result
    }

    async fn process(&self, body: &[u8]) -> Result<IngestReport, IngestError> {
        let batch = parse_payload(body, self.policy)?;
        let store = self.store.store()?;

        if batch.is_empty() {
            debug!("Webhook carried no signals; nothing to write");
            return Ok(IngestReport { written: 0, skipped: batch.skipped.len() });
        }

        let start = Instant::now();
        tokio::time::timeout(self.write_timeout, store.set_batch(&batch.signals))
            .await
            .map_err(|_| {
                IngestError::StoreUnavailable(format!(
                    "batch write timed out after {} ms",
                    self.write_timeout.as_millis()
                ))
            })??;
        histogram!("store_write_ms", start.elapsed().as_secs_f64() * 1000.0);

        for signal in &batch.signals {
            info!("SUCCESS: Set {} -> {}", signal.ticker, signal.color);
        }

        Ok(IngestReport { written: batch.len(), skipped: batch.skipped.len() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, SignalStore};
    use crate::utils::init_test_logging;
    use assert_matches::assert_matches;
    use std::sync::Arc;

    fn signal(ticker: &str, color: &str) -> NormalizedSignal {
        NormalizedSignal { ticker: ticker.to_string(), color: color.to_string() }
    }

    fn ingestor(store: &Arc<MemoryStore>, policy: ValuePolicy) -> SignalIngestor {
        init_test_logging();
        SignalIngestor::new(StoreState::ready(store.clone()), policy, Duration::from_secs(1))
    }

    #[test]
    fn parses_in_document_order() {
        let body = br#"{"IDX:UNVR":"yellow","IDX:BUMI":"RED","DEWA":"green"}"#;
        let batch = parse_payload(body, ValuePolicy::Reject).unwrap();
        assert_eq!(
            batch.signals,
            vec![signal("UNVR", "Yellow"), signal("BUMI", "Red"), signal("DEWA", "Green")]
        );
        assert!(batch.skipped.is_empty());
    }

    #[test]
    fn rejects_empty_and_malformed_bodies() {
        assert_matches!(parse_payload(b"", ValuePolicy::Reject), Err(IngestError::EmptyRequest));
        assert_matches!(
            parse_payload(b"not json", ValuePolicy::Reject),
            Err(IngestError::MalformedJson(_))
        );
        assert_matches!(
            parse_payload(&[0x7b, 0xff, 0xfe, 0x7d], ValuePolicy::Reject),
            Err(IngestError::MalformedJson(_))
        );
    }

    #[test]
    fn rejects_non_object_top_level() {
        let bodies: [&[u8]; 4] = [b"[\"IDX:BUMI\"]", b"\"red\"", b"42", b"null"];
        for body in bodies {
            assert_matches!(parse_payload(body, ValuePolicy::Skip), Err(IngestError::MalformedJson(_)));
        }
    }

    #[test]
    fn non_string_value_policy() {
        let body = br#"{"IDX:BUMI":"red","IDX:DEWA":3,"IDX:UNVR":null,"IDX:ANTM":{"c":"x"}}"#;

        let err = parse_payload(body, ValuePolicy::Reject).unwrap_err();
        assert_matches!(&err, IngestError::MalformedJson(msg) if msg.contains("IDX:DEWA"));

        let batch = parse_payload(body, ValuePolicy::Skip).unwrap();
        assert_eq!(batch.signals, vec![signal("BUMI", "Red")]);
        assert_eq!(batch.skipped, vec!["IDX:DEWA", "IDX:UNVR", "IDX:ANTM"]);
    }

    #[test]
    fn empty_object_is_an_empty_batch() {
        let batch = parse_payload(b"{}", ValuePolicy::Reject).unwrap();
        assert!(batch.is_empty());
    }

    #[test]
    fn payload_preview_truncates() {
        let long = vec![b'a'; MAX_LOGGED_PAYLOAD + 10];
        let preview = payload_preview(&long);
        assert!(preview.ends_with("..."));
        assert_eq!(preview.len(), MAX_LOGGED_PAYLOAD + 3);
        assert_eq!(payload_preview(b"short"), "short");
    }

    #[tokio::test]
    async fn ingest_writes_whole_batch_once() {
        let store = Arc::new(MemoryStore::new());
        let ingestor = ingestor(&store, ValuePolicy::Reject);

        let report = ingestor
            .ingest(br#"{"IDX:BUMI":"Red","IDX:DEWA":"Green","IDX:UNVR":"yellow"}"#)
            .await
            .unwrap();

        assert_eq!(report, IngestReport { written: 3, skipped: 0 });
        assert_eq!(store.batch_count(), 1);
        assert_eq!(store.get("BUMI").await.unwrap().as_deref(), Some("Red"));
        assert_eq!(store.get("DEWA").await.unwrap().as_deref(), Some("Green"));
        assert_eq!(store.get("UNVR").await.unwrap().as_deref(), Some("Yellow"));
    }

    #[tokio::test]
    async fn duplicate_simple_ticker_last_wins() {
        let store = Arc::new(MemoryStore::new());
        let ingestor = ingestor(&store, ValuePolicy::Reject);

        ingestor.ingest(br#"{"IDX:BUMI":"red","OTHER:BUMI":"green"}"#).await.unwrap();
        assert_eq!(store.get("BUMI").await.unwrap().as_deref(), Some("Green"));
    }

    #[tokio::test]
    async fn empty_object_skips_store_round_trip() {
        let store = Arc::new(MemoryStore::new());
        let ingestor = ingestor(&store, ValuePolicy::Reject);

        let report = ingestor.ingest(b"{}").await.unwrap();
        assert_eq!(report.written, 0);
        assert_eq!(store.batch_count(), 0);
    }

    #[tokio::test]
    async fn unavailable_store_is_reported_after_parsing() {
        let ingestor = SignalIngestor::new(
            StoreState::unavailable("REDIS_URL is not set"),
            ValuePolicy::Reject,
            Duration::from_secs(1),
        );
        assert_matches!(ingestor.ingest(b"").await, Err(IngestError::EmptyRequest));
        assert_matches!(
            ingestor.ingest(br#"{"IDX:BUMI":"red"}"#).await,
            Err(IngestError::StoreUnavailable(_))
        );
    }

    #[tokio::test]
    async fn rejected_batch_leaves_store_untouched() {
        let store = Arc::new(MemoryStore::new());
        let ingestor = ingestor(&store, ValuePolicy::Reject);

        let result = ingestor.ingest(br#"{"IDX:BUMI":"red","IDX:DEWA":false}"#).await;
        assert_matches!(result, Err(IngestError::MalformedJson(_)));
        assert_eq!(store.batch_count(), 0);
        assert!(store.snapshot().is_empty());
    }

    #[tokio::test]
    async fn store_failure_is_internal_error() {
        let store = Arc::new(MemoryStore::new());
        store.fail_writes("OOM command not allowed");
        let ingestor = ingestor(&store, ValuePolicy::Reject);

        let result = ingestor.ingest(br#"{"IDX:BUMI":"red"}"#).await;
        assert_matches!(result, Err(IngestError::InternalError(_)));
        assert!(store.snapshot().is_empty());
    }
}
