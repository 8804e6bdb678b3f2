//! ApiUsageTracker - monthly Open API call metering
//!
//! ## Responsibilities
//!
//! - Count vendor API calls per calendar month (`YYYY-MM`)
//! - Use the server `Date` header as the clock, falling back to local UTC
//! - Persist counters across restarts (delayed, best-effort save)
//! - Notify subscribers on every change

use crate::storage::{keys, JsonStore};
use chrono::{DateTime, Datelike, NaiveDateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex, RwLock};
use tracing::{debug, warn};

/// Default delay between a change and its persistence
pub const DEFAULT_SAVE_DELAY: Duration = Duration::from_secs(30);

/// Usage counters for the current period
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UsageSnapshot {
    /// Period identifier (`YYYY-MM`)
    pub period: Option<String>,
    /// Calls observed in the period
    pub count: u64,
    pub last_reset: Option<DateTime<Utc>>,
    pub last_call: Option<DateTime<Utc>>,
}

impl UsageSnapshot {
    fn to_json(&self) -> Value {
        json!({
            "period": self.period,
            "count": self.count,
            "last_reset": self.last_reset.map(|d| d.to_rfc3339()),
            "last_call": self.last_call.map(|d| d.to_rfc3339()),
        })
    }

    /// Lenient restore: unknown or malformed fields keep their defaults
    fn from_json(value: &Value) -> Self {
        Self {
            period: value.get("period").and_then(Value::as_str).map(str::to_string),
            count: value
                .get("count")
                .and_then(|c| c.as_u64().or_else(|| c.as_str().and_then(|s| s.parse().ok())))
                .unwrap_or(0),
            last_reset: value
                .get("last_reset")
                .and_then(Value::as_str)
                .and_then(parse_iso_datetime),
            last_call: value
                .get("last_call")
                .and_then(Value::as_str)
                .and_then(parse_iso_datetime),
        }
    }
}

/// Monthly API usage tracker
pub struct ApiUsageTracker {
    store: JsonStore,
    save_delay: Duration,
    state: RwLock<UsageSnapshot>,
    save_pending: AtomicBool,
    /// Serializes snapshot-and-write so the newest counters land last
    save_lock: Mutex<()>,
    tx: watch::Sender<UsageSnapshot>,
}

impl ApiUsageTracker {
    pub fn new(store: JsonStore, save_delay: Duration) -> Self {
        let (tx, _rx) = watch::channel(UsageSnapshot::default());
        Self {
            store,
            save_delay,
            state: RwLock::new(UsageSnapshot::default()),
            save_pending: AtomicBool::new(false),
            save_lock: Mutex::new(()),
            tx,
        }
    }

    /// Restore persisted counters
    pub async fn load(&self) {
        match self.store.load(keys::USAGE).await {
            Ok(Some(value)) => {
                let restored = UsageSnapshot::from_json(&value);
                debug!(target: "imou_usage", period = ?restored.period, count = restored.count, "Usage restored");
                *self.state.write().await = restored.clone();
                self.tx.send_replace(restored);
            }
            Ok(None) => {}
            Err(e) => {
                warn!(target: "imou_usage", error = %e, "Failed to load usage data, starting fresh");
            }
        }
    }

    pub async fn snapshot(&self) -> UsageSnapshot {
        self.state.read().await.clone()
    }

    /// Receive the latest snapshot after every change
    pub fn subscribe(&self) -> watch::Receiver<UsageSnapshot> {
        self.tx.subscribe()
    }

    /// Record one API call at the server-reported time
    pub async fn note_call(self: &Arc<Self>, date_header: Option<&str>) {
        let moment = parse_date_header(date_header);
        let period = period_key(&moment);

        let snapshot = {
            let mut state = self.state.write().await;
            if state.period.as_deref() != Some(period.as_str()) {
                state.period = Some(period);
                state.count = 0;
                state.last_reset = Some(moment);
            }
            state.count += 1;
            state.last_call = Some(moment);
            state.clone()
        };

        self.tx.send_replace(snapshot);
        self.schedule_save();
    }

    /// Persist the current counters now
    pub async fn flush(&self) {
        let _guard = self.save_lock.lock().await;
        let snapshot = self.snapshot().await;
        if let Err(e) = self.store.save(keys::USAGE, &snapshot.to_json()).await {
            warn!(target: "imou_usage", error = %e, "Failed to save usage data");
        }
    }

    fn schedule_save(self: &Arc<Self>) {
        if self.save_pending.swap(true, Ordering::SeqCst) {
            return;
        }
        let this = Arc::clone(self);
        tokio::spawn(async move {
            if !this.save_delay.is_zero() {
                tokio::time::sleep(this.save_delay).await;
            }
            this.save_pending.store(false, Ordering::SeqCst);
            this.flush().await;
        });
    }
}

fn period_key(moment: &DateTime<Utc>) -> String {
    format!("{:04}-{:02}", moment.year(), moment.month())
}

/// HTTP `Date` header (RFC 2822) to UTC; now if absent or unparseable
fn parse_date_header(value: Option<&str>) -> DateTime<Utc> {
    value
        .and_then(|v| DateTime::parse_from_rfc2822(v.trim()).ok())
        .map(|d| d.with_timezone(&Utc))
        .unwrap_or_else(Utc::now)
}

/// ISO 8601 timestamp; naive values are taken as UTC
fn parse_iso_datetime(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
