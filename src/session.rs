//! Session-scoped persistence for item stores
//!
//! Each session's [`ItemStore`] lives in RocksDB under its session id,
//! encoded as JSON together with the time the session was last used.
//! Requests run load → mutate → save while holding a per-session mutex, so
//! two concurrent requests on one session never hand out the same id.
//!
//! With a TTL configured, a session idle for longer than the TTL reads as
//! empty and is deleted by [`SessionStore::sweep_expired`].

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use rocksdb::{IteratorMode, Options, DB};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::metrics::ROCKSDB_OPS_TOTAL;
use crate::todo::ItemStore;

/// Stored value for one session
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SessionRecord {
    touched_at: DateTime<Utc>,
    items: ItemStore,
}

impl SessionRecord {
    fn is_expired(&self, ttl: Option<Duration>, now: DateTime<Utc>) -> bool {
        let Some(ttl) = ttl else {
            return false;
        };
        // A touch time in the future (clock skew) counts as fresh.
        (now - self.touched_at)
            .to_std()
            .map(|idle| idle > ttl)
            .unwrap_or(false)
    }
}

/// RocksDB-backed map of session id → [`ItemStore`]
pub struct SessionStore {
    db: Arc<DB>,
    locks: DashMap<String, Arc<Mutex<()>>>,
    ttl: Option<Duration>,
}

impl SessionStore {
    /// Open (or create) the session database at `<storage_path>/sessions`.
    /// `ttl` of `None` keeps sessions forever.
    pub fn open(storage_path: &Path, ttl: Option<Duration>) -> Result<Self> {
        let path = storage_path.join("sessions");
        std::fs::create_dir_all(&path)
            .with_context(|| format!("Failed to create session directory {path:?}"))?;

        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        opts.set_max_write_buffer_number(2);
        opts.set_write_buffer_size(8 * 1024 * 1024);

        let db = Arc::new(DB::open(&opts, &path).context("Failed to open sessions DB")?);

        tracing::info!(path = ?path, ttl_secs = ttl.map(|t| t.as_secs()), "Session store initialized");

        Ok(Self {
            db,
            locks: DashMap::new(),
            ttl,
        })
    }

    fn load_record(&self, session_id: &str) -> Result<Option<SessionRecord>> {
        let raw = self.db.get(session_id.as_bytes());
        record_op("get", raw.is_ok());

        match raw.context("Failed to read session")? {
            Some(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .with_context(|| format!("Corrupt session record for {session_id}")),
            None => Ok(None),
        }
    }

    /// Live record for the session; expired records read as absent
    fn load_live(&self, session_id: &str, now: DateTime<Utc>) -> Result<Option<SessionRecord>> {
        Ok(self
            .load_record(session_id)?
            .filter(|record| !record.is_expired(self.ttl, now)))
    }

    /// Load a session's items. An unknown or expired session starts empty.
    pub fn load(&self, session_id: &str) -> Result<ItemStore> {
        match self.load_live(session_id, Utc::now())? {
            Some(record) => Ok(record.items),
            None => {
                tracing::debug!(session = %session_id, "New session");
                Ok(ItemStore::new())
            }
        }
    }

    fn save(&self, session_id: &str, record: &SessionRecord) -> Result<()> {
        let value = serde_json::to_vec(record).context("Failed to serialize session")?;
        let written = self.db.put(session_id.as_bytes(), &value);
        record_op("put", written.is_ok());
        written.context("Failed to store session")?;

        tracing::debug!(
            session = %session_id,
            items = record.items.len(),
            next_id = record.items.next_id(),
            "Saved session"
        );
        Ok(())
    }

    /// Run `f` while holding the session's mutex
    fn locked<T>(&self, session_id: &str, f: impl FnOnce() -> T) -> T {
        let lock = self
            .locks
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let result = {
            let _guard = lock.lock();
            f()
        };

        drop(lock);
        // Only the map's own handle left: nobody is waiting on this session.
        self.locks
            .remove_if(session_id, |_, lock| Arc::strong_count(lock) == 1);

        result
    }

    /// Run `f` against the session's store under the session lock.
    ///
    /// The store is written back only when `f` succeeds and left it changed;
    /// on error the working copy is dropped. A successful request on an
    /// existing session also refreshes its last-used time.
    pub fn with_session<T, E>(
        &self,
        session_id: &str,
        f: impl FnOnce(&mut ItemStore) -> std::result::Result<T, E>,
    ) -> std::result::Result<T, E>
    where
        E: From<anyhow::Error>,
    {
        self.locked(session_id, || -> std::result::Result<T, E> {
            let now = Utc::now();
            let before = self.load_live(session_id, now)?.map(|record| record.items);
            let mut store = before.clone().unwrap_or_default();

            let value = f(&mut store)?;

            let changed = match &before {
                Some(items) => *items != store,
                None => store != ItemStore::new(),
            };
            let touch = before.is_some() && self.ttl.is_some();
            if changed || touch {
                let record = SessionRecord {
                    touched_at: now,
                    items: store,
                };
                self.save(session_id, &record)?;
            }
            Ok(value)
        })
    }

    /// Delete every session idle for longer than the TTL. Returns how many
    /// were removed.
    pub fn sweep_expired(&self, now: DateTime<Utc>) -> Result<usize> {
        if self.ttl.is_none() {
            return Ok(0);
        }

        let mut candidates = Vec::new();
        for entry in self.db.iterator(IteratorMode::Start) {
            let (key, value) = entry.context("Failed to scan sessions")?;
            match serde_json::from_slice::<SessionRecord>(&value) {
                Ok(record) if record.is_expired(self.ttl, now) => {
                    candidates.push(String::from_utf8_lossy(&key).into_owned());
                }
                Ok(_) => {}
                Err(e) => tracing::warn!(error = %e, "Skipping unreadable session record"),
            }
        }

        let mut removed = 0;
        for session_id in candidates {
            // Re-check under the lock: a request may have revived the session.
            let deleted = self.locked(&session_id, || -> Result<bool> {
                match self.load_record(&session_id)? {
                    Some(record) if record.is_expired(self.ttl, now) => {
                        let result = self.db.delete(session_id.as_bytes());
                        record_op("delete", result.is_ok());
                        result.context("Failed to delete expired session")?;
                        Ok(true)
                    }
                    _ => Ok(false),
                }
            })?;
            if deleted {
                removed += 1;
            }
        }

        if removed > 0 {
            tracing::info!(removed, "Expired sessions removed");
        }
        Ok(removed)
    }

    /// Approximate number of stored sessions
    pub fn session_count(&self) -> u64 {
        self.db
            .property_int_value("rocksdb.estimate-num-keys")
            .ok()
            .flatten()
            .unwrap_or(0)
    }

    /// Flush memtables to disk
    pub fn flush(&self) -> Result<()> {
        self.db.flush().context("Failed to flush sessions DB")
    }
}

fn record_op(operation: &str, ok: bool) {
    ROCKSDB_OPS_TOTAL
        .with_label_values(&[operation, if ok { "success" } else { "error" }])
        .inc();
}
