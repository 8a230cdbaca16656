//! Thread-Safe Store Engine with Expiry Support
//!
//! This module implements the core store of EmberKV: a key table and an
//! expiration table living side by side behind a single read/write guard.
//!
//! ## Design Decisions
//!
//! 1. **One guard, two tables**: `data` and `expires` are only ever touched
//!    together under the same `RwLock`, so a key can never keep an expiration
//!    record after it has been removed.
//! 2. **Independent TTL**: `set` replaces the value and leaves any expiration
//!    record alone. `set_expires` is the only way to attach or move a deadline.
//! 3. **Reaper-driven expiry**: reads trust the key table. An entry whose
//!    deadline has passed stays visible until the next reaper tick removes it,
//!    so `get` may serve it for up to one tick and `get_expires` may report a
//!    negative remaining time in that window.
//!
//! ## Concurrency Model
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                      StoreEngine                         │
//! │  ┌────────────────────────────────────────────────────┐  │
//! │  │                 RwLock<State>                      │  │
//! │  │  ┌──────────────────────┐ ┌─────────────────────┐  │  │
//! │  │  │ data: key -> Value   │ │ expires: key -> ms  │  │  │
//! │  │  └──────────────────────┘ └─────────────────────┘  │  │
//! │  └────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────┘
//!    ▲ readers: get, get_indexed, keys, get_expires, snapshot
//!    ▲ writers: set, remove, set_expires, sweep_expired, restore
//! ```
//!
//! Readers share the guard; writers hold it exclusively. No operation does
//! I/O while holding it.

use crate::storage::error::{StoreError, StoreResult};
use crate::storage::glob::GlobPattern;
use crate::storage::snapshot::Snapshot;
use crate::storage::value::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

/// Current wall-clock time as Unix epoch milliseconds.
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// The guarded tables.
#[derive(Debug, Default)]
struct State {
    /// Key table
    data: HashMap<String, Value>,
    /// Expiration table: key -> absolute deadline in epoch milliseconds
    expires: HashMap<String, i64>,
}

impl State {
    /// Deletes a key from both tables. Returns false if the key was absent.
    fn remove_entry(&mut self, key: &str) -> bool {
        self.expires.remove(key);
        self.data.remove(key).is_some()
    }
}

/// The store engine.
///
/// Designed to be wrapped in an `Arc` and shared between request handlers,
/// the expiry reaper and the snapshot worker.
///
/// # Example
///
/// ```
/// use emberkv::storage::{StoreEngine, Value};
///
/// let engine = StoreEngine::new();
///
/// engine.set("name", Value::from("Ariz")).unwrap();
/// assert_eq!(engine.get("name").unwrap(), Value::from("Ariz"));
///
/// engine.set_expires("name", 60).unwrap();
/// assert!(engine.get_expires_secs("name").unwrap() <= 60);
/// ```
pub struct StoreEngine {
    state: RwLock<State>,

    /// Statistics: total GET operations
    get_count: AtomicU64,

    /// Statistics: total SET operations
    set_count: AtomicU64,

    /// Statistics: total successful removals
    del_count: AtomicU64,

    /// Statistics: number of expired keys reaped
    expired_count: AtomicU64,
}

impl std::fmt::Debug for StoreEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreEngine")
            .field("keys", &self.len())
            .field("get_count", &self.get_count.load(Ordering::Relaxed))
            .field("set_count", &self.set_count.load(Ordering::Relaxed))
            .finish()
    }
}

impl Default for StoreEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl StoreEngine {
    /// Creates an empty engine.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State::default()),
            get_count: AtomicU64::new(0),
            set_count: AtomicU64::new(0),
            del_count: AtomicU64::new(0),
            expired_count: AtomicU64::new(0),
        }
    }

    /// Creates an engine hydrated from a snapshot.
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let engine = Self::new();
        engine.restore(snapshot);
        engine
    }

    // A panic while holding the guard cannot leave the tables half-updated
    // (every mutation is a single map call per table), so poisoning is ignored.
    fn read(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Inserts or wholesale-replaces the value for `key`.
    ///
    /// An existing expiration record for the key is left untouched.
    pub fn set(&self, key: &str, value: Value) -> StoreResult<()> {
        if key.is_empty() {
            return Err(StoreError::InvalidKey);
        }

        self.set_count.fetch_add(1, Ordering::Relaxed);
        self.write().data.insert(key.to_string(), value);
        Ok(())
    }

    /// Validates an untyped JSON value and stores it.
    ///
    /// Fails with `InvalidValueShape` without touching the previous value if
    /// `value` is not a string, list of strings or map of strings.
    pub fn set_json(&self, key: &str, value: serde_json::Value) -> StoreResult<()> {
        if key.is_empty() {
            return Err(StoreError::InvalidKey);
        }
        let value = Value::try_from(value)?;
        self.set(key, value)
    }

    /// Returns a copy of the value stored under `key`.
    pub fn get(&self, key: &str) -> StoreResult<Value> {
        self.get_count.fetch_add(1, Ordering::Relaxed);

        self.read()
            .data
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    /// Returns one element of a list or map value.
    ///
    /// For a list, `index` must be an integer in `0..len`. For a map, `index`
    /// is the map key.
    pub fn get_indexed(&self, key: &str, index: &str) -> StoreResult<String> {
        self.get_count.fetch_add(1, Ordering::Relaxed);

        let state = self.read();
        let value = state
            .data
            .get(key)
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;

        match value {
            Value::List(items) => {
                let i: i64 = index
                    .parse()
                    .map_err(|_| StoreError::InvalidIndexType(index.to_string()))?;
                usize::try_from(i)
                    .ok()
                    .and_then(|i| items.get(i))
                    .cloned()
                    .ok_or(StoreError::IndexOutOfRange {
                        index: i,
                        len: items.len(),
                    })
            }
            Value::Map(map) => map
                .get(index)
                .cloned()
                .ok_or_else(|| StoreError::IndexNotFound(index.to_string())),
            other => Err(StoreError::NotIndexable(other.kind())),
        }
    }

    /// Returns true if `key` is currently in the key table.
    pub fn contains(&self, key: &str) -> bool {
        self.read().data.contains_key(key)
    }

    /// Deletes `key` and its expiration record.
    pub fn remove(&self, key: &str) -> StoreResult<()> {
        if self.write().remove_entry(key) {
            self.del_count.fetch_add(1, Ordering::Relaxed);
            Ok(())
        } else {
            Err(StoreError::NotFound(key.to_string()))
        }
    }

    /// Returns all keys matching a glob pattern.
    ///
    /// Supported patterns (see [`GlobPattern`]):
    /// - `*` matches everything
    /// - `h*llo` matches hello, hallo, hxllo
    /// - `h?llo` matches hello, hallo, but not hllo
    /// - `h[ae]llo` matches hello and hallo, but not hillo
    ///
    /// An empty result is reported as `NoMatch` rather than an empty list.
    /// The order of the returned keys is unspecified.
    ///
    /// **Warning**: This operation scans all keys and holds the read guard
    /// while doing so.
    pub fn keys(&self, pattern: &str) -> StoreResult<Vec<String>> {
        let glob = GlobPattern::new(pattern);

        let keys: Vec<String> = self
            .read()
            .data
            .keys()
            .filter(|k| glob.matches(k))
            .cloned()
            .collect();

        if keys.is_empty() {
            Err(StoreError::NoMatch(pattern.to_string()))
        } else {
            Ok(keys)
        }
    }

    /// Sets the key to expire `ttl_secs` seconds from now, replacing any
    /// previous deadline.
    pub fn set_expires(&self, key: &str, ttl_secs: i64) -> StoreResult<()> {
        if ttl_secs <= 0 {
            return Err(StoreError::InvalidTtl(ttl_secs));
        }

        let deadline = now_millis().saturating_add(ttl_secs.saturating_mul(1000));

        let mut state = self.write();
        if !state.data.contains_key(key) {
            return Err(StoreError::NotFound(key.to_string()));
        }
        state.expires.insert(key.to_string(), deadline);
        Ok(())
    }

    /// Returns the milliseconds left until `key` expires.
    ///
    /// Negative when the deadline has passed but the reaper has not run yet.
    pub fn get_expires(&self, key: &str) -> StoreResult<i64> {
        let deadline = self
            .read()
            .expires
            .get(key)
            .copied()
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;

        Ok(deadline.saturating_sub(now_millis()))
    }

    /// Same as [`get_expires`](Self::get_expires), in whole seconds rounded up.
    ///
    /// `set_expires(key, 10)` followed immediately by this call yields 10.
    pub fn get_expires_secs(&self, key: &str) -> StoreResult<i64> {
        self.get_expires(key)
            .map(|ms| ms.saturating_add(999).div_euclid(1000))
    }

    /// Removes every key whose deadline is at or before now.
    ///
    /// This is called by the background expiry reaper. The due set is
    /// computed under the read guard; each key is then removed under the
    /// write guard through the same path as [`remove`](Self::remove). A key
    /// whose deadline was pushed out in between is kept.
    ///
    /// A `set` that lands between the scan and the removal does not save the
    /// key: `set` does not touch the deadline, so the fresh value is removed
    /// along with the stale record.
    ///
    /// # Returns
    ///
    /// Returns the number of keys that were removed.
    pub fn sweep_expired(&self) -> u64 {
        let now = now_millis();

        let due: Vec<String> = self
            .read()
            .expires
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(key, _)| key.clone())
            .collect();

        let mut removed = 0u64;
        for key in due {
            let mut state = self.write();
            let still_due = state.expires.get(&key).is_some_and(|d| *d <= now);
            if still_due && state.remove_entry(&key) {
                removed += 1;
            }
        }

        if removed > 0 {
            self.expired_count.fetch_add(removed, Ordering::Relaxed);
        }

        removed
    }

    /// Copies both tables under the read guard.
    pub fn snapshot(&self) -> Snapshot {
        let state = self.read();
        Snapshot {
            data: state.data.clone(),
            expires: state.expires.clone(),
        }
    }

    /// Replaces the whole state with `snapshot`.
    ///
    /// Expiration records without a matching key are dropped. Deadlines are
    /// restored as absolute instants, so one that elapsed while the process
    /// was down is reaped on the next tick.
    pub fn restore(&self, snapshot: Snapshot) {
        let Snapshot { data, mut expires } = snapshot;

        let before = expires.len();
        expires.retain(|key, _| data.contains_key(key));
        let orphaned = before - expires.len();
        if orphaned > 0 {
            warn!(orphaned, "Dropped expiration records without a key");
        }

        let mut state = self.write();
        state.data = data;
        state.expires = expires;
        debug!(
            keys = state.data.len(),
            expiring = state.expires.len(),
            "Store state restored"
        );
    }

    /// Returns the number of keys.
    pub fn len(&self) -> usize {
        self.read().data.len()
    }

    /// Returns true if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns store statistics.
    pub fn stats(&self) -> StoreStats {
        let (keys, expiring) = {
            let state = self.read();
            (state.data.len(), state.expires.len())
        };

        StoreStats {
            keys,
            expiring,
            get_ops: self.get_count.load(Ordering::Relaxed),
            set_ops: self.set_count.load(Ordering::Relaxed),
            del_ops: self.del_count.load(Ordering::Relaxed),
            expired: self.expired_count.load(Ordering::Relaxed),
        }
    }
}

/// Store statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct StoreStats {
    /// Number of keys currently stored
    pub keys: usize,
    /// Number of keys with an expiration record
    pub expiring: usize,
    /// Total GET operations
    pub get_ops: u64,
    /// Total SET operations
    pub set_ops: u64,
    /// Total successful removals
    pub del_ops: u64,
    /// Total expired keys reaped
    pub expired: u64,
}
