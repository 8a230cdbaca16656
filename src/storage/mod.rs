//! Storage Engine Module
//!
//! This module provides the core storage functionality for EmberKV.
//! It includes the guarded key/expiration tables, the background expiry
//! reaper and snapshot persistence.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       StoreEngine                           │
//! │     RwLock { data: key -> Value, expires: key -> ms }       │
//! └─────────────────────────────────────────────────────────────┘
//!          ▲                                   ▲
//!          │ sweep_expired()                   │ snapshot() / restore()
//!  ┌───────┴──────────┐              ┌─────────┴──────────┐
//!  │  ExpiryReaper    │              │  SnapshotManager   │
//!  │  (Tokio task)    │              │  (Tokio task)      │
//!  └──────────────────┘              └────────────────────┘
//! ```
//!
//! ## Features
//!
//! - **Closed value shapes**: string, list of strings, map of strings
//! - **RwLock**: Multiple concurrent readers, exclusive writers
//! - **TTL Support**: Keys can be given a time-to-live after they are set
//! - **Active Expiry**: A background reaper removes keys once their deadline passes
//! - **Snapshots**: Optional periodic dump of the whole state, loaded at startup
//!
//! ## Example
//!
//! ```
//! use emberkv::storage::{StoreEngine, Value};
//!
//! let engine = StoreEngine::new();
//!
//! engine.set("name", Value::from("Ariz")).unwrap();
//! assert_eq!(engine.get("name").unwrap(), Value::from("Ariz"));
//!
//! engine
//!     .set_json("tags", serde_json::json!(["fast", "small"]))
//!     .unwrap();
//! assert_eq!(engine.get_indexed("tags", "1").unwrap(), "small");
//!
//! assert!(engine.set_json("bad", serde_json::json!(42)).is_err());
//! ```

pub mod engine;
pub mod error;
pub mod expiry;
pub mod glob;
pub mod snapshot;
pub mod value;

// Re-export commonly used types
pub use engine::{StoreEngine, StoreStats};
pub use error::{StoreError, StoreResult};
pub use expiry::{start_expiry_reaper, ExpiryReaper, ReaperConfig};
pub use glob::GlobPattern;
pub use snapshot::{FileMedium, Snapshot, SnapshotError, SnapshotManager, SnapshotMedium, SnapshotWorker};
pub use value::Value;
