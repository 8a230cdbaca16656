//! # EmberKV - An In-Memory Key-Value Cache
//!
//! EmberKV keeps string, list and map values in memory behind a small JSON
//! HTTP API. Keys can carry a time-to-live, can be looked up with glob
//! patterns, and the whole store can be dumped to disk periodically.
//!
//! ## Features
//!
//! - **Three value shapes**: strings, lists of strings and string maps
//! - **Indexed reads**: one list element or one map field without copying the value
//! - **TTL Support**: per-key deadlines enforced by a background reaper
//! - **Glob lookup**: `*`, `?`, `[...]` patterns over all keys
//! - **Snapshots**: periodic JSON dumps, restored on startup
//! - **Token auth**: optional login for the key endpoints
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                              EmberKV                                    │
//! │                                                                         │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐                  │
//! │  │ HTTP Server │───>│  Auth Gate  │───>│  Handlers   │                  │
//! │  │   (axum)    │    │ (optional)  │    │             │                  │
//! │  └─────────────┘    └─────────────┘    └──────┬──────┘                  │
//! │                                               │                         │
//! │                                               ▼                         │
//! │                     ┌──────────────────────────────────────────────┐    │
//! │                     │                StoreEngine                   │    │
//! │                     │        RwLock { data, expires }              │    │
//! │                     └──────────────────────────────────────────────┘    │
//! │                           ▲                         ▲                   │
//! │                           │                         │                   │
//! │              ┌────────────┴──────────┐  ┌───────────┴────────────┐      │
//! │              │     ExpiryReaper      │  │    SnapshotWorker      │      │
//! │              │ (Background Tokio Task)│ │ (Background Tokio Task)│      │
//! │              └───────────────────────┘  └────────────────────────┘      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use emberkv::config::ServerConfig;
//! use emberkv::server::Server;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::load("emberkv.json")?;
//!     Server::new(config).run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Module Overview
//!
//! - [`storage`]: The store engine, expiry reaper, glob matcher and snapshots
//! - [`api`]: HTTP routes, request/response bodies and error mapping
//! - [`auth`]: Login and token validation
//! - [`config`]: JSON configuration file
//! - [`server`]: Wires everything together and runs until Ctrl+C
//!
//! ## Design Highlights
//!
//! ### One Lock, Two Tables
//!
//! Values and deadlines live side by side under a single `RwLock`, so a key
//! and its deadline are always observed together. Reads take the shared guard;
//! writes, deletes and the reaper take the exclusive one.
//!
//! ### Reaper-Driven Expiry
//!
//! Reads do not check deadlines. An expired key stays readable until the next
//! reaper tick removes it, which bounds staleness by the tick interval.

pub mod api;
pub mod auth;
pub mod config;
pub mod server;
pub mod storage;

// Re-export commonly used types for convenience
pub use config::ServerConfig;
pub use server::{Server, ServerError};
pub use storage::{start_expiry_reaper, ExpiryReaper, ReaperConfig, StoreEngine, Value};

/// The default port EmberKV listens on
pub const DEFAULT_PORT: u16 = 8080;

/// The default host EmberKV binds to
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Version of EmberKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
