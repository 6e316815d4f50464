//! # kvfab
//!
//! Bootstrap wrapper for a node of a replicated key-value store:
//! - Discovers whether the cluster already exists and registers this node
//! - Renders `--initial-cluster` / `--initial-cluster-state` for the engine
//! - Launches the engine and records its PID
//! - Gates readiness on the node answering a trivial read
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   member list/add   ┌─────────────────────┐
//! │  Membership  │ ──────────────────► │  Cluster admin API  │
//! │  Controller  │                     │  (other members)    │
//! └──────┬───────┘                     └─────────────────────┘
//!        │ InitialClusterState
//! ┌──────▼───────┐   spawn + pid file  ┌─────────────────────┐
//! │  Supervisor  │ ──────────────────► │  Storage engine     │
//! └──────┬───────┘                     └──────────▲──────────┘
//!        │                                        │ GET /v2/keys/
//! ┌──────▼───────┐                                │
//! │  Sync gate   │ ───────────────────────────────┘
//! └──────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! kvfab start --config /etc/kvfab/kvfab.json
//!
//! # Only print the bootstrap flags
//! kvfab initial-cluster --config /etc/kvfab/kvfab.json
//! ```

pub mod application;
pub mod cluster;
pub mod common;
pub mod supervisor;

// Re-export commonly used types
pub use application::{Application, StartReport};
pub use common::{Config, Error, Result};

/// Current version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
