//! Cluster bootstrap
//!
//! Everything that decides how this node joins its cluster and when it is
//! safe to call it ready:
//! - Member admin API client
//! - Membership discovery (`--initial-cluster` / `--initial-cluster-state`)
//! - Sync gate (read-after-restart probe)

pub mod client;
pub mod membership;
pub mod sync;

pub use client::{ClientTls, HttpMemberClient, Member, MemberApi};
pub use membership::{ClusterState, InitialClusterState, MembershipController};
pub use sync::SyncController;
