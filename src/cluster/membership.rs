//! Membership discovery for node bootstrap
//!
//! Decides whether this node originates a new cluster or joins an existing
//! one, registering itself with the cluster when it is not yet a member.

use crate::cluster::client::{Member, MemberApi};
use crate::common::{NodeIdentity, Result, Sleeper};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Member list attempts before assuming there is no cluster yet
pub const MEMBER_LIST_ATTEMPTS: usize = 5;

/// Delay after each failed member list attempt
pub const MEMBER_LIST_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Delay after a successful member add, before the engine is started
pub const MEMBER_ADD_SETTLE_DELAY: Duration = Duration::from_secs(2);

/// Whether the engine originates or joins its cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterState {
    New,
    Existing,
}

impl ClusterState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClusterState::New => "new",
            ClusterState::Existing => "existing",
        }
    }
}

impl fmt::Display for ClusterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bootstrap directive handed to the engine as
/// `--initial-cluster` / `--initial-cluster-state`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitialClusterState {
    /// Comma-joined `name=peerURL` pairs
    pub members: String,
    pub state: ClusterState,
}

pub struct MembershipController {
    client: Arc<dyn MemberApi>,
    sleeper: Arc<dyn Sleeper>,
    identity: NodeIdentity,
}

impl MembershipController {
    pub fn new(
        client: Arc<dyn MemberApi>,
        sleeper: Arc<dyn Sleeper>,
        identity: NodeIdentity,
    ) -> Self {
        Self {
            client,
            sleeper,
            identity,
        }
    }

    /// Compute how this node should start.
    ///
    /// An unreachable cluster is treated as no cluster at all. Only a failed
    /// member add is fatal, since joining without it would leave membership
    /// inconsistent.
    pub async fn get_initial_cluster_state(&self) -> Result<InitialClusterState> {
        let prior = self.discover_members().await;
        let self_entry = format!("{}={}", self.identity.name, self.identity.advertise_peer_url);

        if prior.is_empty() {
            let result = InitialClusterState {
                members: self_entry,
                state: ClusterState::New,
            };
            tracing::info!(
                action = "membership.initial-cluster-state",
                members = %result.members,
                state = %result.state
            );
            return Ok(result);
        }

        let mut entries: Vec<String> = prior
            .iter()
            .map(|m| format!("{}={}", m.name, m.peer_url().unwrap_or_default()))
            .collect();

        let already_member = prior
            .iter()
            .any(|m| m.peer_url() == Some(self.identity.advertise_peer_url.as_str()));

        if already_member {
            tracing::info!(
                action = "membership.already-member",
                peer_url = %self.identity.advertise_peer_url
            );
        } else {
            tracing::info!(
                action = "membership.member-add",
                peer_url = %self.identity.advertise_peer_url
            );
            let added = self
                .client
                .member_add(&self.identity.advertise_peer_url)
                .await
                .map_err(|e| {
                    tracing::error!(action = "membership.member-add.failed", error = %e);
                    e
                })?;
            tracing::info!(action = "membership.member-add.done", id = %added.id);

            self.sleeper.sleep(MEMBER_ADD_SETTLE_DELAY).await;
            entries.push(self_entry);
        }

        let result = InitialClusterState {
            members: entries.join(","),
            state: ClusterState::Existing,
        };
        tracing::info!(
            action = "membership.initial-cluster-state",
            members = %result.members,
            state = %result.state
        );
        Ok(result)
    }

    /// Bounded member list retries. Exhaustion yields an empty list.
    async fn discover_members(&self) -> Vec<Member> {
        for attempt in 1..=MEMBER_LIST_ATTEMPTS {
            match self.client.member_list().await {
                Ok(members) => {
                    tracing::info!(
                        action = "membership.member-list",
                        attempt,
                        count = members.len()
                    );
                    return members;
                }
                Err(e) => {
                    tracing::error!(
                        action = "membership.member-list.failed",
                        attempt,
                        retryable = e.is_retryable(),
                        error = %e
                    );
                    self.sleeper.sleep(MEMBER_LIST_RETRY_DELAY).await;
                }
            }
        }

        // TODO: a partition during restart lands here and starts a second
        // cluster; make exhaustion fatal once operators agree on the semantics.
        tracing::info!(
            action = "membership.member-list.exhausted",
            attempts = MEMBER_LIST_ATTEMPTS
        );
        Vec::new()
    }
}
