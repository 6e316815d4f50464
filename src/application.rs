//! Top-level bootstrap driver
//!
//! Sequences one node start: membership discovery, engine launch, sync gate.

use crate::cluster::{
    HttpMemberClient, InitialClusterState, MemberApi, MembershipController, SyncController,
};
use crate::common::{Config, Result, Sleeper, TokioSleeper};
use crate::supervisor::{engine_args, ProcessSupervisor, Supervisor};
use std::sync::Arc;

/// Outcome of a successful start
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartReport {
    pub initial_cluster: InitialClusterState,
    pub pid: Option<u32>,
}

pub struct Application {
    config: Config,
    cluster: Arc<dyn MemberApi>,
    local: Arc<dyn MemberApi>,
    supervisor: Box<dyn Supervisor>,
    sleeper: Arc<dyn Sleeper>,
}

impl Application {
    pub fn new(
        config: Config,
        cluster: Arc<dyn MemberApi>,
        local: Arc<dyn MemberApi>,
        supervisor: Box<dyn Supervisor>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self {
            config,
            cluster,
            local,
            supervisor,
            sleeper,
        }
    }

    /// Wire the HTTP clients, the process supervisor and the tokio timer.
    ///
    /// Config invariants are checked when the application runs, not here.
    pub fn from_config(config: Config) -> Result<Self> {
        Self::build(config).inspect_err(|e| {
            tracing::error!(action = "application.build.failed", error = %e);
        })
    }

    fn build(config: Config) -> Result<Self> {
        let cluster = Arc::new(HttpMemberClient::for_cluster(&config)?);
        let local = Arc::new(HttpMemberClient::for_local_node(&config)?);
        let supervisor = Box::new(ProcessSupervisor::new(
            config.engine.program.clone(),
            config.engine.pid_file.clone(),
        ));
        Ok(Self::new(config, cluster, local, supervisor, Arc::new(TokioSleeper)))
    }

    fn validate(&self) -> Result<()> {
        self.config.validate().inspect_err(|e| {
            tracing::error!(action = "application.validate.failed", error = %e);
        })
    }

    /// Compute the bootstrap directive only (registers this node if it joins).
    pub async fn initial_cluster_state(&self) -> Result<InitialClusterState> {
        self.validate()?;
        self.discover_initial_cluster().await
    }

    async fn discover_initial_cluster(&self) -> Result<InitialClusterState> {
        MembershipController::new(
            self.cluster.clone(),
            self.sleeper.clone(),
            self.config.identity(),
        )
        .get_initial_cluster_state()
        .await
    }

    /// Bootstrap the node and block until it serves reads.
    pub async fn start(mut self) -> Result<StartReport> {
        self.validate()?;
        let identity = self.config.identity();
        tracing::info!(
            action = "application.start",
            name = %identity.name,
            peer_url = %identity.advertise_peer_url,
            client_url = %identity.advertise_client_url
        );

        let initial_cluster = self.discover_initial_cluster().await.map_err(|e| {
            tracing::error!(action = "application.initial-cluster-state.failed", error = %e);
            e
        })?;

        let args = engine_args(&self.config, &identity, &initial_cluster);
        self.supervisor.start(args).await.map_err(|e| {
            tracing::error!(action = "application.supervisor-start.failed", error = %e);
            e
        })?;

        SyncController::new(self.local.clone(), self.sleeper.clone())
            .verify_synced()
            .await
            .map_err(|e| {
                tracing::error!(action = "application.verify-synced.failed", error = %e);
                e
            })?;

        let pid = self.supervisor.pid();
        tracing::info!(action = "application.ready", name = %identity.name, pid = ?pid);
        Ok(StartReport {
            initial_cluster,
            pid,
        })
    }
}
