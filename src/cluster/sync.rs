//! Read-after-restart gate
//!
//! The node is only considered synced once it answers a trivial read.

use crate::cluster::client::MemberApi;
use crate::common::{Error, Result, Sleeper};
use std::sync::Arc;
use std::time::Duration;

/// Probe attempts before the node is declared never ready
pub const SYNC_ATTEMPTS: usize = 20;

/// Delay after each failed probe
pub const SYNC_RETRY_DELAY: Duration = Duration::from_secs(1);

pub struct SyncController {
    client: Arc<dyn MemberApi>,
    sleeper: Arc<dyn Sleeper>,
}

impl SyncController {
    pub fn new(client: Arc<dyn MemberApi>, sleeper: Arc<dyn Sleeper>) -> Self {
        Self { client, sleeper }
    }

    /// Probe until the first successful read; after the last failed
    /// attempt the last error is returned.
    pub async fn verify_synced(&self) -> Result<()> {
        let mut last_err = Error::Other("sync probe never ran".into());
        for attempt in 1..=SYNC_ATTEMPTS {
            match self.client.keys().await {
                Ok(()) => {
                    tracing::info!(action = "sync.verify-synced.done", attempt);
                    return Ok(());
                }
                Err(e) => {
                    tracing::debug!(action = "sync.verify-synced.retry", attempt, error = %e);
                    last_err = e;
                    self.sleeper.sleep(SYNC_RETRY_DELAY).await;
                }
            }
        }

        tracing::error!(
            action = "sync.verify-synced.failed",
            attempts = SYNC_ATTEMPTS,
            error = %last_err
        );
        Err(last_err)
    }
}
