//! Periodic removal of expired access-token records.
//!
//! Expired records are already invisible to lookups; the sweeper only
//! reclaims the space they take.

use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::SharedStore;

/// Default interval between sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

/// Run one sweep. Failures are logged and otherwise ignored.
pub async fn sweep_once(store: &SharedStore) -> u64 {
    match store.purge_expired_access_tokens(Utc::now()).await {
        Ok(0) => 0,
        Ok(removed) => {
            debug!(removed, "purged expired access tokens");
            removed
        }
        Err(e) => {
            warn!(error = %e, "access token sweep failed");
            0
        }
    }
}

/// Spawn the sweeper. It stops when `ct` is cancelled.
pub fn spawn_sweeper(store: SharedStore, every: Duration, ct: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            tokio::select! {
                _ = ct.cancelled() => break,
                _ = interval.tick() => {
                    sweep_once(&store).await;
                }
            }
        }
        info!("access token sweeper stopped");
    })
}
