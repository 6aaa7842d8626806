//! Background jobs around media: the confirmation queue fed after content
//! writes, and the periodic staging sweep.

use std::{sync::Arc, time::Duration};

use tokio::{sync::mpsc, task::JoinHandle, time::MissedTickBehavior};
use tracing::{error, info, warn};
use uuid::Uuid;

use super::MediaService;
use crate::{metrics, retry::{retry_with_policy, RetryPolicy}};

/// Sending side of the confirmation queue. Never blocks the caller.
#[derive(Clone)]
pub struct ConfirmQueue {
    tx: mpsc::Sender<Vec<Uuid>>,
}

impl ConfirmQueue {
    /// Queue a batch; a full or closed queue is logged and the batch dropped.
    /// The staging sweep leaves referenced assets alone, so a dropped batch
    /// only delays the status flip until the next confirm of that asset.
    pub fn enqueue(&self, ids: Vec<Uuid>) {
        if ids.is_empty() {
            return;
        }
        match self.tx.try_send(ids) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(ids)) => {
                metrics::CONFIRM_FAILURES_TOTAL.inc();
                warn!(count = ids.len(), "confirm queue full, batch dropped");
            }
            Err(mpsc::error::TrySendError::Closed(ids)) => {
                metrics::CONFIRM_FAILURES_TOTAL.inc();
                warn!(count = ids.len(), "confirm worker stopped, batch dropped");
            }
        }
    }
}

/// How content writes hand referenced assets over for confirmation.
#[derive(Clone)]
pub enum Confirmation {
    /// Through the background worker with retries.
    Queued(ConfirmQueue),
    /// Right after the write, in the request; failures are only logged.
    Inline(Arc<MediaService>),
}

impl Confirmation {
    pub async fn submit(&self, ids: Vec<Uuid>) {
        match self {
            Confirmation::Queued(q) => q.enqueue(ids),
            Confirmation::Inline(media) => {
                if let Err(e) = media.confirm(&ids).await {
                    warn!(error = %e, count = ids.len(), "inline confirm failed");
                }
            }
        }
    }
}

/// Start the confirmation worker. It stops once every `ConfirmQueue` clone
/// is dropped and the queue has drained.
pub fn spawn_confirm_worker(media: Arc<MediaService>, policy: RetryPolicy, capacity: usize) -> (ConfirmQueue, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::channel::<Vec<Uuid>>(capacity.max(1));
    let handle = tokio::spawn(async move {
        while let Some(ids) = rx.recv().await {
            let res = retry_with_policy(&policy, || media.confirm(&ids)).await;
            if let Err(e) = res {
                metrics::CONFIRM_FAILURES_TOTAL.inc();
                error!(error = %e, ids = ?ids, "giving up on media confirmation");
            }
        }
        info!("confirm worker stopped");
    });
    (ConfirmQueue { tx }, handle)
}

/// Run `sweep_staging(ttl)` every `interval`, first tick after one interval.
pub fn spawn_staging_sweeper(media: Arc<MediaService>, ttl: Duration, interval: Duration) -> JoinHandle<()> {
    let interval = interval.max(Duration::from_secs(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(e) = media.sweep_staging(ttl).await {
                warn!(error = %e, "staging sweep failed");
            }
        }
    })
}
