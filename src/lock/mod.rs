//! Named cross-process locks on PostgreSQL advisory locks.

mod acquire;
mod keeper;
mod key;

pub use key::lock_key;

use std::time::Duration;

use tokio::sync::{oneshot, watch};
use tracing::debug;

use crate::connect::Connector;
use crate::error::Error;

const DEFAULT_PING_INTERVAL: Duration = Duration::from_secs(10);

/// One-shot receiver resolved when a held lock is released.
///
/// Resolves exactly once, after the release attempt has run: `Ok(())` on a
/// clean end of the lock's lifetime, `Err` with the terminal failure
/// otherwise.
pub type Completion = oneshot::Receiver<Result<(), Error>>;

/// Per-call lock settings.
#[derive(Clone, Copy, Debug, Default)]
pub struct LockOptions {
    timeout: Duration,
    ping_interval: Option<Duration>,
}

impl LockOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// How long to wait for the lock before giving up. Zero, the default,
    /// means fail immediately if the lock is unavailable.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Cadence of the liveness probe while the lock is held. Defaults to 10
    /// seconds.
    pub fn ping_interval(mut self, interval: Duration) -> Self {
        self.ping_interval = Some(interval);
        self
    }

    fn effective_ping_interval(&self) -> Duration {
        self.ping_interval
            .filter(|interval| !interval.is_zero())
            .unwrap_or(DEFAULT_PING_INTERVAL)
    }
}

/// Acquire the advisory lock for `name` and hold it until `cancel` fires.
///
/// A dedicated session is checked out from `connector` for the lifetime of
/// the lock; while held, the session is pinged at the configured interval to
/// keep it from idling out and to notice a dead connection. Acquisition is
/// synchronous: failures (unavailable, timed out, transport) are returned
/// here, the session is closed, and no completion channel exists. On success
/// the returned [`Completion`] resolves exactly once, after the lock has been
/// released.
pub async fn lock(
    cancel: watch::Receiver<bool>,
    connector: &Connector,
    name: &str,
    options: LockOptions,
) -> Result<Completion, Error> {
    let session = connector.checkout().await?;
    let key = key::lock_key(name);
    debug!(lock = name, key, "acquiring advisory lock");

    let mut acquire_cancel = cancel.clone();
    if let Err(err) = acquire::acquire(&session, key, options.timeout, &mut acquire_cancel).await {
        drop(session);
        return Err(err);
    }
    debug!(lock = name, key, "acquired advisory lock");

    let (done_tx, done_rx) = oneshot::channel();
    tokio::spawn(keeper::run(
        session,
        key,
        options.effective_ping_interval(),
        cancel,
        done_tx,
    ));
    Ok(done_rx)
}

/// Resolve when the cancellation signal fires: the observed value becomes
/// `true`, or the sender side is dropped.
pub(crate) async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    let _ = cancel.wait_for(|canceled| *canceled).await;
}
