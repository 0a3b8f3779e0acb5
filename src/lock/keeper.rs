//! The per-lock background task: liveness pings while held, then release.

use std::time::Duration;

use tokio::sync::{oneshot, watch};
use tracing::{debug, warn};

use crate::error::{Error, suppress_benign};
use crate::session::Session;

use super::cancelled;
use super::key::key_param;

/// Release runs under its own deadline. The cancellation that triggered it
/// has already fired, and the unlock must still be given a chance to reach
/// the server.
const RELEASE_TIMEOUT: Duration = Duration::from_secs(5);

/// Hold the lock until cancellation or a failed ping, release it, then
/// deliver the classified outcome.
///
/// Sole writer of `done` and sole owner of `session` once spawned.
pub(super) async fn run(
    session: Session,
    key: u32,
    ping_interval: Duration,
    mut cancel: watch::Receiver<bool>,
    done: oneshot::Sender<Result<(), Error>>,
) {
    let held = hold(&session, ping_interval, &mut cancel).await;

    let outcome = match release(&session, key).await {
        Ok(()) => {
            debug!(key, "advisory lock released");
            held
        }
        Err(err) if err.is_benign() => {
            debug!(key, error = %err, "unlock skipped; closing the session releases it");
            held
        }
        Err(err) => {
            warn!(key, error = %err, "failed to release advisory lock");
            Err(err)
        }
    };

    drop(session);
    let _ = done.send(suppress_benign(outcome));
}

/// Ping the session every `ping_interval` until cancellation or a failed
/// probe. Both the wait and the probe itself are bounded by cancellation.
async fn hold(
    session: &Session,
    ping_interval: Duration,
    cancel: &mut watch::Receiver<bool>,
) -> Result<(), Error> {
    let mut ticker = tokio::time::interval(ping_interval);
    // The first tick fires immediately; consume it so the first ping comes a
    // full interval after acquisition.
    ticker.tick().await;
    loop {
        tokio::select! {
            _ = cancelled(cancel) => return Err(Error::Canceled),
            _ = ticker.tick() => {}
        }
        tokio::select! {
            _ = cancelled(cancel) => return Err(Error::Canceled),
            res = session.ping() => {
                if let Err(err) = res {
                    warn!(error = %err, "lock session liveness probe failed");
                    return Err(err.into());
                }
            }
        }
    }
}

/// Exactly one unlock attempt, under a fresh deadline independent of the
/// caller's cancellation.
async fn release(session: &Session, key: u32) -> Result<(), Error> {
    let param = key_param(key);
    let params: [&(dyn tokio_postgres::types::ToSql + Sync); 1] = [&param];
    let unlock = session
        .client()
        .execute("SELECT pg_advisory_unlock($1)", &params);
    match tokio::time::timeout(RELEASE_TIMEOUT, unlock).await {
        Ok(Ok(_)) => Ok(()),
        Ok(Err(err)) => Err(err.into()),
        Err(_) => Err(Error::Timeout),
    }
}
