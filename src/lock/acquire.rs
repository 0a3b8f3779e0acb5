//! Acquisition strategies: fail-fast vs. bounded wait.

use std::time::Duration;

use tokio::sync::watch;
use tracing::debug;

use crate::error::Error;
use crate::session::Session;

use super::cancelled;
use super::key::key_param;

/// Claim `key` on `session`, selecting the strategy by `timeout`.
///
/// Zero means a single non-blocking attempt; otherwise the blocking claim is
/// bounded by `timeout`, measured from this call, and by the caller's
/// cancellation. The caller owns the session and closes it on failure.
pub(super) async fn acquire(
    session: &Session,
    key: u32,
    timeout: Duration,
    cancel: &mut watch::Receiver<bool>,
) -> Result<(), Error> {
    if timeout.is_zero() {
        try_claim(session, key).await
    } else {
        wait_for_claim(session, key, timeout, cancel).await
    }
}

async fn try_claim(session: &Session, key: u32) -> Result<(), Error> {
    let row = session
        .client()
        .query_one("SELECT pg_try_advisory_lock($1)", &[&key_param(key)])
        .await?;
    if row.get::<_, bool>(0) {
        Ok(())
    } else {
        debug!(key, "advisory lock already held by another session");
        Err(Error::NotAcquired)
    }
}

async fn wait_for_claim(
    session: &Session,
    key: u32,
    timeout: Duration,
    cancel: &mut watch::Receiver<bool>,
) -> Result<(), Error> {
    let param = key_param(key);
    let params: [&(dyn tokio_postgres::types::ToSql + Sync); 1] = [&param];
    let claim = session
        .client()
        .execute("SELECT pg_advisory_lock($1)", &params);
    tokio::select! {
        res = tokio::time::timeout(timeout, claim) => match res {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(err)) => Err(err.into()),
            Err(_) => {
                debug!(key, ?timeout, "gave up waiting for advisory lock");
                Err(Error::AcquireTimeout(timeout))
            }
        },
        _ = cancelled(cancel) => Err(Error::Canceled),
    }
}
