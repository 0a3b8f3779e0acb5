use std::time::Duration;

use thiserror::Error;

/// Errors surfaced by lock acquisition and by the completion signal.
#[derive(Debug, Error)]
pub enum Error {
    /// The lock is held by another session and no wait was requested.
    #[error("lock is held by another session")]
    NotAcquired,

    /// The bounded wait for the lock elapsed before it was granted.
    #[error("timed out after {0:?} waiting for lock")]
    AcquireTimeout(Duration),

    /// The caller's cancellation signal fired.
    #[error("lock canceled")]
    Canceled,

    /// A bounded operation on the held session exceeded its deadline.
    #[error("session operation timed out")]
    Timeout,

    #[error("postgres error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    #[error("tls error: {0}")]
    Tls(#[from] native_tls::Error),
}

impl Error {
    /// Expected ways a lock's lifetime ends: cancellation, a bounded deadline
    /// elapsing, or the owning session already being closed. The server
    /// releases an advisory lock when its session terminates, so none of
    /// these leaves the lock stuck.
    pub fn is_benign(&self) -> bool {
        match self {
            Error::Canceled | Error::Timeout => true,
            Error::Postgres(err) => err.is_closed(),
            _ => false,
        }
    }
}

/// Collapse benign terminal causes so callers only observe genuine failures.
pub(crate) fn suppress_benign(outcome: Result<(), Error>) -> Result<(), Error> {
    match outcome {
        Err(err) if err.is_benign() => Ok(()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancellation_and_deadline_are_benign() {
        assert!(Error::Canceled.is_benign());
        assert!(Error::Timeout.is_benign());
    }

    #[test]
    fn acquisition_failures_are_not_benign() {
        assert!(!Error::NotAcquired.is_benign());
        assert!(!Error::AcquireTimeout(Duration::from_secs(1)).is_benign());
    }

    #[test]
    fn suppression_keeps_real_failures() {
        assert!(suppress_benign(Ok(())).is_ok());
        assert!(suppress_benign(Err(Error::Canceled)).is_ok());
        assert!(suppress_benign(Err(Error::Timeout)).is_ok());
        assert!(suppress_benign(Err(Error::NotAcquired)).is_err());
    }
}
