//! Named cross-process locks built on PostgreSQL advisory locks.
//!
//! A lock is acquired by name on a dedicated session and held until the
//! caller's cancellation signal fires. While held, a background task pings
//! the session at a regular interval to keep it from idling out and to
//! notice a dead connection. Release is best-effort and runs under its own
//! deadline, after the caller's cancellation has already ended.
//!
//! ```no_run
//! use pglock::{Connector, LockOptions, lock};
//! use tokio::sync::watch;
//!
//! # async fn example() -> Result<(), pglock::Error> {
//! let connector = Connector::from_env();
//! let (cancel_tx, cancel_rx) = watch::channel(false);
//!
//! let done = lock(cancel_rx, &connector, "jobs/flush", LockOptions::new()).await?;
//! // ... the advisory lock is held ...
//! cancel_tx.send(true).ok();
//! done.await.expect("lock task ended")?;
//! # Ok(())
//! # }
//! ```

mod config;
mod connect;
mod error;
mod lock;
mod session;

pub use config::{Config, SslMode};
pub use connect::Connector;
pub use error::Error;
pub use lock::{Completion, LockOptions, lock, lock_key};
pub use session::Session;
