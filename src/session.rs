//! Dedicated lock sessions.

use tokio_postgres::Client;
use tracing::debug;

/// A single dedicated PostgreSQL connection, checked out for the exclusive
/// use of one lock attempt.
///
/// The session's lifetime bounds the advisory lock's ownership: dropping the
/// session closes the connection, and the server releases any advisory lock
/// the session still holds.
pub struct Session {
    client: Client,
}

impl Session {
    pub(crate) fn new(client: Client) -> Self {
        Self { client }
    }

    pub(crate) fn client(&self) -> &Client {
        &self.client
    }

    /// Trivial round-trip used to detect connection death and to reset idle
    /// timers on intermediate infrastructure.
    pub async fn ping(&self) -> Result<(), tokio_postgres::Error> {
        self.client.batch_execute("SELECT 1").await
    }

    /// Whether the underlying connection is known to be gone.
    pub fn is_closed(&self) -> bool {
        self.client.is_closed()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        debug!("closing lock session");
        // Dropping the client closes the connection, which releases any
        // advisory lock the session still holds.
    }
}
