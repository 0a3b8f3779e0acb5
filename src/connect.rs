//! Dedicated session establishment.

use native_tls::TlsConnector;
use postgres_native_tls::MakeTlsConnector;
use tokio_postgres::{Client, NoTls};
use tracing::{debug, warn};

use crate::config::{Config, SslMode};
use crate::error::Error;
use crate::session::Session;

/// Checks out dedicated sessions for lock attempts.
///
/// Every checkout opens a fresh connection. The session's lifetime bounds the
/// advisory lock's ownership, so sessions are never pooled or shared between
/// lock attempts.
#[derive(Clone, Debug)]
pub struct Connector {
    config: Config,
}

impl Connector {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Connector over [`Config::from_env`].
    pub fn from_env() -> Self {
        Self::new(Config::from_env())
    }

    /// Check out a dedicated session.
    pub async fn checkout(&self) -> Result<Session, Error> {
        let conn_str = self.config.connection_string();
        let mode = self.config.tls_mode();

        let client = match build_tls(mode)? {
            Tls::None => {
                debug!("connecting to PostgreSQL without TLS");
                connect_without_tls(&conn_str).await?
            }
            Tls::Prefer(connector) => {
                debug!("connecting to PostgreSQL with TLS mode {:?}", mode);
                match connect_with_tls(&conn_str, connector).await {
                    Ok(client) => client,
                    Err(err) => {
                        warn!(
                            error = %err,
                            "TLS connection failed in PGSSLMODE=prefer, retrying without TLS"
                        );
                        connect_without_tls(&conn_str).await?
                    }
                }
            }
            Tls::Enforced(connector) => {
                debug!("connecting to PostgreSQL with TLS mode {:?}", mode);
                connect_with_tls(&conn_str, connector).await?
            }
        };

        Ok(Session::new(client))
    }
}

enum Tls {
    None,
    Prefer(MakeTlsConnector),
    Enforced(MakeTlsConnector),
}

fn build_tls(mode: SslMode) -> Result<Tls, Error> {
    match mode {
        SslMode::Disable => Ok(Tls::None),
        SslMode::Prefer => Ok(Tls::Prefer(build_tls_connector(mode)?)),
        SslMode::Require | SslMode::VerifyCa | SslMode::VerifyFull => {
            Ok(Tls::Enforced(build_tls_connector(mode)?))
        }
    }
}

fn build_tls_connector(mode: SslMode) -> Result<MakeTlsConnector, Error> {
    let mut builder = TlsConnector::builder();
    if matches!(mode, SslMode::Prefer | SslMode::Require) {
        builder.danger_accept_invalid_certs(true);
    }
    if matches!(mode, SslMode::Prefer | SslMode::Require | SslMode::VerifyCa) {
        builder.danger_accept_invalid_hostnames(true);
    }
    Ok(MakeTlsConnector::new(builder.build()?))
}

async fn connect_with_tls(conn_str: &str, connector: MakeTlsConnector) -> Result<Client, Error> {
    let (client, connection) = tokio_postgres::connect(conn_str, connector).await?;
    spawn_connection(connection);
    Ok(client)
}

async fn connect_without_tls(conn_str: &str) -> Result<Client, Error> {
    let (client, connection) = tokio_postgres::connect(conn_str, NoTls).await?;
    spawn_connection(connection);
    Ok(client)
}

fn spawn_connection<T>(connection: T)
where
    T: std::future::Future<Output = std::result::Result<(), tokio_postgres::Error>>
        + Send
        + 'static,
{
    tokio::spawn(async move {
        if let Err(err) = connection.await {
            warn!(error = %err, "PostgreSQL connection error");
        }
    });
}
