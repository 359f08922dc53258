use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::OnceCell;

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("failed to open sqlite database {path}: {source}")]
    Sqlite {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },
    #[error("failed to connect to mysql at {target}: {source}")]
    MySql {
        target: String,
        #[source]
        source: sqlx::Error,
    },
    #[error("connection attempt timed out after {0:?}")]
    Timeout(Duration),
    #[error("connection task failed: {0}")]
    Task(String),
}

/// Opens a handle to a concrete store.
pub trait Connector: Send + Sync + 'static {
    type Handle: Send + Sync + 'static;

    /// Human readable target for logs; must not contain secrets.
    fn describe(&self) -> String;

    fn connect(&self) -> impl Future<Output = Result<Self::Handle, ConnectionError>> + Send;
}

/// Process-wide owner of the store handle.
///
/// The handle is created on the first [`acquire`](Self::acquire) and shared by
/// every later call. Concurrent first callers wait on the same attempt, so at
/// most one handle is ever established. A failed attempt leaves the manager
/// empty and the next caller tries again; there is no retry loop here.
pub struct ConnectionManager<C: Connector> {
    connector: C,
    handle: OnceCell<C::Handle>,
}

impl<C: Connector> ConnectionManager<C> {
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            handle: OnceCell::new(),
        }
    }

    pub async fn acquire(&self) -> Result<&C::Handle, ConnectionError> {
        self.handle
            .get_or_try_init(|| async {
                let target = self.connector.describe();
                log::info!("🔌 Connecting to {}", target);
                match self.connector.connect().await {
                    Ok(handle) => {
                        log::info!("✅ Connected to {}", target);
                        Ok(handle)
                    }
                    Err(e) => {
                        log::error!("Connection to {} failed: {}", target, e);
                        Err(e)
                    }
                }
            })
            .await
    }

    pub fn is_connected(&self) -> bool {
        self.handle.initialized()
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }
}
