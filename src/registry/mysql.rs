use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use sqlx::mysql::MySqlPool;

use super::{Registry, RegistryError};
use crate::assets::DEFAULT_IO_TIMEOUT;
use crate::db::{ConnectionError, ConnectionManager, MySqlConnector};
use crate::types::{AssetReference, NewSchool, SchoolRecord, SchoolSummary};

type SummaryRow = (i64, String, String, String, String);

/// MySQL-backed registry sharing one lazily built pool.
///
/// A query cut short by the deadline is dropped client-side; whether the
/// server applied it is not known to the caller.
#[derive(Clone)]
pub struct MySqlRegistry {
    manager: Arc<ConnectionManager<MySqlConnector>>,
    timeout: Duration,
}

impl MySqlRegistry {
    pub fn new(connector: MySqlConnector) -> Self {
        Self {
            manager: Arc::new(ConnectionManager::new(connector)),
            timeout: DEFAULT_IO_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn pool(&self) -> Result<&MySqlPool, RegistryError> {
        Ok(self.manager.acquire().await?)
    }

    async fn bounded<T>(
        &self,
        query: impl Future<Output = Result<T, sqlx::Error>>,
    ) -> Result<T, RegistryError> {
        tokio::time::timeout(self.timeout, query)
            .await
            .map_err(|_| RegistryError::Timeout(self.timeout))?
            .map_err(RegistryError::from)
    }
}

impl Registry for MySqlRegistry {
    async fn connect(&self) -> Result<(), ConnectionError> {
        self.manager.acquire().await.map(|_| ())
    }

    async fn insert(
        &self,
        school: NewSchool,
        image: AssetReference,
    ) -> Result<SchoolRecord, RegistryError> {
        let pool = self.pool().await?;
        let done = self
            .bounded(
                sqlx::query(
                    r#"
                    INSERT INTO school (name, email, address, city, state, contact, image)
                    VALUES (?, ?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(school.name.as_str())
                .bind(school.email.as_str())
                .bind(school.address.as_str())
                .bind(school.city.as_str())
                .bind(school.state.as_str())
                .bind(school.contact.as_str())
                .bind(image.as_str())
                .execute(pool),
            )
            .await?;

        let id = i64::try_from(done.last_insert_id())
            .map_err(|_| RegistryError::InvalidRow(format!("id {} out of range", done.last_insert_id())))?;
        Ok(school.into_record(id, image))
    }

    async fn list(&self) -> Result<Vec<SchoolSummary>, RegistryError> {
        let pool = self.pool().await?;
        let rows: Vec<SummaryRow> = self
            .bounded(
                sqlx::query_as::<_, SummaryRow>(
                    "SELECT id, name, address, city, image FROM school",
                )
                .fetch_all(pool),
            )
            .await?;

        Ok(rows
            .into_iter()
            .map(|(id, name, address, city, image)| SchoolSummary {
                id,
                name,
                address,
                city,
                image: AssetReference::new(image),
            })
            .collect())
    }
}
