//! Structured persistence of school records.
//!
//! A [`Registry`] is both the writer (one insert per registration) and the
//! reader (full scan in the listing projection). Backends are picked at
//! startup and wrapped in [`AnyRegistry`].

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

use crate::db::ConnectionError;
use crate::types::{AssetReference, NewSchool, SchoolRecord, SchoolSummary};

pub mod mysql;
pub mod sqlite;

#[cfg(test)]
pub(crate) mod memory;

pub use mysql::MySqlRegistry;
pub use sqlite::SqliteRegistry;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error(transparent)]
    Connection(#[from] ConnectionError),
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("mysql error: {0}")]
    MySql(#[from] sqlx::Error),
    #[error("query timed out after {0:?}")]
    Timeout(Duration),
    #[error("store task failed: {0}")]
    Task(String),
    #[error("invalid row: {0}")]
    InvalidRow(String),
}

pub trait Registry: Clone + Send + Sync + 'static {
    /// Makes sure the store is reachable without touching any row.
    fn connect(&self) -> impl Future<Output = Result<(), ConnectionError>> + Send;

    /// Inserts all seven columns in one statement and returns the stored record.
    fn insert(
        &self,
        school: NewSchool,
        image: AssetReference,
    ) -> impl Future<Output = Result<SchoolRecord, RegistryError>> + Send;

    /// Every record in the store's scan order; empty when there are none.
    fn list(&self) -> impl Future<Output = Result<Vec<SchoolSummary>, RegistryError>> + Send;
}

#[derive(Clone)]
pub enum AnyRegistry {
    Sqlite(SqliteRegistry),
    MySql(MySqlRegistry),
}

impl Registry for AnyRegistry {
    async fn connect(&self) -> Result<(), ConnectionError> {
        match self {
            AnyRegistry::Sqlite(r) => r.connect().await,
            AnyRegistry::MySql(r) => r.connect().await,
        }
    }

    async fn insert(
        &self,
        school: NewSchool,
        image: AssetReference,
    ) -> Result<SchoolRecord, RegistryError> {
        match self {
            AnyRegistry::Sqlite(r) => r.insert(school, image).await,
            AnyRegistry::MySql(r) => r.insert(school, image).await,
        }
    }

    async fn list(&self) -> Result<Vec<SchoolSummary>, RegistryError> {
        match self {
            AnyRegistry::Sqlite(r) => r.list().await,
            AnyRegistry::MySql(r) => r.list().await,
        }
    }
}

impl From<SqliteRegistry> for AnyRegistry {
    fn from(value: SqliteRegistry) -> Self {
        AnyRegistry::Sqlite(value)
    }
}

impl From<MySqlRegistry> for AnyRegistry {
    fn from(value: MySqlRegistry) -> Self {
        AnyRegistry::MySql(value)
    }
}
