use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::{params, Connection, ErrorCode};

use super::{Registry, RegistryError};
use crate::assets::DEFAULT_IO_TIMEOUT;
use crate::db::{ConnectionError, ConnectionManager, SqliteConnector};
use crate::types::{AssetReference, NewSchool, SchoolRecord, SchoolSummary};

/// Where a submitted statement is, as seen by its caller's deadline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RunState {
    Queued,
    Running,
    Finished,
    Abandoned,
}

#[derive(Clone)]
pub struct SqliteRegistry {
    manager: Arc<ConnectionManager<SqliteConnector>>,
    timeout: Duration,
}

fn db_insert_school(
    conn: &Connection,
    school: &NewSchool,
    image: &AssetReference,
) -> rusqlite::Result<i64> {
    conn.execute(
        r#"
        INSERT INTO school (name, email, address, city, state, contact, image)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
        params![
            school.name,
            school.email,
            school.address,
            school.city,
            school.state,
            school.contact,
            image.as_str()
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn map_summary_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<SchoolSummary> {
    let image: String = row.get(4)?;
    Ok(SchoolSummary {
        id: row.get(0)?,
        name: row.get(1)?,
        address: row.get(2)?,
        city: row.get(3)?,
        image: AssetReference::new(image),
    })
}

fn db_list_schools(conn: &Connection) -> rusqlite::Result<Vec<SchoolSummary>> {
    let mut stmt = conn.prepare("SELECT id, name, address, city, image FROM school")?;
    let rows = stmt
        .query_map([], map_summary_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

impl SqliteRegistry {
    pub fn new(connector: SqliteConnector) -> Self {
        Self::with_manager(Arc::new(ConnectionManager::new(connector)))
    }

    pub fn with_manager(manager: Arc<ConnectionManager<SqliteConnector>>) -> Self {
        Self {
            manager,
            timeout: DEFAULT_IO_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Runs `f` on the shared connection in the blocking pool.
    ///
    /// A call whose deadline passes while it is still waiting for the
    /// connection is abandoned: it returns [`RegistryError::Timeout`] and its
    /// statement never runs. A call whose own statement is running gets it
    /// interrupted and is still awaited, so the result reflects what actually
    /// happened to the row. The interrupt is issued while the statement is
    /// known to hold the connection, so no other caller is affected.
    async fn with_conn<F, T>(&self, f: F) -> Result<T, RegistryError>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let handle = self.manager.acquire().await?.clone();
        let state = Arc::new(Mutex::new(RunState::Queued));
        let timeout = self.timeout;

        let worker = handle.clone();
        let worker_state = state.clone();
        let mut task = tokio::task::spawn_blocking(move || {
            let conn = worker
                .connection()
                .lock()
                .map_err(|_| RegistryError::Task("sqlite connection lock poisoned".to_string()))?;
            {
                let mut state = lock_state(&worker_state)?;
                if *state == RunState::Abandoned {
                    return Err(RegistryError::Timeout(timeout));
                }
                *state = RunState::Running;
            }
            let result = f(&*conn).map_err(RegistryError::from);
            // Marked before the connection guard drops, so a late interrupt
            // can never land on the next caller's statement.
            *lock_state(&worker_state)? = RunState::Finished;
            drop(conn);
            result
        });

        match tokio::time::timeout(timeout, &mut task).await {
            Ok(joined) => joined.map_err(|e| RegistryError::Task(e.to_string()))?,
            Err(_) => {
                {
                    let mut current = lock_state(&state)?;
                    match *current {
                        RunState::Queued => {
                            *current = RunState::Abandoned;
                            log::warn!("SQLite call waited past {:?}, abandoning", timeout);
                            return Err(RegistryError::Timeout(timeout));
                        }
                        RunState::Running => {
                            log::warn!("SQLite statement exceeded {:?}, interrupting", timeout);
                            handle.interrupt();
                        }
                        RunState::Finished | RunState::Abandoned => {}
                    }
                }
                let joined = task.await.map_err(|e| RegistryError::Task(e.to_string()))?;
                joined.map_err(|e| match e {
                    RegistryError::Sqlite(rusqlite::Error::SqliteFailure(failure, _))
                        if failure.code == ErrorCode::OperationInterrupted =>
                    {
                        RegistryError::Timeout(timeout)
                    }
                    other => other,
                })
            }
        }
    }
}

fn lock_state(state: &Mutex<RunState>) -> Result<MutexGuard<'_, RunState>, RegistryError> {
    state
        .lock()
        .map_err(|_| RegistryError::Task("sqlite run state lock poisoned".to_string()))
}

impl Registry for SqliteRegistry {
    async fn connect(&self) -> Result<(), ConnectionError> {
        self.manager.acquire().await.map(|_| ())
    }

    async fn insert(
        &self,
        school: NewSchool,
        image: AssetReference,
    ) -> Result<SchoolRecord, RegistryError> {
        self.with_conn(move |conn| {
            let id = db_insert_school(conn, &school, &image)?;
            Ok(school.into_record(id, image))
        })
        .await
    }

    async fn list(&self) -> Result<Vec<SchoolSummary>, RegistryError> {
        self.with_conn(db_list_schools).await
    }
}
