use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rusqlite::{Connection, InterruptHandle};

use super::connection::{ConnectionError, Connector};

pub const DB_SCHEMA_VERSION: i64 = 1;

/// The single SQLite connection shared by the process.
pub struct SqliteHandle {
    conn: Mutex<Connection>,
    interrupt: InterruptHandle,
}

impl SqliteHandle {
    pub fn connection(&self) -> &Mutex<Connection> {
        &self.conn
    }

    /// Aborts the statement currently running on the connection, if any.
    pub fn interrupt(&self) {
        self.interrupt.interrupt();
    }
}

#[derive(Clone, Debug)]
pub struct SqliteConnector {
    path: PathBuf,
    busy_timeout: Duration,
}

impl SqliteConnector {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            busy_timeout: Duration::from_millis(500),
        }
    }

    pub fn with_busy_timeout(mut self, busy_timeout: Duration) -> Self {
        self.busy_timeout = busy_timeout;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Removes the database file and its WAL side files.
    pub fn reset_all(&self) -> std::io::Result<()> {
        for suffix in ["", "-wal", "-shm"] {
            let mut name = self.path.clone().into_os_string();
            name.push(suffix);
            let path = PathBuf::from(name);
            if path.exists() {
                std::fs::remove_file(&path)?;
            }
        }
        Ok(())
    }

    fn open(&self) -> rusqlite::Result<SqliteHandle> {
        let conn = Connection::open(&self.path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.busy_timeout(self.busy_timeout)?;
        migrate(&conn)?;

        let interrupt = conn.get_interrupt_handle();
        Ok(SqliteHandle {
            conn: Mutex::new(conn),
            interrupt,
        })
    }
}

impl Connector for SqliteConnector {
    type Handle = Arc<SqliteHandle>;

    fn describe(&self) -> String {
        format!("sqlite://{}", self.path.display())
    }

    async fn connect(&self) -> Result<Arc<SqliteHandle>, ConnectionError> {
        let connector = self.clone();
        let opened = tokio::task::spawn_blocking(move || connector.open())
            .await
            .map_err(|e| ConnectionError::Task(e.to_string()))?;

        opened
            .map(Arc::new)
            .map_err(|source| ConnectionError::Sqlite {
                path: self.path.clone(),
                source,
            })
    }
}

fn migrate(conn: &Connection) -> rusqlite::Result<()> {
    let version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;

    if version == DB_SCHEMA_VERSION {
        return Ok(());
    }

    if version == 0 {
        log::info!(
            "SQLite schema migration: {} -> {}",
            version,
            DB_SCHEMA_VERSION
        );
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS school (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                email TEXT NOT NULL,
                address TEXT NOT NULL,
                city TEXT NOT NULL,
                state TEXT NOT NULL,
                contact TEXT NOT NULL,
                image TEXT NOT NULL
            );
            "#,
        )?;
        conn.pragma_update(None, "user_version", DB_SCHEMA_VERSION)?;
        return Ok(());
    }

    Err(rusqlite::Error::SqliteFailure(
        rusqlite::ffi::Error::new(rusqlite::ffi::ErrorCode::SchemaChanged as i32),
        Some("database schema version mismatch; please run with --reset option".to_string()),
    ))
}
