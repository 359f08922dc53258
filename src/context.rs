use std::path::PathBuf;
use std::time::Duration;

use crate::configuration::{DbBackend, DbConfig};

/// Runtime settings resolved from the command line and environment.
#[derive(Debug, Clone)]
pub struct Context {
    pub data_dir: PathBuf,
    pub assets_dir: PathBuf,
    pub db: DbConfig,
    pub io_timeout: Duration,
    pub max_upload_bytes: usize,
    pub log_file: Option<PathBuf>,
    pub api_listen: std::net::SocketAddr,
    pub reset: bool,
}

impl Context {
    pub fn from_cli(cli: &crate::cli::Cli) -> Self {
        Self {
            data_dir: PathBuf::from(&cli.data_dir),
            assets_dir: PathBuf::from(&cli.assets_dir),
            db: DbConfig {
                backend: cli.db_backend,
                host: cli.db_host.clone(),
                user: cli.db_user.clone(),
                password: cli.db_pass.clone(),
                database: cli.db_name.clone(),
                port: cli.db_port,
                max_connections: cli.db_max_connections,
            },
            io_timeout: Duration::from_millis(cli.io_timeout_ms),
            max_upload_bytes: cli.max_upload_bytes,
            log_file: cli.log_file.as_ref().map(PathBuf::from),
            api_listen: cli.api_listen,
            reset: cli.reset,
        }
    }

    /// SQLite file backing the registry when that backend is selected.
    pub fn sqlite_path(&self) -> PathBuf {
        self.data_dir.join(format!("{}.sqlite", self.db.database))
    }

    pub fn uses_sqlite(&self) -> bool {
        self.db.backend == DbBackend::Sqlite
    }
}
