use std::fmt;

use clap::ValueEnum;

pub const DEFAULT_DB_HOST: &str = "localhost";
pub const DEFAULT_DB_USER: &str = "root";
pub const DEFAULT_DB_NAME: &str = "assignment";
pub const DEFAULT_DB_PORT: u16 = 3306;
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum DbBackend {
    /// Embedded SQLite file under the data directory.
    Sqlite,
    /// Network MySQL server.
    Mysql,
}

impl fmt::Display for DbBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DbBackend::Sqlite => f.write_str("sqlite"),
            DbBackend::Mysql => f.write_str("mysql"),
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub backend: DbBackend,
    pub host: String,
    pub user: String,
    pub password: String,
    pub database: String,
    pub port: u16,
    pub max_connections: u32,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            backend: DbBackend::Sqlite,
            host: DEFAULT_DB_HOST.to_string(),
            user: DEFAULT_DB_USER.to_string(),
            password: String::new(),
            database: DEFAULT_DB_NAME.to_string(),
            port: DEFAULT_DB_PORT,
            max_connections: DEFAULT_DB_MAX_CONNECTIONS,
        }
    }
}

impl DbConfig {
    /// `user@host:port/database`, safe to log.
    pub fn target(&self) -> String {
        format!("{}@{}:{}/{}", self.user, self.host, self.port, self.database)
    }
}

impl fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbConfig")
            .field("backend", &self.backend)
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .field("port", &self.port)
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = DbConfig::default();
        assert_eq!(cfg.backend, DbBackend::Sqlite);
        assert_eq!(cfg.host, "localhost");
        assert_eq!(cfg.user, "root");
        assert_eq!(cfg.password, "");
        assert_eq!(cfg.database, "assignment");
        assert_eq!(cfg.port, 3306);
    }

    #[test]
    fn debug_redacts_password() {
        let cfg = DbConfig {
            password: "hunter22".into(),
            ..DbConfig::default()
        };
        let rendered = format!("{cfg:?}");
        assert!(!rendered.contains("hunter22"));
        assert_eq!(cfg.target(), "root@localhost:3306/assignment");
    }
}
