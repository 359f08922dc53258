use std::time::Duration;

use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions};

use super::connection::{ConnectionError, Connector};
use crate::configuration::DbConfig;

const CREATE_SCHOOL_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS school (
        id BIGINT NOT NULL AUTO_INCREMENT PRIMARY KEY,
        name TEXT NOT NULL,
        email TEXT NOT NULL,
        address TEXT NOT NULL,
        city TEXT NOT NULL,
        state TEXT NOT NULL,
        contact TEXT NOT NULL,
        image TEXT NOT NULL
    )
"#;

/// Builds a bounded `sqlx` pool against a MySQL server.
#[derive(Clone, Debug)]
pub struct MySqlConnector {
    config: DbConfig,
    acquire_timeout: Duration,
}

impl MySqlConnector {
    pub fn new(config: DbConfig, acquire_timeout: Duration) -> Self {
        Self {
            config,
            acquire_timeout,
        }
    }

    fn options(&self) -> MySqlConnectOptions {
        MySqlConnectOptions::new()
            .host(&self.config.host)
            .port(self.config.port)
            .username(&self.config.user)
            .password(&self.config.password)
            .database(&self.config.database)
    }

    fn error(&self, source: sqlx::Error) -> ConnectionError {
        ConnectionError::MySql {
            target: self.config.target(),
            source,
        }
    }
}

impl Connector for MySqlConnector {
    type Handle = MySqlPool;

    fn describe(&self) -> String {
        format!("mysql://{}", self.config.target())
    }

    async fn connect(&self) -> Result<MySqlPool, ConnectionError> {
        let pool = MySqlPoolOptions::new()
            .max_connections(self.config.max_connections.max(1))
            .acquire_timeout(self.acquire_timeout)
            .connect_with(self.options())
            .await
            .map_err(|e| self.error(e))?;

        tokio::time::timeout(
            self.acquire_timeout,
            sqlx::query(CREATE_SCHOOL_TABLE).execute(&pool),
        )
        .await
        .map_err(|_| ConnectionError::Timeout(self.acquire_timeout))?
        .map_err(|e| self.error(e))?;

        Ok(pool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::DbBackend;

    #[test]
    fn describe_never_leaks_password() {
        let connector = MySqlConnector::new(
            DbConfig {
                backend: DbBackend::Mysql,
                password: "s3cret".into(),
                ..DbConfig::default()
            },
            Duration::from_secs(1),
        );
        let described = connector.describe();
        assert_eq!(described, "mysql://root@localhost:3306/assignment");
        assert!(!described.contains("s3cret"));
    }

    #[tokio::test]
    async fn unreachable_server_is_a_connection_error() {
        let connector = MySqlConnector::new(
            DbConfig {
                backend: DbBackend::Mysql,
                host: "127.0.0.1".into(),
                port: 1,
                ..DbConfig::default()
            },
            Duration::from_millis(500),
        );
        let err = connector.connect().await.unwrap_err();
        assert!(matches!(err, ConnectionError::MySql { .. }), "{err}");
    }
}
