// Store connection lifecycle and the concrete backends behind it.
pub mod connection;
pub mod mysql;
pub mod sqlite;

pub use connection::{ConnectionError, ConnectionManager, Connector};
pub use mysql::MySqlConnector;
pub use sqlite::{SqliteConnector, SqliteHandle};
