use clap::Parser;
use std::env;

use crate::cli::command::Command;
use crate::configuration::{
    DbBackend, DEFAULT_DB_HOST, DEFAULT_DB_MAX_CONNECTIONS, DEFAULT_DB_NAME, DEFAULT_DB_PORT,
    DEFAULT_DB_USER,
};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Register schools and browse the school directory",
    long_about = "Serves a small school directory over HTTP: registrations with an uploaded image, and a filterable listing. Subcommands run a single operation against the same store.",
    subcommand_required = false,
    arg_required_else_help = false
)]
pub struct Cli {
    #[arg(
        long,
        default_value_t = false,
        help = "Reset all persisted state (delete the SQLite database) before starting"
    )]
    pub reset: bool,

    #[arg(
        long,
        env = "SCHOOLS_DATA_DIR",
        default_value = ".schools/",
        value_name = "DIR",
        help = "Directory to store persistent data"
    )]
    pub data_dir: String,

    #[arg(
        long,
        env = "SCHOOLS_ASSETS_DIR",
        default_value = "public",
        value_name = "DIR",
        help = "Root of the public asset tree; images land in DIR/schoolImages"
    )]
    pub assets_dir: String,

    #[arg(
        long = "db-backend",
        env = "DB_BACKEND",
        value_enum,
        default_value_t = DbBackend::Sqlite,
        help = "Record store backend"
    )]
    pub db_backend: DbBackend,

    #[arg(
        long = "db-host",
        env = "DB_HOST",
        default_value = DEFAULT_DB_HOST,
        value_name = "HOST",
        help = "MySQL host"
    )]
    pub db_host: String,

    #[arg(
        long = "db-user",
        env = "DB_USER",
        default_value = DEFAULT_DB_USER,
        value_name = "USER",
        help = "MySQL user"
    )]
    pub db_user: String,

    #[arg(
        long = "db-pass",
        env = "DB_PASS",
        default_value = "",
        hide_env_values = true,
        value_name = "PASS",
        help = "MySQL password"
    )]
    pub db_pass: String,

    #[arg(
        long = "db-name",
        env = "DB_NAME",
        default_value = DEFAULT_DB_NAME,
        value_name = "NAME",
        help = "Database name; also names the SQLite file"
    )]
    pub db_name: String,

    #[arg(
        long = "db-port",
        env = "DB_PORT",
        default_value_t = DEFAULT_DB_PORT,
        value_name = "PORT",
        help = "MySQL port"
    )]
    pub db_port: u16,

    #[arg(
        long = "db-max-connections",
        env = "DB_MAX_CONNECTIONS",
        default_value_t = DEFAULT_DB_MAX_CONNECTIONS,
        value_name = "N",
        help = "Upper bound on pooled MySQL connections"
    )]
    pub db_max_connections: u32,

    #[arg(
        long = "io-timeout-ms",
        env = "SCHOOLS_IO_TIMEOUT_MS",
        default_value_t = 10_000u64,
        value_name = "MS",
        help = "Deadline for each store round trip and asset write"
    )]
    pub io_timeout_ms: u64,

    #[arg(
        long = "max-upload-bytes",
        env = "SCHOOLS_MAX_UPLOAD_BYTES",
        default_value_t = 5 * 1024 * 1024,
        value_name = "BYTES",
        help = "Largest accepted registration request body"
    )]
    pub max_upload_bytes: usize,

    #[arg(
        long = "log-file",
        env = "SCHOOLS_LOG_FILE",
        value_name = "PATH",
        help = "Write logs to PATH (in addition to stderr)"
    )]
    pub log_file: Option<String>,

    #[arg(
        long = "api-listen",
        env = "SCHOOLS_API_LISTEN",
        value_name = "ADDR",
        default_value = "127.0.0.1:8083",
        help = "REST API listen address (host:port)"
    )]
    pub api_listen: std::net::SocketAddr,

    #[command(subcommand)]
    pub cmd: Option<Command>,
}

pub fn parse() -> Cli {
    let dotenv_path = env::var("DOTENV_PATH").unwrap_or(".env".into());
    dotenvy::from_filename(&dotenv_path).ok();

    Cli::parse()
}
