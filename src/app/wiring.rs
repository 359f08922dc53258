use anyhow::{Context, Result};

use crate::{
    assets::AssetStore,
    configuration::DbBackend,
    context,
    db::{MySqlConnector, SqliteConnector},
    registry::{AnyRegistry, MySqlRegistry, SqliteRegistry},
    service::SchoolService,
};

pub fn init_data_dir(ctx: &context::Context) -> Result<()> {
    std::fs::create_dir_all(&ctx.data_dir)?;
    Ok(())
}

/// Builds the configured backend. Nothing connects until first use.
pub fn build_registry(ctx: &context::Context) -> Result<AnyRegistry> {
    let registry = match ctx.db.backend {
        DbBackend::Sqlite => {
            let connector = SqliteConnector::new(ctx.sqlite_path()).with_busy_timeout(ctx.io_timeout);
            if ctx.reset {
                connector.reset_all().context("resetting storage")?;
            }
            SqliteRegistry::new(connector)
                .with_timeout(ctx.io_timeout)
                .into()
        }
        DbBackend::Mysql => {
            if ctx.reset {
                log::warn!("--reset only applies to the sqlite backend; ignoring");
            }
            let connector = MySqlConnector::new(ctx.db.clone(), ctx.io_timeout);
            MySqlRegistry::new(connector)
                .with_timeout(ctx.io_timeout)
                .into()
        }
    };
    Ok(registry)
}

pub fn build_service(ctx: &context::Context) -> Result<SchoolService<AnyRegistry>> {
    let registry = build_registry(ctx)?;
    let assets = AssetStore::new(&ctx.assets_dir).with_timeout(ctx.io_timeout);
    Ok(SchoolService::new(registry, assets))
}
