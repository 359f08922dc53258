mod wiring;

use crate::{cli, context, registry::AnyRegistry, rest, service::SchoolService};
use anyhow::{Context as AnyhowContext, Result};
use tokio_util::sync::CancellationToken;

pub struct App {
    pub ctx: context::Context,
    pub service: SchoolService<AnyRegistry>,
}

impl App {
    pub fn from_cli() -> Result<(Self, cli::Cli)> {
        let cli = crate::cli::parse();
        let ctx = context::Context::from_cli(&cli);

        crate::logging::init(ctx.log_file.as_deref());
        log::info!("🚀 Starting school-registry");
        log::info!("🗄️ Backend: {}", ctx.db.backend);
        if ctx.uses_sqlite() {
            log::info!("📂 Database file: {}", ctx.sqlite_path().display());
        } else {
            log::info!("🔗 Database: {}", ctx.db.target());
        }
        log::info!("🖼️ Assets dir: {}", ctx.assets_dir.display());

        wiring::init_data_dir(&ctx).context("initializing data dir")?;
        let service = wiring::build_service(&ctx).context("building service")?;

        Ok((Self { ctx, service }, cli))
    }
}

pub async fn run_daemon(app: App) -> Result<()> {
    log::info!("🌐 REST API: http://{}", app.ctx.api_listen);
    if let Some(path) = app.ctx.log_file.as_deref() {
        log::info!("📝 Log file: {}", path.display());
    }

    let shutdown = CancellationToken::new();

    let api_addr = app.ctx.api_listen;
    let max_upload_bytes = app.ctx.max_upload_bytes;
    let state = rest::AppState::new(app.service);
    let rest_shutdown = shutdown.clone();

    let mut rest_handle = tokio::spawn(async move {
        rest::serve(api_addr, state, max_upload_bytes, rest_shutdown).await
    });

    let joined = tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            log::info!("🧨 Ctrl-C received, shutting down");
            shutdown.cancel();
            rest_handle.await
        }
        joined = &mut rest_handle => {
            log::warn!("REST server stopped before shutdown was requested");
            shutdown.cancel();
            joined
        }
    };

    match joined {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            log::error!("REST server error: {}", e);
            return Err(e);
        }
        Err(e) => {
            log::error!("REST task failed: {}", e);
            return Err(e.into());
        }
    }

    log::info!("✅ Shutdown complete");
    Ok(())
}

pub async fn run() -> Result<()> {
    let (app, cli) = App::from_cli()?;

    if let Some(cmd) = &cli.cmd {
        // one-shot command mode
        return cmd.run(&app.service).await;
    }

    run_daemon(app).await
}
