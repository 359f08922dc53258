use std::net::SocketAddr;

use axum::{
    extract::DefaultBodyLimit,
    routing::get,
    Router,
};

use crate::{registry::Registry, service::SchoolService};

mod handlers;
mod models;

use handlers::{health, list_schools, not_found, register_school, school_image};

#[derive(Clone)]
pub struct AppState<R: Registry> {
    pub service: SchoolService<R>,
    pub started_at: std::time::SystemTime,
}

impl<R: Registry> AppState<R> {
    pub fn new(service: SchoolService<R>) -> Self {
        Self {
            service,
            started_at: std::time::SystemTime::now(),
        }
    }
}

pub fn router<R: Registry>(state: AppState<R>, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(health::<R>))
        .route(
            "/schools",
            get(list_schools::<R>).post(register_school::<R>),
        )
        .route("/schoolImages/:file", get(school_image::<R>))
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}

pub async fn serve<R: Registry>(
    addr: SocketAddr,
    state: AppState<R>,
    max_upload_bytes: usize,
    shutdown: tokio_util::sync::CancellationToken,
) -> anyhow::Result<()> {
    log::info!("🌐 REST service on http://{}", addr);

    let app = router(state, max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.cancelled().await;
            log::info!("🛑 REST shutdown requested");
        })
        .await?;
    log::info!("👋 REST server exited");
    Ok(())
}
