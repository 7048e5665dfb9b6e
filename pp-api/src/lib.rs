pub mod api;
pub mod args;
pub mod beatmap;
pub mod calculator;
pub mod config;
pub mod errors;
pub mod files;
pub mod metrics_defs;
pub mod mode;
pub mod osu_api;
pub mod pipeline;
pub mod resolver;
pub mod response;
pub mod store;
pub mod telemetry;

#[cfg(test)]
mod testutils;

use crate::api::AppState;
use crate::calculator::RosuCalculator;
use crate::files::BeatmapFiles;
use crate::osu_api::OsuApi;
use crate::pipeline::Pipeline;
use crate::resolver::BeatmapResolver;
use crate::store::{MemoryBeatmapStore, MemoryPpCache};
use crate::telemetry::Telemetry;
use shared::admin_service::AdminService;
use shared::http::run_http_service;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::net::TcpListener;

#[derive(thiserror::Error, Debug)]
pub enum PpApiError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Serves the API and admin listeners until one of them fails.
pub async fn run(config: config::Config, telemetry: Telemetry) -> Result<(), PpApiError> {
    let source = Arc::new(OsuApi::new(&config.osu_api));
    let store = Arc::new(MemoryBeatmapStore::new(&config.cache));
    let cache = Arc::new(MemoryPpCache::new(&config.cache));
    let calculator = Arc::new(RosuCalculator::new(BeatmapFiles::new(
        source.clone(),
        config.beatmaps_dir.clone(),
    )));

    let pipeline = Pipeline::new(
        BeatmapResolver::new(source.clone(), store.clone()),
        store,
        cache,
        calculator,
        Duration::from_secs(config.calculation_timeout_secs),
    );

    let app = api::router(AppState {
        pipeline,
        source,
        telemetry,
    });

    let ready = Arc::new(AtomicBool::new(false));

    let api_task = async {
        let addr = format!("{}:{}", config.listener.host, config.listener.port);
        let listener = TcpListener::bind(addr).await?;
        ready.store(true, Ordering::Relaxed);
        tracing::info!(
            host = %config.listener.host,
            port = config.listener.port,
            "serving pp API"
        );
        axum::serve(listener, app).await
    };

    let ready_flag = ready.clone();
    let admin_service = AdminService::new(
        move || ready_flag.load(Ordering::Relaxed),
        "lets",
        env!("CARGO_PKG_VERSION"),
    );
    let admin_task = run_http_service(
        &config.admin_listener.host,
        config.admin_listener.port,
        admin_service,
    );

    tokio::try_join!(api_task, admin_task)?;
    Ok(())
}
