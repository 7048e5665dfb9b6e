use crate::args::PpRequest;
use crate::metrics_defs::{MAPS_PROXY_FAILURES, REQUEST_DURATION, REQUESTS};
use crate::osu_api::{BeatmapSource, UpstreamError};
use crate::pipeline::Pipeline;
use crate::response::PpResponse;
use crate::telemetry::Telemetry;
use axum::extract::{Path, RawQuery, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use shared::{counter, histogram};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Pipeline,
    pub source: Arc<dyn BeatmapSource>,
    pub telemetry: Telemetry,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/pp", get(pp_handler))
        .route("/web/maps/", get(missing_file_name))
        .route("/web/maps/{file_name}", get(maps_handler))
        .with_state(state)
}

/// `GET /api/v1/pp?b=<beatmap id>[&m=<mods>][&g=<mode>][&a=<accuracy>]`
async fn pp_handler(State(state): State<AppState>, RawQuery(query): RawQuery) -> PpResponse {
    let start = Instant::now();

    let params: HashMap<String, String> = url::form_urlencoded::parse(
        query.as_deref().unwrap_or_default().as_bytes(),
    )
    .into_owned()
    .collect();

    let outcome = match PpRequest::from_query(&params) {
        Ok(request) => state.pipeline.resolve(&request).await,
        Err(e) => Err(e),
    };
    if let Err(e) = &outcome {
        tracing::debug!(kind = e.kind(), "pp request failed");
    }

    let response = PpResponse::from_outcome(outcome, &state.telemetry);
    counter!(REQUESTS, "endpoint" => "pp", "status" => response.status.to_string()).increment(1);
    histogram!(REQUEST_DURATION, "endpoint" => "pp").record(start.elapsed().as_secs_f64());

    response
}

/// `GET /web/maps/<file name>`: the `.osu` file as served upstream.
async fn maps_handler(
    State(state): State<AppState>,
    Path(file_name): Path<String>,
) -> Response {
    let start = Instant::now();
    tracing::info!(file_name = %short_name(&file_name), "requested .osu file");

    let response = if file_name.is_empty() {
        StatusCode::INTERNAL_SERVER_ERROR.into_response()
    } else {
        match state.source.osu_file_by_name(&file_name).await {
            Ok(content) => (StatusCode::OK, content).into_response(),
            Err(e @ (UpstreamError::Timeout | UpstreamError::InvalidBaseUrl)) => {
                state.telemetry.capture("maps", &e);
                counter!(MAPS_PROXY_FAILURES).increment(1);
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
            Err(e) => {
                tracing::warn!(error = %e, "could not fetch .osu file");
                counter!(MAPS_PROXY_FAILURES).increment(1);
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    };

    counter!(
        REQUESTS,
        "endpoint" => "maps",
        "status" => response.status().as_u16().to_string()
    )
    .increment(1);
    histogram!(REQUEST_DURATION, "endpoint" => "maps").record(start.elapsed().as_secs_f64());

    response
}

async fn missing_file_name() -> StatusCode {
    StatusCode::INTERNAL_SERVER_ERROR
}

fn short_name(file_name: &str) -> &str {
    match file_name.char_indices().nth(32) {
        Some((end, _)) => &file_name[..end],
        None => file_name,
    }
}
