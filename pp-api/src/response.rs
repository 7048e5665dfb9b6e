use crate::errors::PpError;
use crate::pipeline::PpResult;
use crate::telemetry::Telemetry;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

pub const MODULE_NAME: &str = "api/pp";

/// Body of every `/api/v1/pp` answer. `status` repeats the HTTP status code.
#[derive(Debug, Serialize)]
pub struct PpResponse {
    pub status: u16,
    pub message: String,
    #[serde(flatten)]
    pub data: Option<PpData>,
}

#[derive(Debug, Serialize)]
pub struct PpData {
    pub song_name: String,
    pub pp: Vec<f64>,
    pub length: u32,
    pub stars: f64,
    pub ar: f64,
    pub bpm: f64,
}

impl From<PpResult> for PpData {
    fn from(result: PpResult) -> Self {
        PpData {
            song_name: result.song_name,
            pp: result.pp,
            length: result.length,
            stars: result.stars,
            ar: result.ar,
            bpm: result.bpm,
        }
    }
}

impl PpResponse {
    /// Maps a pipeline outcome to a response, reporting unknown errors.
    pub fn from_outcome(outcome: Result<PpResult, PpError>, telemetry: &Telemetry) -> Self {
        match outcome {
            Ok(result) => PpResponse {
                status: StatusCode::OK.as_u16(),
                message: "ok".into(),
                data: Some(result.into()),
            },
            Err(err) => {
                if matches!(err, PpError::Unknown(_)) {
                    telemetry.capture(MODULE_NAME, &err);
                }
                PpResponse {
                    status: StatusCode::BAD_REQUEST.as_u16(),
                    message: err.to_string(),
                    data: None,
                }
            }
        }
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::BAD_REQUEST)
    }
}

impl IntoResponse for PpResponse {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self)).into_response()
    }
}
