use crate::calculator::CalcError;
use crate::osu_api::UpstreamError;
use crate::store::StoreError;
use thiserror::Error;

/// Outcome of a failed pp request.
///
/// The first four variants are user-facing. `Unknown` carries the underlying
/// cause and is reported to telemetry.
#[derive(Error, Debug)]
pub enum PpError {
    #[error("missing required arguments")]
    InvalidArguments,

    #[error("beatmap not found")]
    InvalidBeatmap,

    #[error("requested beatmap is too long")]
    BeatmapTooLong,

    #[error("Unsupported gamemode")]
    UnsupportedGameMode,

    #[error("unknown error")]
    Unknown(#[from] InternalError),
}

impl PpError {
    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            PpError::InvalidArguments => "invalid_arguments",
            PpError::InvalidBeatmap => "invalid_beatmap",
            PpError::BeatmapTooLong => "beatmap_too_long",
            PpError::UnsupportedGameMode => "unsupported_game_mode",
            PpError::Unknown(_) => "unknown",
        }
    }
}

/// Causes of the unknown-error path.
#[derive(Error, Debug)]
pub enum InternalError {
    #[error("{0} timed out")]
    Timeout(&'static str),

    #[error("upstream error: {0}")]
    Upstream(#[from] UpstreamError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("calculation error: {0}")]
    Calculation(#[from] CalcError),
}
