use crate::beatmap::{Beatmap, CANONICAL_ACCURACIES};
use crate::files::BeatmapFiles;
use crate::metrics_defs::CALCULATIONS_RUNNING;
use crate::osu_api::UpstreamError;
use async_trait::async_trait;
use shared::gauge;

#[derive(thiserror::Error, Debug)]
pub enum CalcError {
    #[error("could not fetch .osu file: {0}")]
    File(#[from] UpstreamError),
    #[error("could not parse .osu file: {0}")]
    Parse(String),
    #[error("calculation task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Result of one pp calculation.
#[derive(Clone, Debug, PartialEq)]
pub struct Calculation {
    /// Star rating under the requested mods.
    pub stars: f64,
    /// pp at the requested accuracy, or at every canonical accuracy when none was requested.
    pub pp: Vec<f64>,
}

/// Standard mode pp calculation engine.
#[async_trait]
pub trait PpComputer: Send + Sync {
    async fn calculate(
        &self,
        beatmap: &Beatmap,
        mods: u32,
        accuracy: Option<f64>,
    ) -> Result<Calculation, CalcError>;
}

/// [`PpComputer`] backed by rosu-pp.
pub struct RosuCalculator {
    files: BeatmapFiles,
}

impl RosuCalculator {
    pub fn new(files: BeatmapFiles) -> Self {
        RosuCalculator { files }
    }
}

#[async_trait]
impl PpComputer for RosuCalculator {
    async fn calculate(
        &self,
        beatmap: &Beatmap,
        mods: u32,
        accuracy: Option<f64>,
    ) -> Result<Calculation, CalcError> {
        let content = self.files.get(beatmap).await?;

        // Difficulty calculation is CPU bound, keep it off the reactor threads.
        // rosu-pp cannot be interrupted: a job outlives a caller that timed out.
        tokio::task::spawn_blocking(move || {
            let _running = RunningCalculation::start();
            calculate_from_bytes(&content, mods, accuracy)
        })
        .await?
    }
}

/// Tracks a calculation in [`CALCULATIONS_RUNNING`] until dropped.
struct RunningCalculation;

impl RunningCalculation {
    fn start() -> Self {
        gauge!(CALCULATIONS_RUNNING).increment(1.0);
        RunningCalculation
    }
}

impl Drop for RunningCalculation {
    fn drop(&mut self) {
        gauge!(CALCULATIONS_RUNNING).decrement(1.0);
    }
}

pub fn calculate_from_bytes(
    content: &[u8],
    mods: u32,
    accuracy: Option<f64>,
) -> Result<Calculation, CalcError> {
    let map = rosu_pp::Beatmap::from_bytes(content).map_err(|e| CalcError::Parse(e.to_string()))?;

    let diff_attrs = rosu_pp::Difficulty::new().mods(mods).calculate(&map);
    let stars = diff_attrs.stars();
    let performance = rosu_pp::Performance::new(diff_attrs).mods(mods);

    let pp = match accuracy {
        Some(acc) => vec![performance.accuracy(acc).calculate().pp()],
        None => CANONICAL_ACCURACIES
            .iter()
            .map(|acc| performance.clone().accuracy(*acc).calculate().pp())
            .collect(),
    };

    Ok(Calculation { stars, pp })
}
