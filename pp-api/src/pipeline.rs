use crate::args::PpRequest;
use crate::beatmap::{Beatmap, GameMode, PpVector};
use crate::calculator::{Calculation, PpComputer};
use crate::errors::{InternalError, PpError};
use crate::metrics_defs::{
    CALCULATION_DURATION, CALCULATION_TIMEOUTS, PP_CACHE_HIT, PP_CACHE_MISS,
};
use crate::mode::detect_mode;
use crate::resolver::BeatmapResolver;
use crate::store::{BeatmapStore, PpCache};
use shared::{counter, histogram};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Longest beatmap (in seconds of hit length) pp is calculated for.
pub const MAX_HIT_LENGTH: u32 = 900;

/// Successful answer to a pp request.
#[derive(Clone, Debug, PartialEq)]
pub struct PpResult {
    pub song_name: String,
    /// One value for an explicit accuracy, otherwise one per canonical accuracy.
    pub pp: Vec<f64>,
    pub length: u32,
    pub stars: f64,
    pub ar: f64,
    pub bpm: f64,
}

impl PpResult {
    fn new(beatmap: Beatmap, pp: Vec<f64>) -> Self {
        PpResult {
            song_name: beatmap.song_name,
            pp,
            length: beatmap.hit_length,
            stars: beatmap.stars.standard,
            ar: beatmap.ar,
            bpm: beatmap.bpm,
        }
    }
}

/// Resolves pp requests, deciding between cached values and a fresh calculation.
#[derive(Clone)]
pub struct Pipeline {
    resolver: BeatmapResolver,
    store: Arc<dyn BeatmapStore>,
    cache: Arc<dyn PpCache>,
    computer: Arc<dyn PpComputer>,
    calculation_timeout: Duration,
}

impl Pipeline {
    pub fn new(
        resolver: BeatmapResolver,
        store: Arc<dyn BeatmapStore>,
        cache: Arc<dyn PpCache>,
        computer: Arc<dyn PpComputer>,
        calculation_timeout: Duration,
    ) -> Self {
        Pipeline {
            resolver,
            store,
            cache,
            computer,
            calculation_timeout,
        }
    }

    pub async fn resolve(&self, request: &PpRequest) -> Result<PpResult, PpError> {
        tracing::info!(beatmap_id = request.beatmap_id, "requested pp");

        let mut beatmap = self.resolver.resolve(request.beatmap_id).await?;

        if beatmap.hit_length > MAX_HIT_LENGTH {
            return Err(PpError::BeatmapTooLong);
        }

        let mode = request.mode.map(|mode| detect_mode(mode, &beatmap.stars));
        if mode != Some(GameMode::Standard) {
            return Err(PpError::UnsupportedGameMode);
        }

        let pp = if request.is_canonical() {
            self.canonical_pp(&mut beatmap).await?
        } else {
            self.specific_pp(&mut beatmap, request.mods, request.accuracy)
                .await?
        };

        Ok(PpResult::new(beatmap, pp))
    }

    /// No mods and no accuracy: served from the pp cache, filled on miss.
    async fn canonical_pp(&self, beatmap: &mut Beatmap) -> Result<Vec<f64>, PpError> {
        let cached = self
            .cache
            .get(&beatmap.checksum)
            .await
            .map_err(InternalError::from)?;

        // Older entries store all zeros for "not calculated yet".
        if let Some(pp) = cached.filter(|pp| !pp.is_unset()) {
            tracing::debug!(checksum = %beatmap.checksum, "got cached pp");
            counter!(PP_CACHE_HIT).increment(1);
            return Ok(pp.to_vec());
        }

        tracing::debug!(checksum = %beatmap.checksum, "cached pp not found, calculating");
        counter!(PP_CACHE_MISS).increment(1);

        let calculation = self.calculate(beatmap, 0, None).await?;
        beatmap.stars.standard = calculation.stars;
        self.store
            .save(beatmap)
            .await
            .map_err(InternalError::from)?;

        match PpVector::try_from(calculation.pp.as_slice()) {
            Ok(pp) => {
                tracing::debug!(checksum = %beatmap.checksum, "saving cached pp");
                self.cache
                    .put(&beatmap.checksum, pp)
                    .await
                    .map_err(InternalError::from)?;
            }
            Err(len) => {
                tracing::warn!(checksum = %beatmap.checksum, len, "unexpected pp count, not caching");
            }
        }

        Ok(calculation.pp)
    }

    /// Explicit mods or accuracy: always calculated, never cached.
    async fn specific_pp(
        &self,
        beatmap: &mut Beatmap,
        mods: u32,
        accuracy: Option<f64>,
    ) -> Result<Vec<f64>, PpError> {
        tracing::debug!(?accuracy, mods, "specific request, calculating");

        let calculation = self.calculate(beatmap, mods, accuracy).await?;
        beatmap.stars.standard = calculation.stars;

        Ok(match accuracy {
            Some(_) => calculation.pp.into_iter().take(1).collect(),
            None => calculation.pp,
        })
    }

    async fn calculate(
        &self,
        beatmap: &Beatmap,
        mods: u32,
        accuracy: Option<f64>,
    ) -> Result<Calculation, PpError> {
        let start = Instant::now();
        let calculation = tokio::time::timeout(
            self.calculation_timeout,
            self.computer.calculate(beatmap, mods, accuracy),
        )
        .await
        .map_err(|_| {
            tracing::warn!(checksum = %beatmap.checksum, mods, "pp calculation timed out");
            counter!(CALCULATION_TIMEOUTS).increment(1);
            InternalError::Timeout("pp calculation")
        })?
        .map_err(InternalError::from)?;
        histogram!(CALCULATION_DURATION).record(start.elapsed().as_secs_f64());

        Ok(calculation)
    }
}
