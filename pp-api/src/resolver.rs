use crate::beatmap::Beatmap;
use crate::errors::{InternalError, PpError};
use crate::metrics_defs::UPSTREAM_LOOKUP_FAILURES;
use crate::osu_api::{BeatmapSource, UpstreamError};
use crate::store::BeatmapStore;
use shared::counter;
use std::sync::Arc;

/// Turns a beatmap id into the beatmap entity of a request.
#[derive(Clone)]
pub struct BeatmapResolver {
    source: Arc<dyn BeatmapSource>,
    store: Arc<dyn BeatmapStore>,
}

impl BeatmapResolver {
    pub fn new(source: Arc<dyn BeatmapSource>, store: Arc<dyn BeatmapStore>) -> Self {
        BeatmapResolver { source, store }
    }

    /// Resolves the checksum and set id upstream, then loads the beatmap from
    /// the store. Beatmaps missing from the store are built from the upstream
    /// metadata and saved.
    ///
    /// Unknown beatmaps and unusable upstream answers are both `InvalidBeatmap`.
    pub async fn resolve(&self, beatmap_id: u32) -> Result<Beatmap, PpError> {
        let upstream = match self.source.lookup(beatmap_id).await {
            Ok(Some(upstream)) => upstream,
            Ok(None) => return Err(PpError::InvalidBeatmap),
            Err(UpstreamError::Timeout) => {
                return Err(InternalError::Timeout("beatmap lookup").into());
            }
            Err(e) => {
                tracing::warn!(beatmap_id, error = %e, "beatmap lookup failed");
                counter!(UPSTREAM_LOOKUP_FAILURES).increment(1);
                return Err(PpError::InvalidBeatmap);
            }
        };

        let reference = upstream
            .beatmap_ref(beatmap_id)
            .ok_or(PpError::InvalidBeatmap)?;

        let stored = self
            .store
            .load(&reference.checksum, reference.set_id)
            .await
            .map_err(InternalError::from)?;

        match stored {
            Some(beatmap) => Ok(beatmap),
            None => {
                let beatmap = upstream
                    .to_beatmap(reference)
                    .ok_or(PpError::InvalidBeatmap)?;
                self.store
                    .save(&beatmap)
                    .await
                    .map_err(InternalError::from)?;
                Ok(beatmap)
            }
        }
    }
}
