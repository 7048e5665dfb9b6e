use crate::beatmap::{Beatmap, BeatmapRef, GameMode, ModeStars};
use crate::config::OsuApiConfig;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::StatusCode;
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;
use url::Url;

#[derive(thiserror::Error, Debug)]
pub enum UpstreamError {
    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("unexpected status {0}")]
    Status(StatusCode),
    #[error("empty response body")]
    EmptyBody,
    #[error("base URL cannot be extended")]
    InvalidBaseUrl,
    #[error("request timed out")]
    Timeout,
}

/// Upstream game-data source.
#[async_trait]
pub trait BeatmapSource: Send + Sync {
    /// Metadata of a beatmap difficulty, `None` if upstream does not know it.
    async fn lookup(&self, beatmap_id: u32) -> Result<Option<UpstreamBeatmap>, UpstreamError>;

    /// Raw `.osu` file of a beatmap difficulty.
    async fn osu_file_by_id(&self, beatmap_id: u32) -> Result<Bytes, UpstreamError>;

    /// Raw `.osu` file by its file name.
    async fn osu_file_by_name(&self, file_name: &str) -> Result<Bytes, UpstreamError>;
}

/// One entry of the `get_beatmaps` answer. Every value is sent as a string.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpstreamBeatmap {
    pub beatmap_id: Option<String>,
    pub beatmapset_id: Option<String>,
    pub file_md5: Option<String>,
    pub artist: Option<String>,
    pub title: Option<String>,
    pub version: Option<String>,
    pub hit_length: Option<String>,
    pub difficultyrating: Option<String>,
    pub diff_approach: Option<String>,
    pub bpm: Option<String>,
    pub mode: Option<String>,
}

impl UpstreamBeatmap {
    /// Checksum and set id, if both are present and usable.
    pub fn beatmap_ref(&self, beatmap_id: u32) -> Option<BeatmapRef> {
        let checksum = self.file_md5.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
        let set_id = self.beatmapset_id.as_deref()?.trim().parse().ok()?;

        Some(BeatmapRef {
            beatmap_id,
            checksum: checksum.to_string(),
            set_id,
        })
    }

    /// Builds the beatmap entity from the upstream metadata.
    ///
    /// Upstream only rates the beatmap in its own mode; the other ratings stay zero.
    /// `None` when the hit length is missing or not a number, since the length
    /// limit could not be enforced.
    pub fn to_beatmap(&self, reference: BeatmapRef) -> Option<Beatmap> {
        let hit_length = self.hit_length.as_deref()?.trim().parse().ok()?;
        let mode = parse_or_default::<u32>(&self.mode);
        let stars = GameMode::from_id(mode)
            .map(|mode| ModeStars::single(mode, parse_or_default(&self.difficultyrating)))
            .unwrap_or_default();

        Some(Beatmap {
            beatmap_id: reference.beatmap_id,
            checksum: reference.checksum,
            set_id: reference.set_id,
            song_name: format!(
                "{} - {} [{}]",
                self.artist.as_deref().unwrap_or_default(),
                self.title.as_deref().unwrap_or_default(),
                self.version.as_deref().unwrap_or_default()
            ),
            hit_length,
            stars,
            ar: parse_or_default(&self.diff_approach),
            bpm: parse_or_default(&self.bpm),
        })
    }
}

fn parse_or_default<T: std::str::FromStr + Default>(value: &Option<String>) -> T {
    value
        .as_deref()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or_default()
}

/// osu! API v1 and file download client.
#[derive(Clone)]
pub struct OsuApi {
    client: reqwest::Client,
    base: Url,
    key: String,
    timeout: Duration,
}

impl OsuApi {
    pub fn new(config: &OsuApiConfig) -> Self {
        OsuApi {
            client: reqwest::Client::new(),
            base: config.url.clone(),
            key: config.key.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, UpstreamError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| UpstreamError::InvalidBaseUrl)?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn with_timeout<T>(
        &self,
        fut: impl Future<Output = Result<T, UpstreamError>>,
    ) -> Result<T, UpstreamError> {
        tokio::time::timeout(self.timeout, fut)
            .await
            .map_err(|_| UpstreamError::Timeout)?
    }

    async fn download(&self, url: Url) -> Result<Bytes, UpstreamError> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(UpstreamError::Status(response.status()));
        }

        let body = response.bytes().await?;
        if body.is_empty() {
            return Err(UpstreamError::EmptyBody);
        }
        Ok(body)
    }

    async fn get_beatmaps(
        &self,
        url: Url,
        beatmap_id: u32,
    ) -> Result<Option<UpstreamBeatmap>, UpstreamError> {
        let beatmap_id = beatmap_id.to_string();
        let response = self
            .client
            .get(url)
            .query(&[("k", self.key.as_str()), ("b", beatmap_id.as_str())])
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => {
                let beatmaps = response.json::<Vec<UpstreamBeatmap>>().await?;
                Ok(beatmaps.into_iter().next())
            }
            status => Err(UpstreamError::Status(status)),
        }
    }
}

#[async_trait]
impl BeatmapSource for OsuApi {
    async fn lookup(&self, beatmap_id: u32) -> Result<Option<UpstreamBeatmap>, UpstreamError> {
        let url = self.endpoint(&["api", "get_beatmaps"])?;
        self.with_timeout(self.get_beatmaps(url, beatmap_id)).await
    }

    async fn osu_file_by_id(&self, beatmap_id: u32) -> Result<Bytes, UpstreamError> {
        let url = self.endpoint(&["osu", &beatmap_id.to_string()])?;
        self.with_timeout(self.download(url)).await
    }

    async fn osu_file_by_name(&self, file_name: &str) -> Result<Bytes, UpstreamError> {
        let url = self.endpoint(&["web", "maps", file_name])?;
        self.with_timeout(self.download(url)).await
    }
}
