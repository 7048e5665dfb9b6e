use crate::beatmap::{Beatmap, GameMode, ModeStars, PpVector};
use crate::calculator::{CalcError, Calculation, PpComputer};
use crate::config::CacheConfig;
use crate::osu_api::{BeatmapSource, UpstreamBeatmap, UpstreamError};
use crate::pipeline::Pipeline;
use crate::resolver::BeatmapResolver;
use crate::store::{BeatmapStore, MemoryBeatmapStore, MemoryPpCache, PpCache, StoreError};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Upstream metadata of a standard beatmap rated 5 stars, in set 1.
pub fn upstream_beatmap(checksum: &str, hit_length: u32) -> UpstreamBeatmap {
    UpstreamBeatmap {
        beatmap_id: Some("1".into()),
        beatmapset_id: Some("1".into()),
        file_md5: Some(checksum.into()),
        artist: Some("xi".into()),
        title: Some("FREEDOM DiVE".into()),
        version: Some("FOUR DIMENSIONS".into()),
        hit_length: Some(hit_length.to_string()),
        difficultyrating: Some("5.0".into()),
        diff_approach: Some("9".into()),
        bpm: Some("222.22".into()),
        mode: Some("0".into()),
    }
}

pub fn beatmap(hit_length: u32) -> Beatmap {
    Beatmap {
        beatmap_id: 1,
        checksum: "abc".into(),
        set_id: 1,
        song_name: "xi - FREEDOM DiVE [FOUR DIMENSIONS]".into(),
        hit_length,
        stars: ModeStars::single(GameMode::Standard, 5.0),
        ar: 9.0,
        bpm: 222.22,
    }
}

/// In-memory upstream. Lookup errors are returned once.
#[derive(Default)]
pub struct MockSource {
    beatmaps: HashMap<u32, UpstreamBeatmap>,
    lookup_errors: Mutex<HashMap<u32, UpstreamError>>,
    files: HashMap<u32, Bytes>,
    named_files: HashMap<String, Bytes>,
    pub lookup_calls: AtomicUsize,
    pub file_calls: AtomicUsize,
}

impl MockSource {
    pub fn with_beatmap(mut self, beatmap_id: u32, beatmap: UpstreamBeatmap) -> Self {
        self.beatmaps.insert(beatmap_id, beatmap);
        self
    }

    pub fn with_lookup_error(self, beatmap_id: u32, error: UpstreamError) -> Self {
        self.lookup_errors
            .lock()
            .unwrap()
            .insert(beatmap_id, error);
        self
    }

    pub fn with_file(mut self, beatmap_id: u32, content: &[u8]) -> Self {
        self.files
            .insert(beatmap_id, Bytes::copy_from_slice(content));
        self
    }

    pub fn with_named_file(mut self, name: &str, content: &[u8]) -> Self {
        self.named_files
            .insert(name.to_string(), Bytes::copy_from_slice(content));
        self
    }
}

#[async_trait]
impl BeatmapSource for MockSource {
    async fn lookup(&self, beatmap_id: u32) -> Result<Option<UpstreamBeatmap>, UpstreamError> {
        self.lookup_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.lookup_errors.lock().unwrap().remove(&beatmap_id) {
            return Err(error);
        }
        Ok(self.beatmaps.get(&beatmap_id).cloned())
    }

    async fn osu_file_by_id(&self, beatmap_id: u32) -> Result<Bytes, UpstreamError> {
        self.file_calls.fetch_add(1, Ordering::SeqCst);
        self.files
            .get(&beatmap_id)
            .cloned()
            .ok_or(UpstreamError::Status(reqwest::StatusCode::NOT_FOUND))
    }

    async fn osu_file_by_name(&self, file_name: &str) -> Result<Bytes, UpstreamError> {
        self.file_calls.fetch_add(1, Ordering::SeqCst);
        self.named_files
            .get(file_name)
            .cloned()
            .ok_or(UpstreamError::EmptyBody)
    }
}

pub struct FailingStore;

#[async_trait]
impl BeatmapStore for FailingStore {
    async fn load(&self, _checksum: &str, _set_id: u32) -> Result<Option<Beatmap>, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn save(&self, _beatmap: &Beatmap) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
}

/// Memory pp cache counting the calls made through the trait.
pub struct CountingPpCache {
    pub inner: MemoryPpCache,
    pub gets: AtomicUsize,
    pub puts: AtomicUsize,
    pub fail: AtomicBool,
}

impl Default for CountingPpCache {
    fn default() -> Self {
        CountingPpCache {
            inner: MemoryPpCache::new(&CacheConfig::default()),
            gets: AtomicUsize::new(0),
            puts: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl PpCache for CountingPpCache {
    async fn get(&self, checksum: &str) -> Result<Option<PpVector>, StoreError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("cache down".into()));
        }
        self.inner.get(checksum).await
    }

    async fn put(&self, checksum: &str, pp: PpVector) -> Result<(), StoreError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("cache down".into()));
        }
        self.inner.put(checksum, pp).await
    }
}

enum Behavior {
    Succeed { canonical_pp: Vec<f64> },
    Fail,
    Sleep(Duration),
}

pub struct MockCalculator {
    behavior: Behavior,
    pub calls: AtomicUsize,
    pub last_args: Mutex<Option<(u32, Option<f64>)>>,
}

impl MockCalculator {
    pub const STARS: f64 = 5.25;
    pub const CANONICAL_PP: [f64; 4] = [300.5, 280.25, 260.0, 220.75];

    pub fn pp_at(accuracy: f64) -> f64 {
        accuracy * 3.0
    }

    fn new(behavior: Behavior) -> Self {
        MockCalculator {
            behavior,
            calls: AtomicUsize::new(0),
            last_args: Mutex::new(None),
        }
    }

    pub fn with_canonical_pp(pp: Vec<f64>) -> Self {
        Self::new(Behavior::Succeed { canonical_pp: pp })
    }

    pub fn failing() -> Self {
        Self::new(Behavior::Fail)
    }

    pub fn slow(delay: Duration) -> Self {
        Self::new(Behavior::Sleep(delay))
    }
}

impl Default for MockCalculator {
    fn default() -> Self {
        Self::with_canonical_pp(Self::CANONICAL_PP.to_vec())
    }
}

#[async_trait]
impl PpComputer for MockCalculator {
    async fn calculate(
        &self,
        _beatmap: &Beatmap,
        mods: u32,
        accuracy: Option<f64>,
    ) -> Result<Calculation, CalcError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_args.lock().unwrap() = Some((mods, accuracy));

        let canonical_pp = match &self.behavior {
            Behavior::Succeed { canonical_pp } => canonical_pp.clone(),
            Behavior::Fail => return Err(CalcError::Parse("invalid hit object".into())),
            Behavior::Sleep(delay) => {
                tokio::time::sleep(*delay).await;
                Self::CANONICAL_PP.to_vec()
            }
        };

        let pp = match accuracy {
            Some(acc) => vec![Self::pp_at(acc)],
            None => canonical_pp,
        };
        Ok(Calculation {
            stars: Self::STARS,
            pp,
        })
    }
}

/// Pipeline wired to in-memory collaborators.
pub struct TestPipeline {
    pub pipeline: Pipeline,
    pub source: Arc<MockSource>,
    pub store: Arc<MemoryBeatmapStore>,
    pub cache: Arc<CountingPpCache>,
    pub calculator: Arc<MockCalculator>,
}

impl TestPipeline {
    pub const CALCULATION_TIMEOUT: Duration = Duration::from_millis(200);

    pub fn new(source: MockSource) -> Self {
        Self::with_calculator(source, MockCalculator::default())
    }

    pub fn with_calculator(source: MockSource, calculator: MockCalculator) -> Self {
        let source = Arc::new(source);
        let store = Arc::new(MemoryBeatmapStore::new(&CacheConfig::default()));
        let cache = Arc::new(CountingPpCache::default());
        let calculator = Arc::new(calculator);

        let pipeline = Pipeline::new(
            BeatmapResolver::new(source.clone(), store.clone()),
            store.clone(),
            cache.clone(),
            calculator.clone(),
            Self::CALCULATION_TIMEOUT,
        );

        TestPipeline {
            pipeline,
            source,
            store,
            cache,
            calculator,
        }
    }

    pub fn resolver(&self) -> BeatmapResolver {
        BeatmapResolver::new(self.source.clone(), self.store.clone())
    }
}
