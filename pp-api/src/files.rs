use crate::beatmap::Beatmap;
use crate::osu_api::{BeatmapSource, UpstreamError};
use bytes::Bytes;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;

/// Provides `.osu` files, keeping downloaded ones in an optional directory.
///
/// A stored file is only used while its MD5 matches the beatmap checksum, so
/// updated difficulties are downloaded again.
#[derive(Clone)]
pub struct BeatmapFiles {
    source: Arc<dyn BeatmapSource>,
    dir: Option<PathBuf>,
}

impl BeatmapFiles {
    pub fn new(source: Arc<dyn BeatmapSource>, dir: Option<PathBuf>) -> Self {
        BeatmapFiles { source, dir }
    }

    pub async fn get(&self, beatmap: &Beatmap) -> Result<Bytes, UpstreamError> {
        let Some(dir) = &self.dir else {
            return self.source.osu_file_by_id(beatmap.beatmap_id).await;
        };
        let path = dir.join(format!("{}.osu", beatmap.beatmap_id));

        match tokio::fs::read(&path).await {
            Ok(content) if checksum(&content) == beatmap.checksum => {
                tracing::debug!(beatmap_id = beatmap.beatmap_id, "using stored .osu file");
                return Ok(Bytes::from(content));
            }
            Ok(_) => tracing::debug!(beatmap_id = beatmap.beatmap_id, "stored .osu file is outdated"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "could not read .osu file"),
        }

        let content = self.source.osu_file_by_id(beatmap.beatmap_id).await?;

        let written = match tokio::fs::create_dir_all(dir).await {
            Ok(()) => tokio::fs::write(&path, &content).await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            tracing::warn!(path = %path.display(), error = %e, "could not store .osu file");
        }

        Ok(content)
    }
}

fn checksum(content: &[u8]) -> String {
    format!("{:x}", md5::compute(content))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutils::{MockSource, beatmap};
    use std::sync::atomic::Ordering;

    const CONTENT: &[u8] = b"osu file format v14\n";

    #[tokio::test]
    async fn test_without_directory() {
        let source = Arc::new(MockSource::default().with_file(75, CONTENT));
        let files = BeatmapFiles::new(source.clone(), None);

        let mut map = beatmap(180);
        map.beatmap_id = 75;
        assert_eq!(&files.get(&map).await.unwrap()[..], CONTENT);
        assert_eq!(&files.get(&map).await.unwrap()[..], CONTENT);
        assert_eq!(source.file_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_stores_and_reuses_files() {
        let dir = tempfile::tempdir().unwrap();
        let source = Arc::new(MockSource::default().with_file(75, CONTENT));
        let files = BeatmapFiles::new(source.clone(), Some(dir.path().join("beatmaps")));

        let mut map = beatmap(180);
        map.beatmap_id = 75;
        map.checksum = checksum(CONTENT);

        assert_eq!(&files.get(&map).await.unwrap()[..], CONTENT);
        assert!(dir.path().join("beatmaps/75.osu").exists());

        assert_eq!(&files.get(&map).await.unwrap()[..], CONTENT);
        assert_eq!(source.file_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_outdated_file_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("75.osu"), b"old content").unwrap();

        let source = Arc::new(MockSource::default().with_file(75, CONTENT));
        let files = BeatmapFiles::new(source.clone(), Some(dir.path().to_path_buf()));

        let mut map = beatmap(180);
        map.beatmap_id = 75;
        map.checksum = checksum(CONTENT);

        assert_eq!(&files.get(&map).await.unwrap()[..], CONTENT);
        assert_eq!(source.file_calls.load(Ordering::SeqCst), 1);
        assert_eq!(std::fs::read(dir.path().join("75.osu")).unwrap(), CONTENT);
    }

    #[tokio::test]
    async fn test_upstream_failure() {
        let dir = tempfile::tempdir().unwrap();
        let files = BeatmapFiles::new(
            Arc::new(MockSource::default()),
            Some(dir.path().to_path_buf()),
        );
        assert!(files.get(&beatmap(180)).await.is_err());
        assert!(!dir.path().join("1.osu").exists());
    }
}
