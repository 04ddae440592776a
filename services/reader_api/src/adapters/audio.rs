//! services/reader_api/src/adapters/audio.rs
//!
//! The audio collaborator backed by the local filesystem. Recitations are copied
//! from a source directory into a cache directory (reporting progress as they
//! go) and playback state is tracked for the owning controller.

use async_trait::async_trait;
use quran_reader_core::ports::{AudioService, PortError, PortResult, ProgressCallback};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::Mutex;
use tracing::{debug, info};

const CHUNK_SIZE: usize = 64 * 1024;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub enum Playback {
    #[default]
    Idle,
    Playing(String),
    Paused(String),
    Released,
}

pub struct LocalAudioAdapter {
    source_dir: PathBuf,
    cache_dir: PathBuf,
    playback: Mutex<Playback>,
}

impl LocalAudioAdapter {
    pub fn new(source_dir: impl Into<PathBuf>, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            cache_dir: cache_dir.into(),
            playback: Mutex::new(Playback::Idle),
        }
    }

    /// File name of one verse's recitation, e.g. `002255.mp3`.
    pub fn file_name(surah: u16, verse: u16) -> String {
        format!("{:03}{:03}.mp3", surah, verse)
    }

    pub async fn playback(&self) -> Playback {
        self.playback.lock().await.clone()
    }

    async fn copy_with_progress(
        source: &Path,
        target: &Path,
        on_progress: ProgressCallback<'_>,
    ) -> std::io::Result<()> {
        let mut input = tokio::fs::File::open(source).await?;
        let total = input.metadata().await?.len();
        let partial = target.with_extension("part");
        let mut output = tokio::fs::File::create(&partial).await?;

        let mut buffer = vec![0u8; CHUNK_SIZE];
        let mut copied: u64 = 0;
        on_progress(0.0);
        loop {
            let read = input.read(&mut buffer).await?;
            if read == 0 {
                break;
            }
            output.write_all(&buffer[..read]).await?;
            copied += read as u64;
            if total > 0 {
                on_progress(copied as f32 / total as f32 * 100.0);
            }
        }
        output.flush().await?;
        tokio::fs::rename(&partial, target).await?;
        on_progress(100.0);
        Ok(())
    }
}

fn io_error(e: std::io::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

#[async_trait]
impl AudioService for LocalAudioAdapter {
    async fn download(
        &self,
        surah: u16,
        verse: u16,
        on_progress: ProgressCallback<'_>,
    ) -> PortResult<String> {
        let name = Self::file_name(surah, verse);
        let target = self.cache_dir.join(&name);
        let path = target.to_string_lossy().into_owned();

        if tokio::fs::try_exists(&target).await.map_err(io_error)? {
            debug!("Recitation {} already cached", name);
            on_progress(100.0);
            return Ok(path);
        }

        let source = self.source_dir.join(&name);
        if !tokio::fs::try_exists(&source).await.map_err(io_error)? {
            return Err(PortError::NotFound(format!(
                "No recitation available for {}:{}",
                surah, verse
            )));
        }
        tokio::fs::create_dir_all(&self.cache_dir)
            .await
            .map_err(io_error)?;
        Self::copy_with_progress(&source, &target, on_progress)
            .await
            .map_err(io_error)?;
        info!("Downloaded recitation {} to {}", name, path);
        Ok(path)
    }

    async fn play(&self, path: &str) -> PortResult<()> {
        let mut playback = self.playback.lock().await;
        if *playback == Playback::Released {
            return Err(PortError::Unexpected("The audio player was released".to_string()));
        }
        if !tokio::fs::try_exists(path).await.map_err(io_error)? {
            return Err(PortError::NotFound(format!("Audio file {} not found", path)));
        }
        *playback = Playback::Playing(path.to_string());
        Ok(())
    }

    async fn pause(&self) -> PortResult<()> {
        let mut playback = self.playback.lock().await;
        match playback.clone() {
            Playback::Playing(path) => {
                *playback = Playback::Paused(path);
                Ok(())
            }
            Playback::Released => Err(PortError::Unexpected("The audio player was released".to_string())),
            _ => Ok(()),
        }
    }

    async fn stop(&self) -> PortResult<()> {
        let mut playback = self.playback.lock().await;
        if *playback != Playback::Released {
            *playback = Playback::Idle;
        }
        Ok(())
    }

    async fn release(&self) {
        *self.playback.lock().await = Playback::Released;
        debug!("Audio player released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex as StdMutex;

    #[tokio::test]
    async fn download_copies_and_reports_progress() {
        let source = tempfile::tempdir().unwrap();
        let cache = tempfile::tempdir().unwrap();
        let name = LocalAudioAdapter::file_name(2, 255);
        assert_eq!(name, "002255.mp3");
        std::fs::write(source.path().join(&name), vec![7u8; CHUNK_SIZE * 3 + 10]).unwrap();

        let adapter = LocalAudioAdapter::new(source.path(), cache.path().join("nested"));
        let seen = StdMutex::new(Vec::new());
        let record = |p: f32| seen.lock().unwrap().push(p);
        let path = adapter.download(2, 255, &record).await.unwrap();

        assert!(path.ends_with("002255.mp3"));
        assert_eq!(std::fs::read(&path).unwrap().len(), CHUNK_SIZE * 3 + 10);
        let seen = seen.into_inner().unwrap();
        assert_eq!(seen.first().copied(), Some(0.0));
        assert_eq!(seen.last().copied(), Some(100.0));
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
    }

    #[tokio::test]
    async fn missing_recitation_is_not_found() {
        let source = tempfile::tempdir().unwrap();
        let cache = tempfile::tempdir().unwrap();
        let adapter = LocalAudioAdapter::new(source.path(), cache.path());
        let result = adapter.download(1, 1, &|_: f32| {}).await;
        assert!(matches!(result, Err(PortError::NotFound(_))));
    }

    #[tokio::test]
    async fn playback_follows_commands_until_released() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("001001.mp3");
        std::fs::write(&file, b"id3").unwrap();
        let path = file.to_string_lossy().into_owned();
        let adapter = LocalAudioAdapter::new(dir.path(), dir.path());

        adapter.play(&path).await.unwrap();
        assert_eq!(adapter.playback().await, Playback::Playing(path.clone()));
        adapter.pause().await.unwrap();
        assert_eq!(adapter.playback().await, Playback::Paused(path.clone()));
        adapter.stop().await.unwrap();
        assert_eq!(adapter.playback().await, Playback::Idle);

        adapter.release().await;
        assert!(adapter.play(&path).await.is_err());
        assert!(adapter.play("/does/not/exist.mp3").await.is_err());
    }
}
