//! Sample and speech playback through rodio.
//!
//! Each playback opens the default output stream on a blocking thread,
//! plays to the end, and drops the stream. Callers bound the wait with the
//! configured timeout; a playback that overruns is abandoned, not killed.

use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::path::{Path, PathBuf};
use std::time::Duration;

use rodio::OutputStreamBuilder;
use tracing::debug;

use crate::error::{AnnounceError, Result};

#[derive(Debug, Clone)]
pub struct Player {
    volume: f32,
    timeout: Duration,
}

impl Player {
    pub fn new(volume: f32, timeout: Duration) -> Self {
        Self {
            volume: volume.clamp(0.0, 1.0),
            timeout,
        }
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Play an audio file and wait for it to finish.
    pub async fn play_file(&self, path: &Path) -> Result<()> {
        let path: PathBuf = path.to_path_buf();
        let volume = self.volume;
        debug!("Playing {}", path.display());
        self.run_blocking(move || {
            let file = File::open(&path)?;
            play_source(BufReader::new(file), volume)
        })
        .await
    }

    /// Play encoded audio bytes (MP3, WAV, ...) and wait for them to finish.
    pub async fn play_bytes(&self, data: Vec<u8>) -> Result<()> {
        let volume = self.volume;
        debug!("Playing {} bytes of audio", data.len());
        self.run_blocking(move || play_source(Cursor::new(data), volume))
            .await
    }

    async fn run_blocking<F>(&self, job: F) -> Result<()>
    where
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        let handle = tokio::task::spawn_blocking(job);
        match tokio::time::timeout(self.timeout, handle).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(AnnounceError::Playback(format!("playback task failed: {e}"))),
            Err(_) => Err(AnnounceError::Timeout(self.timeout)),
        }
    }
}

fn play_source<R>(source: R, volume: f32) -> Result<()>
where
    R: Read + Seek + Send + Sync + 'static,
{
    let stream = OutputStreamBuilder::open_default_stream()
        .map_err(|e| AnnounceError::AudioDevice(format!("Failed to open audio output: {e}")))?;

    let sink = rodio::play(stream.mixer(), source)
        .map_err(|e| AnnounceError::Playback(format!("Failed to decode audio: {e}")))?;
    sink.set_volume(volume);
    sink.sleep_until_end();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volume_is_clamped() {
        assert_eq!(Player::new(3.0, Duration::from_secs(1)).volume(), 1.0);
        assert_eq!(Player::new(-1.0, Duration::from_secs(1)).volume(), 0.0);
    }

    #[tokio::test]
    async fn missing_file_is_an_io_error() {
        let player = Player::new(0.2, Duration::from_secs(5));
        let err = player
            .play_file(Path::new("/nonexistent/agent-callisto.wav"))
            .await
            .unwrap_err();
        assert!(matches!(err, AnnounceError::Io(_)));
    }

    #[tokio::test]
    #[ignore = "Requires audio hardware"]
    async fn garbage_bytes_fail_to_decode() {
        let player = Player::new(0.2, Duration::from_secs(5));
        let err = player.play_bytes(vec![0u8; 64]).await.unwrap_err();
        assert!(matches!(err, AnnounceError::Playback(_)));
    }
}
