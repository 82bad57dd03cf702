//! Typing clicks and session open/close sounds.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tracing::debug;

use crate::config::Config;
use crate::playback::Player;
use crate::sounds::{SoundBank, SoundGroup};

pub struct Feedback {
    bank: Arc<SoundBank>,
    player: Player,
    typing: bool,
    session: bool,
    interval: Duration,
    last_click: Option<Instant>,
}

impl Feedback {
    pub fn new(config: &Config, bank: Arc<SoundBank>) -> Self {
        Self {
            bank,
            player: Player::new(config.effective_volume(), config.request_timeout()),
            typing: config.enabled && config.sounds.typing_sounds,
            session: config.enabled && config.sounds.session_sounds,
            interval: Duration::from_millis(config.sounds.typing_interval_ms),
            last_click: None,
        }
    }

    /// No sounds at all.
    pub fn disabled() -> Self {
        Self {
            bank: Arc::new(SoundBank::default()),
            player: Player::new(0.0, Duration::from_secs(1)),
            typing: false,
            session: false,
            interval: Duration::ZERO,
            last_click: None,
        }
    }

    /// Click group for a chunk, or `None` when clicks are off or rate-limited.
    pub fn click_for(&mut self, text: &str, now: Instant) -> Option<SoundGroup> {
        if !self.typing || text.is_empty() {
            return None;
        }
        if let Some(last) = self.last_click {
            if now.saturating_duration_since(last) < self.interval {
                return None;
            }
        }
        self.last_click = Some(now);
        Some(SoundGroup::for_chunk(text))
    }

    pub fn on_chunk(&mut self, text: &str, now: Instant) -> Option<JoinHandle<()>> {
        let group = self.click_for(text, now)?;
        self.play(group)
    }

    pub fn session_open(&self) -> Option<JoinHandle<()>> {
        self.session.then(|| self.play(SoundGroup::Open)).flatten()
    }

    pub fn session_close(&self) -> Option<JoinHandle<()>> {
        self.session.then(|| self.play(SoundGroup::Close)).flatten()
    }

    fn play(&self, group: SoundGroup) -> Option<JoinHandle<()>> {
        let path = self.bank.pick(group)?;
        let player = self.player.clone();
        Some(tokio::spawn(async move {
            if let Err(e) = player.play_file(&path).await {
                debug!("Feedback sound {} failed: {e}", path.display());
            }
        }))
    }
}
