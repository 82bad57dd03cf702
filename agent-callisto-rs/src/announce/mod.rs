//! Announcers: the side effects behind a fired notification.
//!
//! Components:
//! - `elevenlabs`: ElevenLabs text-to-speech over HTTP, played with rodio
//! - `local_tts`: OS speech utilities (`say`, `spd-say`, `espeak`, SAPI)
//! - `samples`: notification chime and pre-recorded per-category samples
//! - `haptic`: pulse patterns through a configured device command
//! - `desktop`: desktop notifications via notify-rust
//!
//! Every announcement runs in its own task; failures are logged and
//! recorded, never returned to the stream being watched.

pub mod desktop;
pub mod elevenlabs;
pub mod haptic;
pub mod local_tts;
pub mod samples;

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use futures::future::join_all;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::{AudioProvider, Config};
use crate::error::Result;
use crate::history::{History, NotificationRecord};
use crate::pipeline::{Announcement, Category};
use crate::playback::Player;
use crate::sounds::SoundBank;

#[async_trait]
pub trait Announcer: Send + Sync {
    fn name(&self) -> &str;

    async fn notify(&self, summary: &str, category: Category) -> Result<()>;
}

/// Provider for `audio_provider: none`.
pub struct SilentAnnouncer;

#[async_trait]
impl Announcer for SilentAnnouncer {
    fn name(&self) -> &str {
        "none"
    }

    async fn notify(&self, summary: &str, category: Category) -> Result<()> {
        info!("[{category}] {summary}");
        Ok(())
    }
}

/// A primary provider, an optional fallback for it, and side channels that
/// run alongside.
pub struct CompositeAnnouncer {
    primary: Arc<dyn Announcer>,
    fallback: Option<Arc<dyn Announcer>>,
    channels: Vec<Arc<dyn Announcer>>,
}

impl CompositeAnnouncer {
    pub fn new(primary: Arc<dyn Announcer>) -> Self {
        Self {
            primary,
            fallback: None,
            channels: Vec::new(),
        }
    }

    pub fn with_fallback(mut self, fallback: Arc<dyn Announcer>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn with_channel(mut self, channel: Arc<dyn Announcer>) -> Self {
        self.channels.push(channel);
        self
    }

    async fn notify_primary(&self, summary: &str, category: Category) -> Result<()> {
        match self.primary.notify(summary, category).await {
            Ok(()) => Ok(()),
            Err(e) => match &self.fallback {
                Some(fallback) => {
                    warn!(
                        "{} failed: {e}, falling back to {}",
                        self.primary.name(),
                        fallback.name()
                    );
                    fallback.notify(summary, category).await
                }
                None => Err(e),
            },
        }
    }
}

#[async_trait]
impl Announcer for CompositeAnnouncer {
    fn name(&self) -> &str {
        self.primary.name()
    }

    /// Channel failures are logged here; only the primary result is returned.
    async fn notify(&self, summary: &str, category: Category) -> Result<()> {
        let channels = join_all(self.channels.iter().map(|channel| async move {
            (channel.name(), channel.notify(summary, category).await)
        }));

        let (result, channel_results) =
            tokio::join!(self.notify_primary(summary, category), channels);

        for (name, channel_result) in channel_results {
            if let Err(e) = channel_result {
                warn!("{name} channel failed: {e}");
            }
        }

        result
    }
}

/// Assemble the configured provider and channels.
pub fn build_announcer(config: &Config, bank: Arc<SoundBank>) -> Arc<dyn Announcer> {
    let player = Player::new(config.effective_volume(), config.request_timeout());
    let chime: Arc<dyn Announcer> = Arc::new(samples::ChimeAnnouncer::new(bank, player.clone()));

    let primary: Arc<dyn Announcer> = match config.audio_provider {
        AudioProvider::Chime => chime.clone(),
        AudioProvider::Elevenlabs => match elevenlabs::ElevenLabsAnnouncer::new(
            config.elevenlabs.clone(),
            player.clone(),
            config.request_timeout(),
        ) {
            Ok(announcer) => Arc::new(announcer),
            Err(e) => {
                warn!("ElevenLabs unavailable ({e}), using chime");
                chime.clone()
            }
        },
        AudioProvider::LocalTts => Arc::new(local_tts::LocalTtsAnnouncer::new(
            &config.local_tts,
            config.request_timeout(),
        )),
        AudioProvider::PreRecorded => Arc::new(samples::PreRecordedAnnouncer::new(
            &config.pre_recorded_samples.resolved_dir(),
            player.clone(),
        )),
        AudioProvider::None => Arc::new(SilentAnnouncer),
    };

    let mut composite = CompositeAnnouncer::new(primary);
    let speaks = !matches!(
        config.audio_provider,
        AudioProvider::Chime | AudioProvider::None
    );
    if speaks && config.fallback_to_chime {
        composite = composite.with_fallback(chime);
    }
    if config.haptic.enabled {
        composite = composite.with_channel(Arc::new(haptic::HapticAnnouncer::new(
            config.haptic.clone(),
            config.request_timeout(),
        )));
    }
    if config.desktop.enabled {
        composite = composite.with_channel(Arc::new(desktop::DesktopAnnouncer::new()));
    }

    info!(
        "Announcer: {} (fallback: {}, haptic: {}, desktop: {})",
        composite.name(),
        composite.fallback.is_some(),
        config.haptic.enabled,
        config.desktop.enabled
    );
    Arc::new(composite)
}

/// Announce immediately, outside any stream and its cooldown.
///
/// Returns `None` when announcements are switched off in `config`.
pub fn announce_now(
    config: &Config,
    bank: Arc<SoundBank>,
    announcement: Announcement,
) -> Option<JoinHandle<()>> {
    if !config.notifications_active() {
        info!("Notifications disabled, not announcing \"{}\"", announcement.summary);
        return None;
    }
    let history = History::from_config(&config.history).map(Arc::new);
    Some(dispatch(build_announcer(config, bank), announcement, history))
}

/// Run an announcement in the background.
///
/// The returned handle only matters to callers that must not exit before
/// the side effect completes; the stream loop never awaits it.
pub fn dispatch(
    announcer: Arc<dyn Announcer>,
    announcement: Announcement,
    history: Option<Arc<History>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let t0 = Instant::now();
        let result = announcer
            .notify(&announcement.summary, announcement.category)
            .await;
        let latency_ms = u64::try_from(t0.elapsed().as_millis()).unwrap_or(u64::MAX);

        match &result {
            Ok(()) => info!(
                "Announced [{}] \"{}\" via {} ({latency_ms}ms)",
                announcement.category,
                announcement.summary,
                announcer.name()
            ),
            Err(e) => warn!(
                "Announcement [{}] via {} failed: {e}",
                announcement.category,
                announcer.name()
            ),
        }

        if let Some(history) = history {
            history.append(&NotificationRecord::new(
                &announcement,
                announcer.name(),
                result.as_ref().err(),
                latency_ms,
            ));
        }
    })
}
