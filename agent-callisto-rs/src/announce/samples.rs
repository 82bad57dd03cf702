//! Sample-based announcers: the generic chime and pre-recorded phrases.
//!
//! Pre-recorded layout, checked in order:
//! 1. `<dir>/<summary_slug>.<ext>` (e.g. `build_succeeded.wav`)
//! 2. `<dir>/<category>/*.<ext>`
//! 3. `<dir>/<category>*.<ext>` (e.g. `critical_2.mp3`)

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use super::Announcer;
use crate::error::{AnnounceError, Result};
use crate::pipeline::Category;
use crate::playback::Player;
use crate::sounds::{SoundBank, SoundGroup, SoundSelector};

const AUDIO_EXTENSIONS: &[&str] = &["wav", "mp3", "ogg", "flac"];

fn is_audio(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| AUDIO_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
}

fn audio_files(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut files: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| is_audio(p))
        .collect();
    files.sort();
    files
}

/// `"Build succeeded"` → `"build_succeeded"`.
pub fn summary_slug(summary: &str) -> String {
    summary
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}

/// Plays a notification sound from the sound bank.
pub struct ChimeAnnouncer {
    bank: Arc<SoundBank>,
    player: Player,
}

impl ChimeAnnouncer {
    pub fn new(bank: Arc<SoundBank>, player: Player) -> Self {
        Self { bank, player }
    }
}

#[async_trait]
impl Announcer for ChimeAnnouncer {
    fn name(&self) -> &str {
        "chime"
    }

    async fn notify(&self, _summary: &str, _category: Category) -> Result<()> {
        let path = self
            .bank
            .pick(SoundGroup::Notification)
            .ok_or_else(|| AnnounceError::NoSample("notification chime".into()))?;
        self.player.play_file(&path).await
    }
}

/// Plays recorded phrases matched by summary or category.
pub struct PreRecordedAnnouncer {
    phrases: HashMap<String, PathBuf>,
    by_category: HashMap<Category, SoundSelector<PathBuf>>,
    player: Player,
}

impl PreRecordedAnnouncer {
    pub fn new(dir: &Path, player: Player) -> Self {
        let top_level = audio_files(dir);

        let phrases = top_level
            .iter()
            .filter_map(|path| {
                let stem = path.file_stem()?.to_str()?.to_lowercase();
                Some((stem, path.clone()))
            })
            .collect();

        let by_category = Category::ALL
            .iter()
            .map(|&category| {
                let mut files = audio_files(&dir.join(category.slug()));
                files.extend(top_level.iter().filter(|path| {
                    path.file_stem()
                        .and_then(|s| s.to_str())
                        .is_some_and(|s| s.to_lowercase().starts_with(category.slug()))
                }).cloned());
                debug!("{category}: {} recorded samples", files.len());
                (category, SoundSelector::new(files))
            })
            .collect();

        info!("Pre-recorded samples loaded from {}", dir.display());
        Self {
            phrases,
            by_category,
            player,
        }
    }

    /// Sample to play for this announcement, if any.
    pub fn sample_for(&self, summary: &str, category: Category) -> Option<PathBuf> {
        if let Some(path) = self.phrases.get(&summary_slug(summary)) {
            return Some(path.clone());
        }
        self.by_category
            .get(&category)
            .and_then(SoundSelector::pick)
            .cloned()
    }
}

#[async_trait]
impl Announcer for PreRecordedAnnouncer {
    fn name(&self) -> &str {
        "pre_recorded"
    }

    async fn notify(&self, summary: &str, category: Category) -> Result<()> {
        let path = self
            .sample_for(summary, category)
            .ok_or_else(|| AnnounceError::NoSample(category.to_string()))?;
        self.player.play_file(&path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn player() -> Player {
        Player::new(0.2, Duration::from_secs(1))
    }

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, b"").unwrap();
    }

    #[test]
    fn slugs() {
        assert_eq!(summary_slug("Build succeeded"), "build_succeeded");
        assert_eq!(summary_slug("Error: Cannot find module \"x\""), "error_cannot_find_module_x");
        assert_eq!(summary_slug("42 tests passed"), "42_tests_passed");
    }

    #[test]
    fn phrase_sample_wins_over_category() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("build_succeeded.wav"));
        touch(&dir.path().join("completion/generic.mp3"));

        let announcer = PreRecordedAnnouncer::new(dir.path(), player());
        assert_eq!(
            announcer.sample_for("Build succeeded", Category::Completion),
            Some(dir.path().join("build_succeeded.wav"))
        );
        assert_eq!(
            announcer.sample_for("Task completed", Category::Completion),
            Some(dir.path().join("completion/generic.mp3"))
        );
    }

    #[test]
    fn category_prefixed_files_are_used() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("critical_alarm.ogg"));
        touch(&dir.path().join("notes.txt"));

        let announcer = PreRecordedAnnouncer::new(dir.path(), player());
        assert_eq!(
            announcer.sample_for("Error occurred", Category::Critical),
            Some(dir.path().join("critical_alarm.ogg"))
        );
        assert_eq!(announcer.sample_for("Action needed", Category::Approval), None);
    }

    #[tokio::test]
    async fn missing_sample_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let announcer = PreRecordedAnnouncer::new(dir.path(), player());
        let err = announcer.notify("Action needed", Category::Approval).await.unwrap_err();
        assert!(matches!(err, AnnounceError::NoSample(_)));
    }

    #[tokio::test]
    async fn chime_without_sounds_is_an_error() {
        let chime = ChimeAnnouncer::new(Arc::new(SoundBank::default()), player());
        let err = chime.notify("Task completed", Category::Completion).await.unwrap_err();
        assert!(matches!(err, AnnounceError::NoSample(_)));
    }
}
