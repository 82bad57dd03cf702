//! Sound bank: grouped sample files with non-repeating random selection.
//!
//! Layout of the sounds directory (missing files are skipped):
//! - key clicks: `ui_hacking_charsingle_0{1..6}.wav`
//! - cursor movement: `ui_hacking_charscroll.wav`, `ui_hacking_charscroll_lp.wav`
//! - newline: `ui_hacking_charenter_0{1..3}.wav`
//! - session open/close: `poweron.mp3`, `poweroff.mp3`

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use rand::Rng;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundGroup {
    Single,
    Arrow,
    Enter,
    Open,
    Close,
    Notification,
}

impl SoundGroup {
    pub const ALL: [SoundGroup; 6] = [
        Self::Single,
        Self::Arrow,
        Self::Enter,
        Self::Open,
        Self::Close,
        Self::Notification,
    ];

    fn file_names(self) -> &'static [&'static str] {
        match self {
            Self::Single => &[
                "ui_hacking_charsingle_01.wav",
                "ui_hacking_charsingle_02.wav",
                "ui_hacking_charsingle_03.wav",
                "ui_hacking_charsingle_04.wav",
                "ui_hacking_charsingle_05.wav",
                "ui_hacking_charsingle_06.wav",
            ],
            Self::Arrow => &["ui_hacking_charscroll.wav", "ui_hacking_charscroll_lp.wav"],
            Self::Enter => &[
                "ui_hacking_charenter_01.wav",
                "ui_hacking_charenter_02.wav",
                "ui_hacking_charenter_03.wav",
            ],
            Self::Open => &["poweron.mp3"],
            Self::Close => &["poweroff.mp3"],
            Self::Notification => &[
                "ui_hacking_charenter_01.wav",
                "ui_hacking_charenter_02.wav",
                "ui_hacking_charenter_03.wav",
                "poweron.mp3",
            ],
        }
    }

    /// Click group for a chunk of output.
    pub fn for_chunk(text: &str) -> Self {
        if text.contains(['\n', '\r']) {
            Self::Enter
        } else if ["\x1b[A", "\x1b[B", "\x1b[C", "\x1b[D"]
            .iter()
            .any(|seq| text.contains(seq))
        {
            Self::Arrow
        } else {
            Self::Single
        }
    }
}

const NOTHING_PICKED: usize = usize::MAX;

/// Random choice that never repeats the previous pick back to back.
#[derive(Debug)]
pub struct SoundSelector<T> {
    items: Vec<T>,
    last: AtomicUsize,
}

impl<T> SoundSelector<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items,
            last: AtomicUsize::new(NOTHING_PICKED),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn pick(&self) -> Option<&T> {
        if self.items.is_empty() {
            return None;
        }
        let roll = rand::rng().random_range(0..self.items.len());
        self.pick_with(roll)
    }

    fn pick_with(&self, roll: usize) -> Option<&T> {
        let len = self.items.len();
        if len == 0 {
            return None;
        }
        let mut idx = roll % len;
        if len > 1 && self.last.load(Ordering::Relaxed) == idx {
            idx = (idx + 1) % len;
        }
        self.last.store(idx, Ordering::Relaxed);
        self.items.get(idx)
    }
}

#[derive(Debug, Default)]
pub struct SoundBank {
    groups: HashMap<SoundGroup, SoundSelector<PathBuf>>,
}

impl SoundBank {
    /// Index the sample files present in `dir`.
    pub fn load(dir: &Path) -> Self {
        let groups: HashMap<_, _> = SoundGroup::ALL
            .iter()
            .map(|&group| {
                let files: Vec<PathBuf> = group
                    .file_names()
                    .iter()
                    .map(|name| dir.join(name))
                    .filter(|path| {
                        let exists = path.is_file();
                        if !exists {
                            debug!("Sound file missing: {}", path.display());
                        }
                        exists
                    })
                    .collect();
                (group, SoundSelector::new(files))
            })
            .collect();

        let total: usize = groups.values().map(SoundSelector::len).sum();
        info!("Sound bank: {total} samples from {}", dir.display());
        Self { groups }
    }

    pub fn pick(&self, group: SoundGroup) -> Option<PathBuf> {
        self.groups.get(&group).and_then(SoundSelector::pick).cloned()
    }

    pub fn count(&self, group: SoundGroup) -> usize {
        self.groups.get(&group).map_or(0, SoundSelector::len)
    }

    pub fn is_empty(&self) -> bool {
        self.groups.values().all(SoundSelector::is_empty)
    }
}
