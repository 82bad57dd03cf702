//! Configuration management for agent-callisto.
//!
//! Loads config from YAML files in standard locations. Every section is
//! optional and any read or parse failure falls back to defaults.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::pipeline::buffer::DEFAULT_BUFFER_SIZE;
use crate::pipeline::Category;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioProvider {
    #[default]
    Chime,
    #[serde(alias = "eleven_labs")]
    Elevenlabs,
    LocalTts,
    PreRecorded,
    None,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SoundsConfig {
    pub dir: Option<PathBuf>,
    pub typing_sounds: bool,
    pub session_sounds: bool,
    pub typing_interval_ms: u64,
}

impl Default for SoundsConfig {
    fn default() -> Self {
        Self {
            dir: None,
            typing_sounds: false,
            session_sounds: false,
            typing_interval_ms: 40,
        }
    }
}

impl SoundsConfig {
    pub fn resolved_dir(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(|| config_dir().join("sounds"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ElevenLabsConfig {
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub voice_id: String,
    pub voice_name: String,
    pub model_id: String,
    pub stability: f32,
    pub similarity_boost: f32,
}

impl Default for ElevenLabsConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            voice_id: "21m00Tcm4TlvDq8ikWAM".into(),
            voice_name: "Rachel".into(),
            model_id: "eleven_multilingual_v2".into(),
            stability: 0.5,
            similarity_boost: 0.75,
        }
    }
}

impl ElevenLabsConfig {
    /// Configured key, else `ELEVENLABS_API_KEY`. Blank values count as unset.
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var("ELEVENLABS_API_KEY").ok())
            .filter(|key| !key.trim().is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeechEngine {
    #[default]
    Auto,
    Say,
    SpdSay,
    Espeak,
    #[serde(alias = "sapi")]
    Powershell,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalTtsConfig {
    pub engine: SpeechEngine,
    pub voice: Option<String>,
    /// Words per minute.
    pub rate: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PreRecordedConfig {
    pub samples_dir: Option<PathBuf>,
}

impl PreRecordedConfig {
    pub fn resolved_dir(&self) -> PathBuf {
        self.samples_dir
            .clone()
            .unwrap_or_else(|| config_dir().join("samples"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HapticConfig {
    pub enabled: bool,
    pub device: String,
    pub command: Option<String>,
    pub args: Vec<String>,
    pub intensity: f32,
}

impl Default for HapticConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            device: "default".into(),
            command: None,
            args: vec![],
            intensity: 0.8,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DesktopConfig {
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub enabled: bool,
    pub dir: Option<PathBuf>,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub enabled: bool,
    pub notifications_enabled: bool,
    pub cooldown_ms: u64,
    pub buffer_size: usize,
    pub category_patterns: HashMap<Category, Vec<String>>,
    pub volume: f32,
    pub audio_provider: AudioProvider,
    pub fallback_to_chime: bool,
    pub request_timeout_secs: u64,
    pub sounds: SoundsConfig,
    pub elevenlabs: ElevenLabsConfig,
    pub local_tts: LocalTtsConfig,
    pub pre_recorded_samples: PreRecordedConfig,
    pub haptic: HapticConfig,
    pub desktop: DesktopConfig,
    pub history: HistoryConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enabled: true,
            notifications_enabled: true,
            cooldown_ms: 3000,
            buffer_size: DEFAULT_BUFFER_SIZE,
            category_patterns: HashMap::new(),
            volume: 0.2,
            audio_provider: AudioProvider::default(),
            fallback_to_chime: true,
            request_timeout_secs: 10,
            sounds: SoundsConfig::default(),
            elevenlabs: ElevenLabsConfig::default(),
            local_tts: LocalTtsConfig::default(),
            pre_recorded_samples: PreRecordedConfig::default(),
            haptic: HapticConfig::default(),
            desktop: DesktopConfig::default(),
            history: HistoryConfig::default(),
        }
    }
}

/// `~/.config/agent-callisto`
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config/agent-callisto")
}

impl Config {
    /// Load configuration from YAML file.
    ///
    /// Searches standard locations if no path is provided:
    /// 1. ./callisto.yaml
    /// 2. ~/.config/agent-callisto/config.yaml
    /// 3. /etc/agent-callisto/config.yaml
    pub fn load(path: Option<&Path>) -> Self {
        let resolved = path.map(PathBuf::from).or_else(|| {
            let candidates = [
                std::env::current_dir().ok().map(|d| d.join("callisto.yaml")),
                Some(config_dir().join("config.yaml")),
                Some(PathBuf::from("/etc/agent-callisto/config.yaml")),
            ];
            candidates.into_iter().flatten().find(|p| p.exists())
        });

        let Some(config_path) = resolved else {
            info!("No config file found, using defaults");
            return Self::default();
        };

        match std::fs::read_to_string(&config_path) {
            Ok(contents) => match Self::parse(&contents) {
                Ok(config) => {
                    info!("Loaded config from {}", config_path.display());
                    config
                }
                Err(e) => {
                    warn!("Failed to parse {}: {e}, using defaults", config_path.display());
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read {}: {e}, using defaults", config_path.display());
                Self::default()
            }
        }
    }

    pub fn parse(contents: &str) -> Result<Self, serde_yml::Error> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yml::from_str(contents)
    }

    /// Whether streamed output should be classified at all.
    pub fn notifications_active(&self) -> bool {
        self.enabled && self.notifications_enabled
    }

    pub fn effective_buffer_size(&self) -> usize {
        if self.buffer_size == 0 {
            warn!("buffer_size 0 is not usable, using {DEFAULT_BUFFER_SIZE}");
            DEFAULT_BUFFER_SIZE
        } else {
            self.buffer_size
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn effective_volume(&self) -> f32 {
        self.volume.clamp(0.0, 1.0)
    }
}
