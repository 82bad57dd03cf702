//! ElevenLabs text-to-speech.
//!
//! POSTs the summary to the ElevenLabs API and plays the returned MP3.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, warn};

use super::Announcer;
use crate::config::ElevenLabsConfig;
use crate::error::{AnnounceError, Result};
use crate::pipeline::Category;
use crate::playback::Player;

const API_BASE: &str = "https://api.elevenlabs.io/v1";

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
}

#[derive(Debug, Serialize)]
struct VoiceSettings {
    stability: f32,
    similarity_boost: f32,
}

pub struct ElevenLabsAnnouncer {
    client: Client,
    config: ElevenLabsConfig,
    player: Player,
}

impl ElevenLabsAnnouncer {
    /// Fails only if the HTTP client cannot be built with `timeout`.
    pub fn new(config: ElevenLabsConfig, player: Player, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(3).min(timeout))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            config,
            player,
        })
    }

    fn speech_url(&self) -> String {
        format!("{API_BASE}/text-to-speech/{}", self.config.voice_id)
    }

    fn request_body<'a>(&'a self, text: &'a str) -> SpeechRequest<'a> {
        SpeechRequest {
            text,
            model_id: &self.config.model_id,
            voice_settings: VoiceSettings {
                stability: self.config.stability,
                similarity_boost: self.config.similarity_boost,
            },
        }
    }

    /// Fetch synthesized speech as MP3 bytes.
    pub async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        let api_key = self
            .config
            .resolved_api_key()
            .ok_or(AnnounceError::ApiKeyMissing)?;

        debug!(
            "ElevenLabs request ({}, {} chars)",
            self.config.voice_name,
            text.len()
        );

        let resp = self
            .client
            .post(self.speech_url())
            .header("xi-api-key", api_key)
            .header("Accept", "audio/mpeg")
            .json(&self.request_body(text))
            .send()
            .await?;

        if let Some(remaining) = resp
            .headers()
            .get("x-ratelimit-remaining")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<i32>().ok())
        {
            if remaining < 10 {
                warn!("ElevenLabs rate limit low: {remaining}");
            }
        }

        let bytes = resp.error_for_status()?.bytes().await?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl Announcer for ElevenLabsAnnouncer {
    fn name(&self) -> &str {
        "elevenlabs"
    }

    async fn notify(&self, summary: &str, _category: Category) -> Result<()> {
        let audio = self.synthesize(summary).await?;
        self.player.play_bytes(audio).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn announcer(api_key: Option<&str>) -> ElevenLabsAnnouncer {
        let config = ElevenLabsConfig {
            api_key: api_key.map(String::from),
            voice_id: "voice-123".into(),
            ..ElevenLabsConfig::default()
        };
        ElevenLabsAnnouncer::new(
            config,
            Player::new(0.2, Duration::from_secs(1)),
            Duration::from_secs(10),
        )
        .unwrap()
    }

    #[test]
    fn url_includes_voice_id() {
        assert_eq!(
            announcer(Some("k")).speech_url(),
            "https://api.elevenlabs.io/v1/text-to-speech/voice-123"
        );
    }

    #[test]
    fn request_body_shape() {
        let a = announcer(Some("k"));
        let json = serde_json::to_value(a.request_body("Build succeeded")).unwrap();
        assert_eq!(json["text"], "Build succeeded");
        assert_eq!(json["model_id"], "eleven_multilingual_v2");
        assert_eq!(json["voice_settings"]["stability"], 0.5);
    }

    #[tokio::test]
    async fn blank_key_is_missing_key() {
        let a = announcer(Some("   "));
        if std::env::var("ELEVENLABS_API_KEY").is_ok() {
            return;
        }
        let err = a.synthesize("hello").await.unwrap_err();
        assert!(matches!(err, AnnounceError::ApiKeyMissing));
    }
}
