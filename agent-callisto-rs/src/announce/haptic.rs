//! Haptic pulses through a user-supplied device command.
//!
//! The command runs once per pulse with `{device}`, `{duration_ms}` and
//! `{intensity}` substituted in its arguments.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::local_tts::run_bounded;
use super::Announcer;
use crate::config::HapticConfig;
use crate::error::{AnnounceError, Result};
use crate::pipeline::Category;

const PULSE_GAP: Duration = Duration::from_millis(120);

/// Pulse durations in milliseconds.
pub fn pulse_pattern(category: Category) -> &'static [u64] {
    match category {
        Category::Critical => &[400, 400, 400],
        Category::Completion => &[150],
        Category::Approval => &[150, 150],
    }
}

pub struct HapticAnnouncer {
    config: HapticConfig,
    timeout: Duration,
}

impl HapticAnnouncer {
    pub fn new(config: HapticConfig, timeout: Duration) -> Self {
        Self { config, timeout }
    }

    fn pulse_args(&self, duration_ms: u64) -> Vec<String> {
        let intensity = format!("{:.2}", self.config.intensity.clamp(0.0, 1.0));
        self.config
            .args
            .iter()
            .map(|arg| {
                arg.replace("{device}", &self.config.device)
                    .replace("{duration_ms}", &duration_ms.to_string())
                    .replace("{intensity}", &intensity)
            })
            .collect()
    }
}

#[async_trait]
impl Announcer for HapticAnnouncer {
    fn name(&self) -> &str {
        "haptic"
    }

    async fn notify(&self, _summary: &str, category: Category) -> Result<()> {
        let program = self
            .config
            .command
            .as_deref()
            .ok_or_else(|| AnnounceError::command("haptic", "no haptic command configured"))?;

        let pattern = pulse_pattern(category);
        debug!("Haptic {category}: {} pulses on {}", pattern.len(), self.config.device);

        for (i, &duration_ms) in pattern.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(PULSE_GAP).await;
            }
            run_bounded(program, &self.pulse_args(duration_ms), self.timeout).await?;
        }
        Ok(())
    }
}
