//! Speech through OS utilities.
//!
//! `say` on macOS, `spd-say` or `espeak` on Linux, and PowerShell's
//! System.Speech synthesizer on Windows.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use super::Announcer;
use crate::config::{LocalTtsConfig, SpeechEngine};
use crate::error::{AnnounceError, Result};
use crate::pipeline::Category;

/// Engine used for `auto` on the current platform.
pub fn platform_engine() -> SpeechEngine {
    if cfg!(target_os = "macos") {
        SpeechEngine::Say
    } else if cfg!(target_os = "windows") {
        SpeechEngine::Powershell
    } else {
        SpeechEngine::SpdSay
    }
}

/// Program and arguments that speak `text`.
pub fn speech_command(
    engine: SpeechEngine,
    text: &str,
    voice: Option<&str>,
    rate: Option<u32>,
) -> (String, Vec<String>) {
    let engine = match engine {
        SpeechEngine::Auto => platform_engine(),
        other => other,
    };

    let mut args = Vec::new();
    let program = match engine {
        SpeechEngine::Say => {
            if let Some(voice) = voice {
                args.extend(["-v".to_string(), voice.to_string()]);
            }
            if let Some(rate) = rate {
                args.extend(["-r".to_string(), rate.to_string()]);
            }
            args.extend(["--".to_string(), text.to_string()]);
            "say"
        }
        SpeechEngine::Espeak => {
            if let Some(voice) = voice {
                args.extend(["-v".to_string(), voice.to_string()]);
            }
            if let Some(rate) = rate {
                args.extend(["-s".to_string(), rate.to_string()]);
            }
            args.extend(["--".to_string(), text.to_string()]);
            "espeak"
        }
        SpeechEngine::SpdSay => {
            args.push("--wait".to_string());
            if let Some(voice) = voice {
                args.extend(["-y".to_string(), voice.to_string()]);
            }
            args.extend(["--".to_string(), text.to_string()]);
            "spd-say"
        }
        SpeechEngine::Powershell | SpeechEngine::Auto => {
            let mut script = String::from(
                "Add-Type -AssemblyName System.Speech; \
                 $s = New-Object System.Speech.Synthesis.SpeechSynthesizer; ",
            );
            if let Some(voice) = voice {
                script.push_str(&format!("$s.SelectVoice('{}'); ", ps_quote(voice)));
            }
            if let Some(rate) = rate {
                script.push_str(&format!("$s.Rate = {}; ", sapi_rate(rate)));
            }
            script.push_str(&format!("$s.Speak('{}')", ps_quote(text)));
            args.extend(["-NoProfile".to_string(), "-Command".to_string(), script]);
            "powershell"
        }
    };

    (program.to_string(), args)
}

/// Single-quoted PowerShell literal body.
fn ps_quote(text: &str) -> String {
    text.replace('\'', "''")
}

/// Map words per minute onto SAPI's -10..=10 scale (0 ≈ 180 wpm).
fn sapi_rate(wpm: u32) -> i32 {
    ((i64::from(wpm) - 180) / 20).clamp(-10, 10) as i32
}

/// Run a utility to completion, killing it if it outlives `timeout`.
pub(crate) async fn run_bounded(program: &str, args: &[String], timeout: Duration) -> Result<()> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| AnnounceError::command(program, format!("failed to start: {e}")))?;

    match tokio::time::timeout(timeout, child.wait()).await {
        Ok(Ok(status)) if status.success() => Ok(()),
        Ok(Ok(status)) => Err(AnnounceError::command(program, format!("exited with {status}"))),
        Ok(Err(e)) => Err(AnnounceError::Io(e)),
        Err(_) => {
            let _ = child.kill().await;
            Err(AnnounceError::Timeout(timeout))
        }
    }
}

pub struct LocalTtsAnnouncer {
    engine: SpeechEngine,
    voice: Option<String>,
    rate: Option<u32>,
    timeout: Duration,
}

impl LocalTtsAnnouncer {
    pub fn new(config: &LocalTtsConfig, timeout: Duration) -> Self {
        Self {
            engine: config.engine,
            voice: config.voice.clone(),
            rate: config.rate,
            timeout,
        }
    }
}

#[async_trait]
impl Announcer for LocalTtsAnnouncer {
    fn name(&self) -> &str {
        "local_tts"
    }

    async fn notify(&self, summary: &str, _category: Category) -> Result<()> {
        let (program, args) = speech_command(self.engine, summary, self.voice.as_deref(), self.rate);
        debug!("Speaking via {program}");
        run_bounded(&program, &args, self.timeout).await
    }
}
