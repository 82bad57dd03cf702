//! callisto-hook: Claude Code hook binary.
//!
//! Reads the hook event JSON from stdin and announces through the
//! configured providers. Waits for the announcement before exiting.

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use agent_callisto::announce::{build_announcer, dispatch};
use agent_callisto::config::Config;
use agent_callisto::feedback::Feedback;
use agent_callisto::history::History;
use agent_callisto::pipeline::{Announcement, Category, Pipeline};
use agent_callisto::playback::Player;
use agent_callisto::service::StreamMonitor;
use agent_callisto::sounds::{SoundBank, SoundGroup};
use agent_callisto::transcript::extract_last_assistant_text;
use serde::Deserialize;
use tracing::{debug, info, warn};

const MAX_TRANSCRIPT_CHARS: usize = 2000;

// --- Event JSON from Claude Code ---

#[derive(Deserialize, Debug)]
#[allow(clippy::struct_field_names)]
struct HookEvent {
    hook_event_name: Option<String>,
    source: Option<String>,
    transcript_path: Option<String>,
    tool_name: Option<String>,
    notification_type: Option<String>,
}

/// What a hook event turns into.
#[derive(Debug, PartialEq, Eq)]
enum Action {
    /// Feed text through the pipeline as one final chunk.
    Classify(String),
    Announce(Announcement),
    Sound(SoundGroup),
    Skip(String),
}

fn action_for(event: &HookEvent) -> Action {
    match event.hook_event_name.as_deref() {
        Some("Stop") => {
            let Some(path) = event.transcript_path.as_deref().filter(|p| !p.is_empty()) else {
                return Action::Skip("no transcript path".into());
            };
            match extract_last_assistant_text(Path::new(path), MAX_TRANSCRIPT_CHARS) {
                Some(text) => Action::Classify(text),
                None => Action::Skip("no assistant text found".into()),
            }
        }
        Some("Notification") => match event.notification_type.as_deref() {
            Some("permission_prompt") => {
                Action::Announce(Announcement::new(Category::Approval, "Action needed"))
            }
            Some("idle_prompt") => {
                Action::Announce(Announcement::new(Category::Approval, "Waiting for input"))
            }
            Some(other) => Action::Skip(format!("unknown notification: {other}")),
            None => Action::Skip("no notification_type".into()),
        },
        Some("PermissionRequest") => {
            let tool = event.tool_name.as_deref().unwrap_or("unknown tool");
            Action::Announce(Announcement::new(
                Category::Approval,
                format!("Approval required for {tool}"),
            ))
        }
        Some("SessionStart") => match event.source.as_deref() {
            // Skip resume and compaction restarts
            Some(source @ ("resume" | "compact")) => Action::Skip(format!("source={source}")),
            _ => Action::Sound(SoundGroup::Open),
        },
        Some(other) => Action::Skip(format!("unhandled event {other}")),
        None => Action::Skip("no hook_event_name".into()),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    agent_callisto::init_logging(false);

    let mut input = String::new();
    if let Err(e) = std::io::stdin().read_to_string(&mut input) {
        warn!("Failed to read hook event: {e}");
        return;
    }

    let event: HookEvent = match serde_json::from_str(&input) {
        Ok(e) => e,
        Err(e) => {
            warn!("Invalid hook event JSON: {e}");
            return;
        }
    };
    debug!("Hook event: {event:?}");

    let config = Config::load(None);
    if !config.notifications_active() {
        debug!("Notifications disabled");
        return;
    }

    let bank = Arc::new(SoundBank::load(&config.sounds.resolved_dir()));
    let history = History::from_config(&config.history).map(Arc::new);

    match action_for(&event) {
        Action::Classify(text) => {
            let mut monitor = StreamMonitor::with_parts(
                Pipeline::new(&config),
                build_announcer(&config, bank),
                Feedback::disabled(),
                history,
            );
            if monitor.on_chunk(&text, true).is_none() {
                info!("Nothing to announce");
            }
            monitor.drain().await;
        }
        Action::Announce(announcement) => {
            let announcer = build_announcer(&config, bank);
            if let Err(e) = dispatch(announcer, announcement, history).await {
                warn!("Announcement task failed: {e}");
            }
        }
        Action::Sound(group) => {
            let Some(path) = bank.pick(group) else {
                debug!("No {group:?} sound installed");
                return;
            };
            let player = Player::new(config.effective_volume(), config.request_timeout());
            if let Err(e) = player.play_file(&path).await {
                warn!("Session sound failed: {e}");
            }
        }
        Action::Skip(reason) => debug!("Skipped: {reason}"),
    }
}
