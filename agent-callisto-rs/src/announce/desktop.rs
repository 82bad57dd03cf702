//! Desktop notifications via notify-rust (D-Bus).

use async_trait::async_trait;
use notify_rust::Notification;
use tracing::debug;

use super::Announcer;
use crate::error::{AnnounceError, Result};
use crate::pipeline::Category;

pub fn title(category: Category) -> &'static str {
    match category {
        Category::Critical => "Error",
        Category::Completion => "Done",
        Category::Approval => "Approval needed",
    }
}

fn icon(category: Category) -> &'static str {
    match category {
        Category::Critical => "dialog-error",
        Category::Completion => "emblem-ok",
        Category::Approval => "dialog-question",
    }
}

#[derive(Default)]
pub struct DesktopAnnouncer;

impl DesktopAnnouncer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Announcer for DesktopAnnouncer {
    fn name(&self) -> &str {
        "desktop"
    }

    async fn notify(&self, summary: &str, category: Category) -> Result<()> {
        debug!("Notification: {summary}");

        let summary = summary.to_string();
        tokio::task::spawn_blocking(move || {
            Notification::new()
                .appname("agent-callisto")
                .summary(title(category))
                .body(&summary)
                .icon(icon(category))
                .timeout(3000)
                .show()
                .map(|_| ())
                .map_err(|e| AnnounceError::Desktop(e.to_string()))
        })
        .await
        .map_err(|e| AnnounceError::Desktop(format!("notification task failed: {e}")))?
    }
}
