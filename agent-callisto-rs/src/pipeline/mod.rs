//! Notification pipeline: rolling buffer → classifier → cooldown → summary.
//!
//! Components:
//! - `buffer`: bounded rolling window of recent output
//! - `matcher`: ordered category pattern table
//! - `gate`: cooldown between fired notifications
//! - `summary`: per-category phrase extraction

pub mod buffer;
pub mod category;
pub mod gate;
pub mod matcher;
pub mod summary;

use std::time::{Duration, Instant};

use tracing::debug;

pub use buffer::RollingBuffer;
pub use category::Category;
pub use gate::NotificationGate;
pub use matcher::CategoryMatcher;

use crate::config::Config;

/// A decision to announce something.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Announcement {
    pub category: Category,
    pub summary: String,
}

impl Announcement {
    pub fn new(category: Category, summary: impl Into<String>) -> Self {
        Self {
            category,
            summary: summary.into(),
        }
    }
}

/// Per-stream classification state.
///
/// Owned by a single caller that feeds chunks in order and acts on the
/// returned announcements.
pub struct Pipeline {
    enabled: bool,
    buffer: RollingBuffer,
    matcher: CategoryMatcher,
    gate: NotificationGate,
}

impl Pipeline {
    pub fn new(config: &Config) -> Self {
        Self::from_parts(
            config.notifications_active(),
            config.effective_buffer_size(),
            CategoryMatcher::with_overrides(&config.category_patterns),
            Duration::from_millis(config.cooldown_ms),
        )
    }

    pub fn from_parts(
        enabled: bool,
        buffer_size: usize,
        matcher: CategoryMatcher,
        cooldown: Duration,
    ) -> Self {
        Self {
            enabled,
            buffer: RollingBuffer::new(buffer_size),
            matcher,
            gate: NotificationGate::new(cooldown),
        }
    }

    /// Feed one chunk received at `now`.
    ///
    /// Returns an announcement when the buffered output matches a category
    /// and the cooldown has elapsed; the cooldown is committed in that case.
    pub fn process(&mut self, chunk: &str, now: Instant) -> Option<Announcement> {
        if !self.enabled {
            return None;
        }

        self.buffer.append(chunk);
        let category = self.matcher.classify(self.buffer.contents())?;

        if !self.gate.try_fire(now) {
            debug!("{category} match suppressed by cooldown");
            return None;
        }

        let summary = summary::extract(self.buffer.contents(), Some(category));
        debug!("{category} match: {summary:?}");
        Some(Announcement { category, summary })
    }

    /// Forget buffered output, e.g. when a response stream ends.
    ///
    /// The cooldown carries over so back-to-back streams still respect it.
    pub fn end_session(&mut self) {
        self.buffer.clear();
    }

    pub fn buffer(&self) -> &RollingBuffer {
        &self.buffer
    }

    pub fn matcher(&self) -> &CategoryMatcher {
        &self.matcher
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pipeline(cooldown_ms: u64) -> Pipeline {
        Pipeline::from_parts(
            true,
            500,
            CategoryMatcher::new(),
            Duration::from_millis(cooldown_ms),
        )
    }

    #[test]
    fn announces_on_match() {
        let mut p = pipeline(3000);
        let got = p.process("Ready for review - please approve", Instant::now());
        assert_eq!(got, Some(Announcement::new(Category::Approval, "Ready for review")));
    }

    #[test]
    fn no_match_no_announcement() {
        let mut p = pipeline(3000);
        assert_eq!(p.process("Compiling crate v0.1.0\n", Instant::now()), None);
        assert_eq!(p.buffer().contents(), "Compiling crate v0.1.0\n");
    }

    #[test]
    fn match_split_across_chunks() {
        let mut p = pipeline(3000);
        let t0 = Instant::now();
        assert_eq!(p.process("Build succ", t0), None);
        let got = p.process("eeded in 3.2s\n", t0);
        assert_eq!(got.map(|a| a.summary), Some("Build succeeded".to_string()));
    }

    #[test]
    fn cooldown_suppresses_second_match() {
        let mut p = pipeline(3000);
        let t0 = Instant::now();
        assert!(p.process("Task completed", t0).is_some());
        assert!(p.process("Task completed", t0 + Duration::from_millis(500)).is_none());
        assert!(p.process("Task completed", t0 + Duration::from_millis(3000)).is_some());
    }

    #[test]
    fn disabled_pipeline_does_nothing() {
        let mut p = Pipeline::from_parts(false, 500, CategoryMatcher::new(), Duration::ZERO);
        assert_eq!(p.process("fatal error", Instant::now()), None);
        assert!(p.buffer().is_empty());
    }

    #[test]
    fn end_session_clears_buffer_but_keeps_cooldown() {
        let mut p = pipeline(3000);
        let t0 = Instant::now();
        assert!(p.process("Task completed", t0).is_some());
        p.end_session();
        assert!(p.buffer().is_empty());
        assert!(p.process("Task completed", t0 + Duration::from_millis(10)).is_none());
    }

    #[test]
    fn from_config_uses_overrides_and_buffer_size() {
        let mut config = Config::default();
        config.buffer_size = 16;
        config
            .category_patterns
            .insert(Category::Approval, vec!["continue\\?".into()]);
        let mut p = Pipeline::new(&config);

        assert_eq!(p.buffer().capacity(), 16);
        let got = p.process("Shall I continue?", Instant::now());
        assert_eq!(got, Some(Announcement::new(Category::Approval, "Action needed")));
    }
}
